//! Desktop Entry parsing: the `Exec` line decides what runs inside the
//! sandbox.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;
use regex::Regex;

const MAIN_GROUP: &str = "Desktop Entry";

/// `%f`, `%U` and friends from the Desktop Entry specification.
static FIELD_CODE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^%\w$").expect("static regex"));

#[derive(Debug, thiserror::Error)]
pub enum DesktopError {
    #[error("failed to read desktop entry {path:?}")]
    Read {
        source: std::io::Error,
        path: PathBuf,
    },
}

/// A parsed `.desktop` file, reduced to the key/value pairs of its main
/// group. Locale variants (`Name[zh_CN]`) are kept verbatim under their
/// bracketed key and never consulted by the launcher.
#[derive(Debug, Clone)]
pub struct DesktopEntry {
    values: HashMap<String, String>,
}

impl DesktopEntry {
    pub fn load(path: &Path) -> Result<Self, DesktopError> {
        let data = fs::read_to_string(path).map_err(|source| DesktopError::Read {
            source,
            path: path.to_owned(),
        })?;
        Ok(Self::parse(&data))
    }

    fn parse(data: &str) -> Self {
        let mut values = HashMap::new();
        let mut in_main_group = false;

        for line in data.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            if let Some(group) = line.strip_prefix('[').and_then(|l| l.strip_suffix(']')) {
                in_main_group = group == MAIN_GROUP;
                continue;
            }
            if !in_main_group {
                continue;
            }
            if let Some((key, value)) = line.split_once('=') {
                values.insert(key.trim().to_string(), value.trim().to_string());
            }
        }

        Self { values }
    }

    pub fn raw_value(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }
}

/// Tokenize an `Exec` value with shell-style quoting. Malformed quoting
/// yields no args rather than a half-split command line.
pub fn parse_exec(raw: &str) -> Vec<String> {
    match shell_words::split(raw) {
        Ok(words) => words,
        Err(err) => {
            tracing::warn!(?err, raw, "failed to tokenize exec line");
            Vec::new()
        }
    }
}

/// Remove the first field-code token (`%f`, `%U`, ...) in place.
pub fn strip_field_code(args: &mut Vec<String>) {
    if let Some(pos) = args.iter().position(|a| FIELD_CODE.is_match(a)) {
        args.remove(pos);
    }
}

/// Split a leading `env KEY=VALUE ...` wrapper off an arg list. Returns
/// the extracted assignments and the remaining command args.
pub fn split_env_prefix(args: &[String]) -> (Vec<(String, String)>, Vec<String>) {
    if args.first().map(String::as_str) != Some("env") {
        return (Vec::new(), args.to_vec());
    }

    let mut assignments = Vec::new();
    let mut rest = &args[1..];
    while let Some((key, value)) = rest.first().and_then(|a| a.split_once('=')) {
        assignments.push((key.to_string(), value.to_string()));
        rest = &rest[1..];
    }
    (assignments, rest.to_vec())
}

/// The `env KEY=VALUE` directive wherever it appears in a tokenized
/// `Exec` line.
pub fn env_directive(args: &[String]) -> Option<(String, String)> {
    let pos = args.iter().position(|a| a == "env")?;
    let assignment = args.get(pos + 1)?;
    let (key, value) = assignment.split_once('=')?;
    Some((key.to_string(), value.to_string()))
}
