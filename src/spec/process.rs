use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// The process record of the spec, also used on its own as the payload of
/// a post-start exec injection. `env` is an ordered `K=V` list in which a
/// key appears at most once; updates are last-wins.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
pub struct Process {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cwd: Option<PathBuf>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub env: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<String>,
}

impl Process {
    /// Set `key` to `value`, replacing any earlier entry for the key.
    pub fn set_env(&mut self, key: &str, value: &str) {
        self.env.retain(|e| e.split('=').next() != Some(key));
        self.env.push(format!("{key}={value}"));
    }

    /// Merge a raw `K=V` line, last-wins. Lines without `=` are ignored.
    pub fn push_env_line(&mut self, line: &str) {
        if let Some((key, value)) = line.split_once('=') {
            self.set_env(key, value);
        }
    }

    pub fn env_value(&self, key: &str) -> Option<&str> {
        self.env.iter().rev().find_map(|e| {
            e.split_once('=')
                .filter(|(k, _)| *k == key)
                .map(|(_, v)| v)
        })
    }
}
