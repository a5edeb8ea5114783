//! Resolving what to run: locate the app's desktop entry, extract the
//! `Exec` command and fold its env directives into the composed spec.

use std::path::PathBuf;

use super::Composer;
use crate::desktop::{self, DesktopEntry};
use crate::error::{Error, Result};

impl Composer<'_> {
    /// Decide the process args from, in order: the caller-supplied exec
    /// override, then the desktop entry's `Exec` line.
    pub fn resolve_exec(&mut self, desktop_exec: Option<&str>) -> Result<()> {
        let app_id = self.app_id().to_string();

        let mut desktop_files: Vec<PathBuf> = match self.flatpak_adapter {
            Some(adapter) => adapter.desktop_file_list(&app_id),
            None => {
                let pattern = self.app_root.join("entries/applications/*.desktop");
                match glob::glob(&pattern.to_string_lossy()) {
                    Ok(entries) => entries.flatten().collect(),
                    Err(_) => Vec::new(),
                }
            }
        };
        desktop_files.sort();

        let desktop_path = desktop_files
            .first()
            .ok_or_else(|| Error::NoDesktopEntry(app_id.clone()))?;
        let entry = DesktopEntry::load(desktop_path)?;
        let raw_exec = entry.raw_value("Exec").unwrap_or_default().to_string();
        let parsed = desktop::parse_exec(&raw_exec);

        // the legacy outputs layout ships the bare command; the entries
        // layout wraps it in the launcher cli, whose args end at --exec
        let exec_args: Vec<String> = if self.app_root.join("outputs/share").is_dir() {
            parsed.clone()
        } else {
            match parsed.iter().position(|arg| arg == "--exec") {
                Some(pos) => parsed[pos + 1..].to_vec(),
                None => parsed.clone(),
            }
        };

        if self.spec.process.args.is_empty() {
            match desktop_exec.filter(|exec| !exec.is_empty()) {
                Some(exec) => self.spec.process.args = desktop::parse_exec(exec),
                None => self.spec.process.args = exec_args,
            }
        }

        // a native desktop Exec may still carry %F style placeholders
        desktop::strip_field_code(&mut self.spec.process.args);

        // `env K=V cmd` configures the app env, the command starts at cmd
        let (env_prefix, command) = desktop::split_env_prefix(&self.spec.process.args);
        if !env_prefix.is_empty() {
            for (key, value) in env_prefix {
                self.spec.process.set_env(&key, &value);
            }
            self.spec.process.args = command;
        }
        if let Some((key, value)) = desktop::env_directive(&parsed) {
            self.spec.process.set_env(&key, &value);
        }

        if self.spec.process.args.is_empty() {
            return Err(Error::NoDesktopEntry(app_id));
        }

        tracing::debug!(args = ?self.spec.process.args, "resolved exec");
        Ok(())
    }
}
