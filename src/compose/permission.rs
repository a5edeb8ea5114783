//! Static permission mounts granted by the app config. Entries are taken
//! verbatim after filling launcher defaults; malformed ones are skipped.

use super::Composer;
use crate::error::Result;
use crate::package::Permissions;
use crate::spec::{Mount, MountType};

impl Composer<'_> {
    pub fn stage_mount(&mut self, permissions: Option<&Permissions>) -> Result<()> {
        let rules = match permissions {
            Some(p) if !p.mounts.is_empty() => &p.mounts,
            _ => return Ok(()),
        };

        for rule in rules {
            if rule.source.is_empty() || rule.destination.is_empty() {
                tracing::warn!(?rule, "skip static mount without source or destination");
                continue;
            }

            let mount_type = if rule.mount_type.is_empty() {
                MountType::Bind
            } else {
                match rule.mount_type.parse() {
                    Ok(t) => t,
                    Err(err) => {
                        tracing::warn!(%err, ?rule, "skip static mount");
                        continue;
                    }
                }
            };

            let options: Vec<String> = if rule.options.is_empty() {
                vec!["ro".to_string(), "rbind".to_string()]
            } else {
                rule.options.split(',').map(str::to_string).collect()
            };

            let mount = Mount {
                mount_type,
                source: rule.source.clone().into(),
                destination: rule.destination.clone().into(),
                options,
            };
            tracing::debug!(source = %rule.source, destination = %rule.destination, "add static mount");
            self.spec.mounts.push(mount);
        }

        Ok(())
    }
}
