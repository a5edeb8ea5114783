use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Filesystem type of a mount entry. The composer only emits `bind` and
/// `tmpfs`; the pseudo filesystems come from the embedded base template.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum MountType {
    #[default]
    Bind,
    Tmpfs,
    Proc,
    Devpts,
    Sysfs,
    Mqueue,
}

impl FromStr for MountType {
    type Err = UnknownMountType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "bind" => Ok(MountType::Bind),
            "tmpfs" => Ok(MountType::Tmpfs),
            "proc" => Ok(MountType::Proc),
            "devpts" => Ok(MountType::Devpts),
            "sysfs" => Ok(MountType::Sysfs),
            "mqueue" => Ok(MountType::Mqueue),
            _ => Err(UnknownMountType(s.to_string())),
        }
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown mount type {0:?}")]
pub struct UnknownMountType(pub String);

/// A single mount in the runtime spec. `destination` is always an
/// absolute path inside the container.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Mount {
    #[serde(rename = "type", default)]
    pub mount_type: MountType,

    pub source: PathBuf,

    pub destination: PathBuf,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,
}

impl Mount {
    pub fn bind(
        source: impl Into<PathBuf>,
        destination: impl Into<PathBuf>,
        options: &[&str],
    ) -> Self {
        Self {
            mount_type: MountType::Bind,
            source: source.into(),
            destination: destination.into(),
            options: options.iter().map(|o| o.to_string()).collect(),
        }
    }

    pub fn tmpfs(destination: impl Into<PathBuf>, options: &[&str]) -> Self {
        Self {
            mount_type: MountType::Tmpfs,
            source: PathBuf::from("tmpfs"),
            destination: destination.into(),
            options: options.iter().map(|o| o.to_string()).collect(),
        }
    }
}
