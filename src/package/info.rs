use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Package descriptor loaded from `<layer>/info.json`. Unknown fields are
/// ignored so older descriptors keep loading.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
pub struct PackageInfo {
    #[serde(default)]
    pub appid: String,

    #[serde(default)]
    pub version: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub arch: Vec<String>,

    /// Runtime ref string the app was built against. Empty means the
    /// packaged default runtime.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub runtime: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overlayfs: Option<OverlayfsInfo>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub permissions: Option<Permissions>,
}

/// Extra overlay mounts the package declares for its rootfs.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
pub struct OverlayfsInfo {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub mounts: Vec<MountRule>,
}

/// Permissions granted by the package descriptor.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
pub struct Permissions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filesystem: Option<Filesystem>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub mounts: Vec<MountRule>,
}

/// Filesystem access requests, keyed by XDG user directory name with a
/// `"r" | "ro" | "rw"` value. Unrecognized keys are not honored.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
pub struct Filesystem {
    #[serde(default)]
    pub user: BTreeMap<String, String>,
}

/// A mount declared in a descriptor or config file. `options` is a
/// comma-separated string; type and options fall back to launcher
/// defaults when empty.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
pub struct MountRule {
    #[serde(default, rename = "type", skip_serializing_if = "String::is_empty")]
    pub mount_type: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub options: String,

    #[serde(default)]
    pub source: String,

    #[serde(default)]
    pub destination: String,
}

impl PackageInfo {
    /// Load the descriptor at `path`. A missing file is surfaced as
    /// `DescriptorMissing`; Flatpak-backed apps skip this loader entirely.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(Error::DescriptorMissing(path.to_owned()));
        }
        let data = fs::read_to_string(path).map_err(Error::io("failed to read descriptor", path))?;
        serde_json::from_str(&data).map_err(|source| Error::Descriptor {
            source,
            path: path.to_owned(),
        })
    }
}
