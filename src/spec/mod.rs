//! The runtime specification streamed to the container helper. Plain owned
//! data with only forward edges; the helper resolves mounts in list order,
//! so a later entry with the same destination overrides an earlier one.

mod annotations;
mod linux;
mod mount;
mod process;

pub use annotations::{Annotations, DBusProxyInfo, OverlayfsRootfs, NativeRootfs, RootfsMode};
pub use linux::{IdMap, Linux, Namespace};
pub use mount::{Mount, MountType};
pub use process::Process;

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::{Error, Result};

/// Base spec the composer stages populate. Shipped as an embedded
/// template so every sandbox starts from the same namespace setup.
const SPEC_TEMPLATE: &str = include_str!("config.json");

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Runtime {
    #[serde(rename = "ociVersion", default)]
    pub oci_version: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hostname: Option<String>,

    pub root: Root,

    pub process: Process,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub mounts: Vec<Mount>,

    pub linux: Linux,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub annotations: Option<Annotations>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
pub struct Root {
    #[serde(default)]
    pub path: PathBuf,

    #[serde(default)]
    pub readonly: bool,
}

impl Runtime {
    /// The embedded base template.
    pub fn base() -> Result<Self> {
        serde_json::from_str(SPEC_TEMPLATE).map_err(Error::SpecTemplate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;

    #[test]
    fn test_base_template_parses() -> Result<()> {
        let spec = Runtime::base()?;
        assert_eq!(spec.oci_version, "1.0.1");
        assert!(spec.process.args.is_empty());
        assert!(!spec.mounts.is_empty());
        assert!(spec
            .linux
            .namespaces
            .iter()
            .any(|ns| ns.ns_type == "mount"));
        assert!(spec.annotations.is_none());
        Ok(())
    }

    #[test]
    fn test_empty_fields_are_omitted_on_wire() -> Result<()> {
        let mut spec = Runtime::base()?;
        spec.mounts.clear();
        let json = serde_json::to_string(&spec)?;
        assert!(!json.contains("\"mounts\""));
        assert!(!json.contains("\"annotations\""));
        assert!(json.contains("\"hostname\""));
        Ok(())
    }
}
