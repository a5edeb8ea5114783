use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::Mount;

/// How the helper assembles the container root filesystem.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RootfsMode {
    Native,
    Overlayfs,
}

/// Launcher-specific annotations consumed by the helper. `native` and
/// `overlayfs` are mutually exclusive; the composer populates exactly one.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Annotations {
    pub container_root_path: PathBuf,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub native: Option<NativeRootfs>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overlayfs: Option<OverlayfsRootfs>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dbus_proxy_info: Option<DBusProxyInfo>,
}

impl Annotations {
    pub fn native(container_root_path: PathBuf) -> Self {
        Self {
            container_root_path,
            native: Some(NativeRootfs::default()),
            overlayfs: None,
            dbus_proxy_info: None,
        }
    }

    pub fn overlayfs(container_root_path: PathBuf, overlayfs: OverlayfsRootfs) -> Self {
        Self {
            container_root_path,
            native: None,
            overlayfs: Some(overlayfs),
            dbus_proxy_info: None,
        }
    }

    pub fn rootfs_mode(&self) -> RootfsMode {
        if self.overlayfs.is_some() {
            RootfsMode::Overlayfs
        } else {
            RootfsMode::Native
        }
    }

    /// The mount list belonging to the active rootfs mode.
    pub fn rootfs_mounts_mut(&mut self) -> &mut Vec<Mount> {
        if let Some(overlay) = self.overlayfs.as_mut() {
            return &mut overlay.mounts;
        }
        &mut self.native.get_or_insert_with(NativeRootfs::default).mounts
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
pub struct NativeRootfs {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub mounts: Vec<Mount>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct OverlayfsRootfs {
    pub lower_parent: PathBuf,

    pub upper: PathBuf,

    pub workdir: PathBuf,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub mounts: Vec<Mount>,
}

/// DBus proxy configuration handed to the helper alongside the spec.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct DBusProxyInfo {
    pub enable: bool,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub app_id: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub bus_type: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proxy_path: Option<PathBuf>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub name: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub path: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub interface: Vec<String>,
}

impl DBusProxyInfo {
    fn push_unique(list: &mut Vec<String>, value: &str) {
        if !list.iter().any(|v| v == value) {
            list.push(value.to_string());
        }
    }

    pub fn add_name_filter(&mut self, name: &str) {
        Self::push_unique(&mut self.name, name);
    }

    pub fn add_path_filter(&mut self, path: &str) {
        Self::push_unique(&mut self.path, path);
    }

    pub fn add_interface_filter(&mut self, interface: &str) {
        Self::push_unique(&mut self.interface, interface);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rootfs_modes_are_exclusive() {
        let native = Annotations::native(PathBuf::from("/w"));
        assert_eq!(native.rootfs_mode(), RootfsMode::Native);
        assert!(native.overlayfs.is_none());

        let overlay = Annotations::overlayfs(
            PathBuf::from("/w"),
            OverlayfsRootfs {
                lower_parent: PathBuf::from("/w/.overlayfs/lower_parent"),
                upper: PathBuf::from("/w/.overlayfs/upper"),
                workdir: PathBuf::from("/w/.overlayfs/workdir"),
                mounts: Vec::new(),
            },
        );
        assert_eq!(overlay.rootfs_mode(), RootfsMode::Overlayfs);
        assert!(overlay.native.is_none());
    }

    #[test]
    fn test_filters_append_uniquely() {
        let mut info = DBusProxyInfo::default();
        info.add_name_filter("org.freedesktop.Notifications");
        info.add_name_filter("org.freedesktop.Notifications");
        info.add_path_filter("/org/freedesktop/Notifications");
        assert_eq!(info.name.len(), 1);
        assert_eq!(info.path.len(), 1);
    }
}
