//! Rootfs staging: decides between the native and the overlay rootfs,
//! layers the runtime over the host and mounts the application layer.

use std::path::PathBuf;

use super::{vars::resolve_vars, Composer};
use crate::error::{Error, Result};
use crate::package::{Arch, PackageInfo};
use crate::spec::{Annotations, Mount, OverlayfsRootfs};

/// Runtimes carrying this marker need their `/usr` overlaid on top of the
/// host one instead of a plain thin-runtime mount.
const WINE_RUNTIME_MARKER: &str = "org.deepin.Wine";

impl Composer<'_> {
    pub fn stage_rootfs(&mut self, info: Option<&PackageInfo>) -> Result<()> {
        let mut use_thin_runtime = true;
        let mut fuse_mount = self
            .runtime_root
            .to_string_lossy()
            .contains(WINE_RUNTIME_MARKER);
        let mut special_case = false;

        if self.is_flatpak() {
            fuse_mount = false;
            use_thin_runtime = false;
        }

        // descriptors may request extra overlay mounts of their own
        let declared_mounts = info
            .and_then(|i| i.overlayfs.as_ref())
            .map(|o| o.mounts.as_slice())
            .unwrap_or_default();
        if !declared_mounts.is_empty() {
            fuse_mount = true;
            special_case = true;
        }

        let workdir = self.container.working_directory.clone();
        let mut annotations = if fuse_mount {
            self.container.ensure_overlay_dirs()?;
            Annotations::overlayfs(
                workdir,
                OverlayfsRootfs {
                    lower_parent: self.container.overlay_lower_parent(),
                    upper: self.container.overlay_upper(),
                    workdir: self.container.overlay_workdir(),
                    mounts: Vec::new(),
                },
            )
        } else {
            Annotations::native(workdir)
        };

        let mut mount_map: Vec<(PathBuf, PathBuf)> = Vec::new();
        let mut runtime_root = self.runtime_root.clone();

        if use_thin_runtime {
            mount_map.extend([
                (PathBuf::from("/usr"), PathBuf::from("/usr")),
                (PathBuf::from("/etc"), PathBuf::from("/etc")),
                (runtime_root.clone(), PathBuf::from("/runtime")),
                (
                    PathBuf::from("/usr/share/locale/"),
                    PathBuf::from("/usr/share/locale/"),
                ),
            ]);

            if fuse_mount && !special_case {
                // the runtime /usr must come after the host /usr so the
                // helper resolves it on top
                mount_map.extend([
                    (runtime_root.join("usr"), PathBuf::from("/usr")),
                    (
                        runtime_root.join("opt/deepinwine"),
                        PathBuf::from("/opt/deepinwine"),
                    ),
                    (
                        runtime_root.join("opt/deepin-wine6-stable"),
                        PathBuf::from("/opt/deepin-wine6-stable"),
                    ),
                ]);
            }

            if fuse_mount && special_case {
                for rule in declared_mounts {
                    mount_map.push((
                        resolve_vars(&rule.source, &self.app_root, &runtime_root).into(),
                        resolve_vars(&rule.destination, &self.app_root, &runtime_root).into(),
                    ));
                }
            }
        } else {
            if self.is_flatpak() {
                runtime_root = self
                    .flatpak_adapter
                    .and_then(|a| a.runtime_path(&self.app_ref.app_id))
                    .ok_or_else(|| Error::LayerNotFound(self.app_ref.to_local_string()))?;
            }
            if runtime_root.as_os_str().is_empty() {
                tracing::error!("cannot mount an empty runtime root");
                return Err(Error::LayerNotFound(self.app_ref.to_local_string()));
            }

            mount_map.push((runtime_root.clone(), PathBuf::from("/usr")));
        }

        let rootfs_mounts = annotations.rootfs_mounts_mut();
        for (source, destination) in mount_map {
            tracing::debug!(?source, ?destination, "add rootfs mount");
            rootfs_mounts.push(Mount::bind(source, destination, &["ro", "rbind"]));
        }

        // the app layer itself is writable, some apps update resources in
        // their own tree
        let app_root = if self.is_flatpak() {
            self.flatpak_adapter
                .and_then(|a| a.app_path(&self.app_ref.app_id))
                .ok_or_else(|| Error::LayerNotFound(self.app_ref.to_local_string()))?
        } else {
            self.app_root.clone()
        };
        rootfs_mounts.push(Mount::bind(
            app_root,
            self.app_mount_point(),
            &["rw", "rbind"],
        ));

        self.spec.annotations = Some(annotations);

        self.stage_arch_env()?;
        Ok(())
    }

    /// Architecture-dependent library and Qt plugin paths. Later stages
    /// never override these.
    fn stage_arch_env(&mut self) -> Result<()> {
        let app_id = self.app_ref.app_id.clone();
        let app_lib = if self.is_flatpak() {
            "/app/lib".to_string()
        } else {
            format!("/opt/apps/{app_id}/files/lib")
        };

        let triplet = match self.app_ref.arch.triplet() {
            Some(triplet) => triplet,
            None => {
                tracing::error!(arch = %self.app_ref.arch, "unsupported architecture");
                return Err(Error::UnsupportedArch(self.app_ref.arch.to_string()));
            }
        };

        let mut library_path = vec![
            app_lib.clone(),
            format!("{app_lib}/{triplet}"),
            "/runtime/lib".to_string(),
            format!("/runtime/lib/{triplet}"),
        ];
        if self.app_ref.arch == Arch::X86_64 {
            library_path.push("/runtime/lib/i386-linux-gnu".to_string());
        }

        self.spec.process.set_env(
            "QT_PLUGIN_PATH",
            &format!(
                "/opt/apps/{app_id}/files/plugins:/runtime/lib/{triplet}/qt5/plugins:/usr/lib/{triplet}/qt5/plugins"
            ),
        );
        self.spec.process.set_env(
            "QT_QPA_PLATFORM_PLUGIN_PATH",
            &format!(
                "/opt/apps/{app_id}/files/plugins/platforms:/runtime/lib/{triplet}/qt5/plugins/platforms:/usr/lib/{triplet}/qt5/plugins/platforms"
            ),
        );
        self.spec
            .process
            .set_env("LD_LIBRARY_PATH", &library_path.join(":"));

        Ok(())
    }
}
