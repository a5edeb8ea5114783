//! The spec composer. Stages run in a fixed order and append mounts, env
//! and id mappings to the runtime spec; the rootfs stage picks between
//! native and overlay mode, which later stages must not change.

mod dbus;
mod exec;
mod fixups;
mod host;
mod permission;
mod rootfs;
mod system;
mod user;
mod vars;

pub use vars::resolve_vars;

use std::collections::BTreeMap;
use std::path::PathBuf;

use nix::unistd;

use crate::container::Container;
use crate::error::Result;
use crate::package::Ref;
use crate::repo::FlatpakAdapter;
use crate::spec::{Mount, Runtime};

/// Keys of the run parameter map consumed by the dbus stages.
pub mod params {
    pub const NO_DBUS_PROXY: &str = "no-dbus-proxy";
    pub const BUS_TYPE: &str = "dbus-proxy-bus-type";
    pub const FILTER_NAME: &str = "dbus-proxy-filter-name";
    pub const FILTER_PATH: &str = "dbus-proxy-filter-path";
    pub const FILTER_INTERFACE: &str = "dbus-proxy-filter-interface";
}

/// Mutable view over the spec during composition, bundling everything the
/// stages need to know about the app being launched.
pub struct Composer<'a> {
    pub(crate) spec: &'a mut Runtime,
    pub(crate) container: &'a Container,
    pub(crate) app_ref: &'a Ref,
    pub(crate) app_root: PathBuf,
    pub(crate) runtime_root: PathBuf,
    pub(crate) env_map: &'a BTreeMap<String, String>,
    pub(crate) run_params: &'a BTreeMap<String, String>,
    pub(crate) flatpak_adapter: Option<&'a dyn FlatpakAdapter>,
    pub(crate) uid: u32,
    pub(crate) gid: u32,
}

impl<'a> Composer<'a> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        spec: &'a mut Runtime,
        container: &'a Container,
        app_ref: &'a Ref,
        app_root: PathBuf,
        runtime_root: PathBuf,
        env_map: &'a BTreeMap<String, String>,
        run_params: &'a BTreeMap<String, String>,
        flatpak_adapter: Option<&'a dyn FlatpakAdapter>,
    ) -> Self {
        Self {
            spec,
            container,
            app_ref,
            app_root,
            runtime_root,
            env_map,
            run_params,
            flatpak_adapter,
            uid: unistd::getuid().as_raw(),
            gid: unistd::getgid().as_raw(),
        }
    }

    pub(crate) fn is_flatpak(&self) -> bool {
        self.flatpak_adapter.is_some()
    }

    pub(crate) fn app_id(&self) -> &str {
        &self.app_ref.app_id
    }

    /// `/run/user/<uid>` on both sides of the sandbox boundary.
    pub(crate) fn user_runtime_dir(&self) -> PathBuf {
        PathBuf::from(format!("/run/user/{}", self.uid))
    }

    /// Where the app layer lands inside the sandbox.
    pub(crate) fn app_mount_point(&self) -> PathBuf {
        if self.is_flatpak() {
            PathBuf::from("/app")
        } else {
            PathBuf::from(format!("/opt/apps/{}", self.app_id()))
        }
    }

    /// Append to the ordinary spec mount list.
    pub(crate) fn push_mount(&mut self, mount: Mount) {
        tracing::debug!(source = ?mount.source, destination = ?mount.destination, "add mount");
        self.spec.mounts.push(mount);
    }

    /// Dump the composed env to `<workdir>/env` and bind it to
    /// `/run/app/env` so the app can re-source its environment.
    pub fn write_env_file(&mut self) -> Result<()> {
        let env_path = self.container.working_directory.join("env");
        let mut content = self.spec.process.env.join("\n");
        content.push('\n');
        std::fs::write(&env_path, content)
            .map_err(crate::error::Error::io("failed to write env file", &env_path))?;

        self.push_mount(Mount::bind(env_path, "/run/app/env", &["rbind"]));
        Ok(())
    }
}
