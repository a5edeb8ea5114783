//! Per-run container handle: identifier, working directory and the helper
//! pid once the sandbox is running.

use std::fs;
use std::path::PathBuf;

use nix::unistd::Pid;
use uuid::Uuid;

use crate::error::Result;
use crate::utils;

const OVERLAY_DIR: &str = ".overlayfs";

#[derive(Debug)]
pub struct Container {
    pub id: String,
    pub working_directory: PathBuf,
    pub pid: Option<Pid>,
}

impl Container {
    /// Allocate a fresh container id and create its working directory
    /// under `<linglong-root>/containers/`, including the `root/` the
    /// helper pivots into.
    pub fn create() -> Result<Self> {
        let id = Uuid::new_v4().to_string();
        let working_directory = utils::linglong_root().join("containers").join(&id);
        utils::ensure_dir(&working_directory.join("root"))?;

        Ok(Self {
            id,
            working_directory,
            pid: None,
        })
    }

    pub fn root_path(&self) -> PathBuf {
        self.working_directory.join("root")
    }

    pub fn overlay_lower_parent(&self) -> PathBuf {
        self.working_directory.join(OVERLAY_DIR).join("lower_parent")
    }

    pub fn overlay_upper(&self) -> PathBuf {
        self.working_directory.join(OVERLAY_DIR).join("upper")
    }

    pub fn overlay_workdir(&self) -> PathBuf {
        self.working_directory.join(OVERLAY_DIR).join("workdir")
    }

    /// Create the overlay scratch directories. Only called when the spec
    /// ends up in overlayfs mode.
    pub fn ensure_overlay_dirs(&self) -> Result<()> {
        utils::ensure_dir(&self.overlay_lower_parent())?;
        utils::ensure_dir(&self.overlay_upper())?;
        utils::ensure_dir(&self.overlay_workdir())?;
        Ok(())
    }

    /// Remove the working directory after the helper has exited. The
    /// directory may already be gone; that is not an error.
    pub fn cleanup(&self) {
        if let Err(err) = fs::remove_dir_all(&self.working_directory) {
            if err.kind() != std::io::ErrorKind::NotFound {
                tracing::warn!(?err, path = ?self.working_directory, "failed to remove container workdir");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use serial_test::serial;

    #[test]
    #[serial]
    fn test_create_and_cleanup() -> Result<()> {
        let tmp = tempfile::tempdir()?;
        std::env::set_var("LINGLONG_ROOT", tmp.path());

        let container = Container::create()?;
        assert!(container.root_path().is_dir());
        assert!(container
            .working_directory
            .starts_with(tmp.path().join("containers")));

        container.ensure_overlay_dirs()?;
        assert!(container.overlay_upper().is_dir());
        assert!(container.overlay_workdir().is_dir());

        container.cleanup();
        assert!(!container.working_directory.exists());
        // second cleanup is a no-op
        container.cleanup();

        std::env::remove_var("LINGLONG_ROOT");
        Ok(())
    }

    #[test]
    #[serial]
    fn test_ids_are_unique() -> Result<()> {
        let tmp = tempfile::tempdir()?;
        std::env::set_var("LINGLONG_ROOT", tmp.path());

        let a = Container::create()?;
        let b = Container::create()?;
        assert_ne!(a.id, b.id);

        a.cleanup();
        b.cleanup();
        std::env::remove_var("LINGLONG_ROOT");
        Ok(())
    }
}
