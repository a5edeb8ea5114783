//! Seams to the external collaborators: the package repository and the
//! Flatpak integration adapter. The launcher never touches layer storage
//! directly; implementations are injected by the caller.

use std::path::PathBuf;

use crate::error::Result;
use crate::package::Ref;

/// Resolves package refs to on-disk layer roots.
pub trait Repo {
    /// The layer root materialized for `r`, containing `files/`,
    /// `entries/` and `info.json`.
    fn root_of_layer(&self, r: &Ref) -> Result<PathBuf>;

    /// The newest installed ref matching `app_id` and `version`.
    fn latest_of_ref(&self, app_id: &str, version: &str) -> Result<Ref>;
}

/// Path resolution for Flatpak-backed applications.
pub trait FlatpakAdapter {
    fn runtime_path(&self, app_id: &str) -> Option<PathBuf>;

    fn app_path(&self, app_id: &str) -> Option<PathBuf>;

    fn desktop_file_list(&self, app_id: &str) -> Vec<PathBuf>;
}
