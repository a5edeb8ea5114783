//! Materialize and load the per-user app config,
//! `$HOME/.linglong/<appId>/app.yaml`. The file is rendered from an
//! embedded template plus the permission mounts granted in the package
//! descriptor.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::package::{PackageInfo, Permissions, Ref};
use crate::repo::Repo;
use crate::utils;

const CONFIG_TEMPLATE: &str = include_str!("app.yaml");

/// Runtime ref used when the descriptor does not declare one.
pub const DEFAULT_RUNTIME_REF: &str = "org.deepin.Runtime/20/x86_64";

/// The parsed per-user app config.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    #[serde(default)]
    pub version: String,

    pub package: RefSection,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub runtime: Option<RefSection>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub permissions: Option<Permissions>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct RefSection {
    #[serde(rename = "ref")]
    pub reference: String,
}

impl AppConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let data = fs::read_to_string(path).map_err(Error::io("failed to read app config", path))?;
        serde_yaml::from_str(&data).map_err(Error::TemplateParse)
    }
}

/// Render the config for `app_id` and write it to
/// `$HOME/.linglong/<appId>/app.yaml`, returning the path. Flatpak-backed
/// apps tolerate a missing descriptor; everyone else fails with
/// `DescriptorMissing`.
pub fn materialize(
    repo: &dyn Repo,
    app_id: &str,
    version: &str,
    is_flatpak: bool,
) -> Result<PathBuf> {
    utils::ensure_user_dir(&[".linglong", app_id])?;
    let config_path = utils::user_file(&format!(".linglong/{app_id}/app.yaml"))?;

    let latest_ref = repo.latest_of_ref(app_id, version)?;
    let layer_root = repo.root_of_layer(&latest_ref)?;

    let descriptor_path = layer_root.join("info.json");
    if !is_flatpak && !descriptor_path.is_file() {
        return Err(Error::DescriptorMissing(descriptor_path));
    }
    let info = if descriptor_path.is_file() {
        PackageInfo::load(&descriptor_path)?
    } else {
        PackageInfo::default()
    };

    let runtime = if info.runtime.is_empty() {
        DEFAULT_RUNTIME_REF.to_string()
    } else {
        info.runtime.clone()
    };
    let runtime_ref = Ref::parse(&runtime)?;

    let mut rendered = CONFIG_TEMPLATE
        .replace("@APP_REF@", &latest_ref.to_local_string())
        .replace("@RUNTIME_REF@", &runtime_ref.to_local_string());
    rendered.push_str(&render_permission_mounts(&info));

    fs::write(&config_path, rendered).map_err(|source| Error::ConfigWrite {
        source,
        path: config_path.clone(),
    })?;

    tracing::debug!(path = ?config_path, "materialized app config");
    Ok(config_path)
}

/// The `permissions.mounts` YAML block for the honored user XDG
/// directories. `rw` grants carry explicit options; everything else keeps
/// the launcher defaults.
fn render_permission_mounts(info: &PackageInfo) -> String {
    let user_perms = match info
        .permissions
        .as_ref()
        .and_then(|p| p.filesystem.as_ref())
        .map(|f| &f.user)
    {
        Some(user) if !user.is_empty() => user,
        _ => return String::new(),
    };

    let mut entries = String::new();
    for (name, perm) in user_perms {
        if !matches!(perm.as_str(), "r" | "ro" | "rw") {
            continue;
        }
        if !utils::xdg_user_dir_names().contains(&name.as_str()) {
            continue;
        }
        let Some(dir) = utils::xdg_user_dir(name) else {
            continue;
        };
        let dir = dir.display();
        if perm == "rw" {
            entries.push_str(&format!(
                "\n    - type: bind\n      options: rw,rbind\n      source: {dir}\n      destination: {dir}"
            ));
        } else {
            entries.push_str(&format!(
                "\n    - source: {dir}\n      destination: {dir}"
            ));
        }
    }

    if entries.is_empty() {
        return String::new();
    }
    format!("\n\npermissions:\n  mounts:{entries}\n")
}
