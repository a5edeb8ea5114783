//! Per-user staging: the private `/run/user/<uid>`, redirected home
//! directories under `~/.linglong/<appId>/`, font and theme caches, and
//! the composed process environment.

use std::path::{Path, PathBuf};

use super::Composer;
use crate::error::Result;
use crate::spec::{IdMap, Mount};
use crate::utils;

impl Composer<'_> {
    pub fn stage_user(&mut self) -> Result<()> {
        let app_id = self.app_id().to_string();
        let user_runtime_dir = self.user_runtime_dir();

        self.push_mount(Mount::tmpfs(
            &user_runtime_dir,
            &["nodev", "nosuid", "mode=700"],
        ));

        let mut mount_map: Vec<(PathBuf, PathBuf)> = Vec::new();

        mount_map.push((
            user_runtime_dir.join("pulse"),
            user_runtime_dir.join("pulse"),
        ));

        // cameras need the udev database besides the device nodes
        if Path::new("/run/udev").is_dir() {
            mount_map.push(("/run/udev".into(), "/run/udev".into()));
        }
        if let Ok(entries) = glob::glob("/dev/video*") {
            for entry in entries.flatten() {
                mount_map.push((entry.clone(), entry));
            }
        }

        // the app sees a private home; its real data lives under
        // ~/.linglong/<appId>/
        let host_app_home = utils::ensure_user_dir(&[".linglong", &app_id, "home"])?;
        mount_map.push((host_app_home, utils::user_file("")?));

        let app_linglong_dir = utils::ensure_user_dir(&[".linglong", &app_id])?;
        mount_map.push((
            app_linglong_dir,
            utils::user_file(&format!(".linglong/{app_id}"))?,
        ));

        let app_config_dir = utils::ensure_user_dir(&[".linglong", &app_id, "config"])?;
        mount_map.push((app_config_dir, utils::user_file(".config")?));

        let app_cache_dir = utils::ensure_user_dir(&[".linglong", &app_id, "cache"])?;
        mount_map.push((app_cache_dir, utils::user_file(".cache")?));

        let deepinwine_dir = utils::ensure_user_dir(&[".deepinwine"])?;
        mount_map.push((deepinwine_dir, utils::user_file(".deepinwine")?));

        mount_map.push((
            user_runtime_dir.join("dconf"),
            user_runtime_dir.join("dconf"),
        ));

        mount_map.push((
            utils::user_file(".config/user-dirs.dirs")?,
            utils::user_file(".config/user-dirs.dirs")?,
        ));

        for (source, destination) in mount_map {
            self.push_mount(Mount::bind(source, destination, &["rbind"]));
        }

        let mut ro_mount_map: Vec<(PathBuf, PathBuf)> = vec![
            (
                utils::user_file(".local/share/fonts")?,
                utils::user_file(".local/share/fonts")?,
            ),
            (
                utils::user_file(".config/fontconfig")?,
                utils::user_file(".config/fontconfig")?,
            ),
            (
                utils::user_file(".local/share/fonts")?,
                PathBuf::from("/run/host/appearance/user-fonts"),
            ),
            (
                utils::user_file(".cache/fontconfig")?,
                PathBuf::from("/run/host/appearance/user-fonts-cache"),
            ),
        ];

        let dde_api_dir = utils::ensure_user_dir(&[".cache", "deepin", "dde-api"])?;
        ro_mount_map.push((dde_api_dir.clone(), dde_api_dir));

        // dconf data is shared between apps, expose it read-only under the
        // per-app config dir
        let dconf_dir = utils::ensure_user_dir(&[".config", "dconf"])?;
        ro_mount_map.push((
            dconf_dir,
            utils::user_file(&format!(".linglong/{app_id}/config/dconf"))?,
        ));

        if let Some(xauthority) = std::env::var_os("XAUTHORITY") {
            let xauthority = PathBuf::from(xauthority);
            ro_mount_map.push((xauthority.clone(), xauthority));
        }

        for (source, destination) in ro_mount_map {
            self.push_mount(Mount::bind(source, destination, &["ro", "rbind"]));
        }

        self.stage_user_env()?;

        self.spec.linux.uid_mappings.push(IdMap {
            host_id: self.uid as u64,
            container_id: 0,
            size: 1,
        });
        self.spec.linux.gid_mappings.push(IdMap {
            host_id: self.gid as u64,
            container_id: 0,
            size: 1,
        });

        Ok(())
    }

    fn stage_user_env(&mut self) -> Result<()> {
        let app_id = self.app_id().to_string();
        let user_runtime_dir = self.user_runtime_dir();
        let home = utils::home_dir()?;

        for (key, value) in self.env_map.iter() {
            if utils::ENV_ALLOW_LIST.contains(key.as_str()) {
                self.spec.process.set_env(key, value);
            }
        }

        let app_bin_path = if self.is_flatpak() {
            "/app/bin".to_string()
        } else {
            format!("/opt/apps/{app_id}/files/bin")
        };

        // PATH always begins with the app and runtime bin dirs
        let caller_path = match self.env_map.get("PATH") {
            Some(path) => path.clone(),
            None => std::env::var("PATH").unwrap_or_default(),
        };
        self.spec.process.set_env(
            "PATH",
            &format!("{app_bin_path}:/runtime/bin:{caller_path}"),
        );

        if !self.env_map.contains_key("HOME") {
            self.spec
                .process
                .set_env("HOME", &home.display().to_string());
        }

        self.spec.process.set_env(
            "XDG_RUNTIME_DIR",
            &user_runtime_dir.display().to_string(),
        );
        self.spec.process.set_env(
            "DBUS_SESSION_BUS_ADDRESS",
            &format!("unix:path={}", user_runtime_dir.join("bus").display()),
        );

        let app_share_path = if self.is_flatpak() {
            "/app/share".to_string()
        } else {
            format!("/opt/apps/{app_id}/files/share")
        };
        let host_data_dirs = std::env::var("XDG_DATA_DIRS")
            .unwrap_or_else(|_| "/usr/local/share:/usr/share".to_string());
        self.spec.process.set_env(
            "XDG_DATA_DIRS",
            &format!("{app_share_path}:/runtime/share:{host_data_dirs}"),
        );

        for (key, dir) in [
            ("XDG_CONFIG_HOME", "config"),
            ("XDG_CACHE_HOME", "cache"),
            ("XDG_DATA_HOME", "share"),
        ] {
            self.spec.process.set_env(
                key,
                &utils::user_file(&format!(".linglong/{app_id}/{dir}"))?
                    .display()
                    .to_string(),
            );
        }

        self.spec.process.cwd = Some(home);
        Ok(())
    }
}
