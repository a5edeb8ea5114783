//! Filesystem and environment helpers shared by the composer stages.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;

use crate::error::{Error, Result};

pub const DEFAULT_LINGLONG_ROOT: &str = "/persistent/linglong";

/// Host environment variables that user-supplied env lists may carry into
/// the sandbox. Everything else is dropped during env composition.
pub static ENV_ALLOW_LIST: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "DISPLAY",
        "WAYLAND_DISPLAY",
        "LANG",
        "LANGUAGE",
        "LC_ALL",
        "TERM",
        "USER",
        "HOME",
        "PATH",
        "XAUTHORITY",
        "XMODIFIERS",
        "XIM",
        "XDG_SESSION_DESKTOP",
        "XDG_CURRENT_DESKTOP",
        "XDG_SESSION_TYPE",
        "DESKTOP_SESSION",
        "GTK_IM_MODULE",
        "QT_IM_MODULE",
        "QT4_IM_MODULE",
        "CLUTTER_IM_MODULE",
        "QT_AUTO_SCREEN_SCALE_FACTOR",
        "QT_SCALE_FACTOR",
        "QT_SCREEN_SCALE_FACTORS",
        "QT_ENABLE_HIGHDPI_SCALING",
        "D_DISABLE_RT_SCREEN_SCALE",
        "http_proxy",
        "https_proxy",
        "ftp_proxy",
        "no_proxy",
        "auto_proxy",
        "SOCKS_SERVER",
    ]
    .into()
});

/// Root of the linglong installation, `$LINGLONG_ROOT` or the packaged
/// default.
pub fn linglong_root() -> PathBuf {
    std::env::var_os("LINGLONG_ROOT")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_LINGLONG_ROOT))
}

/// System-wide exported entries, `<linglong-root>/entries/share`.
pub fn entries_share_path() -> PathBuf {
    linglong_root().join("entries/share")
}

pub fn home_dir() -> Result<PathBuf> {
    dirs::home_dir().ok_or(Error::HomeNotFound)
}

/// Path of `rel` under the user home. An empty `rel` yields the home
/// directory itself.
pub fn user_file(rel: &str) -> Result<PathBuf> {
    let home = home_dir()?;
    if rel.is_empty() {
        return Ok(home);
    }
    Ok(home.join(rel))
}

pub fn ensure_dir(path: &Path) -> Result<()> {
    fs::create_dir_all(path).map_err(Error::io("failed to create directory", path))
}

/// Create (if needed) and return a directory underneath the user home.
pub fn ensure_user_dir(parts: &[&str]) -> Result<PathBuf> {
    let mut path = home_dir()?;
    for part in parts {
        path.push(part);
    }
    ensure_dir(&path)?;
    Ok(path)
}

/// XDG user directory names honored by filesystem permissions.
pub fn xdg_user_dir_names() -> &'static [&'static str] {
    &[
        "Desktop",
        "Documents",
        "Downloads",
        "Music",
        "Pictures",
        "Videos",
        "Public",
        "Templates",
    ]
}

/// Resolve an XDG user directory name to its host path.
pub fn xdg_user_dir(name: &str) -> Option<PathBuf> {
    match name {
        "Desktop" => dirs::desktop_dir(),
        "Documents" => dirs::document_dir(),
        "Downloads" => dirs::download_dir(),
        "Music" => dirs::audio_dir(),
        "Pictures" => dirs::picture_dir(),
        "Videos" => dirs::video_dir(),
        "Public" => dirs::public_dir(),
        "Templates" => dirs::template_dir(),
        _ => None,
    }
}

/// Reserve a unique socket path for the session bus proxy. The node is
/// created so a concurrent launcher cannot pick the same name; the caller
/// unlinks it before handing the path to the proxy.
pub fn create_proxy_socket(prefix: &str) -> Result<PathBuf> {
    let dir = std::env::var_os("XDG_RUNTIME_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("/tmp"));
    let dir = dir.join("linglong");
    ensure_dir(&dir)?;

    loop {
        let suffix: String = std::iter::repeat_with(fastrand::alphanumeric)
            .take(6)
            .collect();
        let candidate = dir.join(format!("{prefix}{suffix}"));
        match fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&candidate)
        {
            Ok(_) => return Ok(candidate),
            Err(err) if err.kind() == std::io::ErrorKind::AlreadyExists => continue,
            Err(err) => return Err(Error::io("failed to reserve proxy socket", candidate)(err)),
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
    fn test_linglong_root_env_override() {
        std::env::remove_var("LINGLONG_ROOT");
        assert_eq!(linglong_root(), PathBuf::from(DEFAULT_LINGLONG_ROOT));

        std::env::set_var("LINGLONG_ROOT", "/tmp/linglong-test");
        assert_eq!(linglong_root(), PathBuf::from("/tmp/linglong-test"));
        assert_eq!(
            entries_share_path(),
            PathBuf::from("/tmp/linglong-test/entries/share")
        );
        std::env::remove_var("LINGLONG_ROOT");
    }

    #[test]
    #[serial]
    fn test_ensure_user_dir() -> Result<()> {
        let tmp = tempfile::tempdir()?;
        std::env::set_var("HOME", tmp.path());

        let created = ensure_user_dir(&[".linglong", "org.example.App", "cache"])?;
        assert!(created.is_dir());
        assert_eq!(
            created,
            tmp.path().join(".linglong/org.example.App/cache")
        );
        Ok(())
    }

    #[test]
    fn test_xdg_user_dir_unknown_name() {
        assert!(xdg_user_dir("NotADir").is_none());
    }

    #[test]
    #[serial]
    fn test_create_proxy_socket_is_unique() -> Result<()> {
        let tmp = tempfile::tempdir()?;
        std::env::set_var("XDG_RUNTIME_DIR", tmp.path());

        let first = create_proxy_socket("session-bus-proxy-")?;
        let second = create_proxy_socket("session-bus-proxy-")?;
        assert_ne!(first, second);
        assert!(first.exists());
        std::env::remove_var("XDG_RUNTIME_DIR");
        Ok(())
    }
}
