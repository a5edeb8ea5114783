//! Late mount patches that must see every generic mount: per-app quirks,
//! the user's standard directories, and runtime-provided xdg tools.

use super::Composer;
use crate::error::Result;
use crate::spec::Mount;
use crate::utils;

/// Apps with data-directory layouts predating the per-app home
/// redirection.
const BROWSER_360_APP_ID: &str = "com.360.browser-stable";

impl Composer<'_> {
    pub fn fix_mount(&mut self) -> Result<()> {
        let app_id = self.app_id().to_string();

        if app_id == BROWSER_360_APP_ID {
            let appdata_dir =
                utils::ensure_user_dir(&[".linglong", &app_id, "share", "appdata"])?;
            self.push_mount(Mount::bind(
                appdata_dir,
                format!("/apps-data/private/{BROWSER_360_APP_ID}"),
                &["rw", "rbind"],
            ));
        }

        // the user's standard directories stay writable until the
        // permission descriptor covers them
        for dir in [
            "Desktop",
            "Documents",
            "Downloads",
            "Music",
            "Pictures",
            "Videos",
            ".Public",
            ".Templates",
        ] {
            let path = utils::user_file(dir)?;
            self.push_mount(Mount::bind(path.clone(), path, &["rw", "rbind"]));
        }

        // url and mailto handling goes through the runtime's xdg tools
        for tool in ["xdg-open", "xdg-email"] {
            self.push_mount(Mount::bind(
                self.runtime_root.join("bin").join(tool),
                format!("/usr/bin/{tool}"),
                &["rbind"],
            ));
        }

        let schemas = utils::entries_share_path().join("glib-2.0/schemas/gschemas.compiled");
        if schemas.is_file() {
            self.push_mount(Mount::bind(schemas.clone(), schemas, &["rbind"]));
        }

        Ok(())
    }
}
