//! Variable expansion for mount entries declared in the package
//! descriptor.

use std::path::Path;

use crate::utils;

/// Expand `$APP_ROOT_PATH`, `$RUNTIME_ROOT_PATH`, `$APP_ROOT_SHARE_PATH`
/// and `$LINGLONG_ROOT` in a descriptor-declared mount path.
pub fn resolve_vars(input: &str, app_root: &Path, runtime_root: &Path) -> String {
    // longest names first so APP_ROOT_PATH never clips APP_ROOT_SHARE_PATH
    let variables = [
        (
            "$APP_ROOT_SHARE_PATH",
            utils::entries_share_path().display().to_string(),
        ),
        ("$RUNTIME_ROOT_PATH", runtime_root.display().to_string()),
        ("$APP_ROOT_PATH", app_root.display().to_string()),
        ("$LINGLONG_ROOT", utils::linglong_root().display().to_string()),
    ];

    let mut resolved = input.to_string();
    for (name, value) in variables {
        resolved = resolved.replace(name, &value);
    }
    resolved
}
