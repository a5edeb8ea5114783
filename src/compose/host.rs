//! Host resources shared read-only into the sandbox: network config,
//! fonts, themes, timezone data and the X11 socket.

use super::Composer;
use crate::error::Result;
use crate::spec::Mount;

impl Composer<'_> {
    pub fn stage_host(&mut self) -> Result<()> {
        let ro_mount_map: Vec<(&str, &str)> = vec![
            ("/etc/resolv.conf", "/run/host/network/etc/resolv.conf"),
            ("/run/resolvconf", "/run/resolvconf"),
            ("/usr/share/fonts", "/run/host/appearance/fonts"),
            ("/usr/lib/locale/", "/usr/lib/locale/"),
            ("/usr/share/themes", "/usr/share/themes"),
            ("/usr/share/icons", "/usr/share/icons"),
            ("/usr/share/zoneinfo", "/usr/share/zoneinfo"),
            ("/etc/localtime", "/run/host/etc/localtime"),
            ("/etc/machine-id", "/run/host/etc/machine-id"),
            ("/etc/machine-id", "/etc/machine-id"),
            ("/var", "/var"),
            ("/var/cache/fontconfig", "/run/host/appearance/fonts-cache"),
        ];

        for (source, destination) in ro_mount_map {
            self.push_mount(Mount::bind(source, destination, &["ro", "rbind"]));
        }

        // nvidia devices have no stable names, take whatever is present
        if let Ok(entries) = glob::glob("/dev/nvidia*") {
            for entry in entries.flatten() {
                self.push_mount(Mount::bind(entry.clone(), entry, &["ro", "rbind"]));
            }
        }

        self.push_mount(Mount::bind("/tmp/.X11-unix", "/tmp/.X11-unix", &["rbind"]));
        Ok(())
    }
}
