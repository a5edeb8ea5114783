//! Device nodes every sandboxed desktop app needs.

use super::Composer;
use crate::error::Result;
use crate::spec::Mount;

impl Composer<'_> {
    pub fn stage_system(&mut self) -> Result<()> {
        for path in ["/dev/dri", "/dev/snd"] {
            self.push_mount(Mount::bind(path, path, &["rbind"]));
        }
        Ok(())
    }
}
