//! Package reference and descriptor model.

mod info;
mod reference;

pub use info::{Filesystem, MountRule, OverlayfsInfo, PackageInfo, Permissions};
pub use reference::{Arch, Ref, RefError};
