//! Helper transport: the socket pair to the container helper and the
//! framed protocol spoken over it.

pub mod channel;
pub mod helper;

pub use channel::SpecChannel;
pub use helper::{spawn, terminate, wait, Helper, DEFAULT_HELPER_PATH};
