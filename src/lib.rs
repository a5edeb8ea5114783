//! Sandbox launcher for Linglong applications: composes the container
//! runtime spec for a packaged desktop app, spawns the `ll-box` helper
//! and streams the spec to it over a socket pair.

pub mod app;
pub mod appconfig;
pub mod compose;
pub mod container;
pub mod desktop;
pub mod error;
pub mod launch;
pub mod package;
pub mod repo;
pub mod spec;
pub mod utils;

pub use app::{App, WaitMode, DBUS_PROXY_PATH};
pub use error::{Error, Result};
