use std::path::PathBuf;

use crate::launch::channel::ChannelError;

/// Central error type of the launcher. Modules with a self-contained
/// failure surface define their own error enum and convert into this one.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("package descriptor not found at {0:?}")]
    DescriptorMissing(PathBuf),
    #[error("no layer found for {0}")]
    LayerNotFound(String),
    #[error("no desktop entry for {0}")]
    NoDesktopEntry(String),
    #[error("unsupported architecture: {0}")]
    UnsupportedArch(String),
    #[error("failed to parse app config")]
    TemplateParse(#[source] serde_yaml::Error),
    #[error("failed to parse embedded spec template")]
    SpecTemplate(#[source] serde_json::Error),
    #[error("failed to write app config to {path:?}")]
    ConfigWrite {
        source: std::io::Error,
        path: PathBuf,
    },
    #[error("failed to set up helper socket pair")]
    SocketSetup(#[source] nix::Error),
    #[error("failed to fork helper process")]
    Fork(#[source] nix::Error),
    #[error("helper binary {0:?} does not exist")]
    HelperExec(PathBuf),
    #[error(transparent)]
    Write(#[from] ChannelError),
    #[error("failed to parse {path:?}")]
    Descriptor {
        source: serde_json::Error,
        path: PathBuf,
    },
    #[error(transparent)]
    Ref(#[from] crate::package::RefError),
    #[error(transparent)]
    Desktop(#[from] crate::desktop::DesktopError),
    #[error("cannot determine the user home directory")]
    HomeNotFound,
    #[error("{context}: {path:?}")]
    Io {
        context: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("helper has not been started")]
    NotStarted,
    #[error("operation requires interactive wait mode")]
    NotInteractive,
    #[error("failed to wait for helper")]
    Wait(#[source] nix::Error),
}

impl Error {
    pub(crate) fn io(context: &'static str, path: impl Into<PathBuf>) -> impl FnOnce(std::io::Error) -> Error {
        let path = path.into();
        move |source| Error::Io {
            context,
            path,
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
