use std::{io::Error as IoError, path::PathBuf};
use thiserror::Error as ThisError;

pub(crate) type Result<T> = std::result::Result<T, Error>;

/// The possible errors raised while writing the update scripts
#[derive(Debug, ThisError)]
pub enum Error {
    #[error("failed to create {}", .path.display())]
    Create {
        path: PathBuf,
        #[source]
        source: IoError,
    },
    #[error("failed to write to {}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: IoError,
    },
}
