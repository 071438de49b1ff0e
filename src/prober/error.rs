use std::io::Error as IoError;
use thiserror::Error as ThisError;
use tokio::task::JoinError;

pub(crate) type Result<T> = std::result::Result<T, Error>;

/// The possible errors raised while probing hosts
#[derive(Debug, ThisError)]
pub enum Error {
    #[error("failed to run {command:?}")]
    Launch {
        command: String,
        #[source]
        source: IoError,
    },
    #[error("{command:?} was terminated by a signal")]
    Terminated { command: String },
    #[error("probe worker exited unexpectedly")]
    Worker(#[from] JoinError),
}
