use hickory_proto::{error::ProtoError, op::ResponseCode};
use std::io::Error as IoError;
use thiserror::Error as ThisError;

pub(crate) type Result<T> = std::result::Result<T, Error>;

/// The possible errors raised while transferring a zone
#[derive(Debug, ThisError)]
pub enum Error {
    #[error("invalid zone name {0:?}")]
    InvalidZone(String, #[source] ProtoError),
    #[error("failed to connect to {server}")]
    Connect {
        server: String,
        #[source]
        source: IoError,
    },
    #[error("failed to communicate with the server")]
    Io(#[from] IoError),
    #[error("timed out waiting for the server")]
    Timeout,
    #[error("transfer refused by the server ({0})")]
    Refused(ResponseCode),
    #[error("malformed response: {0}")]
    Malformed(String),
    #[error("failed to encode or decode a message")]
    Protocol(#[from] ProtoError),
}
