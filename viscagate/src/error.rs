use std::io::Error as IoError;
use thiserror::Error;
use viscagate_protocol::ReplyError;

/// Error types
#[derive(Debug, Error)]
pub enum Error {
    #[cfg(test)]
    #[error(transparent)]
    FromHexError(#[from] hex::FromHexError),

    #[error(transparent)]
    IoError(#[from] IoError),

    #[error(transparent)]
    Serial(#[from] serialport::Error),

    #[error(transparent)]
    Protocol(#[from] crate::protocol::Error),

    #[error("camera reported: {0}")]
    Camera(#[from] ReplyError),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("channel unavailable, likely dropped")]
    ChannelUnavailable,

    #[error("timeout waiting for the camera")]
    Timeout,

    #[error("command cancelled")]
    Cancelled,

    #[error("transport closed")]
    Transport,

    #[error("gateway is not started")]
    NotStarted,

    #[error("no camera at address {0}")]
    UnknownCamera(u8),

    #[error("reply was not of the expected shape")]
    UnexpectedReply,
}
