use thiserror::Error;

/// Error types.
#[derive(Debug, Error)]
pub enum Error {
    #[cfg(test)]
    #[error(transparent)]
    FromHexError(#[from] hex::FromHexError),

    #[error("frame is truncated or missing its terminator")]
    Truncated,

    #[error("terminator byte inside the frame body")]
    EmbeddedTerminator,

    #[error("header marker bit is not set: {0:#04x}")]
    BadHeader(u8),

    #[error("unknown message type byte: {0:#04x}")]
    UnknownMessageType(u8),

    #[error("unexpected payload length {got} (wanted {wanted})")]
    PayloadLength { wanted: usize, got: usize },

    #[error("unexpected value in reply: {0:#04x}")]
    UnexpectedValue(u8),

    #[error("unknown error code: {0:#04x}")]
    UnknownErrorCode(u8),

    #[error("frame is not a reply")]
    NotAReply,
}
