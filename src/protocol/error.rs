use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("Unsupported protocol version: {0}")]
    UnsupportedVersion(u8),

    #[error("Unknown command: {0}")]
    UnknownCommand(u16),

    #[error("Unknown ack status: {0}")]
    UnknownStatus(u8),

    #[error("Not enough bytes: {0}")]
    NotEnoughBytes(String),

    #[error("Invalid string: {0}")]
    InvalidString(String),

    #[error("Frame of {len} bytes exceeds the {max} byte limit")]
    FrameTooLarge { len: usize, max: usize },

    #[error("Frame io failed: {0}")]
    Io(#[from] std::io::Error),
}
