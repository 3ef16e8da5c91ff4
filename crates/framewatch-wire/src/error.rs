/// Errors that can occur during message encoding/decoding.
#[derive(Debug, thiserror::Error)]
pub enum WireError {
    /// A declared length (JSON length or `dataSize`) runs past the buffer end.
    #[error("malformed header: declared {declared} bytes, {remaining} remaining")]
    MalformedHeader { declared: usize, remaining: usize },

    /// The encoded JSON exceeds what the 2-byte length prefix can describe.
    #[error("message too large ({size} bytes, max {max})")]
    MessageTooLarge { size: usize, max: usize },

    /// The JSON section is not valid UTF-8 JSON.
    #[error("invalid message json: {0}")]
    InvalidJson(#[from] serde_json::Error),

    /// The JSON section is valid but not an object.
    #[error("message json is not an object")]
    NotAnObject,

    /// The JSON object has no string `type` field.
    #[error("message has no string \"type\" field")]
    MissingType,

    /// `dataSize` is a number but not a non-negative integer.
    #[error("invalid dataSize {0}")]
    InvalidDataSize(serde_json::Number),

    /// An I/O error occurred while reading or writing messages.
    #[error("wire I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The connection was closed by the peer.
    #[error("connection closed")]
    ConnectionClosed,
}

impl WireError {
    /// True for a read that hit its timeout without data.
    pub fn is_timeout(&self) -> bool {
        matches!(
            self,
            WireError::Io(err)
                if matches!(err.kind(), std::io::ErrorKind::WouldBlock | std::io::ErrorKind::TimedOut)
        )
    }
}

pub type Result<T> = std::result::Result<T, WireError>;
