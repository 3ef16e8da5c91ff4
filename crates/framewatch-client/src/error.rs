use std::path::PathBuf;

/// Errors that can occur in client operations.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Transport-level error.
    #[error("transport error: {0}")]
    Transport(#[from] framewatch_transport::TransportError),

    /// Message encoding or decoding error.
    #[error("wire error: {0}")]
    Wire(#[from] framewatch_wire::WireError),

    /// Collection subscription error.
    #[error("store error: {0}")]
    Store(#[from] framewatch_store::StoreError),

    /// `connect` while a connection is being opened or is open.
    #[error("already connected or connecting")]
    AlreadyConnected,

    /// An operation that needs an open connection.
    #[error("not connected")]
    NotConnected,

    /// A message type registered twice.
    #[error("the message '{0}' already has a handler")]
    DuplicateHandler(String),

    /// A known message is missing a field or has it with the wrong type.
    #[error("message '{msg_type}' has a missing or invalid '{field}' field")]
    InvalidField {
        msg_type: String,
        field: &'static str,
    },

    /// JSON serialization/deserialization error.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// Options file could not be read or written.
    #[error("options file {}: {reason}", path.display())]
    Options { path: PathBuf, reason: String },
}

pub type Result<T> = std::result::Result<T, ClientError>;
