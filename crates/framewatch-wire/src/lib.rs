//! Length-prefixed JSON + binary message framing for live telemetry.
//!
//! Every message on the wire is:
//! - A 2-byte little-endian length `N`
//! - `N` bytes of UTF-8 JSON carrying a string `type` field
//! - When the JSON has a numeric `dataSize`, that many raw bytes of payload
//!
//! Several messages may be packed back to back in one physical read. The
//! codec knows nothing about message semantics.

pub mod codec;
pub mod error;
pub mod kinds;
pub mod reader;
pub mod writer;

#[cfg(feature = "async")]
pub mod async_codec;

pub use codec::{
    decode_buffer, decode_message, encode_message, Message, MessageIter, WireConfig,
    DATA_SIZE_FIELD, DEFAULT_MAX_DATA_SIZE, LENGTH_PREFIX_SIZE, MAX_JSON_LEN, TYPE_FIELD,
};
pub use error::{Result, WireError};
pub use reader::{Burst, MessageReader};
pub use writer::{write_all_retrying, MessageWriter};

#[cfg(feature = "async")]
pub use async_codec::MessageCodec;
