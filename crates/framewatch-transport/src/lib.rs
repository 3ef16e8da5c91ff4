//! Duplex byte-stream transport for the telemetry client.
//!
//! This is the lowest layer of framewatch. The instrumented application
//! serves its telemetry over a plain TCP stream; everything else builds on
//! the [`TelemetryStream`] type and the [`Dialer`] seam provided here.

pub mod dial;
pub mod error;
pub mod stream;
pub mod tcp;

pub use dial::{Dialer, Duplex, TcpDialer};
pub use error::{Result, TransportError};
pub use stream::TelemetryStream;
pub use tcp::{normalize_address, TcpTransport, DEFAULT_CONNECT_TIMEOUT};
