use std::io::{Read, Write};
use std::time::Duration;

use crate::error::Result;
use crate::stream::TelemetryStream;
use crate::tcp::{TcpTransport, DEFAULT_CONNECT_TIMEOUT};

/// A connected byte stream the client can read and write.
///
/// The connection state machine only needs these operations, so anything
/// implementing them (a TCP stream, an in-memory fake) can stand in.
pub trait Duplex: Read + Write {
    /// Bound how long a single read may block.
    fn set_read_timeout(&self, timeout: Option<Duration>) -> Result<()>;

    /// Close the stream. Further reads return end of stream.
    fn shutdown(&self) -> Result<()>;
}

impl Duplex for TelemetryStream {
    fn set_read_timeout(&self, timeout: Option<Duration>) -> Result<()> {
        TelemetryStream::set_read_timeout(self, timeout)
    }

    fn shutdown(&self) -> Result<()> {
        TelemetryStream::shutdown(self)
    }
}

/// Opens duplex streams to an application address.
pub trait Dialer {
    type Stream: Duplex;

    /// Open a new stream to `addr` (blocking).
    fn dial(&mut self, addr: &str) -> Result<Self::Stream>;
}

/// Dials over TCP with a bounded connect timeout.
#[derive(Debug, Clone)]
pub struct TcpDialer {
    pub connect_timeout: Duration,
    pub write_timeout: Option<Duration>,
}

impl Default for TcpDialer {
    fn default() -> Self {
        Self {
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            write_timeout: Some(Duration::from_secs(5)),
        }
    }
}

impl Dialer for TcpDialer {
    type Stream = TelemetryStream;

    fn dial(&mut self, addr: &str) -> Result<TelemetryStream> {
        let stream = TcpTransport::connect(addr, self.connect_timeout)?;
        stream.set_write_timeout(self.write_timeout)?;
        Ok(stream)
    }
}
