use std::io::{ErrorKind, Read};

use bytes::{Buf, BytesMut};
use tracing::trace;

use crate::codec::{decode_message, Message, WireConfig};
use crate::error::{Result, WireError};

const INITIAL_BUFFER_CAPACITY: usize = 8 * 1024;
const READ_CHUNK_SIZE: usize = 8 * 1024;

/// Every message completed by one read, in arrival order.
///
/// A rejected message shows up as an `Err` entry; the messages around it
/// are unaffected.
pub type Burst = Vec<Result<Message>>;

/// Reads complete messages from any `Read` stream.
///
/// Handles partial reads internally: a message split across reads is
/// buffered until its last byte arrives.
pub struct MessageReader<T> {
    inner: T,
    buf: BytesMut,
    config: WireConfig,
    /// Bytes of a rejected binary payload still to be dropped.
    discard: usize,
}

impl<T: Read> MessageReader<T> {
    /// Create a new message reader with default configuration.
    pub fn new(inner: T) -> Self {
        Self::with_config(inner, WireConfig::default())
    }

    /// Create a new message reader with explicit configuration.
    pub fn with_config(inner: T, config: WireConfig) -> Self {
        Self {
            inner,
            buf: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
            config,
            discard: 0,
        }
    }

    /// Read the next complete message (blocking).
    ///
    /// Returns `Err(WireError::ConnectionClosed)` when EOF is reached. A
    /// rejected message is returned as its decode error; the next call
    /// continues after it.
    pub fn read_message(&mut self) -> Result<Message> {
        loop {
            if let Some(message) = self.decode_next()? {
                return Ok(message);
            }
            self.fill()?;
        }
    }

    /// Perform one read and decode every message it completes.
    ///
    /// The burst may be empty when the read only delivered part of a
    /// message. I/O errors (including read timeouts) and end of stream are
    /// returned as the outer error. An oversized binary payload is reported
    /// once and its bytes are dropped as they arrive.
    pub fn read_burst(&mut self) -> Result<Burst> {
        self.fill()?;

        let mut burst = Vec::new();
        loop {
            match self.decode_next() {
                Ok(Some(message)) => burst.push(Ok(message)),
                Ok(None) => break,
                Err(err) => burst.push(Err(err)),
            }
        }
        trace!(
            messages = burst.len(),
            buffered = self.buf.len(),
            "decoded burst"
        );
        Ok(burst)
    }

    fn decode_next(&mut self) -> Result<Option<Message>> {
        match decode_message(&mut self.buf, self.config.max_data_size) {
            Err(WireError::MessageTooLarge { size, max }) => {
                let skip = size.min(self.buf.len());
                self.buf.advance(skip);
                self.discard = size - skip;
                Err(WireError::MessageTooLarge { size, max })
            }
            other => other,
        }
    }

    fn fill(&mut self) -> Result<()> {
        let mut chunk = [0u8; READ_CHUNK_SIZE];
        loop {
            let read = match self.inner.read(&mut chunk) {
                Ok(n) => n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(WireError::Io(err)),
            };

            if read == 0 {
                return Err(WireError::ConnectionClosed);
            }

            let skip = self.discard.min(read);
            self.discard -= skip;
            self.buf.extend_from_slice(&chunk[skip..read]);
            return Ok(());
        }
    }

    /// Bytes received but not yet decoded.
    pub fn buffered(&self) -> usize {
        self.buf.len()
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Mutably borrow the underlying stream.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Consume the reader and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }

    /// Current reader configuration.
    pub fn config(&self) -> &WireConfig {
        &self.config
    }
}
