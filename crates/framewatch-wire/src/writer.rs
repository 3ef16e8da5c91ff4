use std::io::{ErrorKind, Write};

use bytes::BytesMut;

use crate::codec::{encode_message, Message};
use crate::error::{Result, WireError};

const INITIAL_BUFFER_CAPACITY: usize = 1024;

/// Writes complete messages to any `Write` stream.
pub struct MessageWriter<T> {
    inner: T,
    buf: BytesMut,
}

impl<T: Write> MessageWriter<T> {
    pub fn new(inner: T) -> Self {
        Self::with_buffer(inner, BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY))
    }

    /// Create a writer that encodes into an existing buffer.
    ///
    /// Pair with [`MessageWriter::into_buffer`] to reuse one allocation
    /// across short-lived writers.
    pub fn with_buffer(inner: T, buf: BytesMut) -> Self {
        Self { inner, buf }
    }

    /// Encode and send one message (blocking).
    ///
    /// The message is fully encoded before anything is written, so an
    /// oversized message leaves the stream untouched.
    pub fn send(&mut self, message: &Message) -> Result<()> {
        self.buf.clear();
        encode_message(message, &mut self.buf)?;
        write_all_retrying(&mut self.inner, &self.buf)
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Mutably borrow the underlying stream.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Consume the writer and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }

    /// Consume the writer and return its encode buffer.
    pub fn into_buffer(self) -> BytesMut {
        self.buf
    }
}

/// Write already encoded bytes in full, then flush.
///
/// Retries writes and flushes interrupted by a signal. Any other error,
/// `WouldBlock` included, is returned as is.
pub fn write_all_retrying<W: Write + ?Sized>(dst: &mut W, bytes: &[u8]) -> Result<()> {
    let mut offset = 0usize;
    while offset < bytes.len() {
        match dst.write(&bytes[offset..]) {
            Ok(0) => return Err(WireError::ConnectionClosed),
            Ok(n) => offset += n,
            Err(err) if err.kind() == ErrorKind::Interrupted => continue,
            Err(err) => return Err(WireError::Io(err)),
        }
    }

    loop {
        match dst.flush() {
            Ok(()) => return Ok(()),
            Err(err) if err.kind() == ErrorKind::Interrupted => continue,
            Err(err) => return Err(WireError::Io(err)),
        }
    }
}
