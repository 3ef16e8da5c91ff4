//! In-memory stand-ins for the TCP transport.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::io::{self, ErrorKind, Read, Write};
use std::rc::Rc;
use std::time::Duration;

use bytes::BytesMut;
use framewatch_transport::{Dialer, Duplex, TransportError};
use framewatch_wire::{encode_message, Message};

/// Both ends of an in-memory connection; clones share state.
#[derive(Debug, Clone, Default)]
pub struct Pipe {
    inbound: Rc<RefCell<VecDeque<u8>>>,
    outbound: Rc<RefCell<Vec<u8>>>,
    closed: Rc<Cell<bool>>,
    shutdowns: Rc<Cell<usize>>,
}

impl Pipe {
    /// Queue raw bytes for the client to read.
    pub fn feed(&self, bytes: &[u8]) {
        self.inbound.borrow_mut().extend(bytes.iter().copied());
    }

    /// Queue an encoded message for the client to read.
    pub fn feed_message(&self, message: &Message) {
        let mut buf = BytesMut::new();
        encode_message(message, &mut buf).unwrap();
        self.feed(&buf);
    }

    /// Simulate the application closing its end.
    pub fn close(&self) {
        self.closed.set(true);
    }

    pub fn written(&self) -> Vec<u8> {
        self.outbound.borrow().clone()
    }

    pub fn shutdowns(&self) -> usize {
        self.shutdowns.get()
    }
}

impl Read for Pipe {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let mut inbound = self.inbound.borrow_mut();
        if inbound.is_empty() {
            if self.closed.get() {
                return Ok(0);
            }
            return Err(io::Error::from(ErrorKind::WouldBlock));
        }
        let n = buf.len().min(inbound.len());
        for (slot, byte) in buf.iter_mut().zip(inbound.drain(..n)) {
            *slot = byte;
        }
        Ok(n)
    }
}

impl Write for Pipe {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.closed.get() {
            return Err(io::Error::from(ErrorKind::BrokenPipe));
        }
        self.outbound.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Duplex for Pipe {
    fn set_read_timeout(&self, _timeout: Option<Duration>) -> framewatch_transport::Result<()> {
        Ok(())
    }

    fn shutdown(&self) -> framewatch_transport::Result<()> {
        self.closed.set(true);
        self.shutdowns.set(self.shutdowns.get() + 1);
        Ok(())
    }
}

/// Hands out queued pipes; refuses once the queue is empty.
///
/// Clones share the queue, so a test keeps one while the connection owns
/// the other.
#[derive(Debug, Clone, Default)]
pub struct FakeDialer {
    pipes: Rc<RefCell<VecDeque<Pipe>>>,
    dials: Rc<RefCell<Vec<String>>>,
}

impl FakeDialer {
    /// Dialer refusing every attempt.
    pub fn refusing() -> Self {
        Self::default()
    }

    /// Queue a pipe for the next successful dial and return the test's end.
    pub fn accept_next(&self) -> Pipe {
        let pipe = Pipe::default();
        self.pipes.borrow_mut().push_back(pipe.clone());
        pipe
    }

    /// Addresses dialed so far.
    pub fn dials(&self) -> Vec<String> {
        self.dials.borrow().clone()
    }
}

impl Dialer for FakeDialer {
    type Stream = Pipe;

    fn dial(&mut self, addr: &str) -> framewatch_transport::Result<Pipe> {
        self.dials.borrow_mut().push(addr.to_string());
        self.pipes.borrow_mut().pop_front().ok_or_else(|| TransportError::Connect {
            addr: addr.to_string(),
            source: io::Error::from(ErrorKind::ConnectionRefused),
        })
    }
}
