use std::mem;
use std::time::{Duration, Instant};

use bytes::BytesMut;
use framewatch_transport::{Dialer, Duplex};
use framewatch_wire::{Burst, Message, MessageReader, MessageWriter, WireConfig, WireError};
use tracing::{debug, info, warn};

use crate::config::ClientConfig;
use crate::error::{ClientError, Result};

/// Lifecycle of the single application connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
}

/// Why the last connection (or attempt) ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisconnectReason {
    /// A probe or startup attempt found nothing listening. Not reported.
    PossibleProbe,
    /// Requested locally (`disconnect`, `quit`).
    Expected,
    /// Anything else.
    Unexpected,
}

/// Raised on every lifecycle transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionEvent {
    Connecting,
    Connected,
    Disconnected { reason: DisconnectReason },
}

/// Repeating, cancellable reconnect timer driven by explicit ticks.
///
/// A cancelled timer restarts its period on the next tick.
#[derive(Debug, Clone)]
pub struct ProbeTimer {
    interval: Duration,
    next_due: Option<Instant>,
    enabled: bool,
}

impl ProbeTimer {
    /// A disabled timer.
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            next_due: None,
            enabled: false,
        }
    }

    pub fn enable(&mut self) {
        self.enabled = true;
    }

    pub fn disable(&mut self) {
        self.enabled = false;
        self.next_due = None;
    }

    /// Drop the pending deadline.
    pub fn cancel(&mut self) {
        self.next_due = None;
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn next_due(&self) -> Option<Instant> {
        self.next_due
    }

    /// True when the deadline has passed; the next one is scheduled.
    pub fn poll(&mut self, now: Instant) -> bool {
        if !self.enabled {
            return false;
        }
        match self.next_due {
            Some(due) if now >= due => {
                self.next_due = Some(now + self.interval);
                true
            }
            Some(_) => false,
            None => {
                self.next_due = Some(now + self.interval);
                false
            }
        }
    }
}

/// Owns the duplex stream and classifies how it ends.
///
/// Transitions are queued as [`ConnectionEvent`]s and collected with
/// [`Connection::take_events`].
pub struct Connection<D: Dialer> {
    dialer: D,
    reader: Option<MessageReader<D::Stream>>,
    state: ConnectionState,
    pending_reason: DisconnectReason,
    address: Option<String>,
    probe: ProbeTimer,
    wire: WireConfig,
    read_timeout: Duration,
    out: BytesMut,
    events: Vec<ConnectionEvent>,
}

impl<D: Dialer> Connection<D> {
    pub fn new(dialer: D, config: &ClientConfig) -> Self {
        Self {
            dialer,
            reader: None,
            state: ConnectionState::Disconnected,
            pending_reason: DisconnectReason::Unexpected,
            address: None,
            probe: ProbeTimer::new(config.probe_interval),
            wire: WireConfig {
                max_data_size: config.max_data_size,
                read_timeout: Some(config.read_timeout),
                write_timeout: config.write_timeout,
            },
            read_timeout: config.read_timeout,
            out: BytesMut::new(),
            events: Vec::new(),
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn is_connected(&self) -> bool {
        self.state == ConnectionState::Connected
    }

    /// Address of the current or last attempt.
    pub fn address(&self) -> Option<&str> {
        self.address.as_deref()
    }

    /// How the next close will be classified.
    pub fn pending_reason(&self) -> DisconnectReason {
        self.pending_reason
    }

    pub fn probe_timer(&self) -> &ProbeTimer {
        &self.probe
    }

    pub fn dialer(&self) -> &D {
        &self.dialer
    }

    /// Connect on behalf of the user. Cancels a pending probe.
    pub fn connect(&mut self, addr: &str) -> Result<()> {
        if self.state != ConnectionState::Disconnected {
            return Err(ClientError::AlreadyConnected);
        }
        self.probe.cancel();
        self.open(addr, DisconnectReason::Unexpected)
    }

    /// Connect speculatively; a failure is classified as a probe.
    pub fn probe(&mut self, addr: &str) -> Result<()> {
        if self.state != ConnectionState::Disconnected {
            return Err(ClientError::AlreadyConnected);
        }
        self.open(addr, DisconnectReason::PossibleProbe)
    }

    fn open(&mut self, addr: &str, failure_reason: DisconnectReason) -> Result<()> {
        self.state = ConnectionState::Connecting;
        self.pending_reason = failure_reason;
        self.address = Some(addr.to_string());
        self.events.push(ConnectionEvent::Connecting);

        let read_timeout = self.read_timeout;
        let dialed = self
            .dialer
            .dial(addr)
            .and_then(|stream| stream.set_read_timeout(Some(read_timeout)).map(|()| stream));
        match dialed {
            Ok(stream) => {
                info!(addr, "connected");
                self.reader = Some(MessageReader::with_config(stream, self.wire.clone()));
                self.state = ConnectionState::Connected;
                self.pending_reason = DisconnectReason::Unexpected;
                self.events.push(ConnectionEvent::Connected);
                Ok(())
            }
            Err(err) => {
                debug!(addr, error = %err, reason = ?failure_reason, "connect failed");
                self.close();
                Err(err.into())
            }
        }
    }

    /// Close the connection as requested by the user.
    pub fn disconnect(&mut self) {
        if self.state == ConnectionState::Connected {
            self.pending_reason = DisconnectReason::Expected;
            self.close();
        }
    }

    /// Classify the next close as expected, e.g. after asking the
    /// application to quit.
    pub fn expect_disconnect(&mut self) {
        if self.state == ConnectionState::Connected {
            self.pending_reason = DisconnectReason::Expected;
        }
    }

    fn close(&mut self) {
        let reason = mem::replace(&mut self.pending_reason, DisconnectReason::Unexpected);
        if let Some(reader) = self.reader.take() {
            if let Err(err) = reader.get_ref().shutdown() {
                debug!(error = %err, "stream shutdown failed");
            }
        }
        self.state = ConnectionState::Disconnected;
        self.events.push(ConnectionEvent::Disconnected { reason });
    }

    /// Turn automatic reconnection on or off.
    pub fn set_probing(&mut self, enabled: bool) {
        if enabled {
            self.probe.enable();
        } else {
            self.probe.disable();
        }
    }

    /// Advance the probe timer. True when a probe attempt is due now.
    pub fn tick(&mut self, now: Instant) -> bool {
        self.probe.poll(now) && self.state == ConnectionState::Disconnected
    }

    /// Wait up to the read timeout for data and decode what arrived.
    ///
    /// End of stream or a read failure closes the connection; a timeout
    /// just yields an empty burst.
    pub fn poll(&mut self) -> Burst {
        let Some(reader) = self.reader.as_mut() else {
            return Vec::new();
        };
        match reader.read_burst() {
            Ok(burst) => burst,
            Err(err) if err.is_timeout() => Vec::new(),
            Err(WireError::ConnectionClosed) => {
                debug!("application closed the connection");
                self.close();
                Vec::new()
            }
            Err(err) => {
                warn!(error = %err, "read failed, closing connection");
                self.close();
                Vec::new()
            }
        }
    }

    /// Encode and write one message.
    ///
    /// The message is fully encoded first, so an oversized one is rejected
    /// with nothing written. A failed write closes the connection.
    pub fn send(&mut self, message: &Message) -> Result<()> {
        let Some(reader) = self.reader.as_mut() else {
            return Err(ClientError::NotConnected);
        };
        let mut writer = MessageWriter::with_buffer(reader.get_mut(), mem::take(&mut self.out));
        let result = writer.send(message);
        self.out = writer.into_buffer();
        match result {
            Ok(()) => Ok(()),
            Err(err @ (WireError::MessageTooLarge { .. } | WireError::InvalidJson(_))) => Err(err.into()),
            Err(err) => {
                warn!(msg_type = %message.msg_type, error = %err, "write failed, closing connection");
                self.close();
                Err(err.into())
            }
        }
    }

    /// Transitions since the last call, oldest first.
    pub fn take_events(&mut self) -> Vec<ConnectionEvent> {
        mem::take(&mut self.events)
    }

    /// Close without raising a disconnect event and stop probing.
    pub fn shutdown(&mut self) {
        self.probe.disable();
        if let Some(reader) = self.reader.take() {
            let _ = reader.get_ref().shutdown();
        }
        self.state = ConnectionState::Disconnected;
        self.pending_reason = DisconnectReason::Unexpected;
        self.events.clear();
    }
}

impl<D: Dialer> Drop for Connection<D> {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl<D: Dialer> std::fmt::Debug for Connection<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("state", &self.state)
            .field("address", &self.address)
            .field("pending_reason", &self.pending_reason)
            .field("probe", &self.probe)
            .finish()
    }
}
