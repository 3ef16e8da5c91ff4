//! Live telemetry client.
//!
//! Owns the single connection to an instrumented application, routes every
//! decoded message to its handler and keeps the rolling session state the
//! timeline and graphs are drawn from.
//!
//! ```no_run
//! use std::time::Instant;
//!
//! use framewatch_client::{Client, ClientConfig, ClientOptions};
//!
//! let mut client = Client::tcp(ClientConfig::default(), ClientOptions::default())?;
//! client.start();
//! loop {
//!     client.tick(Instant::now());
//!     client.pump();
//!     if client.session().invalidation.take() {
//!         // redraw
//!     }
//! }
//! # Ok::<(), framewatch_client::ClientError>(())
//! ```

pub mod client;
pub mod config;
pub mod connection;
pub mod diagnostics;
pub mod dispatch;
pub mod error;
pub mod handlers;
pub mod options;
pub mod session;

#[cfg(test)]
mod testing;

pub use client::Client;
pub use config::ClientConfig;
pub use connection::{Connection, ConnectionEvent, ConnectionState, DisconnectReason, ProbeTimer};
pub use diagnostics::Diagnostics;
pub use dispatch::{Dispatcher, Handler, Route};
pub use error::{ClientError, Result};
pub use options::{ClientOptions, MAX_OPTIONS_FILE_SIZE};
pub use session::Session;
