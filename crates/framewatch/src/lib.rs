//! Live telemetry client for instrumented applications.
//!
//! framewatch connects to a running application over TCP, decodes its
//! stream of length-prefixed JSON messages, keeps a bounded rolling history
//! of frame times, memory, profiling results and log records, and lays that
//! history out as a per-thread timeline and time-series graphs.
//!
//! # Crate Structure
//!
//! - [`transport`]: TCP dialing and the duplex byte stream
//! - [`wire`]: Length-prefixed JSON + binary message codec
//! - [`store`]: Bounded telemetry collections and observers
//! - [`timeline`]: Timeline and graph layout
//! - [`client`]: Connection lifecycle, dispatch and session state

/// Re-export transport types.
pub mod transport {
    pub use framewatch_transport::*;
}

/// Re-export wire types.
pub mod wire {
    pub use framewatch_wire::*;
}

/// Re-export store types.
pub mod store {
    pub use framewatch_store::*;
}

/// Re-export layout types.
pub mod timeline {
    pub use framewatch_timeline::*;
}

/// Re-export client types.
pub mod client {
    pub use framewatch_client::*;
}

pub use framewatch_client::{Client, ClientConfig, ClientOptions};
