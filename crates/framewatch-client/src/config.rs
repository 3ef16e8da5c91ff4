use std::time::Duration;

use framewatch_store::HistoryLimits;
use framewatch_transport::DEFAULT_CONNECT_TIMEOUT;
use framewatch_wire::DEFAULT_MAX_DATA_SIZE;

/// Runtime knobs for a client. Not persisted.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Delay between reconnection probes while disconnected.
    pub probe_interval: Duration,
    /// Bound on a single dial.
    pub connect_timeout: Duration,
    /// Longest a single `pump` blocks waiting for data.
    pub read_timeout: Duration,
    pub write_timeout: Option<Duration>,
    /// Largest accepted binary payload.
    pub max_data_size: usize,
    pub history: HistoryLimits,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            probe_interval: Duration::from_secs(1),
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            read_timeout: Duration::from_millis(50),
            write_timeout: Some(Duration::from_secs(5)),
            max_data_size: DEFAULT_MAX_DATA_SIZE,
            history: HistoryLimits::default(),
        }
    }
}
