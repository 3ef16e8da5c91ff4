use framewatch_store::{ApplicationInfo, TelemetryStore};
use framewatch_timeline::Invalidation;

use crate::config::ClientConfig;
use crate::diagnostics::Diagnostics;
use crate::error::Result;
use crate::options::ClientOptions;

/// Everything message handlers read and write.
///
/// Built once per client and handed to every handler explicitly.
#[derive(Debug)]
pub struct Session {
    pub store: TelemetryStore,
    pub diagnostics: Diagnostics,
    pub application: ApplicationInfo,
    pub options: ClientOptions,
    /// Set by any store mutation or application information change.
    pub invalidation: Invalidation,
    active: bool,
    options_dirty: bool,
}

impl Session {
    pub fn new(config: &ClientConfig, options: ClientOptions) -> Result<Self> {
        let mut store = TelemetryStore::new(config.history);
        let invalidation = Invalidation::new();
        invalidation.watch_store(&mut store)?;
        Ok(Self {
            store,
            diagnostics: Diagnostics::new(config.history.log_limit),
            application: ApplicationInfo::default(),
            options,
            invalidation,
            active: true,
            options_dirty: false,
        })
    }

    /// Drop all telemetry from a previous connection.
    pub fn reset_telemetry(&mut self) {
        self.store.clear_all();
    }

    /// Whether the application was last told to be active.
    pub fn is_active(&self) -> bool {
        self.active
    }

    pub(crate) fn toggle_active(&mut self) -> bool {
        self.active = !self.active;
        self.active
    }

    /// Remember `addr` as the server to connect to next time.
    pub fn remember_server(&mut self, addr: &str) {
        if self.options.server != addr {
            self.options.server = addr.to_string();
            self.options_dirty = true;
        }
    }

    /// True once after options changed, so the caller can persist them.
    pub fn take_options_dirty(&mut self) -> bool {
        std::mem::take(&mut self.options_dirty)
    }
}
