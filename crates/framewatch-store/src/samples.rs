//! Typed telemetry records.
//!
//! Field names follow the wire: `t`/`dt` are seconds, sizes are bytes.

use serde::{Deserialize, Serialize};

/// Worker threads assumed until the application reports its own count.
pub const DEFAULT_THREAD_COUNT: usize = 2;

/// Highest worker thread count accepted from an application.
pub const MAX_THREAD_COUNT: usize = 256;

/// One `(time, value)` sample of a time series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeriesPoint {
    pub time: f64,
    pub value: f64,
}

impl SeriesPoint {
    pub fn new(time: f64, value: f64) -> Self {
        Self { time, value }
    }
}

/// Aggregated statistics for one named profiling scope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfilingResult {
    pub name: String,
    #[serde(default)]
    pub samples: u64,
    #[serde(default)]
    pub mean: f64,
    #[serde(default)]
    pub median: f64,
    #[serde(default)]
    pub stddev: f64,
    #[serde(default)]
    pub total: f64,
}

/// A timed region on one worker thread during one telemetry frame.
///
/// Never mutated after it is stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThreadSpan {
    /// Producer frame id the span belongs to.
    pub frame: u64,
    /// Worker thread index.
    pub thread: usize,
    /// Nesting depth, 0 for a top-level region.
    #[serde(default)]
    pub depth: u32,
    /// Start time in seconds.
    #[serde(rename = "t")]
    pub start: f64,
    /// Duration in seconds.
    #[serde(rename = "dt")]
    pub duration: f64,
    pub name: String,
}

impl ThreadSpan {
    pub fn end(&self) -> f64 {
        self.start + self.duration
    }
}

/// Where a diagnostics record came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogSource {
    /// Produced by this client.
    Local,
    /// Forwarded from the application via `logging.msg`.
    Remote,
}

/// Severity, ordered from least to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    Information,
    Warning,
    Error,
    Critical,
    Fatal,
}

impl LogLevel {
    /// Map a wire level number (0 = Trace .. 6 = Fatal).
    pub fn from_wire(level: i64) -> Option<Self> {
        match level {
            0 => Some(Self::Trace),
            1 => Some(Self::Debug),
            2 => Some(Self::Information),
            3 => Some(Self::Warning),
            4 => Some(Self::Error),
            5 => Some(Self::Critical),
            6 => Some(Self::Fatal),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Information => "information",
            Self::Warning => "warning",
            Self::Error => "error",
            Self::Critical => "critical",
            Self::Fatal => "fatal",
        }
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One diagnostics line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogRecord {
    pub source: LogSource,
    pub level: LogLevel,
    pub text: String,
}

impl LogRecord {
    pub fn local(level: LogLevel, text: impl Into<String>) -> Self {
        Self {
            source: LogSource::Local,
            level,
            text: text.into(),
        }
    }

    pub fn remote(level: LogLevel, text: impl Into<String>) -> Self {
        Self {
            source: LogSource::Remote,
            level,
            text: text.into(),
        }
    }
}

/// What the application has told us about itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationInfo {
    pub name: Option<String>,
    pub thread_count: usize,
}

impl Default for ApplicationInfo {
    fn default() -> Self {
        Self {
            name: None,
            thread_count: DEFAULT_THREAD_COUNT,
        }
    }
}
