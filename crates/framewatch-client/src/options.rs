use std::fs::File;
use std::io::Read;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{ClientError, Result};

/// Largest options file accepted by [`ClientOptions::load`].
pub const MAX_OPTIONS_FILE_SIZE: usize = 64 * 1024;

/// User options persisted between runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ClientOptions {
    /// Connect to `server` on start.
    pub auto_connect: bool,
    /// Last address connected to, `host:port`.
    #[serde(rename = "autoConnectServer", alias = "server")]
    pub server: String,
    /// Keep trying to reconnect while disconnected.
    pub probe_for_running_applications: bool,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            auto_connect: true,
            server: "localhost:8080".to_string(),
            probe_for_running_applications: true,
        }
    }
}

impl ClientOptions {
    /// Load options from a JSON file. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let file = match File::open(path) {
            Ok(file) => file,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "no options file, using defaults");
                return Ok(Self::default());
            }
            Err(err) => return Err(options_error(path, err)),
        };

        let read_limit = u64::try_from(MAX_OPTIONS_FILE_SIZE.saturating_add(1)).unwrap_or(u64::MAX);
        let mut content = String::new();
        file.take(read_limit)
            .read_to_string(&mut content)
            .map_err(|err| options_error(path, err))?;
        if content.len() > MAX_OPTIONS_FILE_SIZE {
            return Err(options_error(
                path,
                format!("larger than {MAX_OPTIONS_FILE_SIZE} bytes"),
            ));
        }

        serde_json::from_str(&content).map_err(|err| options_error(path, err))
    }

    /// Write options as pretty JSON.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content).map_err(|err| options_error(path, err))
    }
}

fn options_error(path: &Path, reason: impl std::fmt::Display) -> ClientError {
    ClientError::Options {
        path: path.to_path_buf(),
        reason: reason.to_string(),
    }
}
