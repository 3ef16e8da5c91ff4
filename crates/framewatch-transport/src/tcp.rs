use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
use std::time::Duration;

use tracing::debug;

use crate::error::{Result, TransportError};
use crate::stream::TelemetryStream;

/// Default bound on a single connect attempt.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(2);

/// Schemes accepted in front of a `host:port` address.
const SCHEMES: [&str; 3] = ["ws://", "tcp://", "http://"];

/// TCP transport to an instrumented application.
pub struct TcpTransport;

impl TcpTransport {
    /// Connect to `addr` (blocking), trying every resolved address in turn.
    ///
    /// Each attempt is bounded by `timeout`. The error of the last failed
    /// attempt is returned when none succeeds.
    pub fn connect(addr: &str, timeout: Duration) -> Result<TelemetryStream> {
        let normalized = normalize_address(addr)?;
        let candidates: Vec<SocketAddr> = normalized
            .to_socket_addrs()
            .map_err(|source| TransportError::Resolve {
                addr: normalized.clone(),
                source,
            })?
            .collect();

        let mut last_err = std::io::Error::new(
            std::io::ErrorKind::AddrNotAvailable,
            "address resolved to nothing",
        );
        for candidate in candidates {
            match TcpStream::connect_timeout(&candidate, timeout) {
                Ok(stream) => {
                    stream.set_nodelay(true)?;
                    debug!(addr = %candidate, "connected to application");
                    return Ok(TelemetryStream::from_tcp(stream));
                }
                Err(err) => {
                    debug!(addr = %candidate, error = %err, "connect attempt failed");
                    last_err = err;
                }
            }
        }

        Err(TransportError::Connect {
            addr: normalized,
            source: last_err,
        })
    }

    /// Transport name for diagnostics.
    pub fn transport_name() -> &'static str {
        "tcp"
    }
}

/// Strip an optional scheme and trailing slash from a server address.
///
/// `"ws://localhost:8080/"` and `"localhost:8080"` name the same endpoint.
pub fn normalize_address(addr: &str) -> Result<String> {
    let mut rest = addr.trim();
    for scheme in SCHEMES {
        if let Some(stripped) = rest.strip_prefix(scheme) {
            rest = stripped;
            break;
        }
    }
    let rest = rest.trim_end_matches('/');

    let has_port = rest
        .rsplit_once(':')
        .is_some_and(|(host, port)| !host.is_empty() && port.parse::<u16>().is_ok());
    if !has_port {
        return Err(TransportError::InvalidAddress(addr.to_string()));
    }
    Ok(rest.to_string())
}
