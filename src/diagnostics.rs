/*!
 * Network diagnostics for backend connectivity failures.
 *
 * When the backend client hits its first transient error it runs a one-off
 * probe against the endpoint and logs a report, so operators can tell a
 * down service apart from DNS or routing trouble without reproducing the
 * failure by hand.
 */

use std::time::Duration;

use log::info;
use tokio::net::TcpStream;
use tokio::time::timeout;
use url::Url;

/// TCP connect timeout for the probe
const PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// Outcome of probing one endpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeReport {
    /// Host part of the endpoint
    pub host: String,
    /// Port probed
    pub port: u16,
    /// Whether a TCP connection was established within the timeout
    pub reachable: bool,
    /// Human-readable detail for the log
    pub detail: String,
}

impl ProbeReport {
    /// One-line summary for operator logs
    pub fn summary(&self) -> String {
        if self.reachable {
            format!(
                "endpoint {}:{} is reachable over TCP; the service itself is failing ({})",
                self.host, self.port, self.detail
            )
        } else {
            format!("endpoint {}:{} is unreachable: {}", self.host, self.port, self.detail)
        }
    }
}

/// Probe the endpoint URL with a bounded TCP connect.
///
/// Never fails: a malformed URL or refused connection becomes an
/// unreachable report.
pub async fn probe_endpoint(endpoint: &str) -> ProbeReport {
    let (host, port) = match Url::parse(endpoint) {
        Ok(url) => {
            let host = url.host_str().unwrap_or("").to_string();
            let port = url.port_or_known_default().unwrap_or(80);
            (host, port)
        }
        Err(e) => {
            return ProbeReport {
                host: endpoint.to_string(),
                port: 0,
                reachable: false,
                detail: format!("endpoint URL did not parse: {}", e),
            };
        }
    };

    if host.is_empty() {
        return ProbeReport {
            host: endpoint.to_string(),
            port,
            reachable: false,
            detail: "endpoint URL has no host".to_string(),
        };
    }

    let report = match timeout(PROBE_TIMEOUT, TcpStream::connect((host.as_str(), port))).await {
        Ok(Ok(_)) => ProbeReport {
            host,
            port,
            reachable: true,
            detail: "TCP connect succeeded".to_string(),
        },
        Ok(Err(e)) => ProbeReport {
            host,
            port,
            reachable: false,
            detail: format!("TCP connect failed: {}", e),
        },
        Err(_) => ProbeReport {
            host,
            port,
            reachable: false,
            detail: format!("TCP connect timed out after {:?}", PROBE_TIMEOUT),
        },
    };

    info!("Network probe: {}", report.summary());
    report
}
