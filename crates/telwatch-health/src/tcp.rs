//! TCP connect probe.

use std::time::{Duration, Instant};

use tokio::net::TcpStream;
use tracing::debug;

use crate::result::{Diagnostics, ProbeOutcome};

/// Open a TCP connection to `host:port` and close it immediately.
///
/// Healthy iff the connect succeeds within `timeout`. No data is
/// exchanged. The stream is dropped (closed) on every path.
pub async fn tcp_probe(host: &str, port: u16, timeout: Duration) -> ProbeOutcome {
    let start = Instant::now();
    let result = tokio::time::timeout(timeout, TcpStream::connect((host, port))).await;

    match result {
        Ok(Ok(stream)) => {
            let elapsed = start.elapsed();
            drop(stream);
            ProbeOutcome::responded(
                true,
                elapsed,
                Diagnostics::Tcp {
                    connection_result: 0,
                },
            )
        }
        Ok(Err(e)) => {
            debug!(error = %e, %host, port, "tcp probe connect failed");
            ProbeOutcome::failed(e.to_string())
        }
        Err(_) => {
            debug!(%host, port, "tcp probe timed out");
            ProbeOutcome::failed(format!("timed out after {}ms", timeout.as_millis()))
        }
    }
}
