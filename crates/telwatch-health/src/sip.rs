//! SIP OPTIONS probe over UDP.
//!
//! Sends one OPTIONS request and waits for a single datagram back. A reply
//! whose status line is 2xx is healthy; any other reply is unhealthy but
//! keeps the payload. Silence until the deadline is governed by
//! [`SipNoReply`].

use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use tokio::net::{lookup_host, UdpSocket};
use tokio::time;
use tracing::debug;

use telwatch_config::SipNoReply;

use crate::result::{Diagnostics, ProbeOutcome};

/// Error reported when the target never answers.
pub const SIP_TIMEOUT_ERROR: &str = "SIP timeout - no response received";

/// Characters of the reply kept in diagnostics.
const RESPONSE_PREVIEW_CHARS: usize = 100;

const RECV_BUFFER_BYTES: usize = 4096;

static CALL_SEQ: AtomicU64 = AtomicU64::new(0);

/// Send a SIP OPTIONS request to `host:port` and classify the reply.
///
/// `timeout` bounds the whole exchange, resolution included.
pub async fn sip_probe(
    host: &str,
    port: u16,
    timeout: Duration,
    no_reply: SipNoReply,
) -> ProbeOutcome {
    exchange(host, port, time::Instant::now() + timeout, no_reply).await
}

async fn exchange(
    host: &str,
    port: u16,
    deadline: time::Instant,
    no_reply: SipNoReply,
) -> ProbeOutcome {
    let target = match time::timeout_at(deadline, resolve(host, port)).await {
        Ok(Ok(addr)) => addr,
        Ok(Err(e)) => return ProbeOutcome::failed(e),
        Err(_) => {
            return ProbeOutcome::failed(format!("resolving {host} timed out"));
        }
    };

    let bind_addr: SocketAddr = if target.is_ipv4() {
        (Ipv4Addr::UNSPECIFIED, 0).into()
    } else {
        (Ipv6Addr::UNSPECIFIED, 0).into()
    };
    // The socket is released when it goes out of scope on every path.
    let socket = match UdpSocket::bind(bind_addr).await {
        Ok(s) => s,
        Err(e) => return ProbeOutcome::failed(format!("udp bind failed: {e}")),
    };

    let request = options_request(host, port, &next_call_id());
    let start = Instant::now();
    if let Err(e) = socket.send_to(request.as_bytes(), target).await {
        debug!(error = %e, %target, "sip probe send failed");
        return ProbeOutcome::failed(format!("send to {target} failed: {e}"));
    }

    let mut buf = [0u8; RECV_BUFFER_BYTES];
    match time::timeout_at(deadline, socket.recv_from(&mut buf)).await {
        Ok(Ok((len, from))) => {
            let elapsed = start.elapsed();
            let payload = &buf[..len];
            let status_code = status_code(payload);
            let healthy = status_code.is_some_and(|code| (200..300).contains(&code));
            if !healthy {
                debug!(?status_code, %from, "sip probe non-2xx reply");
            }
            ProbeOutcome::responded(
                healthy,
                elapsed,
                Diagnostics::Sip {
                    status_code,
                    response: preview(payload),
                },
            )
        }
        Ok(Err(e)) => {
            debug!(error = %e, %target, "sip probe receive failed");
            ProbeOutcome::failed(e.to_string())
        }
        Err(_) => match no_reply {
            SipNoReply::Unhealthy => {
                debug!(%target, "sip probe timed out");
                ProbeOutcome::failed(SIP_TIMEOUT_ERROR)
            }
            SipNoReply::Healthy => {
                debug!(%target, "sip probe got no reply, accepted by policy");
                ProbeOutcome::assumed_healthy()
            }
        },
    }
}

async fn resolve(host: &str, port: u16) -> Result<SocketAddr, String> {
    lookup_host((host, port))
        .await
        .map_err(|e| format!("failed to resolve {host}: {e}"))?
        .next()
        .ok_or_else(|| format!("no address found for {host}"))
}

/// Unique per process: wall-clock millis plus a sequence number.
fn next_call_id() -> String {
    let millis = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis();
    let seq = CALL_SEQ.fetch_add(1, Ordering::Relaxed);
    format!("health-check-{millis}-{seq}")
}

/// Build a minimal SIP OPTIONS request.
pub fn options_request(host: &str, port: u16, call_id: &str) -> String {
    format!(
        "OPTIONS sip:{host}:{port} SIP/2.0\r\n\
         Via: SIP/2.0/UDP telwatch:5060;branch=z9hG4bK{call_id}\r\n\
         Max-Forwards: 70\r\n\
         From: <sip:monitor@localhost>;tag=telwatch\r\n\
         To: <sip:{host}>\r\n\
         Call-ID: {call_id}\r\n\
         CSeq: 1 OPTIONS\r\n\
         Content-Length: 0\r\n\r\n"
    )
}

/// Status code from a `SIP/2.0 <code> <reason>` status line.
fn status_code(payload: &[u8]) -> Option<u16> {
    let text = String::from_utf8_lossy(payload);
    let line = text.lines().next()?;
    let rest = line.strip_prefix("SIP/2.0 ")?;
    let code = rest.get(..3)?;
    if !code.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    code.parse().ok()
}

fn preview(payload: &[u8]) -> String {
    String::from_utf8_lossy(payload)
        .chars()
        .take(RESPONSE_PREVIEW_CHARS)
        .collect()
}
