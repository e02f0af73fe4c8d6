//! telwatch-health — protocol probes and the health checker.
//!
//! Every probe turns one service into a [`ProbeOutcome`] and never fails:
//! transport errors, timeouts, and bad replies all become
//! `healthy = false`. The [`HealthChecker`] picks the probe from the
//! service's [`ServiceKind`](telwatch_config::ServiceKind) and stamps the
//! outcome with the service identity and a timestamp.
//!
//! # Architecture
//!
//! ```text
//! HealthChecker::check(service)
//!   ├── Http  → http_probe(url)              GET, healthy iff status == 200
//!   ├── Tcp   → tcp_probe(host, port)        healthy iff connect succeeds
//!   ├── Sip   → sip_probe(host, port)        OPTIONS over UDP, healthy iff 2xx
//!   └── Unknown → unhealthy, no I/O
//!         ↓
//!   CheckResult { service_name, service_type, timestamp, outcome… }
//! ```

pub mod checker;
pub mod http;
pub mod result;
pub mod sip;
pub mod tcp;

pub use checker::{BoxFuture, HealthChecker, ServiceProbe};
pub use result::{CheckResult, Diagnostics, ProbeOutcome};
