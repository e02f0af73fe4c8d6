//! Health checker — dispatches a service to its protocol probe.

use std::future::Future;
use std::pin::Pin;

use tracing::{debug, warn};

use telwatch_config::{ServiceDescriptor, ServiceKind};

use crate::http::http_probe;
use crate::result::{CheckResult, ProbeOutcome};
use crate::sip::sip_probe;
use crate::tcp::tcp_probe;

/// Boxed future alias used by the object-safe seams.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Checks one service and returns its normalized result.
///
/// Implemented by [`HealthChecker`]; the monitor holds it as a trait
/// object so cycles can run against a scripted backend in tests.
pub trait ServiceProbe: Send + Sync {
    fn check<'a>(&'a self, service: &'a ServiceDescriptor) -> BoxFuture<'a, CheckResult>;
}

/// Production checker backed by real network probes.
#[derive(Debug, Clone, Copy, Default)]
pub struct HealthChecker;

impl HealthChecker {
    pub fn new() -> Self {
        Self
    }

    /// Probe `service` with the protocol its kind declares.
    ///
    /// Unknown types fail fast without touching the network. The result is
    /// always stamped with the service's name, type, and the check time.
    pub async fn check(&self, service: &ServiceDescriptor) -> CheckResult {
        let outcome = match &service.kind {
            ServiceKind::Http { url } => http_probe(url, service.timeout).await,
            ServiceKind::Tcp { host, port } => tcp_probe(host, *port, service.timeout).await,
            ServiceKind::Sip {
                host,
                port,
                no_reply,
            } => sip_probe(host, *port, service.timeout, *no_reply).await,
            ServiceKind::Unknown { type_name } => {
                warn!(service = %service.name, %type_name, "no probe for service type");
                ProbeOutcome::failed(format!("Unknown type: {type_name}"))
            }
        };

        debug!(
            service = %service.name,
            healthy = outcome.healthy,
            response_time_ms = ?outcome.response_time_ms,
            "service checked"
        );
        CheckResult::stamp(service, outcome)
    }
}

impl ServiceProbe for HealthChecker {
    fn check<'a>(&'a self, service: &'a ServiceDescriptor) -> BoxFuture<'a, CheckResult> {
        Box::pin(HealthChecker::check(self, service))
    }
}
