//! Probe outcomes and the normalized check result.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;

use telwatch_config::ServiceDescriptor;

/// Protocol-specific evidence from a probe that got an answer.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "protocol", rename_all = "snake_case")]
pub enum Diagnostics {
    Http {
        status_code: u16,
    },
    Tcp {
        /// Zero on a successful connect.
        connection_result: i32,
    },
    Sip {
        /// Parsed from the reply status line, when it has one.
        status_code: Option<u16>,
        /// Reply payload, lossily decoded and truncated.
        response: String,
    },
}

/// What a probe learned, before the checker attaches service identity.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProbeOutcome {
    pub healthy: bool,
    /// Present only when a round trip completed.
    pub response_time_ms: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diagnostics: Option<Diagnostics>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ProbeOutcome {
    /// A probe that got an answer; `healthy` is the protocol's verdict on it.
    pub fn responded(healthy: bool, elapsed: Duration, diagnostics: Diagnostics) -> Self {
        Self {
            healthy,
            response_time_ms: Some(round_ms(elapsed)),
            diagnostics: Some(diagnostics),
            error: None,
        }
    }

    /// A probe that could not complete.
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            healthy: false,
            response_time_ms: None,
            diagnostics: None,
            error: Some(error.into()),
        }
    }

    /// A probe accepted as healthy without any evidence (SIP silence policy).
    pub fn assumed_healthy() -> Self {
        Self {
            healthy: true,
            response_time_ms: None,
            diagnostics: None,
            error: None,
        }
    }
}

/// Normalized outcome of one check, attributed to a service.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CheckResult {
    pub service_name: String,
    pub service_type: String,
    pub timestamp: DateTime<Utc>,
    #[serde(flatten)]
    pub outcome: ProbeOutcome,
}

impl CheckResult {
    /// Attribute a probe outcome to `service`, timestamped now.
    pub fn stamp(service: &ServiceDescriptor, outcome: ProbeOutcome) -> Self {
        Self {
            service_name: service.name.clone(),
            service_type: service.type_name().to_string(),
            timestamp: Utc::now(),
            outcome,
        }
    }

    pub fn healthy(&self) -> bool {
        self.outcome.healthy
    }

    pub fn response_time_ms(&self) -> Option<f64> {
        self.outcome.response_time_ms
    }

    pub fn error(&self) -> Option<&str> {
        self.outcome.error.as_deref()
    }

    pub fn diagnostics(&self) -> Option<&Diagnostics> {
        self.outcome.diagnostics.as_ref()
    }
}

/// Milliseconds, rounded to two decimals.
fn round_ms(elapsed: Duration) -> f64 {
    (elapsed.as_secs_f64() * 100_000.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use telwatch_config::{RecoveryAction, ServiceKind};

    #[test]
    fn rounds_to_two_decimals() {
        assert_eq!(round_ms(Duration::from_micros(12_346)), 12.35);
        assert_eq!(round_ms(Duration::ZERO), 0.0);
    }

    #[test]
    fn failed_outcome_has_no_timing() {
        let outcome = ProbeOutcome::failed("connection refused");
        assert!(!outcome.healthy);
        assert_eq!(outcome.response_time_ms, None);
        assert_eq!(outcome.diagnostics, None);
        assert_eq!(outcome.error.as_deref(), Some("connection refused"));
    }

    #[test]
    fn stamp_attaches_identity() {
        let service = ServiceDescriptor {
            name: "sbc".to_string(),
            kind: ServiceKind::Tcp {
                host: "127.0.0.1".to_string(),
                port: 5061,
            },
            timeout: Duration::from_secs(1),
            recovery: RecoveryAction::default(),
        };
        let result = CheckResult::stamp(
            &service,
            ProbeOutcome::responded(
                true,
                Duration::from_millis(3),
                Diagnostics::Tcp {
                    connection_result: 0,
                },
            ),
        );
        assert_eq!(result.service_name, "sbc");
        assert_eq!(result.service_type, "tcp");
        assert!(result.healthy());
        assert_eq!(result.response_time_ms(), Some(3.0));
    }

    #[test]
    fn serializes_flat() {
        let service = ServiceDescriptor {
            name: "api".to_string(),
            kind: ServiceKind::Http {
                url: "http://127.0.0.1/".to_string(),
            },
            timeout: Duration::from_secs(1),
            recovery: RecoveryAction::default(),
        };
        let result = CheckResult::stamp(&service, ProbeOutcome::failed("dns failure"));
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["service_name"], "api");
        assert_eq!(json["healthy"], false);
        assert_eq!(json["error"], "dns failure");
        assert!(json["response_time_ms"].is_null());
        assert!(json.get("diagnostics").is_none());
    }
}
