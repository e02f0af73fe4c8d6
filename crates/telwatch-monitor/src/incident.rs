//! Incident records and sinks.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::{DateTime, Local};
use serde::Serialize;

use telwatch_health::CheckResult;

/// Status written for every incident.
pub const UNHEALTHY_STATUS: &str = "UNHEALTHY";

/// Detail used when an unhealthy result carries no error string.
const DEFAULT_DETAIL: &str = "Service check failed";

/// One unhealthy check, ready for persistence.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Incident {
    pub timestamp: DateTime<Local>,
    pub service_name: String,
    pub status: &'static str,
    pub detail: String,
}

impl Incident {
    /// Build the incident for an unhealthy result.
    pub fn from_result(result: &CheckResult) -> Self {
        Self {
            timestamp: result.timestamp.with_timezone(&Local),
            service_name: result.service_name.clone(),
            status: UNHEALTHY_STATUS,
            detail: result.error().unwrap_or(DEFAULT_DETAIL).to_string(),
        }
    }

    /// `[<timestamp>] <service>: <status> - <detail>`
    pub fn to_line(&self) -> String {
        format!(
            "[{}] {}: {} - {}",
            self.timestamp.to_rfc3339(),
            self.service_name,
            self.status,
            self.detail
        )
    }
}

/// Destination for incident records.
///
/// The monitor calls `record` from the blocking thread pool, so
/// implementations may do synchronous I/O.
pub trait IncidentSink: Send + Sync {
    fn record(&self, incident: &Incident) -> std::io::Result<()>;
}

/// Sink that drops every incident.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullIncidentSink;

impl IncidentSink for NullIncidentSink {
    fn record(&self, _incident: &Incident) -> std::io::Result<()> {
        Ok(())
    }
}

/// Appends one line per incident to a file.
#[derive(Debug)]
pub struct IncidentLog {
    path: PathBuf,
    lock: Mutex<()>,
}

impl IncidentLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl IncidentSink for IncidentLog {
    fn record(&self, incident: &Incident) -> std::io::Result<()> {
        let _guard = self.lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(file, "{}", incident.to_line())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use telwatch_config::{RecoveryAction, ServiceDescriptor, ServiceKind};
    use telwatch_health::{Diagnostics, ProbeOutcome};

    fn service() -> ServiceDescriptor {
        ServiceDescriptor {
            name: "sbc".to_string(),
            kind: ServiceKind::Sip {
                host: "127.0.0.1".to_string(),
                port: 5060,
                no_reply: Default::default(),
            },
            timeout: Duration::from_secs(1),
            recovery: RecoveryAction::default(),
        }
    }

    #[test]
    fn detail_is_the_error() {
        let result = CheckResult::stamp(&service(), ProbeOutcome::failed("SIP timeout - no response received"));
        let incident = Incident::from_result(&result);
        assert_eq!(incident.status, "UNHEALTHY");
        assert_eq!(incident.detail, "SIP timeout - no response received");
        assert!(incident
            .to_line()
            .ends_with("] sbc: UNHEALTHY - SIP timeout - no response received"));
    }

    #[test]
    fn detail_defaults_without_error() {
        let outcome = ProbeOutcome::responded(
            false,
            Duration::from_millis(4),
            Diagnostics::Sip {
                status_code: Some(404),
                response: "SIP/2.0 404 Not Found".to_string(),
            },
        );
        let incident = Incident::from_result(&CheckResult::stamp(&service(), outcome));
        assert_eq!(incident.detail, "Service check failed");
    }

    #[test]
    fn log_appends_lines() {
        let dir = tempfile::tempdir().unwrap();
        let log = IncidentLog::new(dir.path().join("incidents.log"));
        let result = CheckResult::stamp(&service(), ProbeOutcome::failed("refused"));
        let incident = Incident::from_result(&result);

        log.record(&incident).unwrap();
        log.record(&incident).unwrap();

        let content = std::fs::read_to_string(log.path()).unwrap();
        let lines: Vec<_> = content.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with('['));
        assert!(lines[0].ends_with("sbc: UNHEALTHY - refused"));
    }

    #[test]
    fn unwritable_log_reports_error() {
        let dir = tempfile::tempdir().unwrap();
        let log = IncidentLog::new(dir.path().join("missing").join("incidents.log"));
        let result = CheckResult::stamp(&service(), ProbeOutcome::failed("refused"));
        assert!(log.record(&Incident::from_result(&result)).is_err());
    }
}
