//! Typed service descriptors produced by configuration validation.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Default failover target when none is configured.
pub const DEFAULT_FAILOVER_TARGET: &str = "unknown";

/// Default restart command when none is configured.
pub const DEFAULT_RESTART_COMMAND: &str = "systemctl restart service";

// ── Service ────────────────────────────────────────────────────────

/// Identity and check configuration for one monitored endpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceDescriptor {
    /// Unique within a configuration; also the recovery-state key.
    pub name: String,
    /// Protocol and its required fields.
    pub kind: ServiceKind,
    /// Probe deadline.
    pub timeout: Duration,
    /// Remediation strategy when the service is unhealthy.
    pub recovery: RecoveryAction,
}

impl ServiceDescriptor {
    /// Protocol label as written in the configuration.
    pub fn type_name(&self) -> &str {
        self.kind.type_name()
    }
}

/// Protocol family of a service, with the fields that protocol requires.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServiceKind {
    /// HTTP(S) GET against `url`; healthy iff the status is exactly 200.
    Http { url: String },
    /// TCP connect to `host:port`; healthy iff the connect succeeds.
    Tcp { host: String, port: u16 },
    /// SIP OPTIONS over UDP to `host:port`; healthy iff a 2xx reply arrives.
    Sip {
        host: String,
        port: u16,
        no_reply: SipNoReply,
    },
    /// A type the checker does not know. Reported unhealthy at check time.
    Unknown { type_name: String },
}

impl ServiceKind {
    pub fn type_name(&self) -> &str {
        match self {
            ServiceKind::Http { .. } => "http",
            ServiceKind::Tcp { .. } => "tcp",
            ServiceKind::Sip { .. } => "sip",
            ServiceKind::Unknown { type_name } => type_name,
        }
    }
}

/// How a SIP target that never answers the OPTIONS request is classified.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SipNoReply {
    /// Silence is a failure.
    #[default]
    Unhealthy,
    /// Silence is accepted; many servers drop unsolicited OPTIONS.
    Healthy,
}

// ── Recovery ───────────────────────────────────────────────────────

/// Configured remediation strategy for a service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecoveryAction {
    /// Redirect traffic to a backup endpoint.
    Failover { target: Option<String> },
    /// Restart the service with a command.
    Restart { command: Option<String> },
    /// Notify on-call with a message.
    Alert { message: Option<String> },
    /// An action name the engine does not recognise.
    Unknown(String),
}

impl Default for RecoveryAction {
    fn default() -> Self {
        RecoveryAction::Alert { message: None }
    }
}

impl RecoveryAction {
    pub fn name(&self) -> &str {
        match self {
            RecoveryAction::Failover { .. } => "failover",
            RecoveryAction::Restart { .. } => "restart",
            RecoveryAction::Alert { .. } => "alert",
            RecoveryAction::Unknown(name) => name,
        }
    }

    /// Failover target, falling back to [`DEFAULT_FAILOVER_TARGET`].
    pub fn failover_target(target: Option<&str>) -> &str {
        target.unwrap_or(DEFAULT_FAILOVER_TARGET)
    }

    /// Restart command, falling back to [`DEFAULT_RESTART_COMMAND`].
    pub fn restart_command(command: Option<&str>) -> &str {
        command.unwrap_or(DEFAULT_RESTART_COMMAND)
    }

    /// Alert message, falling back to `"<service> is down"`.
    pub fn alert_message(message: Option<&str>, service: &str) -> String {
        message.map_or_else(|| format!("{service} is down"), str::to_string)
    }
}

impl fmt::Display for RecoveryAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ── Raw document ───────────────────────────────────────────────────

/// A service entry exactly as written in the configuration document.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawService {
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type")]
    pub service_type: Option<String>,
    pub url: Option<String>,
    pub host: Option<String>,
    pub port: Option<u16>,
    /// Seconds.
    pub timeout: Option<f64>,
    pub recovery: Option<RawRecovery>,
    pub sip_no_reply: Option<SipNoReply>,
}

/// A recovery block exactly as written in the configuration document.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawRecovery {
    pub action: Option<String>,
    pub target: Option<String>,
    pub command: Option<String>,
    pub message: Option<String>,
}

impl From<RawRecovery> for RecoveryAction {
    fn from(raw: RawRecovery) -> Self {
        let action = raw.action.unwrap_or_else(|| "alert".to_string());
        match action.to_ascii_lowercase().as_str() {
            "failover" => RecoveryAction::Failover { target: raw.target },
            "restart" => RecoveryAction::Restart {
                command: raw.command,
            },
            "alert" => RecoveryAction::Alert {
                message: raw.message,
            },
            _ => RecoveryAction::Unknown(action),
        }
    }
}
