//! Monitor configuration loading and validation.
//!
//! JSON is the default document format; paths ending in `.toml` are
//! parsed as TOML. Both describe the same shape:
//!
//! ```json
//! {
//!   "check_interval": 30,
//!   "services": [
//!     { "name": "api", "type": "http", "url": "http://10.0.0.5/health" },
//!     { "name": "sbc", "type": "sip", "host": "10.0.0.9", "port": 5060,
//!       "recovery": { "action": "failover", "target": "sbc-backup" } }
//!   ]
//! }
//! ```

use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::{ConfigError, ConfigResult};
use crate::types::*;

/// Probe timeout when a service does not set one.
pub const DEFAULT_TIMEOUT_SECS: f64 = 5.0;

/// Delay between check cycles when the document does not set one.
pub const DEFAULT_CHECK_INTERVAL_SECS: f64 = 30.0;

/// Validated monitor configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct MonitorConfig {
    /// Services in configuration order; checked in this order every cycle.
    pub services: Vec<ServiceDescriptor>,
    /// Sleep between the end of one cycle and the start of the next.
    pub check_interval: Duration,
}

/// The configuration document before validation.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawConfig {
    #[serde(default)]
    pub services: Vec<RawService>,
    /// Seconds.
    pub check_interval: Option<f64>,
}

impl MonitorConfig {
    /// Load and validate a configuration file.
    pub fn from_file(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;

        let is_toml = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("toml"));
        let config = if is_toml {
            Self::from_toml_str(&content)?
        } else {
            Self::from_json_str(&content)?
        };

        debug!(
            path = %path.display(),
            services = config.services.len(),
            "configuration loaded"
        );
        Ok(config)
    }

    pub fn from_json_str(content: &str) -> ConfigResult<Self> {
        let raw: RawConfig =
            serde_json::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;
        Self::from_raw(raw)
    }

    pub fn from_toml_str(content: &str) -> ConfigResult<Self> {
        let raw: RawConfig =
            toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;
        Self::from_raw(raw)
    }

    /// Validate a raw document into typed descriptors.
    pub fn from_raw(raw: RawConfig) -> ConfigResult<Self> {
        let interval = raw.check_interval.unwrap_or(DEFAULT_CHECK_INTERVAL_SECS);
        let check_interval =
            positive_secs(interval).ok_or(ConfigError::InvalidInterval(interval))?;

        let mut seen = HashSet::new();
        let mut services = Vec::with_capacity(raw.services.len());
        for (index, entry) in raw.services.into_iter().enumerate() {
            let service = validate_service(index, entry)?;
            if !seen.insert(service.name.clone()) {
                return Err(ConfigError::DuplicateName(service.name));
            }
            services.push(service);
        }

        Ok(Self {
            services,
            check_interval,
        })
    }
}

fn validate_service(index: usize, raw: RawService) -> ConfigResult<ServiceDescriptor> {
    let name = raw.name.trim().to_string();
    if name.is_empty() {
        return Err(ConfigError::EmptyName { index });
    }

    let value = raw.timeout.unwrap_or(DEFAULT_TIMEOUT_SECS);
    let Some(timeout) = positive_secs(value) else {
        return Err(ConfigError::InvalidTimeout {
            service: name,
            value,
        });
    };

    let service_type = require(
        &name,
        "all",
        "type",
        raw.service_type.filter(|t| !t.trim().is_empty()),
    )?;

    let kind = match service_type.to_ascii_lowercase().as_str() {
        "http" => {
            let url = require(&name, "http", "url", raw.url)?;
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(ConfigError::InvalidUrl { service: name, url });
            }
            ServiceKind::Http { url }
        }
        "tcp" => ServiceKind::Tcp {
            host: require(&name, "tcp", "host", raw.host)?,
            port: require(&name, "tcp", "port", raw.port)?,
        },
        "sip" => ServiceKind::Sip {
            host: require(&name, "sip", "host", raw.host)?,
            port: require(&name, "sip", "port", raw.port)?,
            no_reply: raw.sip_no_reply.unwrap_or_default(),
        },
        _ => {
            warn!(service = %name, service_type = %service_type, "unknown service type");
            ServiceKind::Unknown {
                type_name: service_type,
            }
        }
    };

    Ok(ServiceDescriptor {
        name,
        kind,
        timeout,
        recovery: raw.recovery.map(RecoveryAction::from).unwrap_or_default(),
    })
}

/// A strictly positive number of seconds that fits in a [`Duration`].
fn positive_secs(secs: f64) -> Option<Duration> {
    if secs > 0.0 {
        Duration::try_from_secs_f64(secs)
            .ok()
            .filter(|d| !d.is_zero())
    } else {
        None
    }
}

fn require<T>(
    service: &str,
    kind: &'static str,
    field: &'static str,
    value: Option<T>,
) -> ConfigResult<T> {
    value.ok_or_else(|| ConfigError::MissingField {
        service: service.to_string(),
        kind,
        field,
    })
}
