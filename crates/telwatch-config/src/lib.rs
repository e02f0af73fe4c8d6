//! telwatch-config — monitor configuration for telwatch.
//!
//! The on-disk document is deliberately loose (every protocol field is
//! optional) so that operators can list HTTP, TCP, and SIP services in one
//! array. [`MonitorConfig::from_file`] validates that document into typed
//! [`ServiceDescriptor`]s whose [`ServiceKind`] carries exactly the fields
//! its protocol needs.

pub mod config;
pub mod error;
pub mod types;

pub use config::{MonitorConfig, DEFAULT_CHECK_INTERVAL_SECS, DEFAULT_TIMEOUT_SECS};
pub use error::{ConfigError, ConfigResult};
pub use types::*;
