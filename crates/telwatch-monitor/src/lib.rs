//! telwatch-monitor — the check-cycle orchestrator.
//!
//! # Architecture
//!
//! ```text
//! Monitor::run(shutdown)
//!   └── loop: Idle → Cycling → Idle (sleep check_interval) … → ShuttingDown
//!         per service, in configuration order:
//!           ├── ServiceProbe::check()          → CheckResult
//!           ├── Reporter::check_completed()    presentation
//!           ├── CycleStatistics::record_check()
//!           ├── RecoveryEngine::recover()      if unhealthy and auto-recover
//!           └── IncidentSink::record()         if unhealthy
//! ```
//!
//! Services are checked one after another, so a hanging probe delays the
//! rest of its cycle by at most its timeout. Shutdown is only observed
//! between cycles.

pub mod incident;
pub mod monitor;
pub mod report;
pub mod stats;

pub use incident::{Incident, IncidentLog, IncidentSink, NullIncidentSink, UNHEALTHY_STATUS};
pub use monitor::{Monitor, MonitorPhase};
pub use report::{Reporter, SilentReporter};
pub use stats::{CycleReport, CycleStatistics};
