//! Cycle statistics and per-cycle reports.

use chrono::{DateTime, Utc};
use serde::Serialize;

use telwatch_health::CheckResult;
use telwatch_recovery::RecoveryOutcome;

/// Cumulative counters since process start.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CycleStatistics {
    pub total_checks: u64,
    pub healthy_checks: u64,
    pub unhealthy_checks: u64,
    pub recoveries_attempted: u64,
    pub recoveries_successful: u64,
}

impl CycleStatistics {
    pub fn record_check(&mut self, healthy: bool) {
        self.total_checks += 1;
        if healthy {
            self.healthy_checks += 1;
        } else {
            self.unhealthy_checks += 1;
        }
    }

    pub fn record_recovery(&mut self, succeeded: bool) {
        self.recoveries_attempted += 1;
        if succeeded {
            self.recoveries_successful += 1;
        }
    }
}

/// Everything one cycle produced, in service order.
#[derive(Debug, Clone)]
pub struct CycleReport {
    pub started_at: DateTime<Utc>,
    pub results: Vec<CheckResult>,
    pub recoveries: Vec<RecoveryOutcome>,
}

impl CycleReport {
    pub fn new(started_at: DateTime<Utc>) -> Self {
        Self {
            started_at,
            results: Vec::new(),
            recoveries: Vec::new(),
        }
    }

    pub fn total(&self) -> usize {
        self.results.len()
    }

    pub fn healthy_count(&self) -> usize {
        self.results.iter().filter(|r| r.healthy()).count()
    }

    pub fn unhealthy(&self) -> impl Iterator<Item = &CheckResult> {
        self.results.iter().filter(|r| !r.healthy())
    }
}
