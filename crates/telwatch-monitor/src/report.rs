//! Presentation sink for check results.

use telwatch_health::CheckResult;
use telwatch_recovery::RecoveryOutcome;

use crate::stats::{CycleReport, CycleStatistics};

/// Receives check results for human-readable rendering.
///
/// `check_completed` is called once per check, before any recovery for
/// that check runs. The other hooks are optional.
pub trait Reporter: Send + Sync {
    fn check_completed(&self, result: &CheckResult);

    fn cycle_started(&self, _services: usize) {}

    fn recovery_finished(&self, _outcome: &RecoveryOutcome) {}

    fn cycle_finished(&self, _report: &CycleReport, _stats: &CycleStatistics) {}
}

/// Reporter that renders nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct SilentReporter;

impl Reporter for SilentReporter {
    fn check_completed(&self, _result: &CheckResult) {}
}
