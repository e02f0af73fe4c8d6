//! Console presentation of check results.

use chrono::Local;

use telwatch_health::CheckResult;
use telwatch_monitor::{CycleReport, CycleStatistics, Reporter};
use telwatch_recovery::{RecoveryOutcome, RecoveryStatus};

const GREEN: &str = "\x1b[92m";
const RED: &str = "\x1b[91m";
const YELLOW: &str = "\x1b[93m";
const RESET: &str = "\x1b[0m";

const RULE: &str = "============================================================";

/// Prints one colored line per check plus cycle banners and summaries.
pub struct ConsoleReporter {
    auto_recover: bool,
}

impl ConsoleReporter {
    pub fn new(auto_recover: bool) -> Self {
        Self { auto_recover }
    }
}

impl Reporter for ConsoleReporter {
    fn cycle_started(&self, _services: usize) {
        println!("\n{RULE}");
        println!(
            "Health Check Cycle - {}",
            Local::now().format("%Y-%m-%d %H:%M:%S")
        );
        println!("{RULE}\n");
    }

    fn check_completed(&self, result: &CheckResult) {
        println!("{}", format_check(result));
    }

    fn recovery_finished(&self, outcome: &RecoveryOutcome) {
        let line = match &outcome.status {
            RecoveryStatus::Completed => format!("{GREEN}recovery completed{RESET}"),
            RecoveryStatus::Failed { reason } => format!("{RED}recovery failed: {reason}{RESET}"),
            RecoveryStatus::Skipped { reason } => format!("{YELLOW}⚠ {reason}{RESET}"),
        };
        println!(
            "  🔧 {} [{} #{}] {line}",
            outcome.service, outcome.action, outcome.attempt
        );
    }

    fn cycle_finished(&self, report: &CycleReport, stats: &CycleStatistics) {
        println!("\n{RULE}");
        println!(
            "Summary: {}/{} services healthy",
            report.healthy_count(),
            report.total()
        );
        if self.auto_recover {
            println!("Recoveries attempted: {}", stats.recoveries_attempted);
        }
        if let Some(names) = unhealthy_names(report) {
            println!("Unhealthy: {names}");
        }
        println!("{RULE}");
    }
}

/// Comma-separated unhealthy services, in check order.
fn unhealthy_names(report: &CycleReport) -> Option<String> {
    let names: Vec<_> = report
        .unhealthy()
        .map(|r| r.service_name.as_str())
        .collect();
    (!names.is_empty()).then(|| names.join(", "))
}

/// `✓ name: HEALTHY (response: 12.5ms)` / `✗ name: UNHEALTHY - error`
pub fn format_check(result: &CheckResult) -> String {
    let (symbol, color, label) = if result.healthy() {
        ("✓", GREEN, "HEALTHY")
    } else {
        ("✗", RED, "UNHEALTHY")
    };

    let mut line = format!("{symbol} {color}{}: {label}{RESET}", result.service_name);
    if let Some(ms) = result.response_time_ms() {
        line.push_str(&format!(" (response: {ms}ms)"));
    }
    if let (false, Some(error)) = (result.healthy(), result.error()) {
        line.push_str(&format!(" - {error}"));
    }
    line
}

/// Final statistics printed on shutdown.
pub fn print_final_stats(stats: &CycleStatistics, auto_recover: bool, incident_log: &str) {
    println!("\nFinal Statistics:");
    println!("  Total checks: {}", stats.total_checks);
    println!("  Healthy: {}", stats.healthy_checks);
    println!("  Unhealthy: {}", stats.unhealthy_checks);
    if auto_recover {
        println!("  Recovery attempts: {}", stats.recoveries_attempted);
        println!("  Successful recoveries: {}", stats.recoveries_successful);
    }
    println!("\nIncidents logged to: {incident_log}");
}
