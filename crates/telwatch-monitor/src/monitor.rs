//! Monitor — drives check cycles over every configured service.
//!
//! One `Monitor` owns the service list, the cumulative statistics, and
//! (when auto-recovery is on) the recovery engine. It is single-task: the
//! only shared mutable state lives inside it, so no locking is needed.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use telwatch_config::{MonitorConfig, ServiceDescriptor};
use telwatch_health::ServiceProbe;
use telwatch_recovery::RecoveryEngine;

use crate::incident::{Incident, IncidentSink, NullIncidentSink};
use crate::report::{Reporter, SilentReporter};
use crate::stats::{CycleReport, CycleStatistics};

/// Where the monitor is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorPhase {
    /// Between cycles.
    Idle,
    /// Checking services.
    Cycling,
    /// Shutdown observed; no further cycles will start.
    ShuttingDown,
}

/// Runs check cycles and dispatches recovery for unhealthy services.
pub struct Monitor {
    services: Vec<ServiceDescriptor>,
    interval: Duration,
    probe: Arc<dyn ServiceProbe>,
    /// Present iff auto-recovery is enabled.
    recovery: Option<RecoveryEngine>,
    reporter: Arc<dyn Reporter>,
    incidents: Arc<dyn IncidentSink>,
    stats: CycleStatistics,
    cycles: u64,
    phase: MonitorPhase,
}

impl Monitor {
    /// Create a monitor with auto-recovery disabled and no-op sinks.
    pub fn new(config: MonitorConfig, probe: Arc<dyn ServiceProbe>) -> Self {
        Self {
            services: config.services,
            interval: config.check_interval,
            probe,
            recovery: None,
            reporter: Arc::new(SilentReporter),
            incidents: Arc::new(NullIncidentSink),
            stats: CycleStatistics::default(),
            cycles: 0,
            phase: MonitorPhase::Idle,
        }
    }

    /// Enable auto-recovery through `engine`.
    pub fn with_recovery(mut self, engine: RecoveryEngine) -> Self {
        self.recovery = Some(engine);
        self
    }

    pub fn with_reporter(mut self, reporter: Arc<dyn Reporter>) -> Self {
        self.reporter = reporter;
        self
    }

    pub fn with_incident_sink(mut self, sink: Arc<dyn IncidentSink>) -> Self {
        self.incidents = sink;
        self
    }

    pub fn auto_recover(&self) -> bool {
        self.recovery.is_some()
    }

    pub fn recovery(&self) -> Option<&RecoveryEngine> {
        self.recovery.as_ref()
    }

    pub fn stats(&self) -> &CycleStatistics {
        &self.stats
    }

    /// Completed cycles since construction.
    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    pub fn phase(&self) -> MonitorPhase {
        self.phase
    }

    /// Check every service once, in configuration order.
    pub async fn run_cycle(&mut self) -> CycleReport {
        self.phase = MonitorPhase::Cycling;
        let mut report = CycleReport::new(Utc::now());
        self.reporter.cycle_started(self.services.len());
        debug!(services = self.services.len(), "check cycle started");

        for service in &self.services {
            let result = self.probe.check(service).await;
            self.reporter.check_completed(&result);
            self.stats.record_check(result.healthy());

            if !result.healthy() {
                if let Some(engine) = self.recovery.as_mut() {
                    let outcome = engine.recover(service, &result).await;
                    self.stats.record_recovery(outcome.succeeded());
                    self.reporter.recovery_finished(&outcome);
                    report.recoveries.push(outcome);
                }

                self.record_incident(Incident::from_result(&result)).await;
            }

            report.results.push(result);
        }

        self.cycles += 1;
        self.phase = MonitorPhase::Idle;
        info!(
            healthy = report.healthy_count(),
            total = report.total(),
            recoveries = report.recoveries.len(),
            elapsed_ms = (Utc::now() - report.started_at).num_milliseconds(),
            "check cycle finished"
        );
        self.reporter.cycle_finished(&report, &self.stats);
        report
    }

    /// Sinks may block on file I/O, so the write runs on the blocking pool.
    /// The cycle still waits for it to keep incidents in check order.
    async fn record_incident(&self, incident: Incident) {
        let sink = Arc::clone(&self.incidents);
        let service = incident.service_name.clone();
        match tokio::task::spawn_blocking(move || sink.record(&incident)).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => warn!(service = %service, error = %e, "failed to record incident"),
            Err(e) => warn!(service = %service, error = %e, "incident writer panicked"),
        }
    }

    /// Run cycles every `check_interval` until `shutdown` turns true.
    ///
    /// A cycle in progress always finishes. Returns the final statistics.
    pub async fn run(&mut self, mut shutdown: watch::Receiver<bool>) -> CycleStatistics {
        info!(
            services = self.services.len(),
            interval_secs = self.interval.as_secs_f64(),
            auto_recover = self.auto_recover(),
            "monitor started"
        );

        loop {
            if *shutdown.borrow() {
                break;
            }

            self.run_cycle().await;

            tokio::select! {
                _ = tokio::time::sleep(self.interval) => {}
                changed = shutdown.changed() => {
                    // A dropped sender can never signal again; treat it as shutdown.
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        self.phase = MonitorPhase::ShuttingDown;
        info!(
            cycles = self.cycles,
            total_checks = self.stats.total_checks,
            unhealthy_checks = self.stats.unhealthy_checks,
            "monitor shutting down"
        );
        self.stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use telwatch_config::{RecoveryAction, ServiceKind};
    use telwatch_health::{BoxFuture, CheckResult, Diagnostics, ProbeOutcome};
    use telwatch_recovery::{
        ActionError, RecoveryCapability, RecoveryOutcome, RecoveryState, RecoveryStep,
    };

    type Events = Arc<Mutex<Vec<String>>>;

    /// Probe with a fixed verdict per service name.
    struct ScriptedProbe {
        healthy: HashMap<String, bool>,
        calls: AtomicUsize,
    }

    impl ScriptedProbe {
        fn new(verdicts: &[(&str, bool)]) -> Self {
            Self {
                healthy: verdicts
                    .iter()
                    .map(|(name, ok)| (name.to_string(), *ok))
                    .collect(),
                calls: AtomicUsize::new(0),
            }
        }
    }

    impl ServiceProbe for ScriptedProbe {
        fn check<'a>(&'a self, service: &'a ServiceDescriptor) -> BoxFuture<'a, CheckResult> {
            Box::pin(async move {
                self.calls.fetch_add(1, Ordering::SeqCst);
                let outcome = if self.healthy.get(&service.name).copied().unwrap_or(false) {
                    ProbeOutcome::responded(
                        true,
                        Duration::from_millis(1),
                        Diagnostics::Tcp {
                            connection_result: 0,
                        },
                    )
                } else {
                    ProbeOutcome::failed("connection refused")
                };
                CheckResult::stamp(service, outcome)
            })
        }
    }

    struct EventReporter(Events);

    impl Reporter for EventReporter {
        fn check_completed(&self, result: &CheckResult) {
            self.0
                .lock()
                .unwrap()
                .push(format!("check:{}", result.service_name));
        }

        fn recovery_finished(&self, outcome: &RecoveryOutcome) {
            self.0
                .lock()
                .unwrap()
                .push(format!("recovered:{}", outcome.service));
        }
    }

    struct EventSink(Events);

    impl IncidentSink for EventSink {
        fn record(&self, incident: &Incident) -> std::io::Result<()> {
            self.0
                .lock()
                .unwrap()
                .push(format!("incident:{}:{}", incident.service_name, incident.detail));
            Ok(())
        }
    }

    struct EventCapability(Events);

    impl RecoveryCapability for EventCapability {
        fn execute<'a>(
            &'a self,
            service: &'a str,
            _step: &'a RecoveryStep,
        ) -> BoxFuture<'a, Result<(), ActionError>> {
            Box::pin(async move {
                self.0.lock().unwrap().push(format!("step:{service}"));
                Ok(())
            })
        }
    }

    fn service(name: &str, recovery: RecoveryAction) -> ServiceDescriptor {
        ServiceDescriptor {
            name: name.to_string(),
            kind: ServiceKind::Tcp {
                host: "127.0.0.1".to_string(),
                port: 9,
            },
            timeout: Duration::from_secs(1),
            recovery,
        }
    }

    fn config(services: Vec<ServiceDescriptor>) -> MonitorConfig {
        MonitorConfig {
            services,
            check_interval: Duration::from_secs(30),
        }
    }

    fn three_services() -> MonitorConfig {
        config(vec![
            service("api", RecoveryAction::default()),
            service("db", RecoveryAction::Restart { command: None }),
            service("sbc", RecoveryAction::Unknown("unknown_action".to_string())),
        ])
    }

    fn probe() -> Arc<ScriptedProbe> {
        Arc::new(ScriptedProbe::new(&[("api", true), ("db", false), ("sbc", false)]))
    }

    #[tokio::test]
    async fn cycle_preserves_order_and_counts() {
        let mut monitor = Monitor::new(three_services(), probe());

        let report = monitor.run_cycle().await;
        let names: Vec<_> = report.results.iter().map(|r| r.service_name.as_str()).collect();
        assert_eq!(names, ["api", "db", "sbc"]);
        assert_eq!(report.healthy_count(), 1);

        let stats = monitor.stats();
        assert_eq!(stats.total_checks, 3);
        assert_eq!(stats.total_checks, stats.healthy_checks + stats.unhealthy_checks);
        assert_eq!(stats.unhealthy_checks, 2);
        assert_eq!(stats.recoveries_attempted, 0);
        assert_eq!(monitor.phase(), MonitorPhase::Idle);
        assert_eq!(monitor.cycles(), 1);
    }

    #[tokio::test]
    async fn one_incident_per_unhealthy_check() {
        let events: Events = Arc::default();
        let mut monitor = Monitor::new(three_services(), probe())
            .with_incident_sink(Arc::new(EventSink(events.clone())));

        monitor.run_cycle().await;
        monitor.run_cycle().await;

        let incidents: Vec<_> = events
            .lock()
            .unwrap()
            .iter()
            .filter(|e| e.starts_with("incident:"))
            .cloned()
            .collect();
        assert_eq!(
            incidents,
            [
                "incident:db:connection refused",
                "incident:sbc:connection refused",
                "incident:db:connection refused",
                "incident:sbc:connection refused",
            ]
        );
    }

    #[tokio::test]
    async fn recovery_runs_between_presentation_and_incident() {
        let events: Events = Arc::default();
        let engine = RecoveryEngine::new(
            RecoveryState::new(),
            Arc::new(EventCapability(events.clone())),
        );
        let mut monitor = Monitor::new(config(vec![service("db", RecoveryAction::default())]), probe())
            .with_recovery(engine)
            .with_reporter(Arc::new(EventReporter(events.clone())))
            .with_incident_sink(Arc::new(EventSink(events.clone())));

        monitor.run_cycle().await;

        assert_eq!(
            *events.lock().unwrap(),
            [
                "check:db",
                "step:db",
                "recovered:db",
                "incident:db:connection refused",
            ]
        );
    }

    #[tokio::test]
    async fn recovery_statistics_follow_outcomes() {
        let engine = RecoveryEngine::new(
            RecoveryState::new(),
            Arc::new(EventCapability(Arc::default())),
        );
        let mut monitor = Monitor::new(three_services(), probe()).with_recovery(engine);

        let report = monitor.run_cycle().await;
        assert_eq!(report.recoveries.len(), 2);

        // db restarts fine; sbc has an unknown action.
        let stats = monitor.stats();
        assert_eq!(stats.recoveries_attempted, 2);
        assert_eq!(stats.recoveries_successful, 1);

        monitor.run_cycle().await;
        let state = monitor.recovery().unwrap().state();
        assert_eq!(state.attempts("db"), 2);
        assert_eq!(state.attempts("sbc"), 2);
        assert_eq!(state.attempts("api"), 0);
    }

    #[tokio::test]
    async fn repeated_cycles_classify_identically() {
        let mut monitor = Monitor::new(three_services(), probe());

        let first: Vec<_> = monitor.run_cycle().await.results.iter().map(|r| r.healthy()).collect();
        let second: Vec<_> = monitor.run_cycle().await.results.iter().map(|r| r.healthy()).collect();
        assert_eq!(first, second);
        assert_eq!(monitor.stats().total_checks, 6);
    }

    #[tokio::test]
    async fn failing_incident_sink_does_not_stop_cycle() {
        struct BrokenSink;
        impl IncidentSink for BrokenSink {
            fn record(&self, _incident: &Incident) -> std::io::Result<()> {
                Err(std::io::Error::other("disk full"))
            }
        }

        let mut monitor =
            Monitor::new(three_services(), probe()).with_incident_sink(Arc::new(BrokenSink));
        let report = monitor.run_cycle().await;
        assert_eq!(report.total(), 3);
    }

    #[tokio::test]
    async fn incidents_are_written_off_the_runtime_thread() {
        struct ThreadSink(Mutex<Vec<std::thread::ThreadId>>);
        impl IncidentSink for ThreadSink {
            fn record(&self, _incident: &Incident) -> std::io::Result<()> {
                self.0.lock().unwrap().push(std::thread::current().id());
                Ok(())
            }
        }

        let sink = Arc::new(ThreadSink(Mutex::default()));
        let mut monitor =
            Monitor::new(three_services(), probe()).with_incident_sink(sink.clone());
        monitor.run_cycle().await;

        let runtime_thread = std::thread::current().id();
        let writers = sink.0.lock().unwrap();
        assert_eq!(writers.len(), 2);
        assert!(writers.iter().all(|id| *id != runtime_thread));
    }

    #[tokio::test(start_paused = true)]
    async fn run_cycles_until_shutdown() {
        let probe = probe();
        let mut monitor = Monitor::new(three_services(), probe.clone());
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let handle = tokio::spawn(async move {
            let stats = monitor.run(shutdown_rx).await;
            (stats, monitor.phase())
        });

        // Cycles start at t=0 and t=30s.
        tokio::time::sleep(Duration::from_secs(45)).await;
        shutdown_tx.send(true).unwrap();

        let (stats, phase) = handle.await.unwrap();
        assert_eq!(phase, MonitorPhase::ShuttingDown);
        assert_eq!(stats.total_checks, 6);
        assert_eq!(probe.calls.load(Ordering::SeqCst), 6);
    }

    #[tokio::test]
    async fn shutdown_before_start_runs_no_cycle() {
        let probe = probe();
        let mut monitor = Monitor::new(three_services(), probe.clone());
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        shutdown_tx.send(true).unwrap();

        let stats = monitor.run(shutdown_rx).await;
        assert_eq!(stats, CycleStatistics::default());
        assert_eq!(probe.calls.load(Ordering::SeqCst), 0);
        assert_eq!(monitor.phase(), MonitorPhase::ShuttingDown);
    }

    #[tokio::test]
    async fn dropped_sender_stops_after_current_cycle() {
        let mut monitor = Monitor::new(three_services(), probe());
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        drop(shutdown_tx);

        let stats = monitor.run(shutdown_rx).await;
        assert_eq!(stats.total_checks, 3);
    }
}
