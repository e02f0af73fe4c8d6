//! Recovery engine — turns a failed check into recovery steps.

use std::sync::Arc;

use tracing::{info, warn};

use telwatch_config::{RecoveryAction, ServiceDescriptor};
use telwatch_health::CheckResult;

use crate::capability::{RecoveryCapability, RecoveryStep};
use crate::state::RecoveryState;

/// How one recovery attempt ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecoveryStatus {
    /// Every step of the action ran.
    Completed,
    /// A capability step failed; later steps did not run.
    Failed { reason: String },
    /// Nothing ran because the action is not recognised.
    Skipped { reason: String },
}

/// Result of one [`RecoveryEngine::recover`] call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecoveryOutcome {
    pub service: String,
    pub action: String,
    /// Attempt number for this service, starting at 1.
    pub attempt: u32,
    pub status: RecoveryStatus,
}

impl RecoveryOutcome {
    /// Whether the attempt counts as a successful recovery.
    ///
    /// This reflects the attempt, not whether the service came back.
    pub fn succeeded(&self) -> bool {
        self.status == RecoveryStatus::Completed
    }
}

/// Dispatches recovery actions and tracks attempts per service.
pub struct RecoveryEngine {
    state: RecoveryState,
    capability: Arc<dyn RecoveryCapability>,
}

impl RecoveryEngine {
    /// Create an engine with an explicit state and capability.
    pub fn new(state: RecoveryState, capability: Arc<dyn RecoveryCapability>) -> Self {
        Self { state, capability }
    }

    /// Attempt counters so far.
    pub fn state(&self) -> &RecoveryState {
        &self.state
    }

    /// Run the recovery action configured for `service`.
    ///
    /// The attempt counter is bumped before anything else, so unknown
    /// actions still count. Failover and restart stop at the first failed
    /// step; alert is fire-and-forget and always succeeds.
    pub async fn recover(
        &mut self,
        service: &ServiceDescriptor,
        result: &CheckResult,
    ) -> RecoveryOutcome {
        let attempt = self.state.record_attempt(&service.name);
        let action = service.recovery.name().to_string();

        info!(
            service = %service.name,
            %action,
            attempt,
            error = result.error().unwrap_or("unhealthy"),
            "recovery triggered"
        );

        let status = match &service.recovery {
            RecoveryAction::Failover { target } => {
                let target = RecoveryAction::failover_target(target.as_deref()).to_string();
                self.run_steps(
                    &service.name,
                    vec![
                        RecoveryStep::MarkPrimaryDown {
                            target: target.clone(),
                        },
                        RecoveryStep::UpdateRouting {
                            target: target.clone(),
                        },
                        RecoveryStep::VerifyBackup { target },
                    ],
                )
                .await
            }
            RecoveryAction::Restart { command } => {
                let command = RecoveryAction::restart_command(command.as_deref()).to_string();
                self.run_steps(
                    &service.name,
                    vec![
                        RecoveryStep::StopService {
                            command: command.clone(),
                        },
                        RecoveryStep::StartService {
                            command: command.clone(),
                        },
                        RecoveryStep::VerifyService { command },
                    ],
                )
                .await
            }
            RecoveryAction::Alert { message } => {
                let step = RecoveryStep::Notify {
                    message: RecoveryAction::alert_message(message.as_deref(), &service.name),
                };
                if let Err(e) = self.capability.execute(&service.name, &step).await {
                    warn!(service = %service.name, error = %e, "alert delivery not confirmed");
                }
                RecoveryStatus::Completed
            }
            RecoveryAction::Unknown(name) => {
                warn!(service = %service.name, action = %name, "unknown recovery action");
                RecoveryStatus::Skipped {
                    reason: format!("Unknown recovery action: {name}"),
                }
            }
        };

        match &status {
            RecoveryStatus::Completed => {
                info!(service = %service.name, %action, attempt, "recovery completed")
            }
            RecoveryStatus::Failed { reason } => {
                warn!(service = %service.name, %action, attempt, %reason, "recovery failed")
            }
            RecoveryStatus::Skipped { .. } => {}
        }

        RecoveryOutcome {
            service: service.name.clone(),
            action,
            attempt,
            status,
        }
    }

    async fn run_steps(&self, service: &str, steps: Vec<RecoveryStep>) -> RecoveryStatus {
        let total = steps.len();
        for (index, step) in steps.iter().enumerate() {
            info!(%service, step = index + 1, total, "{step}");
            if let Err(e) = self.capability.execute(service, step).await {
                return RecoveryStatus::Failed {
                    reason: format!("{step}: {e}"),
                };
            }
        }
        RecoveryStatus::Completed
    }
}
