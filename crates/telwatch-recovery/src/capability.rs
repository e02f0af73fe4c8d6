//! Recovery capabilities — the boundary between deciding and doing.

use std::fmt;
use std::time::Duration;

use tracing::info;

use telwatch_health::BoxFuture;

use crate::error::ActionError;

/// One unit of recovery work handed to a capability.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecoveryStep {
    MarkPrimaryDown { target: String },
    UpdateRouting { target: String },
    VerifyBackup { target: String },
    StopService { command: String },
    StartService { command: String },
    VerifyService { command: String },
    Notify { message: String },
}

impl fmt::Display for RecoveryStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecoveryStep::MarkPrimaryDown { .. } => write!(f, "marking primary endpoint as down"),
            RecoveryStep::UpdateRouting { target } => write!(f, "updating routing tables to {target}"),
            RecoveryStep::VerifyBackup { target } => write!(f, "verifying backup endpoint {target}"),
            RecoveryStep::StopService { .. } => write!(f, "stopping service"),
            RecoveryStep::StartService { command } => write!(f, "starting service via `{command}`"),
            RecoveryStep::VerifyService { .. } => write!(f, "verifying service health"),
            RecoveryStep::Notify { message } => write!(f, "notifying on-call: {message}"),
        }
    }
}

/// Executes recovery steps against real infrastructure — injected for testability.
pub trait RecoveryCapability: Send + Sync {
    /// Carry out `step` on behalf of `service`.
    fn execute<'a>(
        &'a self,
        service: &'a str,
        step: &'a RecoveryStep,
    ) -> BoxFuture<'a, Result<(), ActionError>>;
}

/// Capability that only logs each step and waits a fixed delay.
///
/// Stands in for paging, routing, and restart integrations that are
/// deployment-specific.
#[derive(Debug, Clone)]
pub struct SimulatedCapability {
    step_delay: Duration,
}

impl SimulatedCapability {
    pub fn new(step_delay: Duration) -> Self {
        Self { step_delay }
    }
}

impl Default for SimulatedCapability {
    fn default() -> Self {
        Self::new(Duration::from_millis(500))
    }
}

impl RecoveryCapability for SimulatedCapability {
    fn execute<'a>(
        &'a self,
        service: &'a str,
        step: &'a RecoveryStep,
    ) -> BoxFuture<'a, Result<(), ActionError>> {
        Box::pin(async move {
            info!(%service, %step, "simulated recovery step");
            if !self.step_delay.is_zero() {
                tokio::time::sleep(self.step_delay).await;
            }
            Ok(())
        })
    }
}
