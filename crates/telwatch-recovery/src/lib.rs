//! telwatch-recovery — automatic recovery for unhealthy services.
//!
//! The [`RecoveryEngine`] maps a service's configured
//! [`RecoveryAction`](telwatch_config::RecoveryAction) to a fixed sequence
//! of [`RecoveryStep`]s and hands each step to an injected
//! [`RecoveryCapability`]. How a step physically reaches infrastructure is
//! the capability's business; the engine only decides what runs and counts
//! attempts in a [`RecoveryState`].
//!
//! # Actions
//!
//! ```text
//! failover → mark primary down → update routing → verify backup
//! restart  → stop service      → start service  → verify service
//! alert    → notify (always reported successful)
//! unknown  → nothing runs, reported unsuccessful
//! ```
//!
//! Every call to [`RecoveryEngine::recover`] counts as one attempt, whether
//! or not the action is recognised. There is no cooldown: a service that
//! stays unhealthy is re-recovered every cycle.

pub mod capability;
pub mod engine;
pub mod error;
pub mod state;

pub use capability::{RecoveryCapability, RecoveryStep, SimulatedCapability};
pub use engine::{RecoveryEngine, RecoveryOutcome, RecoveryStatus};
pub use error::ActionError;
pub use state::RecoveryState;
