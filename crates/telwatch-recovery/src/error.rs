//! Errors reported by recovery capabilities.

use thiserror::Error;

/// A recovery step that could not be carried out.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ActionError {
    #[error("step failed: {0}")]
    Failed(String),
}
