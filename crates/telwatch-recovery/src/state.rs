//! Per-service recovery attempt counters.

use std::collections::HashMap;

/// Recovery attempts keyed by service name.
///
/// Counters only grow. They live as long as the owning engine and are
/// never persisted.
#[derive(Debug, Clone, Default)]
pub struct RecoveryState {
    attempts: HashMap<String, u32>,
}

impl RecoveryState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one more attempt for `service` and return the new total.
    pub fn record_attempt(&mut self, service: &str) -> u32 {
        let count = self.attempts.entry(service.to_string()).or_insert(0);
        *count = count.saturating_add(1);
        *count
    }

    /// Attempts recorded for `service` so far.
    pub fn attempts(&self, service: &str) -> u32 {
        self.attempts.get(service).copied().unwrap_or(0)
    }

    /// Attempts across all services.
    pub fn total_attempts(&self) -> u64 {
        self.attempts.values().map(|&n| u64::from(n)).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_empty() {
        let state = RecoveryState::new();
        assert_eq!(state.attempts("sbc"), 0);
        assert_eq!(state.total_attempts(), 0);
    }

    #[test]
    fn counts_per_service() {
        let mut state = RecoveryState::new();
        assert_eq!(state.record_attempt("sbc"), 1);
        assert_eq!(state.record_attempt("sbc"), 2);
        assert_eq!(state.record_attempt("pbx"), 1);

        assert_eq!(state.attempts("sbc"), 2);
        assert_eq!(state.attempts("pbx"), 1);
        assert_eq!(state.total_attempts(), 3);
    }
}
