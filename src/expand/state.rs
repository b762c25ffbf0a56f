//! Expansion bookkeeping and the termination rule for dynamic listings.

use crate::config::Config;
use std::time::Duration;

/// Rounds without height growth after which a listing counts as settled.
pub const IDLE_ROUNDS: u32 = 3;

/// Ceilings for one expansion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExpansionLimits {
    /// Maximum number of rounds, at least 1.
    pub max_rounds: u32,
    /// Wall-clock budget for the whole expansion.
    pub budget: Duration,
    /// Stable rounds required before stopping.
    pub idle_rounds: u32,
}

impl ExpansionLimits {
    pub fn new(max_rounds: u32, budget: Duration) -> Self {
        Self { max_rounds: max_rounds.max(1), budget, idle_rounds: IDLE_ROUNDS }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.max_expand_rounds, Duration::from_millis(config.expand_budget_ms))
    }
}

/// Measurements carried from round to round.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExpansionState {
    /// Entries counted in the rendered document after the last round.
    pub rendered_entry_count: u64,
    /// Document height after the last round.
    pub document_height: u64,
    /// Consecutive rounds in which the height did not grow.
    pub stable_rounds: u32,
    /// Rounds completed so far.
    pub round: u32,
}

impl ExpansionState {
    /// Records the measurements taken at the end of a round.
    pub fn record_round(&mut self, height: u64, entry_count: u64) {
        self.round += 1;
        if height > self.document_height {
            self.stable_rounds = 0;
        } else {
            self.stable_rounds += 1;
        }
        self.document_height = height;
        self.rendered_entry_count = entry_count;
    }
}

/// Why an expansion ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The height stopped growing and nothing was left to click.
    Settled,
    /// The round ceiling was reached.
    RoundLimit,
    /// The wall-clock budget ran out.
    Deadline,
}

/// Decides, after a round, whether expansion stops.
///
/// `clicked` tells whether the round activated a load-more control.
pub fn should_stop(
    state: &ExpansionState,
    clicked: bool,
    elapsed: Duration,
    limits: &ExpansionLimits,
) -> Option<StopReason> {
    if state.stable_rounds >= limits.idle_rounds && !clicked {
        Some(StopReason::Settled)
    } else if state.round >= limits.max_rounds {
        Some(StopReason::RoundLimit)
    } else if elapsed >= limits.budget {
        Some(StopReason::Deadline)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limits() -> ExpansionLimits {
        ExpansionLimits::new(30, Duration::from_secs(60))
    }

    #[test]
    fn test_height_growth_resets_stability() {
        let mut state = ExpansionState::default();
        state.record_round(1000, 10);
        assert_eq!(state.stable_rounds, 0);
        state.record_round(1000, 10);
        state.record_round(1000, 10);
        assert_eq!(state.stable_rounds, 2);
        state.record_round(1500, 20);
        assert_eq!(state.stable_rounds, 0);
        assert_eq!(state.round, 4);
        assert_eq!(state.rendered_entry_count, 20);
    }

    #[test]
    fn test_shrinking_height_counts_as_stable() {
        let mut state = ExpansionState::default();
        state.record_round(2000, 5);
        state.record_round(1800, 5);
        assert_eq!(state.stable_rounds, 1);
        assert_eq!(state.document_height, 1800);
    }

    #[test]
    fn test_constant_height_settles_after_idle_rounds() {
        let limits = limits();
        let mut state = ExpansionState::default();
        let mut rounds = 0;
        loop {
            state.record_round(1200, 8);
            rounds += 1;
            if let Some(reason) = should_stop(&state, false, Duration::ZERO, &limits) {
                assert_eq!(reason, StopReason::Settled);
                break;
            }
        }
        assert!(rounds <= 4);
    }

    #[test]
    fn test_click_keeps_expansion_alive() {
        let state = ExpansionState { stable_rounds: 5, round: 5, ..Default::default() };
        assert_eq!(should_stop(&state, true, Duration::ZERO, &limits()), None);
        assert_eq!(
            should_stop(&state, false, Duration::ZERO, &limits()),
            Some(StopReason::Settled)
        );
    }

    #[test]
    fn test_round_limit() {
        let limits = ExpansionLimits::new(2, Duration::from_secs(60));
        let state = ExpansionState { round: 2, ..Default::default() };
        assert_eq!(should_stop(&state, true, Duration::ZERO, &limits), Some(StopReason::RoundLimit));
    }

    #[test]
    fn test_deadline() {
        let state = ExpansionState { round: 1, ..Default::default() };
        assert_eq!(
            should_stop(&state, true, Duration::from_secs(61), &limits()),
            Some(StopReason::Deadline)
        );
    }

    #[test]
    fn test_zero_rounds_clamped() {
        assert_eq!(ExpansionLimits::new(0, Duration::ZERO).max_rounds, 1);
    }

    #[test]
    fn test_limits_from_config() {
        let config = Config { max_expand_rounds: 7, expand_budget_ms: 1500, ..Config::default() };
        let limits = ExpansionLimits::from_config(&config);
        assert_eq!(limits.max_rounds, 7);
        assert_eq!(limits.budget, Duration::from_millis(1500));
        assert_eq!(limits.idle_rounds, IDLE_ROUNDS);
    }
}
