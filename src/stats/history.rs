//! Outcome history with two retention policies.
//!
//! Both policies expose the same readiness and z-score interface, so the
//! session can treat the statistic source as a swappable component. Counts
//! are maintained incrementally — inserting into a rolling window is O(1),
//! not a recount of the window.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

use crate::types::Side;

/// How much history the statistic is computed over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Retention {
    /// All outcomes since session start; trustworthy after `min_samples`.
    Cumulative { min_samples: usize },
    /// Last `window` outcomes, FIFO-evicted; trustworthy at a full window.
    Rolling { window: usize },
}

/// Ordered outcome labels plus incremental counters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutcomeHistory {
    retention: Retention,
    labels: VecDeque<Side>,
    over_count: u64,
    /// Outcomes ever pushed, including any evicted from a rolling window.
    seen: u64,
}

impl OutcomeHistory {
    pub fn cumulative(min_samples: usize) -> Self {
        Self {
            retention: Retention::Cumulative { min_samples },
            labels: VecDeque::new(),
            over_count: 0,
            seen: 0,
        }
    }

    pub fn rolling(window: usize) -> Self {
        Self {
            retention: Retention::Rolling { window },
            labels: VecDeque::with_capacity(window + 1),
            over_count: 0,
            seen: 0,
        }
    }

    pub fn retention(&self) -> Retention {
        self.retention
    }

    /// Insert one outcome, evicting the oldest when a rolling window is
    /// full.
    pub fn push(&mut self, label: Side) {
        self.labels.push_back(label);
        if label == Side::Over {
            self.over_count += 1;
        }
        self.seen += 1;

        if let Retention::Rolling { window } = self.retention {
            if self.labels.len() > window {
                if let Some(evicted) = self.labels.pop_front() {
                    if evicted == Side::Over {
                        self.over_count -= 1;
                    }
                }
            }
        }
    }

    /// Retained outcomes (window size once a rolling window is full).
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Outcomes ever observed, eviction included.
    pub fn seen(&self) -> u64 {
        self.seen
    }

    pub fn over_count(&self) -> u64 {
        self.over_count
    }

    pub fn under_count(&self) -> u64 {
        self.labels.len() as u64 - self.over_count
    }

    /// Whether enough history has accumulated for the statistic to be
    /// trustworthy.
    pub fn is_ready(&self) -> bool {
        match self.retention {
            Retention::Cumulative { min_samples } => self.labels.len() >= min_samples,
            Retention::Rolling { window } => self.labels.len() == window,
        }
    }

    /// Binomial z-score over the retained outcomes (0.0 while empty).
    pub fn z_score(&self) -> f64 {
        super::binomial_z(self.over_count, self.labels.len() as u64)
    }

    /// Retained labels, oldest first.
    pub fn labels(&self) -> impl Iterator<Item = Side> + '_ {
        self.labels.iter().copied()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rolling_window_size_invariant() {
        let window = 30;
        let mut h = OutcomeHistory::rolling(window);
        for i in 0..window + 17 {
            h.push(if i % 2 == 0 { Side::Over } else { Side::Under });
            assert!(h.len() <= window);
        }
        assert_eq!(h.len(), window);
        assert_eq!(h.seen(), (window + 17) as u64);
    }

    #[test]
    fn test_rolling_keeps_most_recent_in_order() {
        let mut h = OutcomeHistory::rolling(3);
        for label in [Side::Over, Side::Over, Side::Under, Side::Under, Side::Over] {
            h.push(label);
        }
        let retained: Vec<Side> = h.labels().collect();
        assert_eq!(retained, vec![Side::Under, Side::Under, Side::Over]);
    }

    #[test]
    fn test_rolling_incremental_counts_match_recount() {
        let mut h = OutcomeHistory::rolling(10);
        let pattern = [
            Side::Over, Side::Under, Side::Over, Side::Over, Side::Under,
            Side::Over, Side::Under, Side::Under, Side::Over, Side::Over,
            Side::Under, Side::Over, Side::Over,
        ];
        for label in pattern {
            h.push(label);
            let recount = h.labels().filter(|&l| l == Side::Over).count() as u64;
            assert_eq!(h.over_count(), recount);
            assert_eq!(h.under_count() + h.over_count(), h.len() as u64);
        }
    }

    #[test]
    fn test_cumulative_never_evicts() {
        let mut h = OutcomeHistory::cumulative(30);
        for _ in 0..100 {
            h.push(Side::Over);
        }
        assert_eq!(h.len(), 100);
        assert_eq!(h.over_count(), 100);
    }

    #[test]
    fn test_readiness() {
        let mut cum = OutcomeHistory::cumulative(3);
        let mut roll = OutcomeHistory::rolling(3);
        for _ in 0..2 {
            cum.push(Side::Over);
            roll.push(Side::Over);
            assert!(!cum.is_ready());
            assert!(!roll.is_ready());
        }
        cum.push(Side::Under);
        roll.push(Side::Under);
        assert!(cum.is_ready());
        assert!(roll.is_ready());
    }

    #[test]
    fn test_empty_history_z_is_neutral() {
        let h = OutcomeHistory::rolling(30);
        assert_eq!(h.z_score(), 0.0);
    }

    #[test]
    fn test_z_over_window() {
        let mut h = OutcomeHistory::rolling(30);
        for i in 0..30 {
            h.push(if i < 20 { Side::Over } else { Side::Under });
        }
        assert!((h.z_score() - 1.8257418583505538).abs() < 1e-12);
    }
}
