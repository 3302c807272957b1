//! Mode tracker — reporting-only trend detection.
//!
//! Runs beside the staking engine over the same outcome stream but never
//! influences a bet. A SYNC mode opens when the rolling z-score shows a
//! sustained excess of Over outcomes (ANTI-SYNC for Under), accrues a
//! continuation streak while the trend holds, and closes on reversal,
//! timeout, or session end. At most one mode is open at a time.

use tracing::info;

use crate::stats::history::OutcomeHistory;
use crate::types::{ModeEndReason, ModeReport, ModeType, Side};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct ModeConfig {
    /// Rolling window the mode statistic is computed over.
    pub window: usize,
    /// |z| that opens a mode.
    pub z_entry: f64,
    /// Label count difference (against the trend) that closes a mode.
    pub reversal_diff: u64,
    /// Trials after which an open mode times out.
    pub max_trials_without_reversal: u64,
}

impl Default for ModeConfig {
    fn default() -> Self {
        Self {
            window: 30,
            z_entry: 2.0,
            reversal_diff: 5,
            max_trials_without_reversal: 100,
        }
    }
}

// ---------------------------------------------------------------------------
// Tracker
// ---------------------------------------------------------------------------

#[derive(Debug)]
struct OpenMode {
    mode_type: ModeType,
    start_index: u64,
    trigger_z: f64,
    continuation_streak: u32,
    max_continuation: u32,
}

pub struct ModeTracker {
    config: ModeConfig,
    window: OutcomeHistory,
    open: Option<OpenMode>,
    reports: Vec<ModeReport>,
}

impl ModeTracker {
    pub fn new(config: ModeConfig) -> Self {
        let window = OutcomeHistory::rolling(config.window);
        Self {
            config,
            window,
            open: None,
            reports: Vec::new(),
        }
    }

    /// Feed one outcome. `index` is the 1-based trial number.
    pub fn observe(&mut self, index: u64, label: Side) {
        self.window.push(label);
        if !self.window.is_ready() {
            return;
        }

        let z = self.window.z_score();

        match &mut self.open {
            None => {
                let mode_type = if z >= self.config.z_entry {
                    Some(ModeType::Sync)
                } else if z <= -self.config.z_entry {
                    Some(ModeType::AntiSync)
                } else {
                    None
                };

                if let Some(mode_type) = mode_type {
                    info!(index, %mode_type, z = format!("{z:.3}"), "Mode start");
                    self.open = Some(OpenMode {
                        mode_type,
                        start_index: index,
                        trigger_z: z,
                        continuation_streak: 0,
                        max_continuation: 0,
                    });
                }
            }
            Some(mode) => {
                if label == mode.mode_type.trend_side() {
                    mode.continuation_streak += 1;
                    mode.max_continuation =
                        mode.max_continuation.max(mode.continuation_streak);
                } else {
                    mode.continuation_streak = 0;
                }

                // Reversal: the counter-trend label leads by the configured
                // difference within the window.
                let (trend, counter) = match mode.mode_type {
                    ModeType::Sync => (self.window.over_count(), self.window.under_count()),
                    ModeType::AntiSync => (self.window.under_count(), self.window.over_count()),
                };
                if counter >= trend + self.config.reversal_diff {
                    self.close(index, ModeEndReason::Reversal);
                } else if index - mode.start_index >= self.config.max_trials_without_reversal {
                    self.close(index, ModeEndReason::Timeout);
                }
            }
        }
    }

    /// Close any open mode at session end.
    pub fn finish(&mut self, index: u64) {
        if let Some(mode) = &self.open {
            let reason = if index - mode.start_index >= self.config.max_trials_without_reversal
            {
                ModeEndReason::Timeout
            } else {
                ModeEndReason::SimEnd
            };
            self.close(index, reason);
        }
    }

    pub fn reports(&self) -> &[ModeReport] {
        &self.reports
    }

    pub fn is_open(&self) -> bool {
        self.open.is_some()
    }

    fn close(&mut self, end_index: u64, end_reason: ModeEndReason) {
        if let Some(mode) = self.open.take() {
            info!(
                index = end_index,
                mode_type = %mode.mode_type,
                reason = %end_reason,
                max_continuation = mode.max_continuation,
                duration = end_index - mode.start_index,
                "Mode end"
            );
            self.reports.push(ModeReport {
                mode_type: mode.mode_type,
                start_index: mode.start_index,
                trigger_z: mode.trigger_z,
                end_index,
                end_reason,
                max_continuation: mode.max_continuation,
            });
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn tracker(window: usize, z_entry: f64, reversal_diff: u64, timeout: u64) -> ModeTracker {
        ModeTracker::new(ModeConfig {
            window,
            z_entry,
            reversal_diff,
            max_trials_without_reversal: timeout,
        })
    }

    /// Feed labels sequentially starting at trial `start`.
    fn feed(t: &mut ModeTracker, start: u64, labels: &[Side]) -> u64 {
        let mut index = start;
        for &label in labels {
            index += 1;
            t.observe(index, label);
        }
        index
    }

    #[test]
    fn test_no_mode_until_window_full() {
        let mut t = tracker(10, 1.0, 5, 100);
        feed(&mut t, 0, &[Side::Over; 9]);
        assert!(!t.is_open());
        feed(&mut t, 9, &[Side::Over; 1]);
        assert!(t.is_open());
    }

    #[test]
    fn test_sync_opens_on_over_excess() {
        let mut t = tracker(10, 1.9, 5, 100);
        // 10 straight Overs: z = (10 - 5) / sqrt(2.5) ≈ 3.16
        let idx = feed(&mut t, 0, &[Side::Over; 10]);
        assert!(t.is_open());
        assert_eq!(idx, 10);
    }

    #[test]
    fn test_anti_sync_opens_on_under_excess() {
        let mut t = tracker(10, 1.9, 5, 100);
        feed(&mut t, 0, &[Side::Under; 10]);
        assert!(t.is_open());
        t.finish(10);
        assert_eq!(t.reports()[0].mode_type, ModeType::AntiSync);
    }

    #[test]
    fn test_reversal_closes_mode() {
        let mut t = tracker(10, 1.9, 5, 1000);
        let idx = feed(&mut t, 0, &[Side::Over; 10]);
        // Unders flow in until the window shows 5 more Under than Over.
        let idx = feed(&mut t, idx, &[Side::Under; 8]);
        assert!(!t.is_open());
        let report = &t.reports()[0];
        assert_eq!(report.end_reason, ModeEndReason::Reversal);
        assert!(report.end_index <= idx);
    }

    #[test]
    fn test_timeout_closes_mode() {
        let mut t = tracker(10, 1.9, 50, 20);
        let idx = feed(&mut t, 0, &[Side::Over; 10]);
        // Alternate so no reversal diff accumulates.
        let mut labels = Vec::new();
        for i in 0..30 {
            labels.push(if i % 2 == 0 { Side::Under } else { Side::Over });
        }
        feed(&mut t, idx, &labels);
        assert!(!t.is_open());
        assert_eq!(t.reports()[0].end_reason, ModeEndReason::Timeout);
    }

    #[test]
    fn test_sim_end_closes_open_mode() {
        let mut t = tracker(10, 1.9, 5, 100);
        let idx = feed(&mut t, 0, &[Side::Over; 10]);
        t.finish(idx);
        assert!(!t.is_open());
        assert_eq!(t.reports()[0].end_reason, ModeEndReason::SimEnd);
    }

    #[test]
    fn test_max_continuation_tracked() {
        let mut t = tracker(10, 1.9, 50, 1000);
        let idx = feed(&mut t, 0, &[Side::Over; 10]);
        // 3 continuations, a break, then 2 more.
        feed(
            &mut t,
            idx,
            &[
                Side::Over,
                Side::Over,
                Side::Over,
                Side::Under,
                Side::Over,
                Side::Over,
            ],
        );
        t.finish(idx + 6);
        assert_eq!(t.reports()[0].max_continuation, 3);
    }

    #[test]
    fn test_at_most_one_open_mode() {
        let mut t = tracker(10, 1.9, 5, 100);
        let idx = feed(&mut t, 0, &[Side::Over; 10]);
        // Still extreme — no second mode may open on top.
        feed(&mut t, idx, &[Side::Over; 5]);
        assert!(t.is_open());
        assert!(t.reports().is_empty());
    }

    #[test]
    fn test_new_mode_can_open_after_close() {
        let mut t = tracker(10, 1.9, 5, 1000);
        let idx = feed(&mut t, 0, &[Side::Over; 10]);
        let idx = feed(&mut t, idx, &[Side::Under; 8]); // reversal
        assert!(!t.is_open());
        // Keep feeding Unders: the window goes all-Under, ANTI-SYNC opens.
        feed(&mut t, idx, &[Side::Under; 4]);
        assert!(t.is_open());
        t.finish(idx + 4);
        assert_eq!(t.reports().len(), 2);
        assert_eq!(t.reports()[1].mode_type, ModeType::AntiSync);
    }
}
