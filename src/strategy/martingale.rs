//! Martingale-style escalation.
//!
//! Multiply the stake by a configured factor after each loss, reset to the
//! base bet on a win. The 1.2230 default comes from the softer escalation
//! used in practice rather than the classic doubling.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use super::{SequenceContext, StakePlan, StakingStrategy};
use crate::types::Side;

#[derive(Debug, Clone)]
pub struct MartingaleConfig {
    pub base_bet: Decimal,
    /// Loss multiplier, > 1.
    pub multiplier: Decimal,
}

impl Default for MartingaleConfig {
    fn default() -> Self {
        Self {
            base_bet: dec!(1),
            multiplier: dec!(1.2230),
        }
    }
}

pub struct Martingale {
    config: MartingaleConfig,
}

impl Martingale {
    pub fn new(config: MartingaleConfig) -> Self {
        Self { config }
    }
}

impl StakingStrategy for Martingale {
    fn tag(&self) -> &'static str {
        "MARTIN"
    }

    fn open(&self, entry_side: Side) -> StakePlan {
        StakePlan {
            size: self.config.base_bet,
            side: entry_side,
        }
    }

    fn next(&self, ctx: &SequenceContext) -> StakePlan {
        let size = if ctx.last_won {
            self.config.base_bet
        } else {
            ctx.last_stake * self.config.multiplier
        };
        StakePlan {
            size,
            side: ctx.last_side,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx(last_stake: Decimal, last_won: bool) -> SequenceContext {
        SequenceContext {
            entry_side: Side::Over,
            last_side: Side::Over,
            last_stake,
            last_won,
            last_outcome: if last_won { Side::Over } else { Side::Under },
            loss_streak: if last_won { 0 } else { 1 },
        }
    }

    #[test]
    fn test_loss_escalates() {
        let law = Martingale::new(MartingaleConfig {
            base_bet: dec!(1),
            multiplier: dec!(2),
        });
        let plan = law.next(&ctx(dec!(4), false));
        assert_eq!(plan.size, dec!(8));
    }

    #[test]
    fn test_win_resets_to_base() {
        let law = Martingale::new(MartingaleConfig {
            base_bet: dec!(1),
            multiplier: dec!(2),
        });
        let plan = law.next(&ctx(dec!(8), true));
        assert_eq!(plan.size, dec!(1));
    }

    #[test]
    fn test_default_soft_multiplier() {
        let law = Martingale::new(MartingaleConfig::default());
        let plan = law.next(&ctx(dec!(1), false));
        assert_eq!(plan.size, dec!(1.2230));
    }

    #[test]
    fn test_no_floor_by_default() {
        let law = Martingale::new(MartingaleConfig::default());
        assert_eq!(law.stop_floor(), Decimal::ZERO);
    }
}
