//! D'Alembert staking.
//!
//! One step unit down after a win, one step unit up after a loss, never
//! below the floor. The side committed at sequence entry is kept for the
//! whole sequence.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use super::{SequenceContext, StakePlan, StakingStrategy};
use crate::types::Side;

#[derive(Debug, Clone)]
pub struct DalembertConfig {
    pub base_bet: Decimal,
    /// Unit added on a loss, subtracted on a win.
    pub step: Decimal,
    /// Lowest stake the law will compute; also the hybrid-stop floor.
    pub floor: Decimal,
}

impl Default for DalembertConfig {
    fn default() -> Self {
        Self {
            base_bet: dec!(0.20),
            step: dec!(0.02),
            floor: dec!(0.02),
        }
    }
}

pub struct Dalembert {
    config: DalembertConfig,
}

impl Dalembert {
    pub fn new(config: DalembertConfig) -> Self {
        Self { config }
    }
}

impl StakingStrategy for Dalembert {
    fn tag(&self) -> &'static str {
        "DALEM"
    }

    fn open(&self, entry_side: Side) -> StakePlan {
        StakePlan {
            size: self.config.base_bet,
            side: entry_side,
        }
    }

    fn next(&self, ctx: &SequenceContext) -> StakePlan {
        let size = if ctx.last_won {
            (ctx.last_stake - self.config.step).max(self.config.floor)
        } else {
            ctx.last_stake + self.config.step
        };
        StakePlan {
            size,
            side: ctx.last_side,
        }
    }

    fn stop_floor(&self) -> Decimal {
        self.config.floor
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
            entry_side: Side::Under,
            last_side: Side::Under,
            last_stake,
            last_won,
            last_outcome: if last_won { Side::Under } else { Side::Over },
            loss_streak: if last_won { 0 } else { 1 },
        }
    }

    #[test]
    fn test_loss_then_win_returns_to_base() {
        let law = Dalembert::new(DalembertConfig::default());
        let opening = law.open(Side::Under);
        assert_eq!(opening.size, dec!(0.20));

        let after_loss = law.next(&ctx(opening.size, false));
        assert_eq!(after_loss.size, dec!(0.22));

        let after_win = law.next(&ctx(after_loss.size, true));
        assert_eq!(after_win.size, dec!(0.20));
    }

    #[test]
    fn test_wins_clamp_at_floor() {
        let law = Dalembert::new(DalembertConfig::default());
        let plan = law.next(&ctx(dec!(0.02), true));
        assert_eq!(plan.size, dec!(0.02));
    }

    #[test]
    fn test_side_is_held_for_the_sequence() {
        let law = Dalembert::new(DalembertConfig::default());
        assert_eq!(law.open(Side::Over).side, Side::Over);
        let mut c = ctx(dec!(0.20), false);
        c.last_side = Side::Over;
        assert_eq!(law.next(&c).side, Side::Over);
    }

    #[test]
    fn test_stop_floor_is_one_step() {
        let law = Dalembert::new(DalembertConfig::default());
        assert_eq!(law.stop_floor(), dec!(0.02));
    }
}
