//! Flat-stake laws whose edge (such as it is) lives entirely in side
//! selection: follow the last outcome, or flip after a long losing run.

use rust_decimal::Decimal;

use super::{SequenceContext, StakePlan, StakingStrategy};
use crate::types::Side;

// ---------------------------------------------------------------------------
// Follow the winner
// ---------------------------------------------------------------------------

/// Fixed stake, always betting the side that just came up.
pub struct FollowTheWinner {
    bet: Decimal,
}

impl FollowTheWinner {
    pub fn new(bet: Decimal) -> Self {
        Self { bet }
    }
}

impl StakingStrategy for FollowTheWinner {
    fn tag(&self) -> &'static str {
        "FOLLOW"
    }

    fn open(&self, entry_side: Side) -> StakePlan {
        StakePlan {
            size: self.bet,
            side: entry_side,
        }
    }

    fn next(&self, ctx: &SequenceContext) -> StakePlan {
        StakePlan {
            size: self.bet,
            side: ctx.last_outcome,
        }
    }
}

// ---------------------------------------------------------------------------
// Fixed streak trigger
// ---------------------------------------------------------------------------

/// Fixed stake on the committed side, flipping direction once a losing
/// streak reaches the configured length.
pub struct StreakTrigger {
    bet: Decimal,
    flip_after: u32,
}

impl StreakTrigger {
    pub fn new(bet: Decimal, flip_after: u32) -> Self {
        Self { bet, flip_after }
    }
}

impl StakingStrategy for StreakTrigger {
    fn tag(&self) -> &'static str {
        "STREAK"
    }

    fn open(&self, entry_side: Side) -> StakePlan {
        StakePlan {
            size: self.bet,
            side: entry_side,
        }
    }

    fn next(&self, ctx: &SequenceContext) -> StakePlan {
        // Flip exactly when the streak hits the trigger length; a streak
        // that keeps running past it does not flip again.
        let side = if self.flip_after > 0 && ctx.loss_streak == self.flip_after {
            ctx.last_side.opposite()
        } else {
            ctx.last_side
        };
        StakePlan {
            size: self.bet,
            side,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn ctx(last_side: Side, last_outcome: Side, loss_streak: u32) -> SequenceContext {
        SequenceContext {
            entry_side: Side::Under,
            last_side,
            last_stake: dec!(1),
            last_won: loss_streak == 0,
            last_outcome,
            loss_streak,
        }
    }

    #[test]
    fn test_follow_the_winner_chases_last_outcome() {
        let law = FollowTheWinner::new(dec!(1));
        let plan = law.next(&ctx(Side::Under, Side::Over, 1));
        assert_eq!(plan.side, Side::Over);
        assert_eq!(plan.size, dec!(1));

        let plan = law.next(&ctx(Side::Over, Side::Under, 1));
        assert_eq!(plan.side, Side::Under);
    }

    #[test]
    fn test_streak_trigger_flips_at_threshold() {
        let law = StreakTrigger::new(dec!(1), 3);
        assert_eq!(law.next(&ctx(Side::Under, Side::Over, 2)).side, Side::Under);
        assert_eq!(law.next(&ctx(Side::Under, Side::Over, 3)).side, Side::Over);
        // Past the trigger the flipped side is held.
        assert_eq!(law.next(&ctx(Side::Over, Side::Under, 4)).side, Side::Over);
    }

    #[test]
    fn test_streak_trigger_stake_is_flat() {
        let law = StreakTrigger::new(dec!(0.50), 5);
        assert_eq!(law.open(Side::Over).size, dec!(0.50));
        assert_eq!(law.next(&ctx(Side::Over, Side::Under, 4)).size, dec!(0.50));
    }
}
