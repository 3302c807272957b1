//! Staking strategies — pluggable laws that size the next stake and pick
//! its side from the rolling sequence state.
//!
//! The session owns when a sequence starts and stops; strategies only
//! answer "given how the last bet went, what do I stake next, and where".
//! Selection happens at configuration time through a tagged enum, not by
//! comparing strings at runtime.

pub mod dalembert;
pub mod martingale;
pub mod streak;

use rust_decimal::Decimal;
use serde::Deserialize;

use crate::error::EngineError;
use crate::types::Side;
pub use dalembert::{Dalembert, DalembertConfig};
pub use martingale::{Martingale, MartingaleConfig};
pub use streak::{FollowTheWinner, StreakTrigger};

// ---------------------------------------------------------------------------
// Strategy contract
// ---------------------------------------------------------------------------

/// The next bet a strategy wants placed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StakePlan {
    pub size: Decimal,
    pub side: Side,
}

/// Everything a strategy may look at when sizing the next bet of an active
/// sequence.
#[derive(Debug, Clone, Copy)]
pub struct SequenceContext {
    /// Side committed to when the sequence opened.
    pub entry_side: Side,
    /// Side and size of the bet that just resolved.
    pub last_side: Side,
    pub last_stake: Decimal,
    pub last_won: bool,
    /// The label that actually came up on the last draw.
    pub last_outcome: Side,
    /// Consecutive losses up to and including the last bet.
    pub loss_streak: u32,
}

/// A staking law. Implementations must be pure: same context in, same plan
/// out.
pub trait StakingStrategy: Send + Sync {
    /// Short tag recorded on every `BetRecord` this law sizes.
    fn tag(&self) -> &'static str;

    /// First bet of a fresh sequence.
    fn open(&self, entry_side: Side) -> StakePlan;

    /// Bet following a resolved one.
    fn next(&self, ctx: &SequenceContext) -> StakePlan;

    /// Hybrid-stop floor: the sequence ends once the next computed stake
    /// falls to or below this. Zero disables the floor condition.
    fn stop_floor(&self) -> Decimal {
        Decimal::ZERO
    }
}

// ---------------------------------------------------------------------------
// Configuration-time selection
// ---------------------------------------------------------------------------

/// Staking law selection, deserialized from the `[staking]` config table.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "law", rename_all = "snake_case")]
pub enum LawConfig {
    Dalembert {
        base_bet: Decimal,
        step: Decimal,
        /// Defaults to one step unit.
        floor: Option<Decimal>,
    },
    Martingale {
        base_bet: Decimal,
        multiplier: Decimal,
    },
    FollowTheWinner {
        bet: Decimal,
    },
    StreakTrigger {
        bet: Decimal,
        flip_after: u32,
    },
}

impl LawConfig {
    /// Instantiate the selected law.
    pub fn build(&self) -> Box<dyn StakingStrategy> {
        match *self {
            LawConfig::Dalembert {
                base_bet,
                step,
                floor,
            } => Box::new(Dalembert::new(DalembertConfig {
                base_bet,
                step,
                floor: floor.unwrap_or(step),
            })),
            LawConfig::Martingale {
                base_bet,
                multiplier,
            } => Box::new(Martingale::new(MartingaleConfig {
                base_bet,
                multiplier,
            })),
            LawConfig::FollowTheWinner { bet } => Box::new(FollowTheWinner::new(bet)),
            LawConfig::StreakTrigger { bet, flip_after } => {
                Box::new(StreakTrigger::new(bet, flip_after))
            }
        }
    }

    /// Reject parameter combinations that cannot stake sensibly.
    pub fn validate(&self) -> Result<(), EngineError> {
        match *self {
            LawConfig::Dalembert {
                base_bet,
                step,
                floor,
            } => {
                if base_bet <= Decimal::ZERO || step <= Decimal::ZERO {
                    return Err(EngineError::Config(
                        "staking: base_bet and step must be positive".into(),
                    ));
                }
                if let Some(floor) = floor {
                    if floor <= Decimal::ZERO || floor > base_bet {
                        return Err(EngineError::Config(
                            "staking: floor must be positive and at most base_bet".into(),
                        ));
                    }
                }
            }
            LawConfig::Martingale {
                base_bet,
                multiplier,
            } => {
                if base_bet <= Decimal::ZERO {
                    return Err(EngineError::Config(
                        "staking: base_bet must be positive".into(),
                    ));
                }
                if multiplier <= Decimal::ONE {
                    return Err(EngineError::Config(
                        "staking: multiplier must exceed 1".into(),
                    ));
                }
            }
            LawConfig::FollowTheWinner { bet } => {
                if bet <= Decimal::ZERO {
                    return Err(EngineError::Config("staking: bet must be positive".into()));
                }
            }
            LawConfig::StreakTrigger { bet, flip_after } => {
                if bet <= Decimal::ZERO || flip_after == 0 {
                    return Err(EngineError::Config(
                        "staking: bet must be positive and flip_after at least 1".into(),
                    ));
                }
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
