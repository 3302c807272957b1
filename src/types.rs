//! Shared types for the FAIRDICE engine.
//!
//! These types form the data model used across all modules.
//! They are designed to be stable so that rng, strategy, engine,
//! and platform modules can depend on them without circular references.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Outcome labels
// ---------------------------------------------------------------------------

/// Binary label of a draw relative to the 50.00 midpoint of the roll range.
/// Also the direction a bet commits to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    Over,
    Under,
}

impl Side {
    /// The opposite side.
    pub fn opposite(&self) -> Self {
        match self {
            Side::Over => Side::Under,
            Side::Under => Side::Over,
        }
    }

    /// Label a roll in `[0.00, 100.00]`. Exactly 50.00 counts as Under,
    /// matching the provably-fair verifiers this engine replays.
    pub fn from_roll(roll: f64) -> Self {
        if roll <= 50.00 {
            Side::Under
        } else {
            Side::Over
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Over => write!(f, "OV"),
            Side::Under => write!(f, "UN"),
        }
    }
}

/// Whether a statistical extreme is bet against or ridden.
///
/// Both policies appear in the field; which one is "right" is not a derived
/// law, so it stays a configuration choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReversionPolicy {
    /// Bet the opposite side of the extreme (an excess of Over triggers an
    /// Under bet).
    MeanRevert,
    /// Bet with the extreme.
    Momentum,
}

impl ReversionPolicy {
    /// The side to commit to given the sign of the entry z-score.
    pub fn entry_side(&self, z: f64) -> Side {
        let extreme = if z >= 0.0 { Side::Over } else { Side::Under };
        match self {
            ReversionPolicy::MeanRevert => extreme.opposite(),
            ReversionPolicy::Momentum => extreme,
        }
    }
}

// ---------------------------------------------------------------------------
// Engine lifecycle
// ---------------------------------------------------------------------------

/// Session state machine phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EnginePhase {
    /// Accumulating minimum history before any statistic is trustworthy.
    Seeding,
    /// Monitoring the statistic for an entry trigger.
    Armed,
    /// Currently staking according to the active law.
    SequenceActive,
    /// Bankroll reached the profit target. Terminal.
    ProfitTargetStop,
    /// Bankroll fell below the drawdown floor. Terminal.
    DrawdownStop,
    /// The configured draw budget is spent. Terminal.
    Exhausted,
}

impl EnginePhase {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            EnginePhase::ProfitTargetStop | EnginePhase::DrawdownStop | EnginePhase::Exhausted
        )
    }
}

impl fmt::Display for EnginePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EnginePhase::Seeding => write!(f, "SEEDING"),
            EnginePhase::Armed => write!(f, "ARMED"),
            EnginePhase::SequenceActive => write!(f, "SEQUENCE"),
            EnginePhase::ProfitTargetStop => write!(f, "PROFIT TARGET STOP"),
            EnginePhase::DrawdownStop => write!(f, "DRAWDOWN STOP"),
            EnginePhase::Exhausted => write!(f, "EXHAUSTED"),
        }
    }
}

// ---------------------------------------------------------------------------
// Betting state
// ---------------------------------------------------------------------------

/// Mutable bankroll and sequence bookkeeping, updated once per resolved bet.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BettingState {
    pub bankroll: Decimal,
    pub peak_bankroll: Decimal,
    /// The stake the active law would place next. Zero outside a sequence.
    pub current_stake: Decimal,
    /// Committed side while a sequence is active.
    pub current_side: Option<Side>,
    /// Signed streak: positive = consecutive wins, negative = consecutive
    /// losses.
    pub streak: i32,
    /// Net profit of the active staking sequence.
    pub sequence_pnl: Decimal,
}

impl BettingState {
    pub fn new(bankroll: Decimal) -> Self {
        Self {
            bankroll,
            peak_bankroll: bankroll,
            current_stake: Decimal::ZERO,
            current_side: None,
            streak: 0,
            sequence_pnl: Decimal::ZERO,
        }
    }

    /// Apply a resolved bet's pnl and keep the peak monotone.
    pub fn apply_pnl(&mut self, pnl: Decimal) {
        self.bankroll += pnl;
        if self.bankroll > self.peak_bankroll {
            self.peak_bankroll = self.bankroll;
        }
    }

    /// Update the signed win/loss streak.
    pub fn record_result(&mut self, won: bool) {
        self.streak = if won {
            if self.streak > 0 {
                self.streak + 1
            } else {
                1
            }
        } else if self.streak < 0 {
            self.streak - 1
        } else {
            -1
        };
    }

    /// Consecutive losses, regardless of sign convention.
    pub fn loss_streak(&self) -> u32 {
        if self.streak < 0 {
            (-self.streak) as u32
        } else {
            0
        }
    }

    /// Clear sequence-scoped fields (called when a sequence ends).
    pub fn reset_sequence(&mut self) {
        self.current_stake = Decimal::ZERO;
        self.current_side = None;
        self.sequence_pnl = Decimal::ZERO;
    }
}

// ---------------------------------------------------------------------------
// Bet ledger
// ---------------------------------------------------------------------------

/// Immutable, append-only log entry for one resolved bet.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BetRecord {
    /// Trial index (1-based) at which the bet resolved.
    pub index: u64,
    /// Tag of the staking law that sized the bet.
    pub strategy: String,
    /// Statistic value at decision time.
    pub z_score: f64,
    pub side: Side,
    pub size: Decimal,
    /// The raw roll that resolved the bet.
    pub roll: f64,
    pub outcome: Side,
    pub won: bool,
    pub pnl: Decimal,
    pub bankroll_after: Decimal,
}

impl fmt::Display for BetRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[BET {:>5}] {} @ ${:.2} → {} | roll {:>6.2} | bankroll ${:.2}",
            self.index,
            self.side,
            self.size,
            if self.won { "WIN" } else { "LOSS" },
            self.roll,
            self.bankroll_after,
        )
    }
}

// ---------------------------------------------------------------------------
// Modes (reporting only)
// ---------------------------------------------------------------------------

/// Label for a sustained statistical trend, tracked independently of
/// betting decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModeType {
    Sync,
    AntiSync,
}

impl ModeType {
    /// The outcome label that continues this trend.
    pub fn trend_side(&self) -> Side {
        match self {
            ModeType::Sync => Side::Over,
            ModeType::AntiSync => Side::Under,
        }
    }
}

impl fmt::Display for ModeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModeType::Sync => write!(f, "SYNC"),
            ModeType::AntiSync => write!(f, "ANTI-SYNC"),
        }
    }
}

/// Why a mode closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModeEndReason {
    Reversal,
    Timeout,
    SimEnd,
}

impl fmt::Display for ModeEndReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModeEndReason::Reversal => write!(f, "reversal"),
            ModeEndReason::Timeout => write!(f, "timeout"),
            ModeEndReason::SimEnd => write!(f, "sim end"),
        }
    }
}

/// Archived record of one closed mode.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModeReport {
    pub mode_type: ModeType,
    pub start_index: u64,
    /// z-score that triggered entry.
    pub trigger_z: f64,
    pub end_index: u64,
    pub end_reason: ModeEndReason,
    /// Longest run of trend-continuing outcomes while the mode was open.
    pub max_continuation: u32,
}

impl fmt::Display for ModeReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:<10} start {:>6} z {:>6.3} end {:>6} ({}) max cont {}",
            self.mode_type.to_string(),
            self.start_index,
            self.trigger_z,
            self.end_index,
            self.end_reason,
            self.max_continuation,
        )
    }
}

// ---------------------------------------------------------------------------
// Provider results
// ---------------------------------------------------------------------------

/// What a provider reports back for one placed bet.
#[derive(Debug, Clone)]
pub struct BetResolution {
    /// The raw roll in `[0.00, 100.00]`.
    pub roll: f64,
    pub result: Side,
    /// Gross payout per unit staked when the bet wins (e.g. 1.98 at a 1%
    /// house edge on a 50% chance).
    pub payout_multiplier: Decimal,
    /// Post-bet balance if the provider reports one.
    pub new_balance: Option<Decimal>,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
