//! Betting session state machine.
//!
//! A session moves through `Seeding -> Armed -> SequenceActive` and back,
//! until one of the terminal phases fires (profit target, drawdown, budget
//! exhaustion). Each trial is split in two: `begin_trial` decides whether to
//! observe or stake, and `resolve_trial` consumes the roll, settles any
//! pending bet, and advances the strategy. The split keeps the state machine
//! synchronous and lets the caller source rolls from the local generator or
//! from a remote provider.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::EngineError;
use crate::rng::{self, SeedTriple};
use crate::stats::{self, history::{OutcomeHistory, Retention}};
use crate::strategy::{SequenceContext, StakingStrategy};
use crate::types::{BetRecord, BettingState, EnginePhase, ReversionPolicy, Side};

use super::modes::{ModeConfig, ModeTracker};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Total trial budget. Every draw counts, observed or staked.
    pub trials: u64,
    pub initial_bankroll: Decimal,
    /// |z| that arms a staking sequence.
    pub z_entry: f64,
    pub reversion_policy: ReversionPolicy,
    /// Session stops once bankroll reaches `initial * multiplier`.
    pub profit_target_multiplier: Decimal,
    /// Session stops once bankroll falls below `peak * (1 - fraction)`.
    pub max_drawdown_fraction: Decimal,
    /// A sequence closes once its accumulated pnl reaches this.
    pub sequence_profit_target: Decimal,
    pub retention: Retention,
    pub modes: ModeConfig,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            trials: 100_000,
            initial_bankroll: dec!(30),
            z_entry: 2.5,
            reversion_policy: ReversionPolicy::MeanRevert,
            profit_target_multiplier: dec!(10),
            max_drawdown_fraction: dec!(0.5),
            sequence_profit_target: dec!(0.25),
            retention: Retention::Rolling { window: 30 },
            modes: ModeConfig::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// Trial plan
// ---------------------------------------------------------------------------

/// What the session wants to do with the next roll.
#[derive(Debug, Clone, PartialEq)]
pub enum TrialPlan {
    /// A terminal phase was reached; no further rolls are consumed.
    Halted(EnginePhase),
    /// Consume the roll as a label only, no money at risk.
    Observe,
    /// Stake `size` on `side`.
    Bet { side: Side, size: Decimal },
}

#[derive(Debug, Clone)]
struct PendingBet {
    side: Side,
    size: Decimal,
    z_at_decision: f64,
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

pub struct Session {
    id: Uuid,
    config: SessionConfig,
    strategy: Box<dyn StakingStrategy>,
    history: OutcomeHistory,
    state: BettingState,
    phase: EnginePhase,
    ledger: Vec<BetRecord>,
    modes: ModeTracker,
    trials_used: u64,
    pending: Option<PendingBet>,
}

impl Session {
    pub fn new(
        config: SessionConfig,
        strategy: Box<dyn StakingStrategy>,
    ) -> Result<Self, EngineError> {
        if config.initial_bankroll <= Decimal::ZERO {
            return Err(EngineError::Config(
                "initial bankroll must be positive".into(),
            ));
        }
        if config.trials == 0 {
            return Err(EngineError::Config("trial budget must be at least 1".into()));
        }

        let history = match config.retention {
            Retention::Cumulative { min_samples } => OutcomeHistory::cumulative(min_samples),
            Retention::Rolling { window } => OutcomeHistory::rolling(window),
        };
        let state = BettingState::new(config.initial_bankroll);
        let modes = ModeTracker::new(config.modes.clone());
        Ok(Self {
            id: Uuid::new_v4(),
            config,
            strategy,
            history,
            state,
            phase: EnginePhase::Seeding,
            ledger: Vec::new(),
            modes,
            trials_used: 0,
            pending: None,
        })
    }

    /// Rebuild a session from a saved snapshot. The snapshot's history and
    /// betting state carry over; the ledger and mode reports start empty.
    /// An `Exhausted` snapshot resumes as a live session when the new config
    /// grants a larger trial budget.
    pub fn resume(
        config: SessionConfig,
        strategy: Box<dyn StakingStrategy>,
        snapshot: crate::storage::SessionSnapshot,
    ) -> Result<(Self, SeedTriple), EngineError> {
        if config.initial_bankroll <= Decimal::ZERO {
            return Err(EngineError::Config(
                "initial bankroll must be positive".into(),
            ));
        }
        if config.trials == 0 {
            return Err(EngineError::Config("trial budget must be at least 1".into()));
        }
        // The snapshot's window was accumulated under one retention policy;
        // silently reinterpreting it under another would skew the statistic.
        if snapshot.history.retention() != config.retention {
            return Err(EngineError::Config(format!(
                "snapshot retention {:?} does not match configured {:?}",
                snapshot.history.retention(),
                config.retention
            )));
        }

        let mut phase = snapshot.phase;
        if phase == EnginePhase::Exhausted && snapshot.trials_used < config.trials {
            phase = EnginePhase::Armed;
        }

        let modes = ModeTracker::new(config.modes.clone());
        let session = Self {
            id: snapshot.session_id,
            config,
            strategy,
            history: snapshot.history,
            state: snapshot.state,
            phase,
            ledger: Vec::new(),
            modes,
            trials_used: snapshot.trials_used,
            pending: None,
        };
        info!(
            session_id = %session.id,
            phase = %session.phase,
            trials = session.trials_used,
            nonce = snapshot.seeds.nonce,
            "Session resumed"
        );
        Ok((session, snapshot.seeds))
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn phase(&self) -> EnginePhase {
        self.phase
    }

    pub fn state(&self) -> &BettingState {
        &self.state
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn ledger(&self) -> &[BetRecord] {
        &self.ledger
    }

    pub fn mode_tracker(&self) -> &ModeTracker {
        &self.modes
    }

    pub fn history(&self) -> &OutcomeHistory {
        &self.history
    }

    pub fn trials_used(&self) -> u64 {
        self.trials_used
    }

    fn profit_target(&self) -> Decimal {
        self.config.initial_bankroll * self.config.profit_target_multiplier
    }

    fn drawdown_floor(&self) -> Decimal {
        self.state.peak_bankroll * (Decimal::ONE - self.config.max_drawdown_fraction)
    }

    /// Decide the next trial. Never consumes a roll.
    pub fn begin_trial(&mut self) -> TrialPlan {
        if self.phase.is_terminal() {
            return TrialPlan::Halted(self.phase);
        }

        if self.state.bankroll >= self.profit_target() {
            info!(
                bankroll = %self.state.bankroll,
                target = %self.profit_target(),
                "Profit target reached"
            );
            self.phase = EnginePhase::ProfitTargetStop;
            return TrialPlan::Halted(self.phase);
        }

        if self.trials_used >= self.config.trials {
            self.phase = EnginePhase::Exhausted;
            return TrialPlan::Halted(self.phase);
        }

        if !self.history.is_ready() {
            self.phase = EnginePhase::Seeding;
            return TrialPlan::Observe;
        }
        if self.phase == EnginePhase::Seeding {
            debug!(samples = self.history.len(), "Statistic ready, armed");
            self.phase = EnginePhase::Armed;
        }

        // z is computed over past outcomes only; the roll this trial produces
        // is not part of the statistic that priced it.
        let z = self.history.z_score();

        if self.phase == EnginePhase::Armed && z.abs() >= self.config.z_entry {
            let side = self.config.reversion_policy.entry_side(z);
            let plan = self.strategy.open(side);
            self.state.current_side = Some(plan.side);
            self.state.current_stake = plan.size;
            self.state.sequence_pnl = Decimal::ZERO;
            self.state.streak = 0;
            self.phase = EnginePhase::SequenceActive;
            info!(
                strategy = self.strategy.tag(),
                z = format!("{z:.3}"),
                p = format!("{:.5}", stats::one_tailed_p(z.abs())),
                side = %plan.side,
                stake = %plan.size,
                "Sequence opened"
            );
        }

        if self.phase == EnginePhase::SequenceActive {
            let Some(side) = self.state.current_side else {
                self.abandon_sequence("no side committed");
                return TrialPlan::Observe;
            };
            if self.state.bankroll <= Decimal::ZERO {
                self.abandon_sequence("bankroll empty");
                return TrialPlan::Observe;
            }

            let mut size = self.state.current_stake.round_dp(2);
            if size > self.state.bankroll {
                // Not fatal: clamp to what is left and keep going.
                let err = EngineError::InsufficientBankroll {
                    stake: size,
                    available: self.state.bankroll,
                };
                warn!(%err, "Clamping stake");
                size = self
                    .state
                    .bankroll
                    .round_dp_with_strategy(2, RoundingStrategy::ToZero);
            }
            if size <= Decimal::ZERO {
                self.abandon_sequence("stake rounded to zero");
                return TrialPlan::Observe;
            }

            self.pending = Some(PendingBet {
                side,
                size,
                z_at_decision: z,
            });
            return TrialPlan::Bet { side, size };
        }

        TrialPlan::Observe
    }

    /// Consume one roll. Settles the pending bet, if any, and returns its
    /// ledger record. `payout_multiplier` is the gross multiplier paid on a
    /// win (2 for even money).
    pub fn resolve_trial(
        &mut self,
        roll: f64,
        payout_multiplier: Decimal,
    ) -> Option<BetRecord> {
        self.trials_used += 1;
        let roll_stats = stats::roll_stats(roll);
        let label = roll_stats.outcome;
        debug!(
            trial = self.trials_used,
            roll,
            outcome = %label,
            tail_p = format!("{:.4}", roll_stats.p_value),
            "Outcome recorded"
        );
        self.history.push(label);
        self.modes.observe(self.trials_used, label);

        let record = self.pending.take().map(|bet| {
            let won = label == bet.side;
            let pnl = if won {
                bet.size * (payout_multiplier - Decimal::ONE)
            } else {
                -bet.size
            };
            self.state.apply_pnl(pnl);
            self.state.record_result(won);
            self.state.sequence_pnl += pnl;

            let record = BetRecord {
                index: self.trials_used,
                strategy: self.strategy.tag().to_string(),
                z_score: bet.z_at_decision,
                side: bet.side,
                size: bet.size,
                roll,
                outcome: label,
                won,
                pnl,
                bankroll_after: self.state.bankroll,
            };
            debug!(%record, "Bet settled");

            let ctx = SequenceContext {
                entry_side: bet.side,
                last_side: bet.side,
                last_stake: bet.size,
                last_won: won,
                last_outcome: label,
                loss_streak: self.state.loss_streak(),
            };
            let next = self.strategy.next(&ctx);
            self.state.current_side = Some(next.side);
            self.state.current_stake = next.size;

            // Hybrid stop: sequence profit banked, or the stake ladder walked
            // down to its floor. Both firing on the same bet still closes the
            // sequence exactly once.
            let profit_hit = self.state.sequence_pnl >= self.config.sequence_profit_target;
            let floor = self.strategy.stop_floor();
            let floor_hit = floor > Decimal::ZERO && next.size <= floor;
            if profit_hit || floor_hit {
                info!(
                    sequence_pnl = %self.state.sequence_pnl,
                    profit_hit,
                    floor_hit,
                    "Sequence closed"
                );
                self.state.reset_sequence();
                self.phase = EnginePhase::Armed;
            }

            record
        });
        if let Some(record) = &record {
            self.ledger.push(record.clone());
        }

        if self.state.bankroll < self.drawdown_floor() {
            warn!(
                bankroll = %self.state.bankroll,
                peak = %self.state.peak_bankroll,
                "Drawdown stop"
            );
            self.phase = EnginePhase::DrawdownStop;
        } else if self.trials_used >= self.config.trials {
            self.phase = EnginePhase::Exhausted;
        }

        record
    }

    /// Finalize the session: close any open mode.
    pub fn finish(&mut self) {
        self.modes.finish(self.trials_used);
        info!(
            phase = %self.phase,
            trials = self.trials_used,
            bankroll = %self.state.bankroll,
            "Session finished"
        );
    }

    /// Drive the whole session against the local outcome generator.
    /// One nonce per trial, cursor 0, advancing after each draw.
    pub fn simulate(&mut self, seeds: &mut SeedTriple, payout_multiplier: Decimal) {
        loop {
            match self.begin_trial() {
                TrialPlan::Halted(_) => break,
                TrialPlan::Observe | TrialPlan::Bet { .. } => {
                    let roll = rng::draw_roll(seeds, 0);
                    seeds.advance_nonce();
                    self.resolve_trial(roll, payout_multiplier);
                }
            }
        }
        self.finish();
    }

    /// Win rate over settled bets, as a percentage.
    pub fn win_rate_pct(&self) -> f64 {
        if self.ledger.is_empty() {
            return 0.0;
        }
        let wins = self.ledger.iter().filter(|r| r.won).count();
        wins as f64 * 100.0 / self.ledger.len() as f64
    }

    /// Peak-to-final drawdown, as a percentage of the peak.
    pub fn drawdown_pct(&self) -> f64 {
        if self.state.peak_bankroll <= Decimal::ZERO {
            return 0.0;
        }
        ((self.state.peak_bankroll - self.state.bankroll) / self.state.peak_bankroll
            * dec!(100))
        .to_f64()
        .unwrap_or(0.0)
    }

    fn abandon_sequence(&mut self, reason: &str) {
        warn!(reason, "Sequence abandoned");
        self.state.reset_sequence();
        self.phase = EnginePhase::Armed;
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
