//! In-process casino backed by the local outcome generator.
//!
//! Rolls come from the same HMAC byte stream the verifier uses, one nonce per
//! bet at cursor 0, so a simulated run is reproducible from its seed pair.

use async_trait::async_trait;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tokio::sync::Mutex;
use tracing::debug;

use crate::error::EngineError;
use crate::rng::{self, SeedTriple};
use crate::types::{BetResolution, Side};

use super::BetProvider;

struct Inner {
    seeds: SeedTriple,
    balance: Decimal,
}

pub struct SimulatedCasino {
    inner: Mutex<Inner>,
    payout_multiplier: Decimal,
}

impl SimulatedCasino {
    /// `house_edge` is a percentage; 1 yields the usual 1.98x even-chance
    /// payout, 0 yields true even money.
    pub fn new(seeds: SeedTriple, balance: Decimal, house_edge: Decimal) -> Self {
        let payout_multiplier = (dec!(100) - house_edge) / dec!(50);
        Self {
            inner: Mutex::new(Inner { seeds, balance }),
            payout_multiplier,
        }
    }

    pub fn payout_multiplier(&self) -> Decimal {
        self.payout_multiplier
    }

    pub async fn seeds(&self) -> SeedTriple {
        self.inner.lock().await.seeds.clone()
    }
}

#[async_trait]
impl BetProvider for SimulatedCasino {
    fn name(&self) -> &str {
        "simulated"
    }

    async fn place_bet(
        &self,
        side: Side,
        amount: Decimal,
        _currency: &str,
    ) -> Result<BetResolution, EngineError> {
        let mut inner = self.inner.lock().await;
        if amount < Decimal::ZERO {
            return Err(EngineError::Provider("negative bet amount".into()));
        }
        if amount > inner.balance {
            return Err(EngineError::InsufficientBankroll {
                stake: amount,
                available: inner.balance,
            });
        }

        let roll = rng::draw_roll(&inner.seeds, 0);
        inner.seeds.advance_nonce();

        let result = Side::from_roll(roll);
        let won = result == side;
        if won {
            inner.balance += amount * (self.payout_multiplier - Decimal::ONE);
        } else {
            inner.balance -= amount;
        }
        debug!(roll, %result, %amount, balance = %inner.balance, "Simulated bet");

        Ok(BetResolution {
            roll,
            result,
            payout_multiplier: self.payout_multiplier,
            new_balance: Some(inner.balance),
        })
    }

    async fn get_balance(&self, _currency: &str) -> Result<Decimal, EngineError> {
        Ok(self.inner.lock().await.balance)
    }
}
