//! Bet providers.
//!
//! A provider turns a stake request into a settled roll. The engine never
//! talks to a provider directly; the driver does, so provider failures stay
//! outside the state machine.

pub mod simulated;
pub mod stake;

use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::error::EngineError;
use crate::types::{BetResolution, Side};

#[async_trait]
pub trait BetProvider: Send + Sync {
    fn name(&self) -> &str;

    /// Place a dice bet at even chance. A zero `amount` is a legal
    /// observation bet: it produces a roll without risking money.
    async fn place_bet(
        &self,
        side: Side,
        amount: Decimal,
        currency: &str,
    ) -> Result<BetResolution, EngineError>;

    async fn get_balance(&self, currency: &str) -> Result<Decimal, EngineError>;
}
