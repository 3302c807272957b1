//! Async driver: runs a session against a remote provider.
//!
//! The session state machine is synchronous; this wrapper feeds it rolls from
//! a `BetProvider` and absorbs transient provider failures. A failed bet is
//! retried with a fixed backoff, refreshing the remote balance between
//! attempts, and the engine state is never advanced for an unsettled bet.
//! Observation trials are placed as zero-amount bets so the remote wheel
//! still produces a verifiable roll.

use std::time::Duration;

use rust_decimal::Decimal;
use tracing::{debug, info, warn};

use crate::error::EngineError;
use crate::platforms::BetProvider;
use crate::types::{BetResolution, Side};

use super::session::{Session, TrialPlan};

// ---------------------------------------------------------------------------
// Retry policy
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub backoff: Duration,
    /// `None` retries forever; the original operators preferred a stalled
    /// session over a silently divergent one.
    pub max_attempts: Option<u32>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            backoff: Duration::from_secs(5),
            max_attempts: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct DriverConfig {
    pub currency: String,
    /// Pause between settled trials. Zero for backtests.
    pub bet_delay: Duration,
    pub retry: RetryPolicy,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            currency: "usd".to_string(),
            bet_delay: Duration::ZERO,
            retry: RetryPolicy::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// Driver
// ---------------------------------------------------------------------------

pub struct Driver<P: BetProvider> {
    provider: P,
    config: DriverConfig,
}

impl<P: BetProvider> Driver<P> {
    pub fn new(provider: P, config: DriverConfig) -> Self {
        Self { provider, config }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Run the session until it halts. Returns the terminal phase's session
    /// untouched in `session`; fails only when the retry budget is spent.
    pub async fn run(&self, session: &mut Session) -> Result<(), EngineError> {
        info!(
            provider = self.provider.name(),
            currency = %self.config.currency,
            "Driver starting"
        );

        loop {
            let (side, amount) = match session.begin_trial() {
                TrialPlan::Halted(phase) => {
                    info!(%phase, "Driver halting");
                    break;
                }
                // Zero-amount bet: consumes a nonce, risks nothing.
                TrialPlan::Observe => (Side::Under, Decimal::ZERO),
                TrialPlan::Bet { side, size } => (side, size),
            };

            let resolution = self.place_with_retry(side, amount).await?;
            session.resolve_trial(resolution.roll, resolution.payout_multiplier);

            if !self.config.bet_delay.is_zero() {
                tokio::time::sleep(self.config.bet_delay).await;
            }
        }

        session.finish();
        Ok(())
    }

    async fn place_with_retry(
        &self,
        side: Side,
        amount: Decimal,
    ) -> Result<BetResolution, EngineError> {
        let mut attempt: u32 = 0;
        loop {
            match self.provider.place_bet(side, amount, &self.config.currency).await {
                Ok(resolution) => {
                    if attempt > 0 {
                        info!(attempt, "Bet placed after retry");
                    }
                    return Ok(resolution);
                }
                Err(err) => {
                    attempt += 1;
                    warn!(
                        %err,
                        attempt,
                        backoff_secs = self.config.retry.backoff.as_secs(),
                        "Provider error, backing off"
                    );
                    if let Some(max) = self.config.retry.max_attempts {
                        if attempt >= max {
                            return Err(EngineError::Provider(format!(
                                "giving up after {attempt} attempts: {err}"
                            )));
                        }
                    }
                    tokio::time::sleep(self.config.retry.backoff).await;

                    // Refresh the remote balance before retrying so a stale
                    // funds error clears itself.
                    match self.provider.get_balance(&self.config.currency).await {
                        Ok(balance) => debug!(%balance, "Balance refreshed"),
                        Err(err) => warn!(%err, "Balance refresh failed"),
                    }
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use rust_decimal_macros::dec;
    use std::sync::atomic::{AtomicU32, Ordering};

    use crate::types::Side;

    /// Fails the first `fail_first` bets, then settles everything as an
    /// Under roll at even money.
    struct FlakyProvider {
        fail_first: u32,
        calls: AtomicU32,
        balance_checks: AtomicU32,
    }

    impl FlakyProvider {
        fn new(fail_first: u32) -> Self {
            Self {
                fail_first,
                calls: AtomicU32::new(0),
                balance_checks: AtomicU32::new(0),
            }
        }
    }

    #[async_trait]
    impl BetProvider for FlakyProvider {
        fn name(&self) -> &str {
            "flaky"
        }

        async fn place_bet(
            &self,
            _side: Side,
            _amount: Decimal,
            _currency: &str,
        ) -> Result<BetResolution, EngineError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call < self.fail_first {
                return Err(EngineError::Provider("502 bad gateway".into()));
            }
            Ok(BetResolution {
                roll: 25.0,
                result: Side::Under,
                payout_multiplier: dec!(2),
                new_balance: None,
            })
        }

        async fn get_balance(&self, _currency: &str) -> Result<Decimal, EngineError> {
            self.balance_checks.fetch_add(1, Ordering::SeqCst);
            Ok(dec!(100))
        }
    }

    fn fast_retry(max_attempts: Option<u32>) -> DriverConfig {
        DriverConfig {
            currency: "usd".to_string(),
            bet_delay: Duration::ZERO,
            retry: RetryPolicy {
                backoff: Duration::from_millis(1),
                max_attempts,
            },
        }
    }

    #[tokio::test]
    async fn test_retry_until_success() {
        let driver = Driver::new(FlakyProvider::new(3), fast_retry(None));
        let res = driver.place_with_retry(Side::Under, dec!(1)).await.unwrap();
        assert_eq!(res.roll, 25.0);
        assert_eq!(driver.provider().calls.load(Ordering::SeqCst), 4);
        // Balance is refreshed once per failed attempt.
        assert_eq!(driver.provider().balance_checks.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_bounded_retry_gives_up() {
        let driver = Driver::new(FlakyProvider::new(100), fast_retry(Some(2)));
        let err = driver.place_with_retry(Side::Under, dec!(1)).await.unwrap_err();
        assert!(matches!(err, EngineError::Provider(_)));
        assert_eq!(driver.provider().calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_run_drives_session_to_halt() {
        use crate::engine::session::{SessionConfig, TrialPlan};
        use crate::stats::history::Retention;
        use crate::strategy::dalembert::{Dalembert, DalembertConfig};

        let config = SessionConfig {
            trials: 50,
            retention: Retention::Rolling { window: 10 },
            ..SessionConfig::default()
        };
        let mut session = Session::new(
            config,
            Box::new(Dalembert::new(DalembertConfig::default())),
        )
        .unwrap();

        let driver = Driver::new(FlakyProvider::new(2), fast_retry(None));
        driver.run(&mut session).await.unwrap();
        assert!(session.phase().is_terminal());
        assert!(session.trials_used() <= 50);
        assert_eq!(session.begin_trial(), TrialPlan::Halted(session.phase()));
    }
}
