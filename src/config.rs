//! Configuration loading from TOML with environment variable resolution.
//!
//! Reads `config.toml` and deserializes into strongly-typed structs.
//! Secrets (the provider API key) are referenced by env-var name in the
//! config and resolved at runtime via `std::env::var`.

use anyhow::{Context, Result};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Deserialize;
use std::fs;
use std::time::Duration;

use crate::engine::modes::ModeConfig;
use crate::engine::{DriverConfig, RetryPolicy, SessionConfig};
use crate::error::EngineError;
use crate::stats::history::Retention;
use crate::strategy::LawConfig;
use crate::types::ReversionPolicy;

/// Top-level application configuration.
#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub session: SessionSection,
    pub seeds: SeedsSection,
    pub statistic: StatisticSection,
    pub staking: LawConfig,
    pub risk: RiskSection,
    #[serde(default)]
    pub modes: ModesSection,
    pub provider: ProviderSection,
    #[serde(default)]
    pub output: OutputSection,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SessionSection {
    pub name: String,
    pub trials: u64,
    pub initial_bankroll: Decimal,
    pub currency: String,
    #[serde(default)]
    pub bet_delay_ms: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SeedsSection {
    /// Generate a fresh seed pair at startup instead of using the pair below.
    #[serde(default)]
    pub use_random: bool,
    #[serde(default)]
    pub server_seed: Option<String>,
    #[serde(default)]
    pub client_seed: Option<String>,
    #[serde(default = "default_start_nonce")]
    pub start_nonce: u64,
}

fn default_start_nonce() -> u64 {
    1
}

#[derive(Debug, Deserialize, Clone)]
#[serde(rename_all = "snake_case")]
pub struct StatisticSection {
    /// "rolling" or "cumulative".
    pub retention: String,
    #[serde(default = "default_window")]
    pub window: usize,
    #[serde(default = "default_window")]
    pub min_samples: usize,
}

fn default_window() -> usize {
    30
}

#[derive(Debug, Deserialize, Clone)]
pub struct RiskSection {
    pub z_entry: f64,
    pub reversion_policy: ReversionPolicy,
    pub profit_target_multiplier: Decimal,
    pub max_drawdown_fraction: Decimal,
    pub sequence_profit_target: Decimal,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ModesSection {
    pub window: usize,
    pub z_entry: f64,
    pub reversal_diff: u64,
    pub max_trials_without_reversal: u64,
}

impl Default for ModesSection {
    fn default() -> Self {
        let m = ModeConfig::default();
        Self {
            window: m.window,
            z_entry: m.z_entry,
            reversal_diff: m.reversal_diff,
            max_trials_without_reversal: m.max_trials_without_reversal,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ProviderSection {
    /// "simulated" or "stake".
    pub mode: String,
    /// House edge percentage for the simulated provider's payout.
    #[serde(default = "default_house_edge")]
    pub house_edge: Decimal,
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default = "default_retry_backoff_secs")]
    pub retry_backoff_secs: u64,
    /// 0 retries forever.
    #[serde(default)]
    pub max_retry_attempts: u32,
}

fn default_house_edge() -> Decimal {
    dec!(1)
}

fn default_api_key_env() -> String {
    "STAKE_API_KEY".to_string()
}

fn default_retry_backoff_secs() -> u64 {
    5
}

#[derive(Debug, Deserialize, Clone)]
pub struct OutputSection {
    pub ledger_path: String,
    pub modes_path: String,
    pub snapshot_path: String,
}

impl Default for OutputSection {
    fn default() -> Self {
        Self {
            ledger_path: "fairdice_bets.csv".to_string(),
            modes_path: "fairdice_modes.csv".to_string(),
            snapshot_path: "fairdice_state.json".to_string(),
        }
    }
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {path}"))?;
        let config: AppConfig = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {path}"))?;
        config.validate()?;
        Ok(config)
    }

    /// Resolve an environment variable name to its value.
    /// Useful for loading secrets referenced in the config.
    pub fn resolve_env(env_name: &str) -> Result<String> {
        std::env::var(env_name)
            .with_context(|| format!("Environment variable not set: {env_name}"))
    }

    /// Reject configurations that parse but cannot run.
    pub fn validate(&self) -> Result<(), EngineError> {
        let fail = |msg: String| Err(EngineError::Config(msg));

        if self.session.trials == 0 {
            return fail("session.trials must be at least 1".into());
        }
        if self.session.initial_bankroll <= Decimal::ZERO {
            return fail("session.initial_bankroll must be positive".into());
        }
        if !self.seeds.use_random
            && (self.seeds.server_seed.is_none() || self.seeds.client_seed.is_none())
        {
            return fail(
                "seeds: either set use_random or provide server_seed and client_seed".into(),
            );
        }
        match self.statistic.retention.as_str() {
            "rolling" => {
                if self.statistic.window == 0 {
                    return fail("statistic.window must be at least 1".into());
                }
                if self.statistic.min_samples > self.statistic.window {
                    return fail(format!(
                        "statistic.min_samples ({}) exceeds the rolling window ({}); \
                         the statistic would never become ready",
                        self.statistic.min_samples, self.statistic.window
                    ));
                }
            }
            "cumulative" => {
                if self.statistic.min_samples == 0 {
                    return fail("statistic.min_samples must be at least 1".into());
                }
            }
            other => return fail(format!("statistic.retention: unknown kind {other:?}")),
        }
        if self.risk.z_entry <= 0.0 {
            return fail("risk.z_entry must be positive".into());
        }
        if self.risk.profit_target_multiplier <= Decimal::ONE {
            return fail("risk.profit_target_multiplier must exceed 1".into());
        }
        if self.risk.max_drawdown_fraction <= Decimal::ZERO
            || self.risk.max_drawdown_fraction > Decimal::ONE
        {
            return fail("risk.max_drawdown_fraction must be in (0, 1]".into());
        }
        if self.risk.sequence_profit_target <= Decimal::ZERO {
            return fail("risk.sequence_profit_target must be positive".into());
        }
        self.staking.validate()?;
        if self.modes.window == 0 || self.modes.reversal_diff == 0 {
            return fail("modes.window and modes.reversal_diff must be at least 1".into());
        }
        if self.provider.house_edge < Decimal::ZERO || self.provider.house_edge >= dec!(100) {
            return fail("provider.house_edge must be in [0, 100)".into());
        }
        match self.provider.mode.as_str() {
            "simulated" | "stake" => {}
            other => return fail(format!("provider.mode: unknown kind {other:?}")),
        }
        Ok(())
    }

    pub fn retention(&self) -> Retention {
        match self.statistic.retention.as_str() {
            "cumulative" => Retention::Cumulative {
                min_samples: self.statistic.min_samples,
            },
            _ => Retention::Rolling {
                window: self.statistic.window,
            },
        }
    }

    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            trials: self.session.trials,
            initial_bankroll: self.session.initial_bankroll,
            z_entry: self.risk.z_entry,
            reversion_policy: self.risk.reversion_policy,
            profit_target_multiplier: self.risk.profit_target_multiplier,
            max_drawdown_fraction: self.risk.max_drawdown_fraction,
            sequence_profit_target: self.risk.sequence_profit_target,
            retention: self.retention(),
            modes: ModeConfig {
                window: self.modes.window,
                z_entry: self.modes.z_entry,
                reversal_diff: self.modes.reversal_diff,
                max_trials_without_reversal: self.modes.max_trials_without_reversal,
            },
        }
    }

    pub fn driver_config(&self) -> DriverConfig {
        DriverConfig {
            currency: self.session.currency.clone(),
            bet_delay: Duration::from_millis(self.session.bet_delay_ms),
            retry: RetryPolicy {
                backoff: Duration::from_secs(self.provider.retry_backoff_secs),
                max_attempts: match self.provider.max_retry_attempts {
                    0 => None,
                    n => Some(n),
                },
            },
        }
    }
}
