//! Typed error kinds for the engine core.
//!
//! The split follows how each error is handled: `InvalidSeed` and `Config`
//! are fatal at startup, `InsufficientBankroll` is recovered locally by the
//! session (clamp or abandon), and `Provider` surfaces only after the
//! driver's retry policy is exhausted.

use rust_decimal::Decimal;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    /// Malformed seed input (empty server or client seed). Never retried.
    #[error("invalid seed: {0}")]
    InvalidSeed(String),

    /// A stake was requested that exceeds the remaining bankroll. The
    /// session recovers by clamping to the remainder or abandoning the
    /// sequence; this never escapes the engine.
    #[error("insufficient bankroll: stake {stake} exceeds available {available}")]
    InsufficientBankroll { stake: Decimal, available: Decimal },

    /// Remote provider failure after the retry policy gave up.
    #[error("provider failure: {0}")]
    Provider(String),

    /// Contradictory configuration detected at startup (never mid-session).
    #[error("configuration error: {0}")]
    Config(String),
}
