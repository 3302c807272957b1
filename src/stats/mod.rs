//! Statistics over outcome streams.
//!
//! Pure functions: binomial z-scores against a fair (p = 0.5) model, a
//! closed-form normal-CDF approximation for one-tailed p-values, and
//! per-roll uniform statistics used to annotate the bet ledger.

pub mod history;

use crate::types::Side;

/// Abramowitz & Stegun 26.2.17 rational-approximation coefficients.
/// Accurate to roughly 1e-7 — plenty for trigger thresholds.
const B1: f64 = 0.319381530;
const B2: f64 = -0.356563782;
const B3: f64 = 1.781477937;
const B4: f64 = -1.821255978;
const B5: f64 = 1.330274429;
const P_CONST: f64 = 0.2316419;
const C: f64 = 0.39894228;

/// Standard normal CDF.
pub fn normal_cdf(z: f64) -> f64 {
    let t = 1.0 / (1.0 + P_CONST * z.abs());
    let poly = t * (B1 + t * (B2 + t * (B3 + t * (B4 + t * B5))));
    let cdf = 1.0 - C * (-z * z / 2.0).exp() * poly;
    if z < 0.0 {
        1.0 - cdf
    } else {
        cdf
    }
}

/// One-tailed p-value: P(Z >= z).
pub fn one_tailed_p(z: f64) -> f64 {
    1.0 - normal_cdf(z)
}

/// Binomial z-score for `over` successes in `n` fair trials.
///
/// `n = 0` is an expected transient state during seeding, so it maps to a
/// neutral z of 0.0 rather than an error.
pub fn binomial_z(over: u64, n: u64) -> f64 {
    if n == 0 {
        return 0.0;
    }
    let n = n as f64;
    let p = 0.5;
    let expected = n * p;
    let std_dev = (n * p * (1.0 - p)).sqrt();
    (over as f64 - expected) / std_dev
}

/// Statistics of a single roll against the uniform [0, 100] distribution.
#[derive(Debug, Clone, Copy)]
pub struct RollStats {
    pub outcome: Side,
    pub z_score: f64,
    /// One-tailed p-value from the exact linear CDF of the uniform.
    pub p_value: f64,
}

/// z and tail probability of one roll (ledger annotation, not a trigger).
pub fn roll_stats(roll: f64) -> RollStats {
    let mean = 50.0;
    let std_dev = (100.0 * 100.0 / 12.0_f64).sqrt();
    let z = (roll - mean) / std_dev;
    let p_value = if roll >= 50.0 {
        1.0 - roll / 100.0
    } else {
        roll / 100.0
    };
    RollStats {
        outcome: Side::from_roll(roll),
        z_score: z,
        p_value,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
