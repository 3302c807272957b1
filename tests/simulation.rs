//! End-to-end simulation runs over pinned seed pairs.
//!
//! Everything here goes through the public crate surface: config-shaped
//! session setup, the outcome generator, the driver, and the reports.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use fairdice::engine::modes::ModeConfig;
use fairdice::engine::{Driver, DriverConfig, Session, SessionConfig};
use fairdice::platforms::simulated::SimulatedCasino;
use fairdice::platforms::BetProvider;
use fairdice::rng::{self, SeedTriple};
use fairdice::stats::history::Retention;
use fairdice::strategy::{LawConfig, StakingStrategy};
use fairdice::types::ReversionPolicy;

const SERVER: &str = "d83729554eeed8965116385e0486dab8a1f6634ae1a9e8139e849ab75f17341d";
const CLIENT: &str = "wcvqnIM521";

fn seeds() -> SeedTriple {
    SeedTriple::new(SERVER, CLIENT, 1).unwrap()
}

fn base_config(trials: u64) -> SessionConfig {
    SessionConfig {
        trials,
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

fn dalembert() -> Box<dyn StakingStrategy> {
    LawConfig::Dalembert {
        base_bet: dec!(0.20),
        step: dec!(0.02),
        floor: None,
    }
    .build()
}

#[test]
fn test_identical_seeds_give_identical_sessions() {
    let run = || {
        let mut session = Session::new(base_config(5000), dalembert()).unwrap();
        let mut seeds = seeds();
        session.simulate(&mut seeds, dec!(1.98));
        session
    };
    let a = run();
    let b = run();

    assert_eq!(a.phase(), b.phase());
    assert_eq!(a.trials_used(), b.trials_used());
    assert_eq!(a.state().bankroll, b.state().bankroll);
    assert_eq!(a.ledger().len(), b.ledger().len());
    for (ra, rb) in a.ledger().iter().zip(b.ledger()) {
        assert_eq!(ra.index, rb.index);
        assert_eq!(ra.roll, rb.roll);
        assert_eq!(ra.side, rb.side);
        assert_eq!(ra.size, rb.size);
        assert_eq!(ra.pnl, rb.pnl);
    }
    assert_eq!(
        a.mode_tracker().reports().len(),
        b.mode_tracker().reports().len()
    );
}

#[test]
fn test_rolls_stay_in_range_over_long_stream() {
    let mut seeds = seeds();
    for _ in 0..100_000 {
        let roll = rng::draw_roll(&seeds, 0);
        assert!((0.0..=100.0).contains(&roll), "roll out of range: {roll}");
        // Two decimal places exactly.
        assert_eq!((roll * 100.0).round() / 100.0, roll);
        seeds.advance_nonce();
    }
}

#[test]
fn test_ledger_bankroll_chain_is_consistent() {
    let mut session = Session::new(base_config(5000), dalembert()).unwrap();
    let mut seeds = seeds();
    session.simulate(&mut seeds, dec!(1.98));

    let initial = session.config().initial_bankroll;
    let mut expected = initial;
    for record in session.ledger() {
        expected += record.pnl;
        assert_eq!(record.bankroll_after, expected, "chain broke at {}", record.index);
        assert_eq!(record.won, record.outcome == record.side);
        assert!(record.size > Decimal::ZERO);
    }
    assert_eq!(session.state().bankroll, expected);
}

#[test]
fn test_mode_reports_are_ordered_and_disjoint() {
    let mut config = base_config(5000);
    // No staking; this run only watches the stream.
    config.z_entry = f64::INFINITY;
    let mut session = Session::new(config, dalembert()).unwrap();
    let mut seeds = seeds();
    session.simulate(&mut seeds, dec!(1.98));

    assert!(session.ledger().is_empty());
    let reports = session.mode_tracker().reports();
    let mut prev_end = 0u64;
    for report in reports {
        assert!(report.start_index > prev_end, "modes overlap");
        assert!(report.end_index >= report.start_index);
        assert!(report.trigger_z.abs() >= 2.0);
        prev_end = report.end_index;
    }
}

#[tokio::test]
async fn test_driver_and_casino_agree_on_bankroll() {
    let config = base_config(2000);
    let mut session = Session::new(config, dalembert()).unwrap();
    let casino = SimulatedCasino::new(seeds(), dec!(30), dec!(1));
    let driver = Driver::new(casino, DriverConfig::default());

    driver.run(&mut session).await.unwrap();

    assert!(session.phase().is_terminal());
    // The engine's accounting and the house's accounting never drift.
    let house = driver.provider().get_balance("usd").await.unwrap();
    assert_eq!(session.state().bankroll, house);
    // One nonce consumed per trial.
    let final_seeds = driver.provider().seeds().await;
    assert_eq!(final_seeds.nonce, 1 + session.trials_used());
}

#[test]
fn test_momentum_and_mean_revert_take_opposite_entries() {
    let entry_of = |policy: ReversionPolicy| {
        let mut config = base_config(5000);
        config.reversion_policy = policy;
        let mut session = Session::new(config, dalembert()).unwrap();
        let mut seeds = seeds();
        session.simulate(&mut seeds, dec!(1.98));
        session.ledger().first().map(|r| (r.index, r.side))
    };

    let revert = entry_of(ReversionPolicy::MeanRevert);
    let momentum = entry_of(ReversionPolicy::Momentum);
    // Same stream, same trigger trial, opposite sides.
    if let (Some((ri, rs)), Some((mi, ms))) = (revert, momentum) {
        assert_eq!(ri, mi);
        assert_eq!(rs, ms.opposite());
    }
}
