//! FAIRDICE — Provably-Fair Dice Staking Engine
//!
//! Entry point. Loads configuration, initialises structured logging,
//! restores a session snapshot from disk (or commits a fresh seed pair),
//! and runs the observe→arm→stake loop against the selected provider.

use anyhow::Result;
use tracing::{info, warn};

use fairdice::config::AppConfig;
use fairdice::engine::{Driver, Session};
use fairdice::platforms::simulated::SimulatedCasino;
use fairdice::platforms::stake::StakeClient;
use fairdice::report::{self, SessionSummary};
use fairdice::rng::SeedTriple;
use fairdice::storage::{self, SessionSnapshot};
use fairdice::types::EnginePhase;

const BANNER: &str = r#"
 _____ _    ___ ____  ____ ___ ____ _____
|  ___/ \  |_ _|  _ \|  _ \_ _/ ___| ____|
| |_ / _ \  | || |_) | | | | | |   |  _|
|  _/ ___ \ | ||  _ <| |_| | | |___| |___
|_|/_/   \_\___|_| \_\____/___\____|_____|

  Provably-Fair Dice Staking Engine
  v0.1.0
"#;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (non-fatal if missing)
    let _ = dotenv::dotenv();

    let cfg = AppConfig::load("config.toml")?;

    init_logging();

    println!("{BANNER}");
    info!(
        session_name = %cfg.session.name,
        trials = cfg.session.trials,
        initial_bankroll = %cfg.session.initial_bankroll,
        currency = %cfg.session.currency,
        provider = %cfg.provider.mode,
        "FAIRDICE starting up"
    );

    let strategy = cfg.staking.build();
    let session_config = cfg.session_config();

    // -- Restore or create the session -----------------------------------

    let (mut session, mut seeds) =
        match storage::load_snapshot(Some(&cfg.output.snapshot_path))? {
            Some(snapshot) => Session::resume(session_config, strategy, snapshot)?,
            None => {
                let seeds = if cfg.seeds.use_random {
                    SeedTriple::generated()
                } else {
                    SeedTriple::new(
                        cfg.seeds.server_seed.as_deref().unwrap_or_default(),
                        cfg.seeds.client_seed.as_deref().unwrap_or_default(),
                        cfg.seeds.start_nonce,
                    )?
                };
                // Logged up front so every roll of the run can be audited.
                info!(
                    server_seed = %seeds.server_seed,
                    client_seed = %seeds.client_seed,
                    nonce = seeds.nonce,
                    "Seed pair committed"
                );
                (Session::new(session_config, strategy)?, seeds)
            }
        };

    // -- Run against the selected provider --------------------------------

    match cfg.provider.mode.as_str() {
        "stake" => {
            let api_key = AppConfig::resolve_env(&cfg.provider.api_key_env)?;
            let client = StakeClient::new(api_key, cfg.provider.base_url.clone())?;
            let driver = Driver::new(client, cfg.driver_config());

            // The remote house owns the real seed pair; the local triple only
            // mirrors how many nonces this session has consumed.
            let before = session.trials_used();
            run_until_shutdown(&driver, &mut session).await?;
            seeds.nonce += session.trials_used() - before;
        }
        _ => {
            let casino = SimulatedCasino::new(
                seeds.clone(),
                session.state().bankroll,
                cfg.provider.house_edge,
            );
            let driver = Driver::new(casino, cfg.driver_config());
            run_until_shutdown(&driver, &mut session).await?;
            seeds = driver.provider().seeds().await;
        }
    }

    // -- Report and persist ------------------------------------------------

    let summary = SessionSummary::from_session(&session);
    println!("{summary}");
    for mode in session.mode_tracker().reports() {
        info!("{mode}");
    }

    report::export_ledger(session.ledger(), &cfg.output.ledger_path)?;
    report::export_modes(session.mode_tracker().reports(), &cfg.output.modes_path)?;

    // Exhausted runs stay resumable (a larger trial budget re-arms them);
    // the other terminal stops are final, so their snapshots get cleared.
    match session.phase() {
        EnginePhase::ProfitTargetStop | EnginePhase::DrawdownStop => {
            storage::delete_snapshot(Some(&cfg.output.snapshot_path))?;
        }
        _ => {
            let snapshot = SessionSnapshot::capture(&session, &seeds);
            storage::save_snapshot(&snapshot, Some(&cfg.output.snapshot_path))?;
        }
    }

    info!(
        phase = %session.phase(),
        bankroll = %session.state().bankroll,
        trials = session.trials_used(),
        "FAIRDICE shut down cleanly."
    );

    Ok(())
}

async fn run_until_shutdown<P: fairdice::platforms::BetProvider>(
    driver: &Driver<P>,
    session: &mut Session,
) -> Result<()> {
    tokio::select! {
        res = driver.run(session) => res?,
        _ = tokio::signal::ctrl_c() => {
            warn!("Shutdown signal received.");
            session.finish();
        }
    }
    Ok(())
}

fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("fairdice=info"));

    let json_logging = std::env::var("FAIRDICE_LOG_JSON").is_ok();

    if json_logging {
        fmt()
            .json()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_thread_ids(true)
            .init();
    } else {
        fmt()
            .with_env_filter(env_filter)
            .with_target(true)
            .init();
    }
}
