//! Persistence layer.
//!
//! Saves and loads a session snapshot to/from a JSON file. The snapshot
//! carries exactly what a resumed session cannot reconstruct: the seed
//! triple (so the nonce stream continues where it stopped), the betting
//! state, the phase, and the outcome history behind the statistic. The
//! ledger is an export concern, not a resume concern.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info};
use uuid::Uuid;

use crate::engine::Session;
use crate::rng::SeedTriple;
use crate::stats::history::OutcomeHistory;
use crate::types::{BettingState, EnginePhase};

/// Default snapshot file path.
const DEFAULT_SNAPSHOT_FILE: &str = "fairdice_state.json";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub session_id: Uuid,
    pub saved_at: DateTime<Utc>,
    pub seeds: SeedTriple,
    pub phase: EnginePhase,
    pub state: BettingState,
    pub history: OutcomeHistory,
    pub trials_used: u64,
}

impl SessionSnapshot {
    pub fn capture(session: &Session, seeds: &SeedTriple) -> Self {
        Self {
            session_id: session.id(),
            saved_at: Utc::now(),
            seeds: seeds.clone(),
            phase: session.phase(),
            state: session.state().clone(),
            history: session.history().clone(),
            trials_used: session.trials_used(),
        }
    }
}

/// Save a session snapshot to a JSON file.
pub fn save_snapshot(snapshot: &SessionSnapshot, path: Option<&str>) -> Result<()> {
    let path = path.unwrap_or(DEFAULT_SNAPSHOT_FILE);
    let json = serde_json::to_string_pretty(snapshot)
        .context("Failed to serialise session snapshot")?;

    std::fs::write(path, &json)
        .context(format!("Failed to write snapshot to {path}"))?;

    debug!(path, bankroll = %snapshot.state.bankroll, "Snapshot saved");
    Ok(())
}

/// Load a session snapshot from a JSON file.
/// Returns None if the file doesn't exist (fresh start).
pub fn load_snapshot(path: Option<&str>) -> Result<Option<SessionSnapshot>> {
    let path = path.unwrap_or(DEFAULT_SNAPSHOT_FILE);

    if !Path::new(path).exists() {
        info!(path, "No saved snapshot found, starting fresh");
        return Ok(None);
    }

    let json = std::fs::read_to_string(path)
        .context(format!("Failed to read snapshot from {path}"))?;

    let snapshot: SessionSnapshot = serde_json::from_str(&json)
        .context(format!("Failed to parse snapshot from {path}"))?;

    info!(
        path,
        session_id = %snapshot.session_id,
        nonce = snapshot.seeds.nonce,
        bankroll = %snapshot.state.bankroll,
        trials = snapshot.trials_used,
        "Snapshot loaded from disk"
    );

    Ok(Some(snapshot))
}

/// Delete the snapshot file (for testing or reset).
pub fn delete_snapshot(path: Option<&str>) -> Result<()> {
    let path = path.unwrap_or(DEFAULT_SNAPSHOT_FILE);
    if Path::new(path).exists() {
        std::fs::remove_file(path)
            .context(format!("Failed to delete snapshot file {path}"))?;
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
