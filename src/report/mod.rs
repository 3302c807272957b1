//! End-of-session reporting: a printable summary and a CSV ledger export.

use std::fmt;
use std::path::Path;

use anyhow::{Context, Result};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tracing::info;

use crate::engine::Session;
use crate::types::{BetRecord, EnginePhase, ModeReport};

// ---------------------------------------------------------------------------
// Summary
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct SessionSummary {
    pub phase: EnginePhase,
    pub trials: u64,
    pub initial_bankroll: Decimal,
    pub final_bankroll: Decimal,
    pub peak_bankroll: Decimal,
    pub total_return: Decimal,
    pub return_pct: f64,
    pub max_drawdown_pct: f64,
    pub bets: usize,
    pub win_rate_pct: f64,
    pub modes: usize,
}

impl SessionSummary {
    pub fn from_session(session: &Session) -> Self {
        let initial = session.config().initial_bankroll;
        let final_bankroll = session.state().bankroll;
        let total_return = final_bankroll - initial;
        let return_pct = if initial > Decimal::ZERO {
            (total_return / initial * dec!(100)).to_f64().unwrap_or(0.0)
        } else {
            0.0
        };

        Self {
            phase: session.phase(),
            trials: session.trials_used(),
            initial_bankroll: initial,
            final_bankroll,
            peak_bankroll: session.state().peak_bankroll,
            total_return,
            return_pct,
            max_drawdown_pct: session.drawdown_pct(),
            bets: session.ledger().len(),
            win_rate_pct: session.win_rate_pct(),
            modes: session.mode_tracker().reports().len(),
        }
    }
}

impl fmt::Display for SessionSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "+--------------------------------------------+")?;
        writeln!(f, "|              SESSION SUMMARY               |")?;
        writeln!(f, "+--------------------------------------------+")?;
        writeln!(f, "| Stop reason      {:>25} |", self.phase.to_string())?;
        writeln!(f, "| Trials           {:>25} |", self.trials)?;
        writeln!(f, "| Bets settled     {:>25} |", self.bets)?;
        writeln!(f, "| Win rate         {:>24.2}% |", self.win_rate_pct)?;
        writeln!(f, "| Initial bankroll {:>25} |", self.initial_bankroll)?;
        writeln!(f, "| Final bankroll   {:>25} |", self.final_bankroll)?;
        writeln!(f, "| Peak bankroll    {:>25} |", self.peak_bankroll)?;
        writeln!(f, "| Total return     {:>25} |", self.total_return)?;
        writeln!(f, "| Return           {:>24.2}% |", self.return_pct)?;
        writeln!(f, "| Max drawdown     {:>24.2}% |", self.max_drawdown_pct)?;
        writeln!(f, "| Modes observed   {:>25} |", self.modes)?;
        write!(f, "+--------------------------------------------+")
    }
}

// ---------------------------------------------------------------------------
// CSV export
// ---------------------------------------------------------------------------

const LEDGER_HEADER: &str = "Index,Strategy,ZScore,Side,Size,Roll,Outcome,Won,PnL,Bankroll";
const MODES_HEADER: &str = "Mode,StartIndex,TriggerZ,EndIndex,EndReason,MaxContinuation";

fn ledger_line(r: &BetRecord) -> String {
    format!(
        "{},{},{:.4},{},{},{:.2},{},{},{},{}",
        r.index, r.strategy, r.z_score, r.side, r.size, r.roll, r.outcome, r.won, r.pnl,
        r.bankroll_after
    )
}

fn mode_line(m: &ModeReport) -> String {
    format!(
        "{},{},{:.4},{},{},{}",
        m.mode_type, m.start_index, m.trigger_z, m.end_index, m.end_reason, m.max_continuation
    )
}

/// Write the settled-bet ledger to a CSV file.
pub fn export_ledger(records: &[BetRecord], path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let mut out = String::with_capacity(64 * (records.len() + 1));
    out.push_str(LEDGER_HEADER);
    out.push('\n');
    for record in records {
        out.push_str(&ledger_line(record));
        out.push('\n');
    }

    std::fs::write(path, out)
        .context(format!("Failed to write ledger to {}", path.display()))?;
    info!(path = %path.display(), rows = records.len(), "Ledger exported");
    Ok(())
}

/// Write the mode reports to a CSV file.
pub fn export_modes(reports: &[ModeReport], path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let mut out = String::with_capacity(48 * (reports.len() + 1));
    out.push_str(MODES_HEADER);
    out.push('\n');
    for report in reports {
        out.push_str(&mode_line(report));
        out.push('\n');
    }

    std::fs::write(path, out)
        .context(format!("Failed to write mode report to {}", path.display()))?;
    info!(path = %path.display(), rows = reports.len(), "Mode report exported");
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ModeEndReason, ModeType, Side};

    fn record() -> BetRecord {
        BetRecord {
            index: 42,
            strategy: "DALEM".to_string(),
            z_score: -2.7386,
            side: Side::Over,
            size: dec!(0.20),
            roll: 78.77,
            outcome: Side::Over,
            won: true,
            pnl: dec!(0.20),
            bankroll_after: dec!(30.20),
        }
    }

    #[test]
    fn test_ledger_line_format() {
        assert_eq!(
            ledger_line(&record()),
            "42,DALEM,-2.7386,OV,0.20,78.77,OV,true,0.20,30.20"
        );
    }

    #[test]
    fn test_mode_line_format() {
        let m = ModeReport {
            mode_type: ModeType::AntiSync,
            start_index: 100,
            trigger_z: -2.1909,
            end_index: 131,
            end_reason: ModeEndReason::Reversal,
            max_continuation: 7,
        };
        assert_eq!(mode_line(&m), "ANTI-SYNC,100,-2.1909,131,reversal,7");
    }

    #[test]
    fn test_export_ledger_writes_header_and_rows() {
        let mut path = std::env::temp_dir();
        path.push(format!("fairdice_test_ledger_{}.csv", uuid::Uuid::new_v4()));
        export_ledger(&[record()], &path).unwrap();

        let body = std::fs::read_to_string(&path).unwrap();
        let mut lines = body.lines();
        assert_eq!(lines.next(), Some(LEDGER_HEADER));
        assert_eq!(lines.next(), Some(ledger_line(&record()).as_str()));
        assert_eq!(lines.next(), None);

        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_summary_display_contains_key_figures() {
        let summary = SessionSummary {
            phase: EnginePhase::ProfitTargetStop,
            trials: 1234,
            initial_bankroll: dec!(30),
            final_bankroll: dec!(300),
            peak_bankroll: dec!(305),
            total_return: dec!(270),
            return_pct: 900.0,
            max_drawdown_pct: 1.64,
            bets: 87,
            win_rate_pct: 51.72,
            modes: 3,
        };
        let text = summary.to_string();
        assert!(text.contains("SESSION SUMMARY"));
        assert!(text.contains("PROFIT TARGET STOP"));
        assert!(text.contains("900.00%"));
        assert!(text.contains("300"));
    }
}
