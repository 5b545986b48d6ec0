//! Derivation module - pure functions over the canonical snapshot
//!
//! Each submodule answers one dashboard question (traded today, why not,
//! equity curve, conflicts, decision path); [`derive_state`] runs them all
//! over a single snapshot with "today" computed exactly once.

pub mod conflicts;
pub mod decision_path;
pub mod equity;
pub mod health;
pub mod skips;
pub mod traded;

pub use conflicts::{
    detect_conflicts, ConflictOutcome, ConflictRecord, ConflictSummary, ConflictWinner,
};
pub use decision_path::{summarize_decision_path, DecisionTier, DecisionTrace, TraceStep};
pub use equity::{equity_curve, EquityPoint, CURRENT_LABEL, OPEN_LABEL};
pub use health::{feed_health, FeedHealth, SourceHealth};
pub use skips::{extract_skip_reasons, SkipCategory, SkipReason};
pub use traded::traded_today;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::EngineConfig;
use crate::snapshot::FeedSnapshot;

/// Everything the dashboard derives from one canonical snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DerivedState {
    /// Did trading activity happen today
    pub traded_today: bool,
    /// Today's skip decisions, categorized
    pub skip_reasons: Vec<SkipReason>,
    /// Realized curve plus the live point
    pub equity_curve: Vec<EquityPoint>,
    /// Today's advisory conflict scoreboard
    pub conflicts: ConflictSummary,
    /// Four-step narration of the current decision
    pub decision_trace: DecisionTrace,
    /// The `now` this state was derived at
    pub generated_at: DateTime<Utc>,
}

/// Run every derivation over one snapshot.
///
/// `today` is taken from `now` exactly once so a date rollover mid-call
/// cannot split the derivations across two days. Same inputs, same output;
/// nothing here reads the wall clock or mutates the snapshot.
pub fn derive_state(
    snapshot: &FeedSnapshot,
    config: &EngineConfig,
    now: DateTime<Utc>,
) -> DerivedState {
    let today = now.date_naive();

    let traded = traded_today(
        snapshot.status.daily_trade_count,
        &snapshot.positions,
        today,
    );
    let skip_reasons = extract_skip_reasons(&snapshot.decisions, &config.signals, today);
    let curve = equity_curve(
        &snapshot.positions,
        config.equity.starting_capital,
        snapshot.live_pnl.as_ref(),
        config.equity.session_open(),
        now,
    );
    let conflicts = detect_conflicts(&snapshot.decisions, &config.signals, today);

    let regime_label = snapshot
        .primary
        .as_ref()
        .map(|s| s.regime.label.as_str())
        .unwrap_or("N/A");
    let decision_trace = summarize_decision_path(
        snapshot.primary.as_ref(),
        snapshot.secondary.as_ref(),
        regime_label,
        traded,
        &config.signals,
        &config.tiers,
    );

    debug!(
        "Derived state: traded_today={}, skips={}, curve_points={}, conflicts={}, tier={}",
        traded,
        skip_reasons.len(),
        curve.len(),
        conflicts.conflicts.len(),
        decision_trace.tier,
    );

    DerivedState {
        traded_today: traded,
        skip_reasons,
        equity_curve: curve,
        conflicts,
        decision_trace,
        generated_at: now,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_empty_snapshot_derives_all_defaults() {
        let now = Utc.with_ymd_and_hms(2024, 1, 5, 12, 0, 0).unwrap();
        let state = derive_state(&FeedSnapshot::default(), &EngineConfig::default(), now);

        assert!(!state.traded_today);
        assert!(state.skip_reasons.is_empty());
        assert!(state.equity_curve.is_empty());
        assert_eq!(state.conflicts.scans_today, 0);
        assert!(state.conflicts.conflicts.is_empty());
        assert_eq!(state.decision_trace.tier, DecisionTier::Skip);
        assert_eq!(state.decision_trace.combined_probability, 0.0);
        assert_eq!(state.generated_at, now);
    }

    #[test]
    fn test_derivation_is_deterministic() {
        let now = Utc.with_ymd_and_hms(2024, 1, 5, 12, 0, 0).unwrap();
        let config = EngineConfig::default();
        let snapshot = FeedSnapshot::default();
        let a = derive_state(&snapshot, &config, now);
        let b = derive_state(&snapshot, &config, now);
        assert_eq!(
            serde_json::to_string(&a).unwrap(),
            serde_json::to_string(&b).unwrap()
        );
    }
}
