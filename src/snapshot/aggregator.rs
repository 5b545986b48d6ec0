//! Snapshot aggregator - folds raw feed records into canonical form
//!
//! Missing and unreadable wire fields are resolved to neutral defaults
//! here, in exactly one place. Downstream derivations only ever see the
//! canonical [`crate::types`] values; none of them re-checks the wire.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::snapshot::raw::{
    self, RawBotStatus, RawDecisionRecord, RawFeed, RawHeartbeat, RawLivePnl, RawOverride,
    RawPosition, RawPrimarySignal, RawRegimeContext, RawSecondarySignal,
};
use crate::types::{
    BotStatus, DecisionKind, DecisionRecord, Heartbeat, LivePnl, MarketBias, OverrideNote,
    Position, PositionPnl, PositionStatus, PrimarySignal, RegimeContext, SecondarySignal,
    SpreadKind,
};

/// One canonical snapshot of every feed the bot emits.
///
/// `status`, `positions` and `decisions` always carry a value (defaulted when
/// the feed was absent); the signal and live P&L feeds stay `None` when
/// absent because "no signal this cycle" is meaningful on its own.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FeedSnapshot {
    /// Canonical bot status
    pub status: BotStatus,
    /// Canonical position ledger
    pub positions: Vec<Position>,
    /// Primary signal, if the feed carried one
    pub primary: Option<PrimarySignal>,
    /// Secondary advisory, if the feed carried one
    pub secondary: Option<SecondarySignal>,
    /// Canonical decision log
    pub decisions: Vec<DecisionRecord>,
    /// Live P&L snapshot, if the feed carried one
    pub live_pnl: Option<LivePnl>,
}

impl FeedSnapshot {
    /// Fold one combined raw snapshot into canonical form.
    pub fn from_raw(feed: RawFeed) -> Self {
        let mut absent: Vec<&str> = Vec::new();
        if feed.status.is_none() {
            absent.push("status");
        }
        if feed.positions.is_none() {
            absent.push("positions");
        }
        if feed.decisions.is_none() {
            absent.push("decisions");
        }
        if !absent.is_empty() {
            debug!("Feeds absent from snapshot: {}", absent.join(", "));
        }

        Self {
            status: feed.status.map(canonical_status).unwrap_or_default(),
            positions: feed.positions.map(canonical_positions).unwrap_or_default(),
            primary: feed.primary.map(canonical_primary),
            secondary: feed.secondary.map(canonical_secondary),
            decisions: feed.decisions.map(canonical_decisions).unwrap_or_default(),
            live_pnl: feed.live_pnl.map(canonical_live_pnl),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Per-feed canonicalizers
// ─────────────────────────────────────────────────────────────────────────────

/// Canonicalize a raw status record.
pub fn canonical_status(status: RawBotStatus) -> BotStatus {
    BotStatus {
        mode: status.mode.unwrap_or_else(|| "N/A".to_string()),
        capital: status.capital.unwrap_or(0.0),
        open_position_count: status.open_position_count.unwrap_or(0),
        closed_today: status.closed_today.unwrap_or(0),
        daily_trade_count: status.daily_trade_count.unwrap_or(0),
        daily_pnl: status.daily_pnl.unwrap_or(0.0),
        primary_available: status.primary_available.unwrap_or(false),
        secondary_available: status.secondary_available.unwrap_or(false),
        heartbeat: status.heartbeat.map(canonical_heartbeat).unwrap_or_default(),
    }
}

fn canonical_heartbeat(heartbeat: RawHeartbeat) -> Heartbeat {
    Heartbeat {
        last_scan: parse_wire_timestamp(heartbeat.last_scan.as_ref(), "heartbeat.last_scan"),
        status: heartbeat.status.unwrap_or_else(|| "N/A".to_string()),
        scan_count_today: heartbeat.scan_count_today.unwrap_or(0),
    }
}

/// Canonicalize the raw position ledger.
pub fn canonical_positions(positions: Vec<RawPosition>) -> Vec<Position> {
    positions.into_iter().map(canonical_position).collect()
}

fn canonical_position(position: RawPosition) -> Position {
    let id = position.id.unwrap_or_default();

    let kind = match position.kind.as_deref() {
        Some(label) => SpreadKind::from_label(label).unwrap_or_else(|| {
            warn!("Position '{}': unrecognized spread kind '{}'", id, label);
            SpreadKind::default()
        }),
        None => SpreadKind::default(),
    };

    // Unrecognized lifecycle labels land on Closed, which no derivation
    // counts without an exit timestamp.
    let status = match position.status.as_deref() {
        Some(label) => PositionStatus::from_label(label).unwrap_or_else(|| {
            warn!("Position '{}': unrecognized status '{}'", id, label);
            PositionStatus::default()
        }),
        None => PositionStatus::default(),
    };

    let created_at = parse_wire_timestamp(position.created_at.as_ref(), "position.created_at");
    let exited_at = parse_wire_timestamp(position.exited_at.as_ref(), "position.exited_at");

    Position {
        id,
        symbol: position.symbol.unwrap_or_else(|| "N/A".to_string()),
        kind,
        long_strike: position.long_strike.unwrap_or(0.0),
        short_strike: position.short_strike.unwrap_or(0.0),
        contracts: position.contracts.unwrap_or(0),
        entry_price: position.entry_price.unwrap_or(0.0),
        max_profit: position.max_profit.unwrap_or(0.0),
        max_loss: position.max_loss.unwrap_or(0.0),
        status,
        realized_pnl: position.realized_pnl.unwrap_or(0.0),
        created_at,
        exited_at,
    }
}

/// Canonicalize a raw primary signal.
pub fn canonical_primary(signal: RawPrimarySignal) -> PrimarySignal {
    let bias = match signal.bias.as_deref() {
        Some(label) => MarketBias::from_label(label).unwrap_or_else(|| {
            warn!("Unrecognized market bias '{}'", label);
            MarketBias::Neutral
        }),
        None => MarketBias::Neutral,
    };
    PrimarySignal {
        advice: signal.advice.unwrap_or_else(|| "N/A".to_string()),
        confidence: signal.confidence.unwrap_or(0.0),
        win_probability: signal.win_probability.unwrap_or(0.0),
        bias,
        regime: signal.regime.map(canonical_regime).unwrap_or_default(),
    }
}

/// Canonicalize a raw secondary advisory.
pub fn canonical_secondary(signal: RawSecondarySignal) -> SecondarySignal {
    SecondarySignal {
        advice: signal.advice.unwrap_or_else(|| "N/A".to_string()),
        confidence: signal.confidence.unwrap_or(0.0),
        win_probability: signal.win_probability.unwrap_or(0.0),
        reasoning: signal.reasoning.unwrap_or_default(),
    }
}

fn canonical_regime(regime: RawRegimeContext) -> RegimeContext {
    RegimeContext {
        spot: regime.spot.unwrap_or(0.0),
        call_wall: regime.call_wall.unwrap_or(0.0),
        put_wall: regime.put_wall.unwrap_or(0.0),
        net_gex: regime.net_gex.unwrap_or(0.0),
        label: regime.label.unwrap_or_else(|| "N/A".to_string()),
    }
}

/// Canonicalize the raw decision log.
pub fn canonical_decisions(decisions: Vec<RawDecisionRecord>) -> Vec<DecisionRecord> {
    decisions.into_iter().map(canonical_decision).collect()
}

fn canonical_decision(decision: RawDecisionRecord) -> DecisionRecord {
    let id = decision.id.unwrap_or_default();

    let kind = match decision.kind.as_deref() {
        Some(label) => {
            let parsed = DecisionKind::from_label(label);
            if parsed.is_none() {
                warn!("Decision '{}': unrecognized kind '{}'", id, label);
            }
            parsed
        }
        None => None,
    };

    DecisionRecord {
        id,
        timestamp: parse_wire_timestamp(decision.timestamp.as_ref(), "decision.timestamp"),
        kind,
        action: decision.action.unwrap_or_else(|| "N/A".to_string()),
        what: decision.what,
        why: decision.why,
        how: decision.how,
        override_note: decision.override_note.and_then(canonical_override),
        primary: decision.primary.map(canonical_primary),
        secondary: decision.secondary.map(canonical_secondary),
        regime: decision.regime.map(canonical_regime),
        executed: decision.executed.unwrap_or(false),
    }
}

fn canonical_override(note: RawOverride) -> Option<OverrideNote> {
    // An override entry counts unless the bot explicitly un-flagged it.
    if note.flag == Some(false) {
        return None;
    }
    Some(OverrideNote {
        detail: note.detail.unwrap_or_default(),
    })
}

/// Canonicalize a raw live P&L snapshot.
pub fn canonical_live_pnl(pnl: RawLivePnl) -> LivePnl {
    let positions = pnl
        .positions
        .unwrap_or_default()
        .into_iter()
        .map(|row| PositionPnl {
            position_id: row.position_id.unwrap_or_default(),
            unrealized_pnl: row.unrealized_pnl.unwrap_or(0.0),
        })
        .collect();

    LivePnl {
        positions,
        total_realized_pnl: pnl.total_realized_pnl.unwrap_or(0.0),
        total_unrealized_pnl: pnl.total_unrealized_pnl.unwrap_or(0.0),
        underlying_price: pnl.underlying_price.unwrap_or(0.0),
        last_updated: parse_wire_timestamp(pnl.last_updated.as_ref(), "live_pnl.last_updated"),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Shared helpers
// ─────────────────────────────────────────────────────────────────────────────

fn parse_wire_timestamp(
    value: Option<&serde_json::Value>,
    field: &str,
) -> Option<DateTime<Utc>> {
    let value = value?;
    if value.is_null() {
        return None;
    }
    let parsed = raw::parse_timestamp(value);
    if parsed.is_none() {
        warn!("Unreadable {} value: {}", field, value);
    }
    parsed
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn make_raw_position(kind: &str, status: &str) -> RawPosition {
        RawPosition {
            id: Some("P-1".to_string()),
            symbol: Some("SPX".to_string()),
            kind: Some(kind.to_string()),
            long_strike: Some(5000.0),
            short_strike: Some(5050.0),
            contracts: Some(1),
            entry_price: Some(2.15),
            max_profit: Some(215.0),
            max_loss: Some(-4785.0),
            status: Some(status.to_string()),
            realized_pnl: Some(0.0),
            created_at: Some(serde_json::json!("2024-01-02T15:00:00Z")),
            exited_at: None,
        }
    }

    #[test]
    fn test_empty_feed_yields_neutral_snapshot() {
        let snapshot = FeedSnapshot::from_raw(RawFeed::default());
        assert_eq!(snapshot.status.mode, "N/A");
        assert_eq!(snapshot.status.daily_trade_count, 0);
        assert!(snapshot.positions.is_empty());
        assert!(snapshot.decisions.is_empty());
        assert!(snapshot.primary.is_none());
        assert!(snapshot.secondary.is_none());
        assert!(snapshot.live_pnl.is_none());
    }

    #[test]
    fn test_position_labels_parse() {
        let pos = canonical_position(make_raw_position("bear_call", "open"));
        assert_eq!(pos.kind, SpreadKind::Bearish);
        assert_eq!(pos.status, PositionStatus::Open);
        assert!(pos.created_at.is_some());
        assert!(pos.exited_at.is_none());
    }

    #[test]
    fn test_unrecognized_labels_fall_back() {
        let pos = canonical_position(make_raw_position("iron_condor", "pending"));
        assert_eq!(pos.kind, SpreadKind::Bullish);
        // Closed with no exit timestamp stays out of every derivation
        assert_eq!(pos.status, PositionStatus::Closed);
    }

    #[test]
    fn test_sparse_position_gets_defaults() {
        let pos = canonical_position(RawPosition::default());
        assert_eq!(pos.id, "");
        assert_eq!(pos.symbol, "N/A");
        assert_eq!(pos.contracts, 0);
        assert_eq!(pos.realized_pnl, 0.0);
        assert_eq!(pos.status, PositionStatus::Closed);
    }

    #[test]
    fn test_primary_signal_bias_and_regime() {
        let raw = RawPrimarySignal {
            advice: Some("BULL_PUT_SPREAD".to_string()),
            confidence: Some(0.72),
            win_probability: Some(0.64),
            bias: Some("up".to_string()),
            regime: Some(RawRegimeContext {
                spot: Some(5021.5),
                call_wall: Some(5100.0),
                put_wall: Some(4950.0),
                net_gex: Some(1.2e9),
                label: None,
            }),
        };
        let signal = canonical_primary(raw);
        assert_eq!(signal.bias, MarketBias::Bullish);
        assert_eq!(signal.regime.label, "N/A");
        assert_eq!(signal.regime.put_wall, 4950.0);
    }

    #[test]
    fn test_decision_kind_and_override() {
        let raw = RawDecisionRecord {
            id: Some("D-9".to_string()),
            kind: Some("no_trade".to_string()),
            override_note: Some(RawOverride {
                detail: Some("secondary vetoed entry".to_string()),
                flag: None,
            }),
            ..RawDecisionRecord::default()
        };
        let decision = canonical_decision(raw);
        assert_eq!(decision.kind, Some(DecisionKind::Skip));
        assert_eq!(decision.action, "N/A");
        assert!(!decision.executed);
        assert_eq!(
            decision.override_note.unwrap().detail,
            "secondary vetoed entry"
        );
    }

    #[test]
    fn test_unflagged_override_is_dropped() {
        let raw = RawDecisionRecord {
            override_note: Some(RawOverride {
                detail: Some("noted but not acted on".to_string()),
                flag: Some(false),
            }),
            ..RawDecisionRecord::default()
        };
        assert!(canonical_decision(raw).override_note.is_none());
    }

    #[test]
    fn test_live_pnl_rows() {
        let raw = RawLivePnl {
            positions: Some(vec![crate::snapshot::raw::RawPositionPnl {
                position_id: Some("P-1".to_string()),
                unrealized_pnl: Some(42.0),
            }]),
            total_realized_pnl: None,
            total_unrealized_pnl: Some(42.0),
            underlying_price: Some(5021.5),
            last_updated: Some(serde_json::json!(1_704_207_000)),
        };
        let pnl = canonical_live_pnl(raw);
        assert_eq!(pnl.positions.len(), 1);
        assert_eq!(pnl.total_realized_pnl, 0.0);
        assert_eq!(pnl.total_unrealized_pnl, 42.0);
        assert!(pnl.last_updated.is_some());
    }

    #[test]
    fn test_round_trip_through_json() {
        let json = r#"{
            "status": {"mode": "paper", "capital": 100000.0, "daily_trade_count": 2},
            "positions": [{"id": "P-1", "spread_type": "bull_put", "status": "open"}],
            "decisions": [{"id": "D-1", "type": "entry", "executed": true}]
        }"#;
        let snapshot = FeedSnapshot::from_raw(RawFeed::from_json(json).unwrap());
        assert_eq!(snapshot.status.mode, "paper");
        assert_eq!(snapshot.status.daily_trade_count, 2);
        assert_eq!(snapshot.positions[0].kind, SpreadKind::Bullish);
        assert_eq!(snapshot.decisions[0].kind, Some(DecisionKind::Entry));
        assert!(snapshot.decisions[0].executed);
    }
}
