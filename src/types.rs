//! Core types used throughout GexDash
//!
//! Canonical, fully-defaulted forms of the per-source payloads the fetch
//! layer polls from the bot backend. Raw wire shapes live in
//! [`crate::snapshot::raw`]; everything downstream of the aggregator works
//! with the types in this module only.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Strategy variant of a two-strike options spread
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SpreadKind {
    Bullish,
    Bearish,
}

impl Default for SpreadKind {
    fn default() -> Self {
        SpreadKind::Bullish
    }
}

impl SpreadKind {
    /// Parse from a wire label
    pub fn from_label(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "bullish" | "bull" | "bull_call" | "bull_put" | "call_spread" => {
                Some(SpreadKind::Bullish)
            }
            "bearish" | "bear" | "bear_call" | "bear_put" | "put_spread" => {
                Some(SpreadKind::Bearish)
            }
            _ => None,
        }
    }
}

impl fmt::Display for SpreadKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SpreadKind::Bullish => write!(f, "BULLISH"),
            SpreadKind::Bearish => write!(f, "BEARISH"),
        }
    }
}

/// Lifecycle state of a position
///
/// Transitions only open -> {closed, expired}; a position never reopens and
/// the exit fields are set exactly once, together with the transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PositionStatus {
    Open,
    Closed,
    Expired,
}

impl Default for PositionStatus {
    fn default() -> Self {
        // Closed with no exit timestamp is inert in every derivation, which
        // makes it the neutral choice for unrecognized wire values.
        PositionStatus::Closed
    }
}

impl PositionStatus {
    /// Parse from a wire label
    pub fn from_label(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "open" => Some(PositionStatus::Open),
            "closed" => Some(PositionStatus::Closed),
            "expired" => Some(PositionStatus::Expired),
            _ => None,
        }
    }

    /// True for closed and expired positions
    pub fn is_settled(&self) -> bool {
        matches!(self, PositionStatus::Closed | PositionStatus::Expired)
    }
}

impl fmt::Display for PositionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PositionStatus::Open => write!(f, "OPEN"),
            PositionStatus::Closed => write!(f, "CLOSED"),
            PositionStatus::Expired => write!(f, "EXPIRED"),
        }
    }
}

/// A multi-leg options spread position
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Position {
    /// Backend position id
    pub id: String,
    /// Underlying instrument symbol
    pub symbol: String,
    /// Bullish or bearish spread
    pub kind: SpreadKind,
    /// Strike of the long leg
    pub long_strike: f64,
    /// Strike of the short leg
    pub short_strike: f64,
    /// Contract count
    pub contracts: u32,
    /// Net entry price (debit/credit)
    pub entry_price: f64,
    /// Maximum profit at expiry
    pub max_profit: f64,
    /// Maximum loss at expiry
    pub max_loss: f64,
    /// Lifecycle status
    pub status: PositionStatus,
    /// Realized P&L; meaningful only once the position is no longer open
    pub realized_pnl: f64,
    /// Creation timestamp (None when the wire value was unparseable)
    pub created_at: Option<DateTime<Utc>>,
    /// Exit timestamp; present only once closed or expired
    pub exited_at: Option<DateTime<Utc>>,
}

/// Predicted market direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MarketBias {
    Bullish,
    Bearish,
    Neutral,
}

impl Default for MarketBias {
    fn default() -> Self {
        MarketBias::Neutral
    }
}

impl MarketBias {
    /// Parse from a wire label
    pub fn from_label(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "bullish" | "up" | "long" => Some(MarketBias::Bullish),
            "bearish" | "down" | "short" => Some(MarketBias::Bearish),
            "neutral" | "flat" => Some(MarketBias::Neutral),
            _ => None,
        }
    }
}

impl fmt::Display for MarketBias {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MarketBias::Bullish => write!(f, "BULLISH"),
            MarketBias::Bearish => write!(f, "BEARISH"),
            MarketBias::Neutral => write!(f, "NEUTRAL"),
        }
    }
}

/// Dealer gamma-positioning context attached to model output
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegimeContext {
    /// Underlying spot price
    pub spot: f64,
    /// Call wall strike level
    pub call_wall: f64,
    /// Put wall strike level
    pub put_wall: f64,
    /// Net gamma exposure
    pub net_gex: f64,
    /// Regime label (e.g. "positive", "negative")
    pub label: String,
}

impl Default for RegimeContext {
    fn default() -> Self {
        Self {
            spot: 0.0,
            call_wall: 0.0,
            put_wall: 0.0,
            net_gex: 0.0,
            label: "N/A".to_string(),
        }
    }
}

/// Model-driven prediction from the primary (GEX) signal subsystem
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrimarySignal {
    /// Advice label (e.g. "BUY_CALL_SPREAD", "WAIT")
    pub advice: String,
    /// Model confidence (0.0 - 1.0)
    pub confidence: f64,
    /// Estimated win probability (0.0 - 1.0)
    pub win_probability: f64,
    /// Predicted direction
    pub bias: MarketBias,
    /// Regime context at signal time
    pub regime: RegimeContext,
}

impl Default for PrimarySignal {
    fn default() -> Self {
        Self {
            advice: "N/A".to_string(),
            confidence: 0.0,
            win_probability: 0.0,
            bias: MarketBias::Neutral,
            regime: RegimeContext::default(),
        }
    }
}

/// Independently computed advisory prediction (the Oracle)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecondarySignal {
    /// Advice label
    pub advice: String,
    /// Advisory confidence (0.0 - 1.0)
    pub confidence: f64,
    /// Estimated win probability (0.0 - 1.0)
    pub win_probability: f64,
    /// Free-text reasoning
    pub reasoning: String,
}

impl Default for SecondarySignal {
    fn default() -> Self {
        Self {
            advice: "N/A".to_string(),
            confidence: 0.0,
            win_probability: 0.0,
            reasoning: String::new(),
        }
    }
}

/// Kind of an audit-log decision entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DecisionKind {
    Entry,
    Exit,
    Skip,
}

impl DecisionKind {
    /// Parse from a wire label
    pub fn from_label(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "entry" | "enter" | "trade" => Some(DecisionKind::Entry),
            "exit" | "close" => Some(DecisionKind::Exit),
            "skip" | "no_trade" | "no-trade" | "notrade" => Some(DecisionKind::Skip),
            _ => None,
        }
    }
}

impl fmt::Display for DecisionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecisionKind::Entry => write!(f, "ENTRY"),
            DecisionKind::Exit => write!(f, "EXIT"),
            DecisionKind::Skip => write!(f, "SKIP"),
        }
    }
}

/// Descriptor of one advisory opinion superseding the other for a cycle
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OverrideNote {
    /// Free text naming the signal that did the overriding and why
    pub detail: String,
}

/// Append-only audit entry describing one scan cycle's outcome
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionRecord {
    /// Backend record id
    pub id: String,
    /// Entry timestamp (None when missing or unparseable)
    pub timestamp: Option<DateTime<Utc>>,
    /// Decision kind (None when the wire value was unrecognized; downstream
    /// treats None as "not a skip")
    pub kind: Option<DecisionKind>,
    /// Action label (e.g. "SKIP", "ENTER_BULLISH")
    pub action: String,
    /// What the bot did
    pub what: Option<String>,
    /// Why it did it
    pub why: Option<String>,
    /// How it did it
    pub how: Option<String>,
    /// Present when one advisory overrode the other this cycle
    pub override_note: Option<OverrideNote>,
    /// Primary signal snapshot at decision time
    pub primary: Option<PrimarySignal>,
    /// Secondary advisory snapshot at decision time
    pub secondary: Option<SecondarySignal>,
    /// Market/regime context at decision time
    pub regime: Option<RegimeContext>,
    /// Whether the cycle executed a trade
    pub executed: bool,
}

/// Per-position unrealized P&L row inside a live snapshot
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PositionPnl {
    pub position_id: String,
    pub unrealized_pnl: f64,
}

/// Ephemeral live P&L snapshot, recomputed by the backend on every poll
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct LivePnl {
    /// Per-position unrealized rows
    pub positions: Vec<PositionPnl>,
    /// Aggregate realized P&L
    pub total_realized_pnl: f64,
    /// Aggregate unrealized P&L
    pub total_unrealized_pnl: f64,
    /// Current underlying price
    pub underlying_price: f64,
    /// Backend-side computation time (None when unparseable)
    pub last_updated: Option<DateTime<Utc>>,
}

/// Bot heartbeat block inside the status payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Heartbeat {
    /// Last scan-cycle timestamp (None when missing or unparseable)
    pub last_scan: Option<DateTime<Utc>>,
    /// Heartbeat status label
    pub status: String,
    /// Scan cycles completed today
    pub scan_count_today: u32,
}

impl Default for Heartbeat {
    fn default() -> Self {
        Self {
            last_scan: None,
            status: "N/A".to_string(),
            scan_count_today: 0,
        }
    }
}

/// Canonical bot status record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BotStatus {
    /// Operating mode label (e.g. "live", "paper")
    pub mode: String,
    /// Current account capital
    pub capital: f64,
    /// Open position count as reported by the backend
    pub open_position_count: u32,
    /// Positions closed today as reported by the backend
    pub closed_today: u32,
    /// Trades executed today as reported by the backend
    pub daily_trade_count: u32,
    /// Realized P&L for today
    pub daily_pnl: f64,
    /// Primary signal subsystem reachable
    pub primary_available: bool,
    /// Secondary advisory subsystem reachable
    pub secondary_available: bool,
    /// Heartbeat block
    pub heartbeat: Heartbeat,
}

impl Default for BotStatus {
    fn default() -> Self {
        Self {
            mode: "N/A".to_string(),
            capital: 0.0,
            open_position_count: 0,
            closed_today: 0,
            daily_trade_count: 0,
            daily_pnl: 0.0,
            primary_available: false,
            secondary_available: false,
            heartbeat: Heartbeat::default(),
        }
    }
}

/// Identifier for one independently polled backend source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FeedSource {
    Status,
    Positions,
    PrimarySignal,
    SecondarySignal,
    Decisions,
    LivePnl,
}

impl FeedSource {
    /// All sources in polling order
    pub const ALL: [FeedSource; 6] = [
        FeedSource::Status,
        FeedSource::Positions,
        FeedSource::PrimarySignal,
        FeedSource::SecondarySignal,
        FeedSource::Decisions,
        FeedSource::LivePnl,
    ];
}

impl fmt::Display for FeedSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeedSource::Status => write!(f, "status"),
            FeedSource::Positions => write!(f, "positions"),
            FeedSource::PrimarySignal => write!(f, "primary_signal"),
            FeedSource::SecondarySignal => write!(f, "secondary_signal"),
            FeedSource::Decisions => write!(f, "decisions"),
            FeedSource::LivePnl => write!(f, "live_pnl"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_labels_round_trip() {
        for status in [
            PositionStatus::Open,
            PositionStatus::Closed,
            PositionStatus::Expired,
        ] {
            let label = status.to_string();
            assert_eq!(PositionStatus::from_label(&label), Some(status));
        }
    }

    #[test]
    fn test_unknown_labels_are_rejected() {
        assert_eq!(PositionStatus::from_label("pending"), None);
        assert_eq!(DecisionKind::from_label("hold"), None);
        assert_eq!(SpreadKind::from_label("iron_condor"), None);
    }

    #[test]
    fn test_decision_kind_accepts_no_trade_spellings() {
        assert_eq!(DecisionKind::from_label("no_trade"), Some(DecisionKind::Skip));
        assert_eq!(DecisionKind::from_label("No-Trade"), Some(DecisionKind::Skip));
        assert_eq!(DecisionKind::from_label("SKIP"), Some(DecisionKind::Skip));
    }

    #[test]
    fn test_settled_statuses() {
        assert!(!PositionStatus::Open.is_settled());
        assert!(PositionStatus::Closed.is_settled());
        assert!(PositionStatus::Expired.is_settled());
    }

    #[test]
    fn test_defaults_are_neutral() {
        let status = BotStatus::default();
        assert_eq!(status.mode, "N/A");
        assert_eq!(status.daily_trade_count, 0);
        assert!(!status.primary_available);
        assert!(status.heartbeat.last_scan.is_none());

        let primary = PrimarySignal::default();
        assert_eq!(primary.advice, "N/A");
        assert_eq!(primary.win_probability, 0.0);
        assert_eq!(primary.regime.label, "N/A");
    }
}
