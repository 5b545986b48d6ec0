//! Wire-format records for the bot's JSON feed files
//!
//! The bot process writes each feed as best-effort JSON: fields come and go
//! across bot versions, and an interrupted scan can leave half-filled
//! records behind. Every field here is therefore optional. Canonical
//! defaults are applied in exactly one place (the snapshot aggregator),
//! never at the read site.

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use serde::Deserialize;

// ─────────────────────────────────────────────────────────────────────────────
// Feed payloads
// ─────────────────────────────────────────────────────────────────────────────

/// One combined snapshot file holding every feed the bot emits.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawFeed {
    /// Bot status feed (mode, capital, heartbeat)
    pub status: Option<RawBotStatus>,
    /// Position ledger feed
    pub positions: Option<Vec<RawPosition>>,
    /// Primary (GEX) signal feed
    #[serde(alias = "primary_signal")]
    pub primary: Option<RawPrimarySignal>,
    /// Secondary (oracle) signal feed
    #[serde(alias = "secondary_signal")]
    pub secondary: Option<RawSecondarySignal>,
    /// Decision log feed
    pub decisions: Option<Vec<RawDecisionRecord>>,
    /// Live P&L feed
    pub live_pnl: Option<RawLivePnl>,
}

impl RawFeed {
    /// Decode a combined snapshot file.
    pub fn from_json(raw: &str) -> Result<Self> {
        serde_json::from_str(raw).context("Failed to decode combined feed snapshot")
    }
}

/// Bot status as written by the scan loop.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawBotStatus {
    /// Run mode label ("paper", "live", ...)
    pub mode: Option<String>,
    /// Account capital in dollars
    pub capital: Option<f64>,
    /// Count of currently open spreads
    #[serde(alias = "open_positions")]
    pub open_position_count: Option<u32>,
    /// Positions closed since the session opened
    pub closed_today: Option<u32>,
    /// Entries executed since the session opened
    #[serde(alias = "trades_today")]
    pub daily_trade_count: Option<u32>,
    /// Realized P&L since the session opened
    pub daily_pnl: Option<f64>,
    /// Whether the primary signal source answered the last scan
    pub primary_available: Option<bool>,
    /// Whether the secondary signal source answered the last scan
    pub secondary_available: Option<bool>,
    /// Scan-loop heartbeat
    pub heartbeat: Option<RawHeartbeat>,
}

impl RawBotStatus {
    /// Decode a status feed file.
    pub fn from_json(raw: &str) -> Result<Self> {
        serde_json::from_str(raw).context("Failed to decode status feed")
    }
}

/// Scan-loop heartbeat block inside the status feed.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawHeartbeat {
    /// Timestamp of the last completed scan (string or epoch number)
    pub last_scan: Option<serde_json::Value>,
    /// Free-form loop status label
    pub status: Option<String>,
    /// Scans completed since the session opened
    #[serde(alias = "scans_today")]
    pub scan_count_today: Option<u32>,
}

/// One vertical spread as the position ledger records it.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawPosition {
    /// Ledger identifier
    pub id: Option<String>,
    /// Underlying symbol
    pub symbol: Option<String>,
    /// Spread direction label ("bull_put", "bear_call", ...)
    #[serde(alias = "spread_type")]
    pub kind: Option<String>,
    /// Strike of the long leg
    pub long_strike: Option<f64>,
    /// Strike of the short leg
    pub short_strike: Option<f64>,
    /// Number of contracts
    #[serde(alias = "quantity")]
    pub contracts: Option<u32>,
    /// Net credit or debit per spread at entry
    pub entry_price: Option<f64>,
    /// Best-case P&L for the whole position
    pub max_profit: Option<f64>,
    /// Worst-case P&L for the whole position
    pub max_loss: Option<f64>,
    /// Lifecycle label ("open", "closed", "expired")
    pub status: Option<String>,
    /// Realized P&L once settled
    #[serde(alias = "pnl")]
    pub realized_pnl: Option<f64>,
    /// Entry timestamp (string or epoch number)
    #[serde(alias = "entry_time", alias = "opened_at")]
    pub created_at: Option<serde_json::Value>,
    /// Exit timestamp, absent while open (string or epoch number)
    #[serde(alias = "exit_time", alias = "closed_at")]
    pub exited_at: Option<serde_json::Value>,
}

/// Decode a position ledger file (a JSON array).
pub fn decode_positions(raw: &str) -> Result<Vec<RawPosition>> {
    serde_json::from_str(raw).context("Failed to decode position ledger feed")
}

/// GEX-derived regime block attached to signals and decisions.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawRegimeContext {
    /// Underlying spot price
    #[serde(alias = "spot_price")]
    pub spot: Option<f64>,
    /// Call wall strike
    pub call_wall: Option<f64>,
    /// Put wall strike
    pub put_wall: Option<f64>,
    /// Net gamma exposure
    pub net_gex: Option<f64>,
    /// Human-readable regime label
    #[serde(alias = "regime")]
    pub label: Option<String>,
}

/// Primary (GEX) signal as the signal feed records it.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawPrimarySignal {
    /// Advice label ("bull_put_spread", "skip", ...)
    pub advice: Option<String>,
    /// Model confidence in [0, 1]
    pub confidence: Option<f64>,
    /// Estimated probability the spread expires profitable
    #[serde(alias = "win_prob")]
    pub win_probability: Option<f64>,
    /// Directional read ("bullish", "bearish", "neutral")
    pub bias: Option<String>,
    /// Regime context at signal time
    pub regime: Option<RawRegimeContext>,
}

impl RawPrimarySignal {
    /// Decode a primary signal feed file.
    pub fn from_json(raw: &str) -> Result<Self> {
        serde_json::from_str(raw).context("Failed to decode primary signal feed")
    }
}

/// Secondary (oracle) signal as the signal feed records it.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawSecondarySignal {
    /// Advice label
    pub advice: Option<String>,
    /// Model confidence in [0, 1]
    pub confidence: Option<f64>,
    /// Estimated probability the spread expires profitable
    #[serde(alias = "win_prob")]
    pub win_probability: Option<f64>,
    /// Free-form model reasoning
    pub reasoning: Option<String>,
}

impl RawSecondarySignal {
    /// Decode a secondary signal feed file.
    pub fn from_json(raw: &str) -> Result<Self> {
        serde_json::from_str(raw).context("Failed to decode secondary signal feed")
    }
}

/// Override annotation inside a decision record.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawOverride {
    /// Which signal overrode which, in prose
    #[serde(alias = "reason")]
    pub detail: Option<String>,
    /// Explicit override marker; absent counts as flagged
    pub flag: Option<bool>,
}

/// One entry in the bot's decision log.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawDecisionRecord {
    /// Log identifier
    pub id: Option<String>,
    /// When the decision was made (string or epoch number)
    pub timestamp: Option<serde_json::Value>,
    /// Decision kind label ("entry", "exit", "skip")
    #[serde(alias = "type", alias = "decision_type")]
    pub kind: Option<String>,
    /// Action label, what the bot did
    pub action: Option<String>,
    /// What was considered
    pub what: Option<String>,
    /// Why the bot acted as it did
    pub why: Option<String>,
    /// How the decision was carried out
    pub how: Option<String>,
    /// Present when one signal overrode the other
    #[serde(rename = "override", alias = "override_note")]
    pub override_note: Option<RawOverride>,
    /// Primary signal snapshot at decision time
    #[serde(alias = "primary_signal")]
    pub primary: Option<RawPrimarySignal>,
    /// Secondary signal snapshot at decision time
    #[serde(alias = "secondary_signal")]
    pub secondary: Option<RawSecondarySignal>,
    /// Regime context at decision time
    pub regime: Option<RawRegimeContext>,
    /// Whether the decision produced a fill
    pub executed: Option<bool>,
}

/// Decode a decision log file (a JSON array).
pub fn decode_decisions(raw: &str) -> Result<Vec<RawDecisionRecord>> {
    serde_json::from_str(raw).context("Failed to decode decision log feed")
}

/// Per-position mark inside the live P&L feed.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawPositionPnl {
    /// Ledger identifier of the marked position
    #[serde(alias = "id")]
    pub position_id: Option<String>,
    /// Mark-to-market P&L for the open position
    #[serde(alias = "pnl")]
    pub unrealized_pnl: Option<f64>,
}

/// Live P&L as the marking loop records it.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawLivePnl {
    /// Per-position marks
    pub positions: Option<Vec<RawPositionPnl>>,
    /// Realized P&L across all settled positions
    pub total_realized_pnl: Option<f64>,
    /// Mark-to-market P&L across all open positions
    pub total_unrealized_pnl: Option<f64>,
    /// Underlying spot at mark time
    #[serde(alias = "spot")]
    pub underlying_price: Option<f64>,
    /// When the marks were taken (string or epoch number)
    pub last_updated: Option<serde_json::Value>,
}

impl RawLivePnl {
    /// Decode a live P&L feed file.
    pub fn from_json(raw: &str) -> Result<Self> {
        serde_json::from_str(raw).context("Failed to decode live P&L feed")
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Timestamp parsing
// ─────────────────────────────────────────────────────────────────────────────

/// Smallest value treated as epoch milliseconds rather than seconds.
const EPOCH_MILLIS_CUTOFF: i64 = 100_000_000_000;

/// Parse a wire timestamp into UTC, returning `None` for anything unreadable.
///
/// The bot has written timestamps in several shapes over its life: RFC 3339
/// strings, naive `"%Y-%m-%d %H:%M:%S"` strings, and raw epoch numbers in
/// either seconds or milliseconds. All of them are accepted here.
pub fn parse_timestamp(value: &serde_json::Value) -> Option<DateTime<Utc>> {
    match value {
        serde_json::Value::String(s) => parse_timestamp_str(s),
        serde_json::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                parse_epoch(i)
            } else {
                // Fractional epoch seconds, e.g. Python's time.time()
                n.as_f64()
                    .and_then(|f| Utc.timestamp_millis_opt((f * 1000.0) as i64).single())
            }
        }
        _ => None,
    }
}

fn parse_timestamp_str(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(naive.and_utc());
        }
    }
    // Epoch written as a quoted number
    s.parse::<i64>().ok().and_then(parse_epoch)
}

fn parse_epoch(value: i64) -> Option<DateTime<Utc>> {
    if value <= 0 {
        return None;
    }
    if value >= EPOCH_MILLIS_CUTOFF {
        Utc.timestamp_millis_opt(value).single()
    } else {
        Utc.timestamp_opt(value, 0).single()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
