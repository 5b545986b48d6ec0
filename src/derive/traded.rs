//! Traded-today classifier
//!
//! Four ordered rules decide whether trading activity happened this session.
//! The backend's daily counter is authoritative; the position ledger covers
//! the window after a counter reset or a missed status poll.

use chrono::{DateTime, NaiveDate, Utc};

use crate::types::{Position, PositionStatus};

/// Decide whether trading activity occurred on `today`.
///
/// Rules run in order and the first hit wins:
/// 1. the daily trade counter is non-zero
/// 2. any position is currently open
/// 3. any position was created today
/// 4. any settled position exited today
///
/// `today` must be computed once by the caller and reused across the rules;
/// a timestamp that failed to parse never matches it.
pub fn traded_today(daily_trade_count: u32, positions: &[Position], today: NaiveDate) -> bool {
    if daily_trade_count > 0 {
        return true;
    }
    if positions.iter().any(|p| p.status == PositionStatus::Open) {
        return true;
    }
    if positions.iter().any(|p| falls_on(p.created_at, today)) {
        return true;
    }
    positions
        .iter()
        .any(|p| p.status.is_settled() && falls_on(p.exited_at, today))
}

fn falls_on(ts: Option<DateTime<Utc>>, today: NaiveDate) -> bool {
    ts.map(|ts| ts.date_naive() == today).unwrap_or(false)
}
