//! Equity curve synthesizer
//!
//! Rebuilds the session equity series from the position ledger: one point
//! per settled position at its exit time, plus one synthetic "current"
//! point carrying unrealized P&L from the live snapshot. The chart layer
//! plots the output as-is.

use chrono::{DateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{LivePnl, Position, PositionStatus};

/// Reserved label for the synthetic point at the current instant.
pub const CURRENT_LABEL: &str = "current";

/// Reserved label for the synthetic session-open bootstrap point.
pub const OPEN_LABEL: &str = "open";

/// One point on the derived equity curve
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EquityPoint {
    /// Exit date ("%Y-%m-%d") for realized points, "current" or "open"
    /// for the synthetic ones
    pub label: String,
    /// Point position on the time axis
    pub timestamp: DateTime<Utc>,
    /// Account equity at this point
    pub equity: f64,
    /// P&L this point contributed: the position's realized P&L, the
    /// total unrealized P&L for "current", 0 for "open"
    pub pnl: f64,
}

/// Synthesize the equity curve from the ledger and the live snapshot.
///
/// 1. settled positions (closed/expired, with an exit timestamp) are
///    sorted by exit time, ties keeping ledger order
/// 2. each contributes a point at `starting_capital` plus the realized
///    running total
/// 3. a final "current" point adds the live unrealized total at `now`
/// 4. with no settled points but at least one open position, a bootstrap
///    "open" point pins the curve at the session-open instant
/// 5. with no settled points and no open positions the curve is empty
///
/// Output timestamps are non-decreasing even when `now` lags the last
/// exit or precedes the session open; both synthetic points clamp toward
/// the realized series rather than reordering it.
pub fn equity_curve(
    positions: &[Position],
    starting_capital: f64,
    live: Option<&LivePnl>,
    session_open: NaiveTime,
    now: DateTime<Utc>,
) -> Vec<EquityPoint> {
    let mut settled: Vec<(DateTime<Utc>, &Position)> = positions
        .iter()
        .filter(|p| p.status.is_settled())
        .filter_map(|p| p.exited_at.map(|ts| (ts, p)))
        .collect();
    settled.sort_by_key(|(ts, _)| *ts);

    let has_open = positions
        .iter()
        .any(|p| p.status == PositionStatus::Open);

    if settled.is_empty() && !has_open {
        return Vec::new();
    }

    let mut curve = Vec::with_capacity(settled.len() + 2);
    let mut running_realized = 0.0;

    for (exited_at, position) in &settled {
        running_realized += position.realized_pnl;
        curve.push(EquityPoint {
            label: exited_at.format("%Y-%m-%d").to_string(),
            timestamp: *exited_at,
            equity: starting_capital + running_realized,
            pnl: position.realized_pnl,
        });
    }

    if curve.is_empty() {
        // Open positions only: pin the curve at the session open so the
        // chart has a left edge. Clamped so an early poll cannot place
        // it after "now".
        let open_instant = now.date_naive().and_time(session_open).and_utc().min(now);
        curve.push(EquityPoint {
            label: OPEN_LABEL.to_string(),
            timestamp: open_instant,
            equity: starting_capital,
            pnl: 0.0,
        });
    }

    let unrealized = live.map(|l| l.total_unrealized_pnl).unwrap_or(0.0);
    let live_timestamp = settled
        .last()
        .map(|(ts, _)| now.max(*ts))
        .unwrap_or(now);
    curve.push(EquityPoint {
        label: CURRENT_LABEL.to_string(),
        timestamp: live_timestamp,
        equity: starting_capital + running_realized + unrealized,
        pnl: unrealized,
    });

    curve
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SpreadKind;
    use chrono::TimeZone;

    fn session_open() -> NaiveTime {
        NaiveTime::from_hms_opt(13, 30, 0).unwrap()
    }

    fn make_settled(id: &str, exit: DateTime<Utc>, realized_pnl: f64) -> Position {
        Position {
            id: id.to_string(),
            symbol: "SPX".to_string(),
            kind: SpreadKind::Bullish,
            long_strike: 5000.0,
            short_strike: 5050.0,
            contracts: 1,
            entry_price: 2.0,
            max_profit: 200.0,
            max_loss: -4800.0,
            status: PositionStatus::Closed,
            realized_pnl,
            created_at: Some(exit - chrono::Duration::hours(6)),
            exited_at: Some(exit),
        }
    }

    fn make_open(id: &str) -> Position {
        Position {
            status: PositionStatus::Open,
            realized_pnl: 0.0,
            exited_at: None,
            ..make_settled(id, Utc::now(), 0.0)
        }
    }

    fn make_live(unrealized: f64) -> LivePnl {
        LivePnl {
            total_unrealized_pnl: unrealized,
            ..LivePnl::default()
        }
    }

    #[test]
    fn test_realized_walk_plus_live_point() {
        let now = Utc.with_ymd_and_hms(2024, 1, 8, 18, 0, 0).unwrap();
        let positions = vec![
            make_settled(
                "P-1",
                Utc.with_ymd_and_hms(2024, 1, 2, 20, 0, 0).unwrap(),
                500.0,
            ),
            make_settled(
                "P-2",
                Utc.with_ymd_and_hms(2024, 1, 5, 20, 0, 0).unwrap(),
                -200.0,
            ),
        ];
        let live = make_live(50.0);
        let curve = equity_curve(&positions, 100_000.0, Some(&live), session_open(), now);

        assert_eq!(curve.len(), 3);
        assert_eq!(curve[0].label, "2024-01-02");
        assert_eq!(curve[0].equity, 100_500.0);
        assert_eq!(curve[0].pnl, 500.0);
        assert_eq!(curve[1].label, "2024-01-05");
        assert_eq!(curve[1].equity, 100_300.0);
        assert_eq!(curve[2].label, CURRENT_LABEL);
        assert_eq!(curve[2].timestamp, now);
        assert_eq!(curve[2].equity, 100_350.0);
        assert_eq!(curve[2].pnl, 50.0);
    }

    #[test]
    fn test_empty_iff_no_settled_and_no_open() {
        let now = Utc.with_ymd_and_hms(2024, 1, 8, 18, 0, 0).unwrap();
        assert!(equity_curve(&[], 100_000.0, None, session_open(), now).is_empty());

        // A closed position whose exit never parsed stays invisible
        let mut ghost = make_settled("P-1", now, 100.0);
        ghost.exited_at = None;
        let live = make_live(25.0);
        assert!(
            equity_curve(&[ghost], 100_000.0, Some(&live), session_open(), now).is_empty()
        );
    }

    #[test]
    fn test_bootstrap_point_for_open_only_ledger() {
        let now = Utc.with_ymd_and_hms(2024, 1, 8, 18, 0, 0).unwrap();
        let live = make_live(-40.0);
        let curve = equity_curve(
            &[make_open("P-1")],
            100_000.0,
            Some(&live),
            session_open(),
            now,
        );

        assert_eq!(curve.len(), 2);
        assert_eq!(curve[0].label, OPEN_LABEL);
        assert_eq!(
            curve[0].timestamp,
            Utc.with_ymd_and_hms(2024, 1, 8, 13, 30, 0).unwrap()
        );
        assert_eq!(curve[0].equity, 100_000.0);
        assert_eq!(curve[0].pnl, 0.0);
        assert_eq!(curve[1].label, CURRENT_LABEL);
        assert_eq!(curve[1].equity, 99_960.0);
    }

    #[test]
    fn test_bootstrap_clamps_to_now_before_session_open() {
        let early = Utc.with_ymd_and_hms(2024, 1, 8, 9, 0, 0).unwrap();
        let curve = equity_curve(&[make_open("P-1")], 100_000.0, None, session_open(), early);
        assert_eq!(curve[0].timestamp, early);
        assert_eq!(curve[1].timestamp, early);
    }

    #[test]
    fn test_live_point_never_precedes_last_exit() {
        let exit = Utc.with_ymd_and_hms(2024, 1, 8, 20, 0, 0).unwrap();
        let stale_now = Utc.with_ymd_and_hms(2024, 1, 8, 19, 0, 0).unwrap();
        let curve = equity_curve(
            &[make_settled("P-1", exit, 100.0)],
            100_000.0,
            None,
            session_open(),
            stale_now,
        );
        assert_eq!(curve[1].timestamp, exit);
    }

    #[test]
    fn test_timestamps_non_decreasing_and_ties_stable() {
        let now = Utc.with_ymd_and_hms(2024, 1, 8, 22, 0, 0).unwrap();
        let tie = Utc.with_ymd_and_hms(2024, 1, 8, 20, 0, 0).unwrap();
        let positions = vec![
            make_settled("P-2", tie, -75.0),
            make_settled("P-1", Utc.with_ymd_and_hms(2024, 1, 8, 15, 0, 0).unwrap(), 30.0),
            make_settled("P-3", tie, 10.0),
        ];
        let curve = equity_curve(&positions, 100_000.0, None, session_open(), now);

        for pair in curve.windows(2) {
            assert!(pair[0].timestamp <= pair[1].timestamp);
        }
        // Ledger order preserved on the tied exit time
        assert_eq!(curve[1].pnl, -75.0);
        assert_eq!(curve[2].pnl, 10.0);
    }

    #[test]
    fn test_equity_tracks_running_total() {
        let now = Utc.with_ymd_and_hms(2024, 1, 9, 18, 0, 0).unwrap();
        let positions = vec![
            make_settled("P-1", Utc.with_ymd_and_hms(2024, 1, 2, 20, 0, 0).unwrap(), 250.0),
            make_settled("P-2", Utc.with_ymd_and_hms(2024, 1, 3, 20, 0, 0).unwrap(), -400.0),
            make_settled("P-3", Utc.with_ymd_and_hms(2024, 1, 4, 20, 0, 0).unwrap(), 100.0),
        ];
        let curve = equity_curve(&positions, 100_000.0, None, session_open(), now);
        let equities: Vec<f64> = curve.iter().map(|p| p.equity).collect();
        assert_eq!(equities, vec![100_250.0, 99_850.0, 99_950.0, 99_950.0]);
    }

    #[test]
    fn test_missing_live_snapshot_defaults_to_zero() {
        let now = Utc.with_ymd_and_hms(2024, 1, 8, 18, 0, 0).unwrap();
        let positions = vec![make_settled(
            "P-1",
            Utc.with_ymd_and_hms(2024, 1, 2, 20, 0, 0).unwrap(),
            500.0,
        )];
        let curve = equity_curve(&positions, 100_000.0, None, session_open(), now);
        assert_eq!(curve.last().unwrap().equity, 100_500.0);
        assert_eq!(curve.last().unwrap().pnl, 0.0);
    }
}
