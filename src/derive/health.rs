//! Feed health summary
//!
//! Derives per-source freshness from the update stamps the fetch layer
//! keeps, plus the bot's own heartbeat. Ages only; whether to re-poll or
//! alert is the fetch layer's call.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::FeedSource;

/// Freshness of one polled source
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceHealth {
    /// Which feed
    pub source: FeedSource,
    /// When the fetch layer last stored a payload for it
    pub last_update: Option<DateTime<Utc>>,
    /// Milliseconds since then; None when the source was never seen
    pub age_ms: Option<i64>,
    /// Older than the configured threshold, or never seen
    pub stale: bool,
}

/// Freshness of every source plus the bot heartbeat
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedHealth {
    /// One entry per source, in polling order
    pub sources: Vec<SourceHealth>,
    /// Milliseconds since the bot's last completed scan
    pub heartbeat_age_ms: Option<i64>,
    /// Heartbeat older than the threshold, or never seen
    pub heartbeat_stale: bool,
    /// Threshold the flags were computed against
    pub stale_threshold_ms: i64,
    /// When this summary was computed
    pub updated_at: DateTime<Utc>,
}

impl FeedHealth {
    /// True when any source or the heartbeat is stale.
    pub fn any_stale(&self) -> bool {
        self.heartbeat_stale || self.sources.iter().any(|s| s.stale)
    }
}

/// Compute freshness flags for every source.
pub fn feed_health(
    stamps: &[(FeedSource, Option<DateTime<Utc>>)],
    heartbeat_last_scan: Option<DateTime<Utc>>,
    stale_threshold_ms: i64,
    now: DateTime<Utc>,
) -> FeedHealth {
    let sources = stamps
        .iter()
        .map(|(source, last_update)| {
            let age_ms = last_update.map(|ts| age_of(ts, now));
            SourceHealth {
                source: *source,
                last_update: *last_update,
                age_ms,
                stale: age_ms.map(|age| age > stale_threshold_ms).unwrap_or(true),
            }
        })
        .collect();

    let heartbeat_age_ms = heartbeat_last_scan.map(|ts| age_of(ts, now));
    let heartbeat_stale = heartbeat_age_ms
        .map(|age| age > stale_threshold_ms)
        .unwrap_or(true);

    FeedHealth {
        sources,
        heartbeat_age_ms,
        heartbeat_stale,
        stale_threshold_ms,
        updated_at: now,
    }
}

fn age_of(ts: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    now.timestamp_millis().saturating_sub(ts.timestamp_millis())
}
