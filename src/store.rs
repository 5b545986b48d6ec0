//! Snapshot store - latest canonical feeds behind one lock
//!
//! Caller-owned container for the fetch layer: raw payloads go in and are
//! canonicalized immediately, derived state comes out memoized by revision
//! and UTC day. The derivations stay pure; this is a thin cache around
//! them, not a global.

use chrono::{DateTime, NaiveDate, Utc};
use std::collections::HashMap;
use std::sync::RwLock;
use tracing::warn;

use crate::config::EngineConfig;
use crate::derive::{derive_state, feed_health, DerivedState, FeedHealth};
use crate::snapshot::raw::{
    RawBotStatus, RawDecisionRecord, RawLivePnl, RawPosition, RawPrimarySignal,
    RawSecondarySignal,
};
use crate::snapshot::{
    canonical_decisions, canonical_live_pnl, canonical_positions, canonical_primary,
    canonical_secondary, canonical_status, FeedSnapshot,
};
use crate::types::FeedSource;

struct CachedDerivation {
    revision: u64,
    day: NaiveDate,
    state: DerivedState,
}

struct StoreInner {
    snapshot: FeedSnapshot,
    /// When each source last delivered a payload
    stamps: HashMap<FeedSource, DateTime<Utc>>,
    /// Bumped on every put; the memo key together with the UTC day
    revision: u64,
    cached: Option<CachedDerivation>,
}

/// Latest canonical snapshot of every feed, plus a derivation cache.
///
/// Writers are the fetch layer's per-source pollers; readers are the view
/// layer. All methods take `&self`; a poisoned lock degrades to defaults
/// instead of panicking.
pub struct SnapshotStore {
    config: EngineConfig,
    inner: RwLock<StoreInner>,
}

impl SnapshotStore {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            inner: RwLock::new(StoreInner {
                snapshot: FeedSnapshot::default(),
                stamps: HashMap::new(),
                revision: 0,
                cached: None,
            }),
        }
    }

    /// Store the latest status feed.
    pub fn put_status(&self, status: RawBotStatus) {
        let status = canonical_status(status);
        self.update(FeedSource::Status, |snapshot| snapshot.status = status);
    }

    /// Replace the position ledger with the latest poll.
    pub fn put_positions(&self, positions: Vec<RawPosition>) {
        let positions = canonical_positions(positions);
        self.update(FeedSource::Positions, |snapshot| {
            snapshot.positions = positions
        });
    }

    /// Store the latest primary signal.
    pub fn put_primary(&self, signal: RawPrimarySignal) {
        let signal = canonical_primary(signal);
        self.update(FeedSource::PrimarySignal, |snapshot| {
            snapshot.primary = Some(signal)
        });
    }

    /// Store the latest secondary advisory.
    pub fn put_secondary(&self, signal: RawSecondarySignal) {
        let signal = canonical_secondary(signal);
        self.update(FeedSource::SecondarySignal, |snapshot| {
            snapshot.secondary = Some(signal)
        });
    }

    /// Replace the decision log with the latest poll.
    pub fn put_decisions(&self, decisions: Vec<RawDecisionRecord>) {
        let decisions = canonical_decisions(decisions);
        self.update(FeedSource::Decisions, |snapshot| {
            snapshot.decisions = decisions
        });
    }

    /// Store the latest live P&L marks.
    pub fn put_live_pnl(&self, pnl: RawLivePnl) {
        let pnl = canonical_live_pnl(pnl);
        self.update(FeedSource::LivePnl, |snapshot| {
            snapshot.live_pnl = Some(pnl)
        });
    }

    /// Clone out the current canonical snapshot.
    pub fn snapshot(&self) -> FeedSnapshot {
        self.inner
            .read()
            .map(|inner| inner.snapshot.clone())
            .unwrap_or_default()
    }

    /// How many puts this store has absorbed.
    pub fn revision(&self) -> u64 {
        self.inner.read().map(|inner| inner.revision).unwrap_or(0)
    }

    /// Derive (or fetch the cached) state for the current snapshot.
    ///
    /// The cache is valid while no new payload has arrived and `now` is
    /// still on the same UTC day; the day is part of the key because the
    /// today-filters change their answers at midnight.
    pub fn derived(&self, now: DateTime<Utc>) -> DerivedState {
        let day = now.date_naive();
        let mut inner = match self.inner.write() {
            Ok(inner) => inner,
            Err(_) => {
                warn!("Snapshot store lock poisoned; deriving from an empty snapshot");
                return derive_state(&FeedSnapshot::default(), &self.config, now);
            }
        };

        if let Some(cached) = &inner.cached {
            if cached.revision == inner.revision && cached.day == day {
                return cached.state.clone();
            }
        }

        let state = derive_state(&inner.snapshot, &self.config, now);
        inner.cached = Some(CachedDerivation {
            revision: inner.revision,
            day,
            state: state.clone(),
        });
        state
    }

    /// Freshness summary across all sources plus the bot heartbeat.
    pub fn health(&self, now: DateTime<Utc>) -> FeedHealth {
        let (stamps, last_scan) = match self.inner.read() {
            Ok(inner) => {
                let stamps: Vec<(FeedSource, Option<DateTime<Utc>>)> = FeedSource::ALL
                    .iter()
                    .map(|source| (*source, inner.stamps.get(source).copied()))
                    .collect();
                (stamps, inner.snapshot.status.heartbeat.last_scan)
            }
            Err(_) => {
                warn!("Snapshot store lock poisoned; reporting every source stale");
                let stamps = FeedSource::ALL.iter().map(|source| (*source, None)).collect();
                (stamps, None)
            }
        };
        feed_health(
            &stamps,
            last_scan,
            self.config.health.stale_threshold_ms,
            now,
        )
    }

    fn update<F>(&self, source: FeedSource, apply: F)
    where
        F: FnOnce(&mut FeedSnapshot),
    {
        match self.inner.write() {
            Ok(mut inner) => {
                apply(&mut inner.snapshot);
                inner.stamps.insert(source, Utc::now());
                inner.revision = inner.revision.saturating_add(1);
            }
            Err(_) => warn!("Snapshot store lock poisoned; dropping {} update", source),
        }
    }
}
