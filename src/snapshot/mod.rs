//! Snapshot module - Wire decoding and canonical aggregation
//!
//! Decodes the bot's JSON feed files into tolerant raw records and folds
//! them into one canonical [`FeedSnapshot`] with every default resolved.

mod aggregator;
pub mod raw;

pub use aggregator::{
    canonical_decisions, canonical_live_pnl, canonical_positions, canonical_primary,
    canonical_secondary, canonical_status, FeedSnapshot,
};
