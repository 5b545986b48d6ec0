//! GexDash Library
//!
//! Derivation core for the options spread-bot operations dashboard:
//! canonicalizes the bot's polled feeds and answers the questions no
//! single feed answers alone (traded today, skip reasons, equity curve,
//! advisory conflicts, decision tier).

pub mod config;
pub mod derive;
pub mod snapshot;
pub mod store;
pub mod types;

pub use config::EngineConfig;
pub use derive::{derive_state, DerivedState};
pub use snapshot::FeedSnapshot;
pub use store::SnapshotStore;
