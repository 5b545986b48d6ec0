//! Configuration management for GexDash
//!
//! Loads from optional config files + environment variables via .env

use anyhow::{bail, Context, Result};
use chrono::NaiveTime;
use config::{Config, Environment, File};
use serde::Deserialize;

/// Engine configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EngineConfig {
    pub signals: SignalsConfig,
    pub equity: EquityConfig,
    pub tiers: TiersConfig,
    pub health: HealthConfig,
}

/// Names of the two advisory subsystems, as they appear in log text
#[derive(Debug, Clone, Deserialize)]
pub struct SignalsConfig {
    /// Name of the primary (model/GEX) signal; used for substring matching
    /// in skip categorization and conflict-winner resolution
    pub primary_name: String,
    /// Name of the secondary advisory, same use
    pub secondary_name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EquityConfig {
    /// Equity curve baseline in dollars
    pub starting_capital: f64,
    /// Nominal session open, UTC hour
    pub session_open_hour_utc: u32,
    /// Nominal session open, UTC minute
    pub session_open_minute_utc: u32,
}

impl EquityConfig {
    /// Session open as a wall time; falls back to midnight if the
    /// configured pair is out of range.
    pub fn session_open(&self) -> NaiveTime {
        NaiveTime::from_hms_opt(self.session_open_hour_utc, self.session_open_minute_utc, 0)
            .unwrap_or(NaiveTime::MIN)
    }
}

/// Inclusive lower bounds for the decision tiers
#[derive(Debug, Clone, Deserialize)]
pub struct TiersConfig {
    /// Combined win probability at or above this lands in TRADE
    pub trade_min: f64,
    /// At or above this (but below trade_min) lands in REDUCED
    pub reduced_min: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HealthConfig {
    /// Feed age beyond which a source is flagged stale, in milliseconds
    pub stale_threshold_ms: i64,
}

impl Default for SignalsConfig {
    fn default() -> Self {
        Self {
            primary_name: "gex".to_string(),
            secondary_name: "oracle".to_string(),
        }
    }
}

impl Default for EquityConfig {
    fn default() -> Self {
        Self {
            starting_capital: 100_000.0,
            session_open_hour_utc: 13, // 09:30 New York in EST
            session_open_minute_utc: 30,
        }
    }
}

impl Default for TiersConfig {
    fn default() -> Self {
        Self {
            trade_min: 0.60,
            reduced_min: 0.50,
        }
    }
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            stale_threshold_ms: 90_000,
        }
    }
}

impl EngineConfig {
    /// Load configuration from file and environment
    pub fn load() -> Result<Self> {
        // Load .env file first
        dotenvy::dotenv().ok();

        let config = Config::builder()
            // Signal naming defaults
            .set_default("signals.primary_name", "gex")?
            .set_default("signals.secondary_name", "oracle")?
            // Equity curve defaults
            .set_default("equity.starting_capital", 100_000.0)?
            .set_default("equity.session_open_hour_utc", 13)?
            .set_default("equity.session_open_minute_utc", 30)?
            // Tier defaults
            .set_default("tiers.trade_min", 0.60)?
            .set_default("tiers.reduced_min", 0.50)?
            // Health defaults
            .set_default("health.stale_threshold_ms", 90_000)?
            // Load config file if exists
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            // Override with environment variables (GEXDASH_*)
            .add_source(Environment::with_prefix("GEXDASH").separator("__"))
            .build()
            .context("Failed to build configuration")?;

        let engine_config: EngineConfig = config
            .try_deserialize()
            .context("Failed to deserialize configuration")?;

        Ok(engine_config)
    }

    /// Generate a digest of the config for logging
    pub fn digest(&self) -> String {
        format!(
            "signals={}/{} capital={:.0} tiers={:.2}/{:.2} stale_ms={}",
            self.signals.primary_name,
            self.signals.secondary_name,
            self.equity.starting_capital,
            self.tiers.trade_min,
            self.tiers.reduced_min,
            self.health.stale_threshold_ms,
        )
    }

    /// Check cross-field invariants the type system cannot express
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.tiers.trade_min)
            || !(0.0..=1.0).contains(&self.tiers.reduced_min)
        {
            bail!("tier bounds must lie in [0, 1]");
        }
        if self.tiers.reduced_min > self.tiers.trade_min {
            bail!(
                "tiers.reduced_min ({}) must not exceed tiers.trade_min ({})",
                self.tiers.reduced_min,
                self.tiers.trade_min
            );
        }
        if self.equity.session_open_hour_utc > 23 || self.equity.session_open_minute_utc > 59 {
            bail!("equity.session_open must be a valid UTC wall time");
        }
        if self.health.stale_threshold_ms <= 0 {
            bail!("health.stale_threshold_ms must be positive");
        }
        Ok(())
    }
}

impl std::fmt::Display for EngineConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.digest())
    }
}
