//! Decision path summarizer
//!
//! Renders the four-step narration of the bot's most recent decision:
//! signal, validation, regime, final. The trace narrates a decision the
//! bot already made; nothing here originates a trade.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::config::{SignalsConfig, TiersConfig};
use crate::types::{PrimarySignal, SecondarySignal};

/// Coarse decision bucket from thresholding combined win probability
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DecisionTier {
    Trade,
    Reduced,
    Skip,
}

impl DecisionTier {
    /// Threshold cascade with inclusive lower bounds.
    pub fn classify(combined_probability: f64, tiers: &TiersConfig) -> Self {
        if combined_probability >= tiers.trade_min {
            DecisionTier::Trade
        } else if combined_probability >= tiers.reduced_min {
            DecisionTier::Reduced
        } else {
            DecisionTier::Skip
        }
    }
}

impl fmt::Display for DecisionTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecisionTier::Trade => write!(f, "TRADE"),
            DecisionTier::Reduced => write!(f, "REDUCED"),
            DecisionTier::Skip => write!(f, "SKIP"),
        }
    }
}

/// One narrated step in the decision path
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraceStep {
    /// Step heading shown on the path widget
    pub title: String,
    /// One-line narration
    pub detail: String,
}

/// The full four-step decision narration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionTrace {
    /// Always four steps: signal, validation, regime, final
    pub steps: Vec<TraceStep>,
    /// max(primary, secondary) win probability
    pub combined_probability: f64,
    /// Tier the combined probability lands in
    pub tier: DecisionTier,
}

/// Build the decision trace from the current signal snapshots.
///
/// A missing signal contributes a zero win probability, so with both
/// signals absent the combined probability is 0 and the tier is SKIP.
/// The max() combine is inherited behavior: it is not a calibrated
/// posterior and can overstate confidence when both inputs are weak.
pub fn summarize_decision_path(
    primary: Option<&PrimarySignal>,
    secondary: Option<&SecondarySignal>,
    regime_label: &str,
    traded_today: bool,
    signals: &SignalsConfig,
    tiers: &TiersConfig,
) -> DecisionTrace {
    let primary_prob = primary.map(|s| s.win_probability).unwrap_or(0.0);
    let secondary_prob = secondary.map(|s| s.win_probability).unwrap_or(0.0);
    let combined_probability = primary_prob.max(secondary_prob);
    let tier = DecisionTier::classify(combined_probability, tiers);

    let primary_label = signals.primary_name.to_uppercase();
    let secondary_label = signals.secondary_name.to_uppercase();

    let signal_detail = format!(
        "{}: {} ({:.0}%) | {}: {} ({:.0}%)",
        primary_label,
        primary.map(|s| s.advice.as_str()).unwrap_or("N/A"),
        primary_prob * 100.0,
        secondary_label,
        secondary.map(|s| s.advice.as_str()).unwrap_or("N/A"),
        secondary_prob * 100.0,
    );

    let carrier = if primary_prob >= secondary_prob {
        &primary_label
    } else {
        &secondary_label
    };
    let validation_detail = format!(
        "Combined win probability {:.1}% (carried by {})",
        combined_probability * 100.0,
        carrier,
    );

    let regime_detail = format!("Dealer positioning: {}", regime_label);

    let final_detail = format!(
        "{} tier; {}",
        tier,
        if traded_today {
            "traded today"
        } else {
            "no trade today"
        }
    );

    DecisionTrace {
        steps: vec![
            TraceStep {
                title: "Signal".to_string(),
                detail: signal_detail,
            },
            TraceStep {
                title: "Validation".to_string(),
                detail: validation_detail,
            },
            TraceStep {
                title: "Regime".to_string(),
                detail: regime_detail,
            },
            TraceStep {
                title: "Final".to_string(),
                detail: final_detail,
            },
        ],
        combined_probability,
        tier,
    }
}
