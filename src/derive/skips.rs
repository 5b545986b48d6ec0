//! Skip-reason extractor
//!
//! Pulls today's "no trade" entries out of the decision log and buckets
//! each one by a substring heuristic. The buckets drive the dashboard's
//! "why didn't we trade" panel.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::config::SignalsConfig;
use crate::types::{DecisionKind, DecisionRecord};

/// Heuristic bucket for a skip reason
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SkipCategory {
    /// Reason mentions the primary signal by name
    Primary,
    /// Reason mentions the secondary advisor by name
    Secondary,
    /// The why-text talks about market conditions
    Market,
    /// The why-text talks about risk limits
    Risk,
    /// Nothing matched
    Other,
}

impl fmt::Display for SkipCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipCategory::Primary => write!(f, "PRIMARY"),
            SkipCategory::Secondary => write!(f, "SECONDARY"),
            SkipCategory::Market => write!(f, "MARKET"),
            SkipCategory::Risk => write!(f, "RISK"),
            SkipCategory::Other => write!(f, "OTHER"),
        }
    }
}

/// One of today's skip decisions, with its resolved reason text
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkipReason {
    /// Id of the source decision record
    pub id: String,
    /// When the skip was logged
    pub timestamp: DateTime<Utc>,
    /// Best available reason text
    pub reason: String,
    /// Heuristic bucket
    pub category: SkipCategory,
}

/// Collect and categorize today's skip decisions, in log order.
///
/// A record qualifies when its timestamp falls on `today` and it is a skip
/// (by kind, or by an action label of "skip"). Records whose timestamp
/// failed to parse never qualify.
pub fn extract_skip_reasons(
    decisions: &[DecisionRecord],
    signals: &SignalsConfig,
    today: NaiveDate,
) -> Vec<SkipReason> {
    decisions
        .iter()
        .filter_map(|record| {
            let timestamp = record.timestamp?;
            if timestamp.date_naive() != today || !is_skip(record) {
                return None;
            }
            let reason = record
                .why
                .clone()
                .or_else(|| record.what.clone())
                .unwrap_or_else(|| "No reason provided".to_string());
            let category = categorize(&reason, record.why.as_deref(), signals);
            Some(SkipReason {
                id: record.id.clone(),
                timestamp,
                reason,
                category,
            })
        })
        .collect()
}

fn is_skip(record: &DecisionRecord) -> bool {
    record.action.eq_ignore_ascii_case("skip") || record.kind == Some(DecisionKind::Skip)
}

/// Ordered rule table; the first match wins.
///
/// 1. reason text contains the primary signal's name  -> Primary
/// 2. reason text contains the secondary advisor's name -> Secondary
/// 3. why-text contains "market"                        -> Market
/// 4. why-text contains "risk"                          -> Risk
/// 5. otherwise                                         -> Other
///
/// Case-insensitive substring matching throughout. This is a heuristic over
/// free text, not a guaranteed-correct classifier.
fn categorize(reason: &str, why: Option<&str>, signals: &SignalsConfig) -> SkipCategory {
    let reason = reason.to_lowercase();
    let why = why.map(str::to_lowercase).unwrap_or_default();
    let primary = signals.primary_name.to_lowercase();
    let secondary = signals.secondary_name.to_lowercase();

    if !primary.is_empty() && reason.contains(&primary) {
        SkipCategory::Primary
    } else if !secondary.is_empty() && reason.contains(&secondary) {
        SkipCategory::Secondary
    } else if why.contains("market") {
        SkipCategory::Market
    } else if why.contains("risk") {
        SkipCategory::Risk
    } else {
        SkipCategory::Other
    }
}
