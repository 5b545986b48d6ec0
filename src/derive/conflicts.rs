//! Signal conflict detector
//!
//! Scans today's decision log for cycles where one advisory overrode the
//! other, names a winner per record, and tallies the scoreboard shown on
//! the dashboard's conflict panel.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::config::SignalsConfig;
use crate::types::{DecisionRecord, PrimarySignal, SecondarySignal};

/// Which advisory carried the cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConflictWinner {
    Primary,
    Secondary,
}

impl fmt::Display for ConflictWinner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConflictWinner::Primary => write!(f, "PRIMARY"),
            ConflictWinner::Secondary => write!(f, "SECONDARY"),
        }
    }
}

/// Whether the conflicted cycle ended in a fill
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConflictOutcome {
    Traded,
    NotTraded,
}

impl fmt::Display for ConflictOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConflictOutcome::Traded => write!(f, "TRADED"),
            ConflictOutcome::NotTraded => write!(f, "NOT TRADED"),
        }
    }
}

/// One override-flagged cycle from today's log
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConflictRecord {
    /// Id of the source decision record
    pub id: String,
    /// When the conflicted cycle ran
    pub timestamp: DateTime<Utc>,
    /// Primary signal summary at decision time
    pub primary_summary: String,
    /// Secondary advisory summary at decision time
    pub secondary_summary: String,
    /// Declared winner
    pub winner: ConflictWinner,
    /// Whether the cycle traded
    pub outcome: ConflictOutcome,
    /// Unset at derivation time; no ground truth is available yet
    pub correct: Option<bool>,
}

/// Today's conflict scoreboard
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConflictSummary {
    /// Decision records logged today
    pub scans_today: u32,
    /// Of those, cycles that executed a trade
    pub trades_today: u32,
    /// Conflicts the primary signal carried
    pub wins_by_primary: u32,
    /// Conflicts the secondary advisory carried
    pub wins_by_secondary: u32,
    /// The override-flagged cycles themselves, in log order
    pub conflicts: Vec<ConflictRecord>,
}

/// Scan today's decision records for advisory conflicts.
///
/// The winner comes from substring-matching the override text against the
/// primary signal's configured name: named means the primary carried the
/// cycle, anything else counts for the secondary. There is no structured
/// winner field upstream, so an ambiguous descriptor resolves to secondary
/// rather than failing.
pub fn detect_conflicts(
    decisions: &[DecisionRecord],
    signals: &SignalsConfig,
    today: NaiveDate,
) -> ConflictSummary {
    let mut summary = ConflictSummary::default();
    let primary_name = signals.primary_name.to_lowercase();

    for record in decisions {
        let timestamp = match record.timestamp {
            Some(ts) if ts.date_naive() == today => ts,
            _ => continue,
        };

        summary.scans_today += 1;
        if record.executed {
            summary.trades_today += 1;
        }

        let note = match &record.override_note {
            Some(note) => note,
            None => continue,
        };

        let winner = if !primary_name.is_empty()
            && note.detail.to_lowercase().contains(&primary_name)
        {
            ConflictWinner::Primary
        } else {
            ConflictWinner::Secondary
        };
        match winner {
            ConflictWinner::Primary => summary.wins_by_primary += 1,
            ConflictWinner::Secondary => summary.wins_by_secondary += 1,
        }

        let outcome = if record.executed {
            ConflictOutcome::Traded
        } else {
            ConflictOutcome::NotTraded
        };

        summary.conflicts.push(ConflictRecord {
            id: record.id.clone(),
            timestamp,
            primary_summary: summarize_primary(record.primary.as_ref()),
            secondary_summary: summarize_secondary(record.secondary.as_ref()),
            winner,
            outcome,
            correct: None,
        });
    }

    summary
}

fn summarize_primary(signal: Option<&PrimarySignal>) -> String {
    match signal {
        Some(s) => format!("{} ({:.0}% win)", s.advice, s.win_probability * 100.0),
        None => "N/A".to_string(),
    }
}

fn summarize_secondary(signal: Option<&SecondarySignal>) -> String {
    match signal {
        Some(s) => format!("{} ({:.0}% win)", s.advice, s.win_probability * 100.0),
        None => "N/A".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::OverrideNote;
    use chrono::TimeZone;

    fn signals() -> SignalsConfig {
        SignalsConfig {
            primary_name: "gex".to_string(),
            secondary_name: "oracle".to_string(),
        }
    }

    fn noon() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 5, 12, 0, 0).unwrap()
    }

    fn make_decision(id: &str, executed: bool, override_detail: Option<&str>) -> DecisionRecord {
        DecisionRecord {
            id: id.to_string(),
            timestamp: Some(noon()),
            kind: None,
            action: "N/A".to_string(),
            what: None,
            why: None,
            how: None,
            override_note: override_detail.map(|detail| OverrideNote {
                detail: detail.to_string(),
            }),
            primary: Some(PrimarySignal {
                advice: "BULL_PUT_SPREAD".to_string(),
                win_probability: 0.64,
                ..PrimarySignal::default()
            }),
            secondary: Some(SecondarySignal {
                advice: "WAIT".to_string(),
                win_probability: 0.55,
                ..SecondarySignal::default()
            }),
            regime: None,
            executed,
        }
    }

    #[test]
    fn test_override_winners_resolve_by_name() {
        let decisions = vec![
            make_decision("D-1", false, Some("Oracle vetoed the model entry")),
            make_decision("D-2", true, Some("GEX overrode oracle caution")),
        ];
        let summary = detect_conflicts(&decisions, &signals(), noon().date_naive());
        assert_eq!(summary.conflicts.len(), 2);
        assert_eq!(summary.conflicts[0].winner, ConflictWinner::Secondary);
        assert_eq!(summary.conflicts[1].winner, ConflictWinner::Primary);
        assert_eq!(summary.wins_by_primary, 1);
        assert_eq!(summary.wins_by_secondary, 1);
    }

    #[test]
    fn test_counts_cover_all_of_today() {
        let decisions = vec![
            make_decision("D-1", true, None),
            make_decision("D-2", false, None),
            make_decision("D-3", false, Some("oracle vetoed")),
        ];
        let summary = detect_conflicts(&decisions, &signals(), noon().date_naive());
        assert_eq!(summary.scans_today, 3);
        assert_eq!(summary.trades_today, 1);
        assert_eq!(summary.conflicts.len(), 1);
        assert_eq!(summary.conflicts[0].outcome, ConflictOutcome::NotTraded);
    }

    #[test]
    fn test_ambiguous_descriptor_goes_to_secondary() {
        let decisions = vec![make_decision("D-1", false, Some(""))];
        let summary = detect_conflicts(&decisions, &signals(), noon().date_naive());
        assert_eq!(summary.conflicts[0].winner, ConflictWinner::Secondary);
    }

    #[test]
    fn test_other_days_are_ignored() {
        let mut old = make_decision("D-1", true, Some("gex overrode"));
        old.timestamp = Some(Utc.with_ymd_and_hms(2024, 1, 4, 12, 0, 0).unwrap());
        let mut unparsed = make_decision("D-2", true, Some("gex overrode"));
        unparsed.timestamp = None;

        let summary = detect_conflicts(&[old, unparsed], &signals(), noon().date_naive());
        assert_eq!(summary.scans_today, 0);
        assert_eq!(summary.trades_today, 0);
        assert!(summary.conflicts.is_empty());
    }

    #[test]
    fn test_summaries_and_correctness_field() {
        let decisions = vec![make_decision("D-1", true, Some("gex overrode"))];
        let summary = detect_conflicts(&decisions, &signals(), noon().date_naive());
        let conflict = &summary.conflicts[0];
        assert_eq!(conflict.primary_summary, "BULL_PUT_SPREAD (64% win)");
        assert_eq!(conflict.secondary_summary, "WAIT (55% win)");
        assert_eq!(conflict.outcome, ConflictOutcome::Traded);
        assert!(conflict.correct.is_none());
    }

    #[test]
    fn test_missing_signal_snapshots_summarize_as_na() {
        let mut record = make_decision("D-1", false, Some("oracle vetoed"));
        record.primary = None;
        record.secondary = None;
        let summary = detect_conflicts(&[record], &signals(), noon().date_naive());
        assert_eq!(summary.conflicts[0].primary_summary, "N/A");
        assert_eq!(summary.conflicts[0].secondary_summary, "N/A");
    }
}
