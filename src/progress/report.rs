//! Progress report types and terminal formatting.
//!
//! The report can be rendered as text (Display) or serialized as JSON.

use serde::Serialize;
use std::fmt;

use crate::ledger::LedgerEntry;

/// Workspace-wide labeling progress.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ProgressReport {
    /// Records carrying at least one plate text.
    pub annotated: usize,
    /// Records in the store.
    pub total: usize,
    /// Ledger rows in file order.
    pub ledger: Vec<LedgerEntry>,
}

impl ProgressReport {
    /// Records still lacking a plate text (flagged ones included).
    pub fn remaining(&self) -> usize {
        self.total.saturating_sub(self.annotated)
    }

    /// Sum of every user's count.
    pub fn total_actions(&self) -> u64 {
        self.ledger.iter().map(|entry| entry.count).sum()
    }
}

impl fmt::Display for ProgressReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Annotated {} of {} record(s) ({} remaining)",
            self.annotated,
            self.total,
            self.remaining()
        )?;

        if self.ledger.is_empty() {
            return writeln!(f, "No annotations credited yet");
        }

        let width = self
            .ledger
            .iter()
            .map(|entry| entry.user_name.chars().count())
            .max()
            .unwrap_or(0);

        writeln!(f, "Annotations per user:")?;
        for entry in &self.ledger {
            writeln!(f, "  {:<width$}  {}", entry.user_name, entry.count)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(user_name: &str, count: u64) -> LedgerEntry {
        LedgerEntry {
            user_name: user_name.to_string(),
            count,
        }
    }

    #[test]
    fn display_aligns_user_column() {
        let report = ProgressReport {
            annotated: 2,
            total: 5,
            ledger: vec![entry("al", 4), entry("barbara", 1)],
        };
        let text = report.to_string();
        assert!(text.contains("Annotated 2 of 5 record(s) (3 remaining)"));
        assert!(text.contains("  al       4\n"));
        assert!(text.contains("  barbara  1\n"));
        assert_eq!(report.total_actions(), 5);
    }

    #[test]
    fn display_without_ledger_rows() {
        let report = ProgressReport::default();
        assert!(report.to_string().contains("No annotations credited yet"));
    }

    #[test]
    fn serializes_ledger_with_file_column_names() {
        let report = ProgressReport {
            annotated: 1,
            total: 1,
            ledger: vec![entry("alice", 1)],
        };
        let json = serde_json::to_value(&report).expect("serialize");
        assert_eq!(json["ledger"][0]["user_name"], "alice");
        assert_eq!(json["ledger"][0]["annotations_count"], 1);
    }
}
