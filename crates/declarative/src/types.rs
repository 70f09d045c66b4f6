//! Outcome types for convergence passes

use serde::{Deserialize, Serialize};

/// Result of converging one object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ApplyResult {
    /// Stored state already matched
    NoChange,
    /// Object was absent and has been created
    Created,
    /// Object had drifted and has been updated
    Modified,
}

/// Summary of a convergence pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconcileSummary {
    pub created: usize,
    pub modified: usize,
    pub unchanged: usize,
}

impl ReconcileSummary {
    /// Total number of writes made
    pub fn total_changes(&self) -> usize {
        self.created + self.modified
    }

    /// Total number of objects visited
    pub fn total(&self) -> usize {
        self.created + self.modified + self.unchanged
    }

    pub fn add_result(&mut self, result: ApplyResult) {
        match result {
            ApplyResult::NoChange => self.unchanged += 1,
            ApplyResult::Created => self.created += 1,
            ApplyResult::Modified => self.modified += 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_counts() {
        let mut summary = ReconcileSummary::default();
        summary.add_result(ApplyResult::Created);
        summary.add_result(ApplyResult::NoChange);
        summary.add_result(ApplyResult::Modified);
        summary.add_result(ApplyResult::NoChange);

        assert_eq!(summary.created, 1);
        assert_eq!(summary.modified, 1);
        assert_eq!(summary.unchanged, 2);
        assert_eq!(summary.total_changes(), 2);
        assert_eq!(summary.total(), 4);
    }
}
