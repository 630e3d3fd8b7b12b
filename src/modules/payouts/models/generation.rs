use serde::{Deserialize, Serialize};

use crate::core::PayoutPeriod;

/// Per-organization outcome of a generation run.
///
/// `SkippedDuplicate` and `SkippedNoOrders` are normal results, reported
/// distinctly from `Error` so an operator re-running a period can tell a
/// safe no-op from a failure needing attention.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum GenerationOutcome {
    Created {
        invoice_id: String,
        invoice_number: String,
    },
    SkippedDuplicate,
    SkippedNoOrders,
    Error {
        message: String,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrganizationResult {
    pub organization_id: String,
    #[serde(flatten)]
    pub outcome: GenerationOutcome,
}

/// Report for one manual (or scheduled) generation run over a period.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationRunReport {
    pub period: PayoutPeriod,
    pub invoices_created: u32,
    /// False when a deadline stopped the run before every organization was
    /// processed; the results list covers only what actually ran
    pub completed: bool,
    pub results: Vec<OrganizationResult>,
}

impl GenerationRunReport {
    pub fn count_of(&self, predicate: impl Fn(&GenerationOutcome) -> bool) -> usize {
        self.results
            .iter()
            .filter(|result| predicate(&result.outcome))
            .count()
    }

    pub fn skipped_duplicates(&self) -> usize {
        self.count_of(|outcome| matches!(outcome, GenerationOutcome::SkippedDuplicate))
    }

    pub fn errors(&self) -> usize {
        self.count_of(|outcome| matches!(outcome, GenerationOutcome::Error { .. }))
    }
}
