use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};

/// A fractional-share mapping of one line item's cost to one person.
///
/// `share_percentage` is a 0..=1 fraction held at 4 decimal places. For a
/// given line item the shares across all its assignments should sum to
/// exactly 1.0000 — validated by `validate_assignments`, not enforced here.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemAssignment {
    pub line_item_id: String,
    pub person_id: String,
    pub share_percentage: BigDecimal,
    pub assigned_amount: BigDecimal,
}

/// Outcome of `validate_assignments`: non-fatal diagnostics meant to gate
/// submission in the editor, never to abort a computation.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentValidation {
    pub is_valid: bool,
    pub errors: Vec<AssignmentIssue>,
}

/// A single per-item validation finding.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum AssignmentIssue {
    /// The item has no assignments at all.
    Unassigned { line_item_id: String, name: String },
    /// The item's shares do not sum to the expected whole.
    ShareMismatch {
        line_item_id: String,
        name: String,
        expected: BigDecimal,
        actual: BigDecimal,
    },
}

impl std::fmt::Display for AssignmentIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AssignmentIssue::Unassigned { name, .. } => {
                write!(f, "\"{}\" has no assignments", name)
            }
            AssignmentIssue::ShareMismatch {
                name,
                expected,
                actual,
                ..
            } => {
                write!(
                    f,
                    "\"{}\" shares sum to {}, expected {}",
                    name, actual, expected
                )
            }
        }
    }
}
