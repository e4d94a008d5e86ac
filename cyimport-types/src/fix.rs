use crate::candidate::ImportCandidate;
use serde::{Deserialize, Serialize};

/// A concrete mutation derived from one validation error.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FixAction {
    /// Append a uniqueness suffix to a string field.
    RenameWithSuffix { field: String },

    /// Set every key in `fields` whose value is `id` to null, at any depth.
    ClearReference { fields: Vec<String>, id: String },
}

/// A fix selected for one error of a failed save.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlannedFix {
    /// Key of the rule that matched.
    pub rule: String,

    /// The error text that triggered the rule.
    pub error: String,

    pub action: FixAction,

    /// Human-readable description of what applying the fix does.
    pub explanation: String,
}

/// Outcome of applying planned fixes to a candidate.
#[derive(Debug, Clone, PartialEq)]
pub struct FixResult {
    pub mutated_candidate: ImportCandidate,
    pub explanation: String,
}
