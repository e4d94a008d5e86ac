//! Remote Save Gateway wire shapes.

use serde::{Deserialize, Serialize};

/// Body returned by the save endpoint.
///
/// Success: `{ "success": true }`. Failure: `{ "success": false, "errors": ["..."] }`.
/// Unknown fields are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveResponse {
    pub success: bool,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
}

impl SaveResponse {
    pub fn ok() -> Self {
        Self {
            success: true,
            errors: Vec::new(),
        }
    }

    pub fn rejected<I, S>(errors: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            success: false,
            errors: errors.into_iter().map(Into::into).collect(),
        }
    }
}
