use serde::{Deserialize, Serialize};

/// Field holding the human-readable record name.
pub const NAME_FIELD: &str = "name";

/// The record being imported.
///
/// Candidates are opaque JSON: only the `name` field is interpreted here. Fix rules may touch other
/// fields by key, but nothing else assumes a schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ImportCandidate(serde_json::Value);

impl ImportCandidate {
    pub fn new(value: serde_json::Value) -> Self {
        Self(value)
    }

    pub fn as_value(&self) -> &serde_json::Value {
        &self.0
    }

    pub fn as_value_mut(&mut self) -> &mut serde_json::Value {
        &mut self.0
    }

    /// String value of a top-level field, if present.
    pub fn str_field(&self, field: &str) -> Option<&str> {
        self.0.get(field).and_then(|v| v.as_str())
    }

    pub fn name(&self) -> Option<&str> {
        self.str_field(NAME_FIELD)
    }

    /// Sets a top-level string field. Returns false when the candidate is not a JSON object.
    pub fn set_str_field(&mut self, field: &str, value: impl Into<String>) -> bool {
        match self.0.as_object_mut() {
            Some(map) => {
                map.insert(field.to_string(), serde_json::Value::String(value.into()));
                true
            }
            None => false,
        }
    }

    /// Display name for the instance wrapping this candidate.
    pub fn instance_name(&self) -> InstanceName {
        match self.0.get(NAME_FIELD) {
            Some(serde_json::Value::String(s)) => InstanceName::Single(s.clone()),
            Some(serde_json::Value::Array(items)) => InstanceName::Many(
                items
                    .iter()
                    .filter_map(|i| i.as_str().map(str::to_string))
                    .collect(),
            ),
            _ => InstanceName::Single(UNNAMED.to_string()),
        }
    }
}

impl From<serde_json::Value> for ImportCandidate {
    fn from(value: serde_json::Value) -> Self {
        Self::new(value)
    }
}

/// Placeholder for candidates without a usable name.
pub const UNNAMED: &str = "<unnamed>";

/// Instance label: a single name, or several when a record bundles multiple named parts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum InstanceName {
    Single(String),
    Many(Vec<String>),
}

impl std::fmt::Display for InstanceName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InstanceName::Single(s) => f.write_str(s),
            InstanceName::Many(items) => f.write_str(&items.join(", ")),
        }
    }
}
