use crate::candidate::InstanceName;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Tri-state success flag: `"unknown"` before any attempt, then `true`/`false`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SuccessFlag {
    #[default]
    Unknown,
    Yes,
    No,
}

impl SuccessFlag {
    pub fn as_bool(self) -> Option<bool> {
        match self {
            SuccessFlag::Unknown => None,
            SuccessFlag::Yes => Some(true),
            SuccessFlag::No => Some(false),
        }
    }
}

impl Serialize for SuccessFlag {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.as_bool() {
            Some(b) => serializer.serialize_bool(b),
            None => serializer.serialize_str("unknown"),
        }
    }
}

impl<'de> Deserialize<'de> for SuccessFlag {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Bool(bool),
            Str(String),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Bool(true) => Ok(SuccessFlag::Yes),
            Raw::Bool(false) => Ok(SuccessFlag::No),
            Raw::Str(s) if s == "unknown" => Ok(SuccessFlag::Unknown),
            Raw::Str(s) => Err(serde::de::Error::custom(format!(
                "expected true, false or \"unknown\", got \"{s}\""
            ))),
        }
    }
}

/// UI-facing view of an import instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstanceSnapshot {
    pub name: InstanceName,
    pub is_success: SuccessFlag,
    #[serde(default)]
    pub error_descriptions: Vec<String>,
    #[serde(default)]
    pub is_fix_in_progress: bool,
}
