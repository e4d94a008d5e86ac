use serde::{Deserialize, Serialize};

/// Which kind of configuration record a batch imports.
///
/// The kinds share one workflow and differ only in save endpoint and recognised fix rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TargetKind {
    DataMapping,
    DataSourceConfig,
    ChainingConfig,
}

impl TargetKind {
    pub const ALL: [TargetKind; 3] = [
        TargetKind::DataMapping,
        TargetKind::DataSourceConfig,
        TargetKind::ChainingConfig,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            TargetKind::DataMapping => "data-mapping",
            TargetKind::DataSourceConfig => "data-source-config",
            TargetKind::ChainingConfig => "chaining-config",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.as_str() == s)
    }
}

impl std::fmt::Display for TargetKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_round_trip_through_str() {
        for kind in TargetKind::ALL {
            assert_eq!(TargetKind::parse(kind.as_str()), Some(kind));
            let wire = serde_json::to_string(&kind).unwrap();
            assert_eq!(wire, format!("\"{}\"", kind.as_str()));
        }
        assert_eq!(TargetKind::parse("report"), None);
    }
}
