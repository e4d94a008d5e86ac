use crate::classifier::{ErrorClassifier, PatternClassifier};
use crate::rules::rules_for;
use cyimport_types::target::TargetKind;
use std::sync::Arc;

/// Per-target configuration: where to save and which errors can be fixed.
#[derive(Clone)]
pub struct TargetProfile {
    pub kind: TargetKind,
    pub endpoint: String,
    pub classifier: Arc<dyn ErrorClassifier>,
}

impl std::fmt::Debug for TargetProfile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TargetProfile")
            .field("kind", &self.kind)
            .field("endpoint", &self.endpoint)
            .field(
                "rules",
                &self
                    .classifier
                    .rules()
                    .iter()
                    .map(|r| r.key)
                    .collect::<Vec<_>>(),
            )
            .finish()
    }
}

impl TargetProfile {
    pub fn builtin(kind: TargetKind) -> Self {
        Self {
            kind,
            endpoint: Self::default_endpoint(kind).to_string(),
            classifier: Arc::new(PatternClassifier::new(rules_for(kind))),
        }
    }

    pub fn default_endpoint(kind: TargetKind) -> &'static str {
        match kind {
            TargetKind::DataMapping => "/platform-api/data-mapping/config/import",
            TargetKind::DataSourceConfig => "/platform-api/data-source/config/import",
            TargetKind::ChainingConfig => "/platform-api/chaining/config/import",
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn with_classifier(mut self, classifier: Arc<dyn ErrorClassifier>) -> Self {
        self.classifier = classifier;
        self
    }
}
