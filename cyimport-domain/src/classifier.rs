use crate::rules::FixRule;
use cyimport_types::candidate::ImportCandidate;
use cyimport_types::fix::PlannedFix;

/// Maps one gateway error to at most one fix.
///
/// This is the only place that interprets error text. A backend that returns structured error codes
/// gets its own implementation; the import state machine is unaffected.
pub trait ErrorClassifier: Send + Sync {
    fn diagnose(&self, candidate: &ImportCandidate, error: &str) -> Option<PlannedFix>;

    /// Rules backing this classifier, for listing and explanation.
    fn rules(&self) -> &[FixRule] {
        &[]
    }
}

/// Classifier over an ordered rule list; the first matching rule wins.
#[derive(Debug, Clone, Default)]
pub struct PatternClassifier {
    rules: Vec<FixRule>,
}

impl PatternClassifier {
    pub fn new(rules: Vec<FixRule>) -> Self {
        Self { rules }
    }
}

impl ErrorClassifier for PatternClassifier {
    fn diagnose(&self, candidate: &ImportCandidate, error: &str) -> Option<PlannedFix> {
        self.rules.iter().find_map(|rule| {
            rule.match_error(candidate, error)
                .map(|(action, explanation)| PlannedFix {
                    rule: rule.key.to_string(),
                    error: error.to_string(),
                    action,
                    explanation,
                })
        })
    }

    fn rules(&self) -> &[FixRule] {
        &self.rules
    }
}
