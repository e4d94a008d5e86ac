use crate::classifier::ErrorClassifier;
use crate::profile::TargetProfile;
use crate::rules::apply_fixes;
use chrono::{DateTime, Utc};
use cyimport_types::candidate::ImportCandidate;
use cyimport_types::fix::{FixResult, PlannedFix};
use std::sync::Arc;
use tracing::debug;

/// Fix-Suggestion Resolver: error strings in, candidate mutations out.
///
/// Every method is pure; nothing here talks to the network.
#[derive(Clone)]
pub struct FixResolver {
    classifier: Arc<dyn ErrorClassifier>,
}

impl FixResolver {
    pub fn new(classifier: Arc<dyn ErrorClassifier>) -> Self {
        Self { classifier }
    }

    pub fn for_profile(profile: &TargetProfile) -> Self {
        Self::new(profile.classifier.clone())
    }

    /// One diagnosis per error, in error order. Errors diagnosing to an action already planned are
    /// folded into the earlier fix.
    pub fn plan(&self, candidate: &ImportCandidate, errors: &[String]) -> Vec<PlannedFix> {
        let mut fixes: Vec<PlannedFix> = Vec::new();
        for error in errors {
            match self.classifier.diagnose(candidate, error) {
                Some(fix) if fixes.iter().any(|f| f.action == fix.action) => {
                    debug!(rule = %fix.rule, error = %error, "duplicate fix folded");
                }
                Some(fix) => {
                    debug!(rule = %fix.rule, error = %error, "fix planned");
                    fixes.push(fix);
                }
                None => debug!(error = %error, "no fix rule matched"),
            }
        }
        fixes
    }

    /// Human-readable preview; empty when there is nothing to fix.
    pub fn describe(fixes: &[PlannedFix]) -> String {
        fixes
            .iter()
            .map(|f| f.explanation.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn apply(
        &self,
        candidate: &ImportCandidate,
        fixes: &[PlannedFix],
        now: DateTime<Utc>,
    ) -> FixResult {
        apply_fixes(candidate, fixes, now)
    }
}
