//! Per-record import state machine.
//!
//! ```text
//! Unattempted --save--> Succeeded
//!             --save--> Failed(fixes)  --apply fixes--> Unattempted --save--> ...
//!                       Failed(no fixes)                              (terminal)
//! ```
//!
//! A retry is only reachable through [`PendingFix`], which exists only while the last failure has at
//! least one planned fix. An unfixable failure therefore cannot be retried into a loop.

use cyimport_domain::{Clock, FixResolver, SaveGateway, TargetProfile};
use cyimport_types::candidate::ImportCandidate;
use cyimport_types::fix::PlannedFix;
use cyimport_types::instance::{InstanceSnapshot, SuccessFlag};
use cyimport_types::report::RecordState;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, info, warn};

/// Error recorded when the gateway could not be used at all.
pub const TRANSPORT_FAILURE_MESSAGE: &str = "Error when we try to do import";

/// Error recorded when the gateway rejects a candidate without saying why.
pub const EMPTY_REJECTION_MESSAGE: &str = "Import rejected without error details";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// The gateway answered `success: false`.
    Validation,
    /// Network, status or decode failure. Never auto-fixable.
    Transport,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FailedAttempt {
    pub kind: FailureKind,
    /// Error strings in gateway order.
    pub errors: Vec<String>,
    /// Fixes planned for `errors`; empty means unfixable.
    pub fixes: Vec<PlannedFix>,
}

impl FailedAttempt {
    pub fn is_fixable(&self) -> bool {
        !self.fixes.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum ImportState {
    #[default]
    Unattempted,
    Succeeded,
    Failed(FailedAttempt),
}

impl ImportState {
    pub fn record_state(&self) -> RecordState {
        match self {
            ImportState::Unattempted => RecordState::Unattempted,
            ImportState::Succeeded => RecordState::Succeeded,
            ImportState::Failed(_) => RecordState::Failed,
        }
    }

    pub fn failure(&self) -> Option<&FailedAttempt> {
        match self {
            ImportState::Failed(f) => Some(f),
            _ => None,
        }
    }
}

/// Sets the busy flag for its lifetime, including when an in-flight future is dropped.
struct BusyGuard<'a>(&'a AtomicBool);

impl<'a> BusyGuard<'a> {
    fn engage(flag: &'a AtomicBool) -> Self {
        flag.store(true, Ordering::SeqCst);
        Self(flag)
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// One record moving through save, fix and retry.
///
/// All mutating operations take `&mut self`, so a single instance can never have two saves in
/// flight. Different instances share nothing mutable and may be driven concurrently.
pub struct ImportInstance<G> {
    candidate: ImportCandidate,
    state: ImportState,
    profile: Arc<TargetProfile>,
    resolver: FixResolver,
    gateway: Arc<G>,
    clock: Arc<dyn Clock>,
    busy: Arc<AtomicBool>,
    fix_rounds: u32,
    applied_fixes: Vec<PlannedFix>,
}

impl<G> std::fmt::Debug for ImportInstance<G> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImportInstance")
            .field("candidate", &self.candidate)
            .field("state", &self.state)
            .field("endpoint", &self.profile.endpoint)
            .field("fix_rounds", &self.fix_rounds)
            .finish()
    }
}

impl<G: SaveGateway> ImportInstance<G> {
    pub fn new(
        candidate: ImportCandidate,
        profile: Arc<TargetProfile>,
        gateway: Arc<G>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let resolver = FixResolver::for_profile(&profile);
        Self {
            candidate,
            state: ImportState::Unattempted,
            profile,
            resolver,
            gateway,
            clock,
            busy: Arc::new(AtomicBool::new(false)),
            fix_rounds: 0,
            applied_fixes: Vec::new(),
        }
    }

    /// Sends the current candidate to the gateway and records the outcome. Never fails.
    pub async fn attempt_save(&mut self) -> &ImportState {
        let name = self.candidate.instance_name();
        debug!(name = %name, endpoint = %self.profile.endpoint, "attempting save");

        let outcome = self
            .gateway
            .save(&self.profile.endpoint, &self.candidate)
            .await;

        self.state = match outcome {
            Ok(response) if response.success => {
                info!(name = %name, fix_rounds = self.fix_rounds, "import succeeded");
                ImportState::Succeeded
            }
            Ok(response) => {
                let errors = if response.errors.is_empty() {
                    vec![EMPTY_REJECTION_MESSAGE.to_string()]
                } else {
                    response.errors
                };
                let fixes = self.resolver.plan(&self.candidate, &errors);
                info!(
                    name = %name,
                    errors = errors.len(),
                    fixes = fixes.len(),
                    "import rejected"
                );
                ImportState::Failed(FailedAttempt {
                    kind: FailureKind::Validation,
                    errors,
                    fixes,
                })
            }
            Err(e) => {
                warn!(name = %name, error = %e, "import transport failure");
                ImportState::Failed(FailedAttempt {
                    kind: FailureKind::Transport,
                    errors: vec![TRANSPORT_FAILURE_MESSAGE.to_string()],
                    fixes: Vec::new(),
                })
            }
        };

        &self.state
    }

    /// Preview of what a retry would change; empty when no fix applies.
    pub fn describe_fix(&self) -> String {
        match &self.state {
            ImportState::Failed(f) => FixResolver::describe(&f.fixes),
            _ => String::new(),
        }
    }

    /// The retry handle, present only while the last failure has something to fix.
    pub fn pending_fix(&mut self) -> Option<PendingFix<'_, G>> {
        let fixes = match &self.state {
            ImportState::Failed(f) if f.is_fixable() => f.fixes.clone(),
            _ => return None,
        };
        Some(PendingFix {
            instance: self,
            fixes,
        })
    }

    /// Succeeded, or failed with nothing left to fix.
    pub fn is_terminal(&self) -> bool {
        match &self.state {
            ImportState::Succeeded => true,
            ImportState::Failed(f) => !f.is_fixable(),
            ImportState::Unattempted => false,
        }
    }

    pub fn snapshot(&self) -> InstanceSnapshot {
        let (is_success, error_descriptions) = match &self.state {
            ImportState::Unattempted => (SuccessFlag::Unknown, Vec::new()),
            ImportState::Succeeded => (SuccessFlag::Yes, Vec::new()),
            ImportState::Failed(f) => (SuccessFlag::No, f.errors.clone()),
        };
        InstanceSnapshot {
            name: self.candidate.instance_name(),
            is_success,
            error_descriptions,
            is_fix_in_progress: self.is_fix_in_progress(),
        }
    }

    pub fn state(&self) -> &ImportState {
        &self.state
    }

    pub fn candidate(&self) -> &ImportCandidate {
        &self.candidate
    }

    pub fn is_fix_in_progress(&self) -> bool {
        self.busy.load(Ordering::SeqCst)
    }

    /// Shared view of the busy flag for a UI polling from elsewhere.
    pub fn busy_flag(&self) -> Arc<AtomicBool> {
        self.busy.clone()
    }

    pub fn fix_rounds(&self) -> u32 {
        self.fix_rounds
    }

    /// Every fix applied so far, in application order.
    pub fn applied_fixes(&self) -> &[PlannedFix] {
        &self.applied_fixes
    }
}

/// A failed instance with at least one applicable fix.
pub struct PendingFix<'a, G> {
    instance: &'a mut ImportInstance<G>,
    fixes: Vec<PlannedFix>,
}

impl<'a, G: SaveGateway> PendingFix<'a, G> {
    pub fn fixes(&self) -> &[PlannedFix] {
        &self.fixes
    }

    pub fn describe(&self) -> String {
        FixResolver::describe(&self.fixes)
    }

    /// Applies every planned fix, returns the instance to `Unattempted` and saves again.
    pub async fn apply_and_retry(self) -> &'a ImportState {
        let PendingFix { instance, fixes } = self;
        let busy = instance.busy.clone();
        let _guard = BusyGuard::engage(&busy);

        let result = instance
            .resolver
            .apply(&instance.candidate, &fixes, instance.clock.now());
        info!(
            name = %instance.candidate.instance_name(),
            fixes = fixes.len(),
            explanation = %result.explanation,
            "applying fixes before retry"
        );

        instance.candidate = result.mutated_candidate;
        instance.fix_rounds += 1;
        instance.applied_fixes.extend(fixes);
        instance.state = ImportState::Unattempted;

        instance.attempt_save().await
    }
}
