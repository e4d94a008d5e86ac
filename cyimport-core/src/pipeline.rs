//! Batch import pipeline: save every record, auto-fix what can be fixed, report the rest.
//!
//! Records are driven one at a time in input order. The pipeline itself never fails; every
//! per-record problem ends up in the report.

use crate::instance::{FailureKind, ImportInstance, ImportState};
use crate::orchestrator::ImportOrchestrator;
use crate::settings::ImportSettings;
use cyimport_domain::{Clock, SaveGateway};
use cyimport_types::candidate::ImportCandidate;
use cyimport_types::report::{
    ImportReport, RecordReport, ReportSummary, RunInfo, TerminalReason,
};
use std::sync::Arc;
use tracing::{debug, info};

/// Error type for pipeline callers. Exit code 2 = some record not imported, 1 = tool error.
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error("import incomplete: {failed} of {total} record(s) not imported")]
    ImportIncomplete { failed: u64, total: u64 },
    #[error("{0:#}")]
    Internal(#[from] anyhow::Error),
}

impl ToolError {
    pub fn exit_code(&self) -> u8 {
        match self {
            ToolError::ImportIncomplete { .. } => 2,
            ToolError::Internal(_) => 1,
        }
    }
}

/// Outcome of [`run_import`].
pub struct ImportOutcome<G> {
    pub report: ImportReport,
    pub instances: Vec<ImportInstance<G>>,
}

impl<G> ImportOutcome<G> {
    pub fn has_failures(&self) -> bool {
        self.report.summary.succeeded < self.report.summary.total
    }

    /// `Err(ImportIncomplete)` when any record was not imported.
    pub fn into_result(self) -> Result<ImportReport, ToolError> {
        if self.has_failures() {
            let s = &self.report.summary;
            return Err(ToolError::ImportIncomplete {
                failed: s.total - s.succeeded,
                total: s.total,
            });
        }
        Ok(self.report)
    }
}

pub async fn run_import<G: SaveGateway>(
    settings: &ImportSettings,
    records: Vec<ImportCandidate>,
    gateway: Arc<G>,
    clock: Arc<dyn Clock>,
) -> ImportOutcome<G> {
    let profile = settings.profile();
    let mut report = ImportReport::new(
        RunInfo::start(clock.now()),
        profile.kind,
        profile.endpoint.clone(),
    );

    info!(
        kind = %profile.kind,
        endpoint = %profile.endpoint,
        records = records.len(),
        auto_fix = settings.auto_fix,
        "starting import"
    );

    let orchestrator = ImportOrchestrator::new(profile, gateway).with_clock(clock.clone());
    let mut instances = orchestrator.create_instances(records);

    for (index, instance) in instances.iter_mut().enumerate() {
        let terminal_reason = drive(instance, settings).await;
        debug!(index, reason = ?terminal_reason, "record finished");
        report.records.push(record_report(index, instance, terminal_reason));
    }

    report.summary = ReportSummary::from_records(&report.records);
    report.run.ended_at = Some(clock.now());

    info!(
        total = report.summary.total,
        succeeded = report.summary.succeeded,
        failed = report.summary.failed,
        unfixable = report.summary.unfixable,
        "import finished"
    );

    ImportOutcome { report, instances }
}

/// Save once, then fix and retry until success, a terminal failure or the round cap.
async fn drive<G: SaveGateway>(
    instance: &mut ImportInstance<G>,
    settings: &ImportSettings,
) -> TerminalReason {
    instance.attempt_save().await;

    loop {
        if let Some(reason) = stop_reason(instance, settings) {
            return reason;
        }
        match instance.pending_fix() {
            Some(fix) => {
                debug!(fixes = fix.fixes().len(), "applying planned fixes");
                fix.apply_and_retry().await;
            }
            None => return TerminalReason::Unfixable,
        }
    }
}

fn stop_reason<G: SaveGateway>(
    instance: &ImportInstance<G>,
    settings: &ImportSettings,
) -> Option<TerminalReason> {
    let ImportState::Failed(failure) = instance.state() else {
        return match instance.state() {
            ImportState::Succeeded => Some(TerminalReason::Succeeded),
            _ => None,
        };
    };

    if failure.kind == FailureKind::Transport {
        Some(TerminalReason::Transport)
    } else if !failure.is_fixable() {
        Some(TerminalReason::Unfixable)
    } else if !settings.auto_fix {
        Some(TerminalReason::AutoFixDisabled)
    } else if instance.fix_rounds() >= settings.max_fix_rounds {
        Some(TerminalReason::FixRoundsExhausted)
    } else {
        None
    }
}

fn record_report<G: SaveGateway>(
    index: usize,
    instance: &ImportInstance<G>,
    terminal_reason: TerminalReason,
) -> RecordReport {
    let suggested = instance.describe_fix();
    RecordReport {
        index,
        instance: instance.snapshot(),
        state: instance.state().record_state(),
        fix_rounds: instance.fix_rounds(),
        applied_fixes: instance.applied_fixes().to_vec(),
        suggested_fix: (!suggested.is_empty()).then_some(suggested),
        terminal_reason,
    }
}
