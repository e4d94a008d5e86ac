use crate::fix::PlannedFix;
use crate::instance::InstanceSnapshot;
use crate::target::TargetKind;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Result of one batch import, written as `report.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportReport {
    pub schema: String,
    pub run: RunInfo,
    pub target: TargetKind,
    pub endpoint: String,
    #[serde(default)]
    pub records: Vec<RecordReport>,
    pub summary: ReportSummary,
}

impl ImportReport {
    pub fn new(run: RunInfo, target: TargetKind, endpoint: impl Into<String>) -> Self {
        Self {
            schema: crate::schema::CYIMPORT_REPORT_V1.to_string(),
            run,
            target,
            endpoint: endpoint.into(),
            records: Vec::new(),
            summary: ReportSummary::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunInfo {
    pub id: Uuid,

    pub started_at: DateTime<Utc>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ended_at: Option<DateTime<Utc>>,
}

impl RunInfo {
    pub fn start(now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            started_at: now,
            ended_at: None,
        }
    }
}

/// Final state of one record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordState {
    Unattempted,
    Succeeded,
    Failed,
}

/// Why the driver stopped working on a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TerminalReason {
    Succeeded,
    /// Validation errors matched no fix rule.
    Unfixable,
    /// The gateway could not be reached or answered with garbage.
    Transport,
    FixRoundsExhausted,
    AutoFixDisabled,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordReport {
    /// Position in the input batch.
    pub index: usize,

    pub instance: InstanceSnapshot,

    pub state: RecordState,

    #[serde(default)]
    pub fix_rounds: u32,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub applied_fixes: Vec<PlannedFix>,

    /// Fix that would be offered next, when the driver stopped before applying it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggested_fix: Option<String>,

    pub terminal_reason: TerminalReason,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportSummary {
    pub total: u64,
    pub succeeded: u64,
    pub failed: u64,
    pub unfixable: u64,
    pub unattempted: u64,
    pub fix_rounds: u64,
}

impl ReportSummary {
    pub fn from_records(records: &[RecordReport]) -> Self {
        let mut s = ReportSummary {
            total: records.len() as u64,
            ..Default::default()
        };
        for r in records {
            match r.state {
                RecordState::Succeeded => s.succeeded += 1,
                RecordState::Failed => s.failed += 1,
                RecordState::Unattempted => s.unattempted += 1,
            }
            if r.terminal_reason == TerminalReason::Unfixable {
                s.unfixable += 1;
            }
            s.fix_rounds += u64::from(r.fix_rounds);
        }
        s
    }
}
