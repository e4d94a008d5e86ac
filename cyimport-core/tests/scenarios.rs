use cyimport_core::adapters::{FixedClock, ScriptedGateway};
use cyimport_core::instance::{FailureKind, ImportInstance, ImportState, TRANSPORT_FAILURE_MESSAGE};
use cyimport_core::orchestrator::ImportOrchestrator;
use cyimport_core::pipeline::{ToolError, run_import};
use cyimport_core::settings::ImportSettings;
use cyimport_core::{GatewayError, TargetProfile};
use cyimport_domain::ErrorClassifier;
use cyimport_types::candidate::ImportCandidate;
use cyimport_types::fix::{FixAction, PlannedFix};
use cyimport_types::instance::SuccessFlag;
use cyimport_types::report::{RecordState, TerminalReason};
use cyimport_types::target::TargetKind;
use cyimport_types::wire::SaveResponse;
use pretty_assertions::assert_eq;
use serde_json::json;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, OnceLock};

const NOW_MILLIS: i64 = 1_700_000_000_000;

fn single(
    kind: TargetKind,
    candidate: serde_json::Value,
    gw: Arc<ScriptedGateway>,
) -> ImportInstance<ScriptedGateway> {
    ImportOrchestrator::new(TargetProfile::builtin(kind), gw)
        .with_clock(Arc::new(FixedClock::at_millis(NOW_MILLIS)))
        .create_instances([ImportCandidate::new(candidate)])
        .remove(0)
}

#[tokio::test]
async fn same_name_rejection_is_fixed_by_renaming() {
    let gw = Arc::new(ScriptedGateway::new(vec![Ok(SaveResponse::rejected([
        "Entity with same name exists",
    ]))]));
    let mut inst = single(TargetKind::DataMapping, json!({"name": "Foo"}), gw.clone());

    inst.attempt_save().await;
    assert_eq!(inst.snapshot().is_success, SuccessFlag::No);
    let description = inst.describe_fix();
    assert!(description.contains("Rename"), "{description}");

    let pending = inst.pending_fix().expect("same-name is fixable");
    let state = pending.apply_and_retry().await;
    assert_eq!(*state, ImportState::Succeeded);

    let sent = gw.requests();
    assert_eq!(sent.len(), 2);
    assert_eq!(sent[0].candidate.as_value(), &json!({"name": "Foo"}));
    assert_eq!(
        sent[1].candidate.as_value(),
        &json!({"name": format!("Foo_{NOW_MILLIS}")})
    );
    assert_eq!(inst.snapshot().is_success, SuccessFlag::Yes);
    assert!(inst.snapshot().error_descriptions.is_empty());
}

#[tokio::test]
async fn stale_mapping_reference_is_cleared_before_retry() {
    let gw = Arc::new(ScriptedGateway::new(vec![Ok(SaveResponse::rejected([
        "DataMappingConfig with id [X1] invalid",
    ]))]));
    let mut inst = single(
        TargetKind::DataSourceConfig,
        json!({
            "name": "Bar",
            "endpoints": [
                {"dataMappingConfigId": "X1"},
                {"dataMappingConfigId": "X2"}
            ]
        }),
        gw.clone(),
    );

    inst.attempt_save().await;
    assert!(!inst.describe_fix().is_empty());
    inst.pending_fix()
        .expect("stale reference is fixable")
        .apply_and_retry()
        .await;

    let retry = &gw.requests()[1].candidate;
    assert_eq!(
        retry.as_value(),
        &json!({
            "name": "Bar",
            "endpoints": [
                {"dataMappingConfigId": null},
                {"dataMappingConfigId": "X2"}
            ]
        })
    );
}

#[tokio::test]
async fn transport_failure_reports_single_synthetic_error() {
    let gw = Arc::new(ScriptedGateway::new(vec![Err(GatewayError::Transport {
        message: "operation timed out".to_string(),
    })]));
    let mut inst = single(TargetKind::ChainingConfig, json!({"name": "Baz"}), gw);

    let state = inst.attempt_save().await.clone();
    assert_eq!(state.failure().map(|f| f.kind), Some(FailureKind::Transport));

    let snap = inst.snapshot();
    assert_eq!(snap.is_success, SuccessFlag::No);
    assert_eq!(snap.error_descriptions, vec![TRANSPORT_FAILURE_MESSAGE.to_string()]);
    assert_eq!(inst.describe_fix(), "");
    assert!(inst.pending_fix().is_none());
}

#[tokio::test]
async fn transport_failure_can_be_retried_with_a_fresh_save() {
    let gw = Arc::new(ScriptedGateway::new(vec![Err(GatewayError::Transport {
        message: "connection refused".to_string(),
    })]));
    let mut inst = single(TargetKind::DataMapping, json!({"name": "Baz"}), gw.clone());

    inst.attempt_save().await;
    assert_eq!(*inst.attempt_save().await, ImportState::Succeeded);
    assert_eq!(gw.requests().len(), 2);
    assert_eq!(inst.fix_rounds(), 0);
}

#[tokio::test]
async fn success_after_prior_failures_overrides_earlier_errors() {
    let gw = Arc::new(ScriptedGateway::new(vec![
        Ok(SaveResponse::rejected(["Something odd happened"])),
        Err(GatewayError::Decode {
            message: "expected value".to_string(),
        }),
        Ok(SaveResponse::ok()),
    ]));
    let mut inst = single(TargetKind::DataMapping, json!({"name": "Qux"}), gw);

    inst.attempt_save().await;
    inst.attempt_save().await;
    inst.attempt_save().await;

    let snap = inst.snapshot();
    assert_eq!(snap.is_success, SuccessFlag::Yes);
    assert!(snap.error_descriptions.is_empty());
    assert!(inst.is_terminal());
}

#[tokio::test]
async fn unrecognised_error_is_terminal_with_empty_description() {
    let gw = Arc::new(ScriptedGateway::new(vec![Ok(SaveResponse::rejected([
        "Quota exceeded",
    ]))]));
    let mut inst = single(TargetKind::DataMapping, json!({"name": "Foo"}), gw);

    inst.attempt_save().await;
    assert_eq!(inst.describe_fix(), "");
    assert!(inst.is_terminal());
    assert!(inst.pending_fix().is_none());
    assert_eq!(
        inst.snapshot().error_descriptions,
        vec!["Quota exceeded".to_string()]
    );
}

#[tokio::test]
async fn describe_fix_does_not_mutate_the_candidate() {
    let gw = Arc::new(ScriptedGateway::new(vec![Ok(SaveResponse::rejected([
        "Entity with same name exists",
    ]))]));
    let mut inst = single(TargetKind::DataMapping, json!({"name": "Foo"}), gw);
    inst.attempt_save().await;

    let first = inst.describe_fix();
    let second = inst.describe_fix();
    assert_eq!(first, second);
    assert_eq!(inst.candidate().as_value(), &json!({"name": "Foo"}));
    assert_eq!(inst.fix_rounds(), 0);
}

#[tokio::test]
async fn first_time_success_has_no_errors() {
    let gw = Arc::new(ScriptedGateway::new(vec![]));
    let mut inst = single(TargetKind::DataSourceConfig, json!({"name": "New"}), gw);

    assert_eq!(*inst.attempt_save().await, ImportState::Succeeded);
    let snap = inst.snapshot();
    assert_eq!(snap.is_success, SuccessFlag::Yes);
    assert!(snap.error_descriptions.is_empty());
    assert!(!snap.is_fix_in_progress);
}

fn names(records: &[&str]) -> Vec<ImportCandidate> {
    records
        .iter()
        .map(|n| ImportCandidate::new(json!({ "name": n })))
        .collect()
}

#[tokio::test]
async fn pipeline_assigns_terminal_reasons_per_record() {
    let gw = Arc::new(ScriptedGateway::from_fn(|_, c| match c.name() {
        Some("dup") => Ok(SaveResponse::rejected(["Entity with same name exists"])),
        Some("bad") => Ok(SaveResponse::rejected(["Quota exceeded"])),
        Some("offline") => Err(GatewayError::Transport {
            message: "connection reset".to_string(),
        }),
        _ => Ok(SaveResponse::ok()),
    }));
    let settings = ImportSettings::default();

    let outcome = run_import(
        &settings,
        names(&["ok", "dup", "bad", "offline"]),
        gw,
        Arc::new(FixedClock::at_millis(NOW_MILLIS)),
    )
    .await;

    let reasons: Vec<_> = outcome
        .report
        .records
        .iter()
        .map(|r| r.terminal_reason)
        .collect();
    assert_eq!(
        reasons,
        vec![
            TerminalReason::Succeeded,
            TerminalReason::Succeeded,
            TerminalReason::Unfixable,
            TerminalReason::Transport,
        ]
    );

    let dup = &outcome.report.records[1];
    assert_eq!(dup.fix_rounds, 1);
    assert_eq!(dup.applied_fixes.len(), 1);
    assert_eq!(dup.applied_fixes[0].rule, "same-name");

    let s = &outcome.report.summary;
    assert_eq!(s.total, 4);
    assert_eq!(s.succeeded, 2);
    assert!(outcome.has_failures());

    let err = outcome.into_result().expect_err("two records failed");
    assert_eq!(err.exit_code(), 2);
    assert!(matches!(err, ToolError::ImportIncomplete { failed: 2, total: 4 }));
}

#[tokio::test]
async fn pipeline_without_auto_fix_leaves_suggestion_in_report() {
    let gw = Arc::new(ScriptedGateway::new(vec![Ok(SaveResponse::rejected([
        "Entity with same name exists",
    ]))]));
    let settings = ImportSettings {
        auto_fix: false,
        ..Default::default()
    };

    let outcome = run_import(
        &settings,
        names(&["dup"]),
        gw.clone(),
        Arc::new(FixedClock::at_millis(NOW_MILLIS)),
    )
    .await;

    let record = &outcome.report.records[0];
    assert_eq!(record.terminal_reason, TerminalReason::AutoFixDisabled);
    assert_eq!(record.state, RecordState::Failed);
    assert!(record.suggested_fix.as_deref().unwrap_or("").contains("Rename"));
    assert_eq!(gw.requests().len(), 1);
}

#[tokio::test]
async fn pipeline_stops_after_max_fix_rounds() {
    let gw = Arc::new(ScriptedGateway::from_fn(|_, _| {
        Ok(SaveResponse::rejected(["Entity with same name exists"]))
    }));
    let settings = ImportSettings {
        max_fix_rounds: 2,
        ..Default::default()
    };

    let outcome = run_import(
        &settings,
        names(&["always-dup"]),
        gw.clone(),
        Arc::new(FixedClock::at_millis(NOW_MILLIS)),
    )
    .await;

    let record = &outcome.report.records[0];
    assert_eq!(record.terminal_reason, TerminalReason::FixRoundsExhausted);
    assert_eq!(record.fix_rounds, 2);
    assert_eq!(gw.requests().len(), 3);
}

#[tokio::test]
async fn pipeline_on_clean_batch_is_ok() {
    let outcome = run_import(
        &ImportSettings::default(),
        names(&["a", "b"]),
        Arc::new(ScriptedGateway::new(vec![])),
        Arc::new(FixedClock::at_millis(NOW_MILLIS)),
    )
    .await;

    assert!(!outcome.has_failures());
    assert_eq!(outcome.instances.len(), 2);
    let report = outcome.into_result().expect("all imported");
    assert_eq!(report.summary.succeeded, 2);
    assert_eq!(report.schema, "cyimport.report.v1");
    assert!(report.run.ended_at.is_some());
}

#[tokio::test]
async fn busy_flag_is_raised_only_during_the_retry_save() {
    let flag: Arc<OnceLock<Arc<AtomicBool>>> = Arc::new(OnceLock::new());
    let seen: Arc<Mutex<Vec<bool>>> = Arc::new(Mutex::new(Vec::new()));

    let gw = {
        let flag = flag.clone();
        let seen = seen.clone();
        Arc::new(ScriptedGateway::from_fn(move |_, candidate| {
            let busy = flag.get().is_some_and(|f| f.load(Ordering::SeqCst));
            seen.lock().expect("seen lock").push(busy);
            if candidate.name() == Some("Foo") {
                Ok(SaveResponse::rejected(["Entity with same name exists"]))
            } else {
                Ok(SaveResponse::ok())
            }
        }))
    };
    let mut inst = ImportInstance::new(
        ImportCandidate::new(json!({"name": "Foo"})),
        Arc::new(TargetProfile::builtin(TargetKind::DataMapping)),
        gw,
        Arc::new(FixedClock::at_millis(NOW_MILLIS)),
    );
    flag.set(inst.busy_flag()).expect("flag set once");

    inst.attempt_save().await;
    assert!(!inst.snapshot().is_fix_in_progress);

    let pending = inst.pending_fix().expect("same-name is fixable");
    let state = pending.apply_and_retry().await;
    assert_eq!(*state, ImportState::Succeeded);

    assert_eq!(*seen.lock().expect("seen lock"), vec![false, true]);
    assert!(!inst.is_fix_in_progress());
    assert!(!inst.snapshot().is_fix_in_progress);
}

/// Classifier keyed on a structured error code instead of message text.
struct ErrorCodeClassifier;

impl ErrorClassifier for ErrorCodeClassifier {
    fn diagnose(&self, _candidate: &ImportCandidate, error: &str) -> Option<PlannedFix> {
        error.contains("E42").then(|| PlannedFix {
            rule: "code-e42".to_string(),
            error: error.to_string(),
            action: FixAction::RenameWithSuffix {
                field: "name".to_string(),
            },
            explanation: "rename".to_string(),
        })
    }
}

#[tokio::test]
async fn custom_classifier_drives_describe_and_retry() {
    let profile = TargetProfile::builtin(TargetKind::DataMapping)
        .with_classifier(Arc::new(ErrorCodeClassifier));
    let gw = Arc::new(ScriptedGateway::new(vec![Ok(SaveResponse::rejected([
        "E42",
    ]))]));
    let mut inst = ImportOrchestrator::new(profile, gw.clone())
        .with_clock(Arc::new(FixedClock::at_millis(7)))
        .create_instances([ImportCandidate::new(json!({"name": "Foo"}))])
        .remove(0);

    inst.attempt_save().await;
    assert_eq!(inst.describe_fix(), "rename");

    let pending = inst.pending_fix().expect("E42 is fixable");
    assert_eq!(pending.fixes()[0].rule, "code-e42");
    let state = pending.apply_and_retry().await;
    assert_eq!(*state, ImportState::Succeeded);
    assert_eq!(inst.candidate().name(), Some("Foo_7"));
    assert_eq!(gw.requests().len(), 2);
}

#[tokio::test]
async fn custom_classifier_without_a_match_leaves_the_record_unfixable() {
    let profile = TargetProfile::builtin(TargetKind::DataMapping)
        .with_classifier(Arc::new(ErrorCodeClassifier));
    let gw = Arc::new(ScriptedGateway::new(vec![Ok(SaveResponse::rejected([
        "Entity with same name exists",
    ]))]));
    let mut inst = ImportOrchestrator::new(profile, gw)
        .with_clock(Arc::new(FixedClock::at_millis(7)))
        .create_instances([ImportCandidate::new(json!({"name": "Foo"}))])
        .remove(0);

    inst.attempt_save().await;
    assert_eq!(inst.describe_fix(), "");
    assert!(inst.pending_fix().is_none());
}
