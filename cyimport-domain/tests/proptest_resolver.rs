//! Property-based tests for the fix resolver.
//!
//! These tests verify that:
//! - A "with same name" failure always yields a fix that changes the name
//! - Planning and describing never mutate the candidate
//! - Errors matching no rule never yield a fix

use chrono::{TimeZone, Utc};
use cyimport_domain::{FixResolver, TargetProfile};
use cyimport_types::candidate::ImportCandidate;
use cyimport_types::target::TargetKind;
use proptest::prelude::*;
use serde_json::json;

fn arb_kind() -> impl Strategy<Value = TargetKind> {
    prop::sample::select(TargetKind::ALL.to_vec())
}

/// Error texts that contain neither rule trigger.
fn arb_unrecognised_error() -> impl Strategy<Value = String> {
    prop::string::string_regex(r"[A-Za-z ]{0,40}")
        .unwrap()
        .prop_filter("no trigger", |s| {
            !s.contains("with same name") && !s.contains("with id")
        })
}

proptest! {
    #[test]
    fn same_name_fix_changes_the_name(
        kind in arb_kind(),
        name in "[A-Za-z0-9 _-]{0,20}",
        prefix in "[A-Za-z ]{0,10}",
        millis in 0i64..4_000_000_000_000,
    ) {
        let resolver = FixResolver::for_profile(&TargetProfile::builtin(kind));
        let candidate = ImportCandidate::new(json!({ "name": name }));
        let errors = vec![format!("{prefix}with same name exists")];

        let fixes = resolver.plan(&candidate, &errors);
        prop_assert_eq!(fixes.len(), 1);
        prop_assert!(!FixResolver::describe(&fixes).is_empty());

        let now = Utc.timestamp_millis_opt(millis).unwrap();
        let result = resolver.apply(&candidate, &fixes, now);
        let renamed = result.mutated_candidate.name().unwrap().to_string();
        prop_assert_ne!(&renamed, &name);
        prop_assert!(renamed.starts_with(&name));
    }

    #[test]
    fn planning_and_describing_leave_candidate_untouched(
        kind in arb_kind(),
        name in "[a-z]{1,8}",
        id in "[A-Z][0-9]{1,3}",
    ) {
        let resolver = FixResolver::for_profile(&TargetProfile::builtin(kind));
        let candidate = ImportCandidate::new(json!({
            "name": name,
            "datasourceId": id,
            "endpoints": [{ "dataMappingConfigId": id }]
        }));
        let before = candidate.clone();
        let errors = vec![
            "Entity with same name exists".to_string(),
            format!("Reference with id [{id}] invalid"),
        ];

        let first = FixResolver::describe(&resolver.plan(&candidate, &errors));
        let second = FixResolver::describe(&resolver.plan(&candidate, &errors));
        prop_assert_eq!(first, second);
        prop_assert_eq!(candidate, before);
    }

    #[test]
    fn unrecognised_errors_yield_no_fix(
        kind in arb_kind(),
        errors in prop::collection::vec(arb_unrecognised_error(), 0..4),
    ) {
        let resolver = FixResolver::for_profile(&TargetProfile::builtin(kind));
        let candidate = ImportCandidate::new(json!({ "name": "Foo", "datasourceId": "D1" }));
        let fixes = resolver.plan(&candidate, &errors);
        prop_assert!(fixes.is_empty());
        prop_assert_eq!(FixResolver::describe(&fixes), "");
    }
}
