//! BDD harness (cucumber-rs).
//!
//! This crate exists to keep scenario tests isolated from the production crates.

use cyimport_core::adapters::{FixedClock, ScriptedGateway};
use cyimport_core::instance::ImportInstance;
use cyimport_core::{GatewayError, TargetProfile};
use cyimport_types::candidate::ImportCandidate;
use cyimport_types::target::TargetKind;
use cyimport_types::wire::SaveResponse;
use std::sync::Arc;

/// Instant every scenario runs at; rename suffixes are derived from it.
pub const SCENARIO_NOW_MILLIS: i64 = 1_700_000_000_000;

/// One instance wired to a scripted gateway answering with `responses` in order.
pub fn scripted_instance(
    kind: TargetKind,
    candidate: serde_json::Value,
    responses: Vec<Result<SaveResponse, GatewayError>>,
) -> (ImportInstance<ScriptedGateway>, Arc<ScriptedGateway>) {
    let gateway = Arc::new(ScriptedGateway::new(responses));
    let instance = ImportInstance::new(
        ImportCandidate::new(candidate),
        Arc::new(TargetProfile::builtin(kind)),
        gateway.clone(),
        Arc::new(FixedClock::at_millis(SCENARIO_NOW_MILLIS)),
    );
    (instance, gateway)
}
