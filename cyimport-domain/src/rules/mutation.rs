use chrono::{DateTime, Utc};
use cyimport_types::candidate::ImportCandidate;
use cyimport_types::fix::{FixAction, FixResult, PlannedFix};
use serde_json::Value;
use tracing::debug;

/// Applies `fixes` to a copy of `candidate`.
///
/// Identical actions are applied once. The input candidate is never touched.
pub fn apply_fixes(
    candidate: &ImportCandidate,
    fixes: &[PlannedFix],
    now: DateTime<Utc>,
) -> FixResult {
    let mut mutated = candidate.clone();
    let mut applied: Vec<&FixAction> = Vec::new();
    let mut lines: Vec<&str> = Vec::new();

    for fix in fixes {
        if applied.contains(&&fix.action) {
            continue;
        }
        applied.push(&fix.action);
        lines.push(fix.explanation.as_str());

        match &fix.action {
            FixAction::RenameWithSuffix { field } => {
                let Some(current) = mutated.str_field(field).map(str::to_string) else {
                    debug!(rule = %fix.rule, field = %field, "rename target missing, skipping");
                    continue;
                };
                let renamed = format!("{}_{}", current, now.timestamp_millis());
                debug!(rule = %fix.rule, from = %current, to = %renamed, "renaming candidate");
                mutated.set_str_field(field, renamed);
            }
            FixAction::ClearReference { fields, id } => {
                let cleared = clear_references(mutated.as_value_mut(), fields, id);
                debug!(rule = %fix.rule, id = %id, cleared, "cleared stale references");
            }
        }
    }

    FixResult {
        mutated_candidate: mutated,
        explanation: lines.join("\n"),
    }
}

/// Counts object keys in `fields` whose value is the string `id`, at any depth.
pub(crate) fn count_references(value: &Value, fields: &[String], id: &str) -> usize {
    match value {
        Value::Object(map) => map
            .iter()
            .map(|(k, v)| {
                let own = usize::from(fields.iter().any(|f| f == k) && v.as_str() == Some(id));
                own + count_references(v, fields, id)
            })
            .sum(),
        Value::Array(items) => items.iter().map(|v| count_references(v, fields, id)).sum(),
        _ => 0,
    }
}

fn clear_references(value: &mut Value, fields: &[String], id: &str) -> usize {
    match value {
        Value::Object(map) => {
            let mut cleared = 0;
            for (k, v) in map.iter_mut() {
                if fields.iter().any(|f| f == k) && v.as_str() == Some(id) {
                    *v = Value::Null;
                    cleared += 1;
                } else {
                    cleared += clear_references(v, fields, id);
                }
            }
            cleared
        }
        Value::Array(items) => items
            .iter_mut()
            .map(|v| clear_references(v, fields, id))
            .sum(),
        _ => 0,
    }
}
