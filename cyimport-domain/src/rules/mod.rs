//! Fix rules: (pattern, mutation) pairs expressed as data.

use cyimport_types::candidate::{ImportCandidate, NAME_FIELD};
use cyimport_types::fix::FixAction;
use cyimport_types::target::TargetKind;
use serde::Serialize;

mod mutation;
mod pattern;

pub use mutation::apply_fixes;
pub(crate) use mutation::count_references;

/// How a rule recognises an error message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ErrorPattern {
    /// Case-sensitive substring.
    Contains { text: String },

    /// `marker` followed by a bracketed identifier, e.g. `with id [X1]`.
    BracketedId { marker: String },
}

/// Mutation a matching rule applies to the candidate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FixTemplate {
    RenameWithSuffix { field: String },
    ClearReference { fields: Vec<String> },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FixRule {
    pub key: &'static str,
    pub description: &'static str,
    pub pattern: ErrorPattern,
    pub template: FixTemplate,
}

impl FixRule {
    pub const SAME_NAME: &'static str = "same-name";
    pub const STALE_MAPPING_REFERENCE: &'static str = "stale-mapping-reference";
    pub const STALE_DATASOURCE_REFERENCE: &'static str = "stale-datasource-reference";

    /// Returns the concrete action and its explanation when `error` matches and the candidate
    /// actually carries something the action can change.
    pub fn match_error(&self, candidate: &ImportCandidate, error: &str) -> Option<(FixAction, String)> {
        match (&self.pattern, &self.template) {
            (ErrorPattern::Contains { text }, FixTemplate::RenameWithSuffix { field }) => {
                if !error.contains(text.as_str()) {
                    return None;
                }
                let current = candidate.str_field(field)?;
                Some((
                    FixAction::RenameWithSuffix {
                        field: field.clone(),
                    },
                    format!(
                        "Rename \"{}\" by appending a unique timestamp suffix to `{}`",
                        current, field
                    ),
                ))
            }
            (ErrorPattern::BracketedId { marker }, FixTemplate::ClearReference { fields }) => {
                let id = pattern::bracketed_id(error, marker)?;
                let hits = count_references(candidate.as_value(), fields, id);
                if hits == 0 {
                    return None;
                }
                Some((
                    FixAction::ClearReference {
                        fields: fields.clone(),
                        id: id.to_string(),
                    },
                    format!(
                        "Clear {} reference(s) to [{}] held in `{}`",
                        hits,
                        id,
                        fields.join("`, `")
                    ),
                ))
            }
            (ErrorPattern::Contains { text }, FixTemplate::ClearReference { fields }) => {
                if !error.contains(text.as_str()) {
                    return None;
                }
                let id = pattern::bracketed_id(error, "")?;
                let hits = count_references(candidate.as_value(), fields, id);
                (hits > 0).then(|| {
                    (
                        FixAction::ClearReference {
                            fields: fields.clone(),
                            id: id.to_string(),
                        },
                        format!("Clear {} reference(s) to [{}]", hits, id),
                    )
                })
            }
            (ErrorPattern::BracketedId { .. }, FixTemplate::RenameWithSuffix { .. }) => None,
        }
    }
}

fn same_name_rule() -> FixRule {
    FixRule {
        key: FixRule::SAME_NAME,
        description: "The backend already holds a record with this name; append a timestamp \
                      suffix to the name so the import becomes a new record.",
        pattern: ErrorPattern::Contains {
            text: "with same name".to_string(),
        },
        template: FixTemplate::RenameWithSuffix {
            field: NAME_FIELD.to_string(),
        },
    }
}

fn stale_reference_rule(key: &'static str, description: &'static str, field: &str) -> FixRule {
    FixRule {
        key,
        description,
        pattern: ErrorPattern::BracketedId {
            marker: "with id".to_string(),
        },
        template: FixTemplate::ClearReference {
            fields: vec![field.to_string()],
        },
    }
}

/// Every rule shipped with cyimport, in evaluation order.
pub fn builtin_rules() -> Vec<FixRule> {
    vec![
        same_name_rule(),
        stale_reference_rule(
            FixRule::STALE_MAPPING_REFERENCE,
            "An endpoint points at a data mapping configuration the backend no longer accepts; \
             null the `dataMappingConfigId` holding that id.",
            "dataMappingConfigId",
        ),
        stale_reference_rule(
            FixRule::STALE_DATASOURCE_REFERENCE,
            "The chaining configuration points at a data source the backend no longer accepts; \
             null the `datasourceId` holding that id.",
            "datasourceId",
        ),
    ]
}

/// Rules recognised for a target kind, in evaluation order.
pub(crate) fn rules_for(kind: TargetKind) -> Vec<FixRule> {
    let wanted: &[&str] = match kind {
        TargetKind::DataMapping => &[FixRule::SAME_NAME],
        TargetKind::DataSourceConfig => &[FixRule::SAME_NAME, FixRule::STALE_MAPPING_REFERENCE],
        TargetKind::ChainingConfig => &[FixRule::SAME_NAME, FixRule::STALE_DATASOURCE_REFERENCE],
    };
    builtin_rules()
        .into_iter()
        .filter(|r| wanted.contains(&r.key))
        .collect()
}

/// A rule and the target kinds that recognise it.
#[derive(Debug, Clone, Serialize)]
pub struct RuleUsage {
    #[serde(flatten)]
    pub rule: FixRule,
    pub targets: Vec<TargetKind>,
}

pub fn rule_catalog() -> Vec<RuleUsage> {
    builtin_rules()
        .into_iter()
        .map(|rule| {
            let targets = TargetKind::ALL
                .into_iter()
                .filter(|k| rules_for(*k).iter().any(|r| r.key == rule.key))
                .collect();
            RuleUsage { rule, targets }
        })
        .collect()
}
