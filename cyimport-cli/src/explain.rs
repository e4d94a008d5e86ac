//! Rule explanations for the `cyimport explain` and `cyimport list-rules` commands.
//!
//! Matching and mutation come from the domain rule catalog; this module adds the
//! operator-facing text around them.

use cyimport_domain::{ErrorPattern, FixTemplate, RuleUsage, rule_catalog};

/// Operator guidance for one fix rule.
#[derive(Debug, Clone)]
pub struct RuleGuide {
    /// Rule key as used in reports (e.g., "same-name").
    pub key: &'static str,
    pub title: &'static str,
    /// A gateway error this rule recognises.
    pub example_error: &'static str,
    /// What to do by hand when auto-fix is disabled or the retry still fails.
    pub remediation: &'static str,
}

pub static RULE_GUIDES: &[RuleGuide] = &[
    RuleGuide {
        key: "same-name",
        title: "Rename Duplicate Record",
        example_error: "Entity with same name exists",
        remediation: r#"The target environment already holds a record with this name.

Either delete or rename the existing record in the target environment, or edit the
export so the imported record gets a distinct `name` and run the import again.
Auto-fix keeps both records by appending `_<epoch millis>` to the imported name."#,
    },
    RuleGuide {
        key: "stale-mapping-reference",
        title: "Clear Stale Data Mapping Reference",
        example_error: "DataMappingConfig with id [X1] invalid",
        remediation: r#"An endpoint of the data source configuration points at a data mapping that
does not exist in the target environment.

Import the referenced data mapping first and re-run, or accept the auto-fix, which
imports the data source with that `dataMappingConfigId` set to null. The endpoint
must then be re-linked to a mapping in the target environment."#,
    },
    RuleGuide {
        key: "stale-datasource-reference",
        title: "Clear Stale Data Source Reference",
        example_error: "DataSourceConfig with id [DS7] not found",
        remediation: r#"The chaining configuration points at a data source that does not exist in the
target environment.

Import the referenced data source first and re-run, or accept the auto-fix, which
imports the chaining configuration with that `datasourceId` set to null."#,
    },
];

/// A catalog rule with its guide attached.
#[derive(Debug, Clone)]
pub struct RuleExplanation {
    pub usage: RuleUsage,
    pub guide: Option<&'static RuleGuide>,
}

/// Look up a rule by key; case-insensitive, underscores accepted for hyphens.
pub fn lookup_rule(query: &str) -> Option<RuleExplanation> {
    let normalized = query.to_lowercase().replace('_', "-");
    rule_catalog()
        .into_iter()
        .find(|u| u.rule.key == normalized)
        .map(|usage| RuleExplanation {
            guide: guide_for(usage.rule.key),
            usage,
        })
}

pub fn guide_for(key: &str) -> Option<&'static RuleGuide> {
    RULE_GUIDES.iter().find(|g| g.key == key)
}

pub fn list_rule_keys() -> Vec<&'static str> {
    rule_catalog().iter().map(|u| u.rule.key).collect()
}

pub fn format_pattern(pattern: &ErrorPattern) -> String {
    match pattern {
        ErrorPattern::Contains { text } => format!("error text contains \"{}\"", text),
        ErrorPattern::BracketedId { marker } => {
            format!("error text contains \"{} [<id>]\"", marker)
        }
    }
}

pub fn format_template(template: &FixTemplate) -> String {
    match template {
        FixTemplate::RenameWithSuffix { field } => {
            format!("append \"_<epoch millis>\" to `{}`", field)
        }
        FixTemplate::ClearReference { fields } => format!(
            "set every {} equal to <id> to null, at any depth",
            fields
                .iter()
                .map(|f| format!("`{}`", f))
                .collect::<Vec<_>>()
                .join(" or ")
        ),
    }
}
