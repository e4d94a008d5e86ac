//! Domain logic: turn gateway validation errors into candidate fixes.
//!
//! This crate owns *what* should be fixed and why. It does not own *when* a save is retried; that's
//! the `cyimport-core` crate.

mod classifier;
mod ports;
mod profile;
mod resolver;
mod rules;

pub use classifier::{ErrorClassifier, PatternClassifier};
pub use ports::{Clock, GatewayError, SaveGateway, SystemClock};
pub use profile::TargetProfile;
pub use resolver::FixResolver;
pub use rules::{
    ErrorPattern, FixRule, FixTemplate, RuleUsage, apply_fixes, builtin_rules, rule_catalog,
};
