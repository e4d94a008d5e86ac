//! Clap-free settings for the import pipeline.

use cyimport_domain::TargetProfile;
use cyimport_types::target::TargetKind;

pub const DEFAULT_MAX_FIX_ROUNDS: u32 = 3;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportSettings {
    pub target: TargetKind,

    /// Overrides the target's built-in save endpoint.
    pub endpoint: Option<String>,

    /// Apply planned fixes and retry automatically.
    pub auto_fix: bool,

    /// Upper bound on fix-and-retry rounds per record.
    pub max_fix_rounds: u32,
}

impl Default for ImportSettings {
    fn default() -> Self {
        Self {
            target: TargetKind::DataMapping,
            endpoint: None,
            auto_fix: true,
            max_fix_rounds: DEFAULT_MAX_FIX_ROUNDS,
        }
    }
}

impl ImportSettings {
    pub fn profile(&self) -> TargetProfile {
        let profile = TargetProfile::builtin(self.target);
        match &self.endpoint {
            Some(endpoint) => profile.with_endpoint(endpoint.clone()),
            None => profile,
        }
    }
}
