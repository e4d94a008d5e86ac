//! Configuration file loading for cyimport.
//!
//! Discovers and loads `cyimport.toml` from the working directory.
//! Merges config file settings with CLI arguments (CLI takes precedence).

use anyhow::Context;
use camino::{Utf8Path, Utf8PathBuf};
use cyimport_core::settings::DEFAULT_MAX_FIX_ROUNDS;
use cyimport_types::target::TargetKind;
use fs_err as fs;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::debug;

/// The config file name to search for.
pub const CONFIG_FILE_NAME: &str = "cyimport.toml";

pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Top-level configuration from cyimport.toml.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CyimportConfig {
    pub gateway: GatewayConfig,

    pub import: ImportConfig,

    /// Save endpoint overrides keyed by target kind (`data-mapping = "/custom/import"`).
    pub endpoints: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GatewayConfig {
    /// Base URL of the Cyoda platform, e.g. `https://cyoda.example.com`.
    pub base_url: Option<String>,

    pub timeout_secs: Option<u64>,

    /// Bearer token. Prefer `CYIMPORT_TOKEN` over committing it here.
    pub token: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ImportConfig {
    pub auto_fix: bool,
    pub max_fix_rounds: u32,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            auto_fix: true,
            max_fix_rounds: DEFAULT_MAX_FIX_ROUNDS,
        }
    }
}

/// Discover the cyimport.toml config file.
///
/// Returns `None` if `dir` holds no config file.
pub fn discover_config(dir: &Utf8Path) -> Option<Utf8PathBuf> {
    let config_path = dir.join(CONFIG_FILE_NAME);
    if config_path.exists() {
        debug!("found config file at {}", config_path);
        Some(config_path)
    } else {
        debug!("no config file found at {}", config_path);
        None
    }
}

/// Load and parse a cyimport.toml config file.
pub fn load_config(path: &Utf8Path) -> anyhow::Result<CyimportConfig> {
    let contents =
        fs::read_to_string(path).with_context(|| format!("read config file {}", path))?;
    parse_config(&contents).with_context(|| format!("parse config file {}", path))
}

pub fn parse_config(contents: &str) -> anyhow::Result<CyimportConfig> {
    let config: CyimportConfig = toml::from_str(contents).context("invalid TOML")?;
    for key in config.endpoints.keys() {
        if TargetKind::parse(key).is_none() {
            anyhow::bail!(
                "unknown target kind '{}' in [endpoints]; expected one of: {}",
                key,
                known_kinds()
            );
        }
    }
    Ok(config)
}

/// Load config from `dir`, or return default if not found.
pub fn load_or_default(dir: &Utf8Path) -> anyhow::Result<CyimportConfig> {
    match discover_config(dir) {
        Some(path) => load_config(&path),
        None => Ok(CyimportConfig::default()),
    }
}

fn known_kinds() -> String {
    TargetKind::ALL
        .iter()
        .map(|k| k.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Import flags as given on the command line; `None` means "not passed".
#[derive(Debug, Clone, Default)]
pub struct ImportOverrides {
    pub base_url: Option<String>,
    pub token: Option<String>,
    pub timeout_secs: Option<u64>,
    pub endpoint: Option<String>,
    pub no_auto_fix: bool,
    pub max_fix_rounds: Option<u32>,
}

/// Effective settings for one `import` run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergedConfig {
    pub base_url: String,
    pub timeout: Duration,
    pub token: Option<String>,
    /// Endpoint override for the selected target, if any.
    pub endpoint: Option<String>,
    pub auto_fix: bool,
    pub max_fix_rounds: u32,
}

/// Builder for merging config file with CLI arguments.
pub struct ConfigMerger {
    config: CyimportConfig,
}

impl ConfigMerger {
    pub fn new(config: CyimportConfig) -> Self {
        Self { config }
    }

    /// Merge with import command CLI arguments.
    ///
    /// `--no-auto-fix` wins over `auto_fix = true`; every other flag replaces the file value.
    pub fn merge_import_args(
        self,
        kind: TargetKind,
        cli: &ImportOverrides,
    ) -> anyhow::Result<MergedConfig> {
        let Some(base_url) = cli
            .base_url
            .clone()
            .or_else(|| self.config.gateway.base_url.clone())
        else {
            anyhow::bail!(
                "no gateway base URL; pass --base-url or set [gateway] base_url in {}",
                CONFIG_FILE_NAME
            );
        };

        let endpoint = cli
            .endpoint
            .clone()
            .or_else(|| self.config.endpoints.get(kind.as_str()).cloned());

        Ok(MergedConfig {
            base_url,
            timeout: Duration::from_secs(
                cli.timeout_secs
                    .or(self.config.gateway.timeout_secs)
                    .unwrap_or(DEFAULT_TIMEOUT_SECS),
            ),
            token: cli.token.clone().or_else(|| self.config.gateway.token.clone()),
            endpoint,
            auto_fix: self.config.import.auto_fix && !cli.no_auto_fix,
            max_fix_rounds: cli.max_fix_rounds.unwrap_or(self.config.import.max_fix_rounds),
        })
    }
}
