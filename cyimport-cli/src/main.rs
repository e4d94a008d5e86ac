use anyhow::Context;
use camino::{Utf8Path, Utf8PathBuf};
use clap::{Parser, Subcommand};
use cyimport_cli::config::{self, ConfigMerger, ImportOverrides};
use cyimport_cli::explain;
use cyimport_core::pipeline::{ToolError, run_import};
use cyimport_core::settings::ImportSettings;
use cyimport_core::{Clock, SystemClock};
use cyimport_domain::rule_catalog;
use cyimport_gateway::{HttpGatewayConfig, HttpSaveGateway};
use cyimport_records::{flatten_records, load_exports};
use cyimport_render::render_report_md;
use cyimport_types::target::TargetKind;
use fs_err as fs;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(
    name = "cyimport",
    version,
    about = "Import Cyoda configuration exports, fixing known rejections automatically."
)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Import exported records and write a report.
    Import(ImportArgs),
    /// Explain what a fix rule matches and what it changes.
    Explain(ExplainArgs),
    /// List all fix rules and the targets that use them.
    ListRules(ListRulesArgs),
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum KindArg {
    DataMapping,
    DataSourceConfig,
    ChainingConfig,
}

impl From<KindArg> for TargetKind {
    fn from(k: KindArg) -> Self {
        match k {
            KindArg::DataMapping => TargetKind::DataMapping,
            KindArg::DataSourceConfig => TargetKind::DataSourceConfig,
            KindArg::ChainingConfig => TargetKind::ChainingConfig,
        }
    }
}

#[derive(Debug, Parser)]
struct ImportArgs {
    /// Kind of configuration record in the input.
    #[arg(long, value_enum)]
    kind: KindArg,

    /// Export file, or a directory of `*.json` export files.
    #[arg(long)]
    input: Utf8PathBuf,

    /// Config file (default: ./cyimport.toml when present).
    #[arg(long)]
    config: Option<Utf8PathBuf>,

    /// Base URL of the Cyoda platform.
    #[arg(long)]
    base_url: Option<String>,

    /// Bearer token for the platform API.
    #[arg(long, env = "CYIMPORT_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Request timeout in seconds.
    #[arg(long)]
    timeout_secs: Option<u64>,

    /// Save endpoint path, replacing the built-in one for the kind.
    #[arg(long)]
    endpoint: Option<String>,

    /// Report fixes instead of applying them.
    #[arg(long, default_value_t = false)]
    no_auto_fix: bool,

    /// Maximum fix-and-retry rounds per record.
    #[arg(long)]
    max_fix_rounds: Option<u32>,

    /// Output directory for report.json and report.md.
    #[arg(long, default_value = "artifacts/cyimport")]
    out_dir: Utf8PathBuf,
}

#[derive(Debug, Parser)]
struct ExplainArgs {
    /// Rule key to explain (e.g., "same-name").
    rule_key: String,
}

#[derive(Debug, Parser)]
struct ListRulesArgs {
    /// Only list rules used by this target kind.
    #[arg(long, value_enum)]
    kind: Option<KindArg>,

    /// Output format (text, json).
    #[arg(long, value_enum, default_value = "text")]
    format: OutputFormat,
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

fn main() -> ExitCode {
    match real_main() {
        Ok(()) => ExitCode::from(0),
        Err(e @ ToolError::ImportIncomplete { .. }) => {
            warn!("{}", e);
            eprintln!("{}", e);
            ExitCode::from(e.exit_code())
        }
        Err(e) => {
            error!("{:?}", e);
            eprintln!("error: {}", e);
            ExitCode::from(e.exit_code())
        }
    }
}

fn real_main() -> Result<(), ToolError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Import(args) => cmd_import(args),
        Command::Explain(args) => cmd_explain(args).map_err(ToolError::from),
        Command::ListRules(args) => cmd_list_rules(args).map_err(ToolError::from),
    }
}

fn cmd_import(args: ImportArgs) -> Result<(), ToolError> {
    let kind = TargetKind::from(args.kind);

    let file_config = match &args.config {
        Some(path) => config::load_config(path)?,
        None => config::load_or_default(Utf8Path::new(".")).context("load cyimport.toml config")?,
    };
    let merged = ConfigMerger::new(file_config).merge_import_args(
        kind,
        &ImportOverrides {
            base_url: args.base_url.clone(),
            token: args.token.clone(),
            timeout_secs: args.timeout_secs,
            endpoint: args.endpoint.clone(),
            no_auto_fix: args.no_auto_fix,
            max_fix_rounds: args.max_fix_rounds,
        },
    )?;
    debug!(
        "merged config: base_url={}, timeout={:?}, endpoint={:?}, auto_fix={}, max_fix_rounds={}",
        merged.base_url, merged.timeout, merged.endpoint, merged.auto_fix, merged.max_fix_rounds
    );

    let exports = load_exports(&args.input)
        .with_context(|| format!("load exports from {}", args.input))?;
    let unreadable = exports.iter().filter(|e| e.records.is_err()).count();
    if unreadable > 0 {
        warn!("{} of {} export file(s) skipped", unreadable, exports.len());
    }
    if !exports.is_empty() && unreadable == exports.len() {
        return Err(anyhow::anyhow!("no readable export files under {}", args.input).into());
    }
    let records = flatten_records(&exports);

    let gateway = HttpSaveGateway::new(HttpGatewayConfig {
        base_url: merged.base_url.clone(),
        timeout: merged.timeout,
        token: merged.token.clone(),
    })
    .context("build HTTP gateway")?;

    let settings = ImportSettings {
        target: kind,
        endpoint: merged.endpoint.clone(),
        auto_fix: merged.auto_fix,
        max_fix_rounds: merged.max_fix_rounds,
    };

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("start async runtime")?;
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let outcome = runtime.block_on(run_import(&settings, records, Arc::new(gateway), clock));

    fs::create_dir_all(&args.out_dir).with_context(|| format!("create {}", args.out_dir))?;
    write_json(&args.out_dir.join("report.json"), &outcome.report)?;
    fs::write(
        args.out_dir.join("report.md"),
        render_report_md(&outcome.report),
    )
    .with_context(|| format!("write report.md to {}", args.out_dir))?;

    let s = &outcome.report.summary;
    println!(
        "imported {} of {} record(s); report in {}",
        s.succeeded, s.total, args.out_dir
    );
    info!("wrote report to {}", args.out_dir);

    outcome.into_result().map(|_| ())
}

fn write_json<T: serde::Serialize>(path: &Utf8Path, v: &T) -> anyhow::Result<()> {
    let s = serde_json::to_string_pretty(v).context("serialize json")?;
    fs::write(path, s).with_context(|| format!("write {}", path))?;
    Ok(())
}

fn cmd_explain(args: ExplainArgs) -> anyhow::Result<()> {
    use explain::{format_pattern, format_template, list_rule_keys, lookup_rule};

    let Some(rule) = lookup_rule(&args.rule_key) else {
        let available = list_rule_keys().join(", ");
        anyhow::bail!(
            "Unknown rule key: '{}'\n\nAvailable rules: {}",
            args.rule_key,
            available
        );
    };
    let usage = &rule.usage;
    let title = rule.guide.map(|g| g.title).unwrap_or(usage.rule.key);

    println!("================================================================================");
    println!("RULE: {}", title);
    println!("================================================================================");
    println!();
    println!("Key:      {}", usage.rule.key);
    println!(
        "Targets:  {}",
        usage
            .targets
            .iter()
            .map(|t| t.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    );
    println!();

    println!("DESCRIPTION");
    println!("--------------------------------------------------------------------------------");
    println!("{}", usage.rule.description);
    println!();

    println!("MATCHES");
    println!("--------------------------------------------------------------------------------");
    println!("{}", format_pattern(&usage.rule.pattern));
    if let Some(guide) = rule.guide {
        println!("e.g. \"{}\"", guide.example_error);
    }
    println!();

    println!("FIX");
    println!("--------------------------------------------------------------------------------");
    println!("{}", format_template(&usage.rule.template));
    println!();

    if let Some(guide) = rule.guide {
        println!("REMEDIATION GUIDANCE");
        println!("--------------------------------------------------------------------------------");
        println!("{}", guide.remediation);
        println!();
    }

    Ok(())
}

fn cmd_list_rules(args: ListRulesArgs) -> anyhow::Result<()> {
    let wanted = args.kind.map(TargetKind::from);
    let rules: Vec<_> = rule_catalog()
        .into_iter()
        .filter(|u| wanted.is_none_or(|k| u.targets.contains(&k)))
        .collect();

    match args.format {
        OutputFormat::Text => {
            println!("Available rules:\n");
            println!("  {:<28} TARGETS", "KEY");
            println!("  {:<28} -------", "---");
            for u in &rules {
                let targets = u
                    .targets
                    .iter()
                    .map(|t| t.as_str())
                    .collect::<Vec<_>>()
                    .join(", ");
                println!("  {:<28} {}", u.rule.key, targets);
            }
            println!();
            println!("Use 'cyimport explain <key>' for details.");
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&rules)?);
        }
    }
    Ok(())
}
