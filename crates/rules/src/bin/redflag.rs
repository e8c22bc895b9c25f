//! redflag: run red-flag rules against procurement records.
//!
//! Subcommands:
//! - `detect`: evaluate one JSON record (file or stdin)
//! - `validate`: check rule files and report errors and warnings
//! - `stream`: evaluate newline-delimited JSON records from stdin

use std::fs;
use std::io::{self, BufRead, Read};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing::{info, warn};

use procwatch_core::config::{load_dotenv, Config};
use procwatch_core::Value;
use procwatch_rules::engine::{DetectionEngine, Detector};
use procwatch_rules::loader::{RuleError, RuleLoader};
use procwatch_rules::schema::{RuleDefinition, Severity};
use procwatch_rules::sink::{JsonWriterSink, OutputFormat, ResultSink};
use procwatch_rules::source::{load_bundle, RuleSource, StaticRuleSource};
use procwatch_rules::validation::validate_definition;

// ── CLI ─────────────────────────────────────────────────────────────

/// Red-flag detection over procurement records.
#[derive(Parser, Debug)]
#[command(name = "redflag", version, about)]
struct Cli {
    /// Configuration profile (keys are read as `{PROFILE}_{KEY}` first).
    #[arg(long, global = true, env = "PROCWATCH_PROFILE")]
    profile: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Evaluate the rules against a single JSON record.
    Detect(DetectArgs),
    /// Validate rule definitions without evaluating anything.
    Validate(RulesArgs),
    /// Evaluate newline-delimited JSON records read from stdin.
    Stream(StreamArgs),
}

#[derive(Args, Debug)]
struct RulesArgs {
    /// Rule directory or bundle file. Defaults to the configured RULES_DIR.
    #[arg(long)]
    rules: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct DetectArgs {
    #[command(flatten)]
    rules: RulesArgs,

    /// JSON record file. Reads stdin when omitted.
    #[arg(long)]
    record: Option<PathBuf>,

    #[command(flatten)]
    output: OutputArgs,
}

#[derive(Args, Debug)]
struct StreamArgs {
    #[command(flatten)]
    rules: RulesArgs,

    /// Hot-reload rule files and refresh the rule set before each record.
    #[arg(long)]
    watch: bool,

    #[command(flatten)]
    output: OutputArgs,
}

#[derive(Args, Debug)]
struct OutputArgs {
    #[arg(long, value_enum, default_value_t = FormatArg::Envelope)]
    format: FormatArg,

    /// Drop findings below this severity.
    #[arg(long)]
    min_severity: Option<Severity>,

    /// Override the configured parallel evaluation threshold.
    #[arg(long)]
    parallel_threshold: Option<usize>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum FormatArg {
    Envelope,
    Records,
}

impl From<FormatArg> for OutputFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Envelope => OutputFormat::Envelope,
            FormatArg::Records => OutputFormat::Records,
        }
    }
}

// ── Rule loading ────────────────────────────────────────────────────

type SharedSource = Arc<dyn RuleSource + Send + Sync>;

fn rules_path(args: &RulesArgs, config: &Config) -> PathBuf {
    args.rules
        .clone()
        .unwrap_or_else(|| config.rules.rules_dir.clone())
}

fn open_dir(path: &Path) -> Result<RuleLoader> {
    let loader = RuleLoader::new(path.to_path_buf());
    let results = loader
        .load_all()
        .with_context(|| format!("failed to scan rules directory {}", path.display()))?;
    let failed = results.iter().filter(|r| r.error().is_some()).count();
    info!(path = %path.display(), rules = loader.len(), failed, "rules directory loaded");
    Ok(loader)
}

fn open_bundle(path: &Path) -> Result<Vec<RuleDefinition>> {
    load_bundle(path).with_context(|| format!("failed to load rule bundle {}", path.display()))
}

/// Open `path` as a rule source: a directory of rule files or a bundle.
fn open_source(path: &Path, watch: bool) -> Result<SharedSource> {
    if path.is_dir() {
        let mut loader = open_dir(path)?;
        if watch {
            loader.watch().context("failed to start rules watcher")?;
        }
        Ok(Arc::new(loader))
    } else {
        if watch {
            warn!(path = %path.display(), "--watch only applies to rule directories, ignoring");
        }
        Ok(Arc::new(StaticRuleSource::new(open_bundle(path)?)))
    }
}

fn build_engine(config: &Config, output: &OutputArgs) -> DetectionEngine {
    let mut engine_config = config.engine.clone();
    if let Some(threshold) = output.parallel_threshold {
        engine_config.parallel_threshold = threshold;
    }
    DetectionEngine::new(engine_config)
}

// ── Subcommands ─────────────────────────────────────────────────────

fn run_detect(args: DetectArgs, config: &Config) -> Result<()> {
    let source = open_source(&rules_path(&args.rules, config), false)?;
    let detector = Detector::new(source, build_engine(config, &args.output))
        .context("failed to load rules")?;

    let text = match &args.record {
        Some(path) => fs::read_to_string(path)
            .with_context(|| format!("failed to read record {}", path.display()))?,
        None => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .context("failed to read record from stdin")?;
            buf
        }
    };
    let record = Value::from_json_str(&text).context("record is not valid JSON")?;

    let mut report = detector.detect(&record)?;
    if let Some(min) = args.output.min_severity {
        report.retain_min_severity(min);
    }

    let sink = JsonWriterSink::new(io::stdout().lock(), args.output.format.into());
    sink.accept(&report.red_flags)?;
    info!(
        red_flags = report.red_flags.len(),
        failed_rules = report.diagnostics.len(),
        "detection complete"
    );
    Ok(())
}

fn run_validate(args: RulesArgs, config: &Config) -> Result<()> {
    let path = rules_path(&args, config);
    let mut invalid = 0usize;

    let definitions = if path.is_dir() {
        let loader = RuleLoader::new(path.clone());
        let results = loader
            .load_all()
            .with_context(|| format!("failed to scan rules directory {}", path.display()))?;
        for result in &results {
            if let Some(error) = result.error() {
                invalid += 1;
                let field = match error {
                    RuleError::Header(header) => header.field,
                    _ => "",
                };
                println!(
                    "{}",
                    serde_json::json!({
                        "path": result.path,
                        "valid": false,
                        "errors": [{ "path": field, "message": error.to_string() }],
                        "warnings": [],
                    })
                );
            }
        }
        loader.definitions()
    } else {
        open_bundle(&path)?
    };

    for def in &definitions {
        let result = validate_definition(def);
        if !result.valid {
            invalid += 1;
        }
        println!(
            "{}",
            serde_json::json!({
                "rule_id": def.id,
                "valid": result.valid,
                "errors": result.errors,
                "warnings": result.warnings,
            })
        );
    }

    info!(rules = definitions.len(), invalid, "validation complete");
    if invalid > 0 {
        bail!("{invalid} rule(s) failed validation");
    }
    Ok(())
}

fn run_stream(args: StreamArgs, config: &Config) -> Result<()> {
    let watch = args.watch || config.rules.watch;
    let source = open_source(&rules_path(&args.rules, config), watch)?;
    let detector = Detector::new(source, build_engine(config, &args.output))
        .context("failed to load rules")?;
    let sink = JsonWriterSink::new(io::stdout().lock(), args.output.format.into());

    let mut processed = 0usize;
    for (line_no, line) in io::stdin().lock().lines().enumerate() {
        let line = line.context("failed to read stdin")?;
        if line.trim().is_empty() {
            continue;
        }

        if watch {
            if let Err(e) = detector.reload() {
                warn!(error = %e, "rule reload failed, keeping previous rule set");
            }
        }

        let record = match Value::from_json_str(&line) {
            Ok(record) => record,
            Err(e) => {
                warn!(line = line_no + 1, error = %e, "skipping unparsable record");
                continue;
            }
        };

        let mut report = match detector.detect(&record) {
            Ok(report) => report,
            Err(e) => {
                warn!(line = line_no + 1, error = %e, "skipping record");
                continue;
            }
        };
        if let Some(min) = args.output.min_severity {
            report.retain_min_severity(min);
        }
        sink.accept(&report.red_flags)?;
        processed += 1;
    }

    info!(records = processed, "stream finished");
    Ok(())
}

// ── main ────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    load_dotenv();

    // Logs go to stderr so stdout stays machine-readable.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    let config = match &cli.profile {
        Some(profile) => Config::for_profile(profile),
        None => Config::from_env(),
    };
    config.log_summary();

    match cli.command {
        Command::Detect(args) => run_detect(args, &config),
        Command::Validate(args) => run_validate(args, &config),
        Command::Stream(args) => run_stream(args, &config),
    }
}
