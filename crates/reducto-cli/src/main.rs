mod config;

use anyhow::{Context, Result};
use chrono::{SecondsFormat, Utc};
use clap::{Parser, ValueEnum};
use config::ReduceConfig;
use reducto_core::{
    BlockSourceAccessor, CommandOracle, CommandOracleConfig, MinimizeStats, OracleCounters,
    Session, SessionConfig, Status, WrittenFiles,
};
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

/// Shrink a failing test down to the statements that still reproduce it.
#[derive(Parser)]
#[command(name = "reducto")]
#[command(version)]
struct Cli {
    /// Source file holding the failing test.
    container: PathBuf,

    /// Name of the test function to minimize.
    unit: String,

    /// Project file or directory used by the build and test commands.
    project: PathBuf,

    /// Writes `Original/` and `Simplified/` copies here instead of editing in place.
    output_dir: Option<PathBuf>,

    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(long)]
    timeout_ms: Option<u64>,

    #[arg(long)]
    no_build: bool,

    #[arg(long)]
    skip_initial_check: bool,

    #[arg(long, value_enum, default_value = "json")]
    format: OutputFormat,

    #[arg(long)]
    report: Option<PathBuf>,
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Json,
    Text,
}

impl OutputFormat {
    fn as_str(&self) -> &'static str {
        match self {
            OutputFormat::Json => "json",
            OutputFormat::Text => "text",
        }
    }
}

#[derive(Serialize)]
struct ReportJson {
    schema_version: String,
    tool: ToolInfo,
    invocation: Invocation,
    inputs: Vec<InputInfo>,
    status: Status,
    exit_code: i32,
    started_at: String,
    finished_at: String,
    duration_ms: u64,
    result: ResultInfo,
}

#[derive(Serialize)]
struct ToolInfo {
    name: String,
    version: String,
    git_sha: String,
}

#[derive(Serialize)]
struct Invocation {
    container: String,
    unit: String,
    project: String,
    output_dir: Option<String>,
    config: Option<String>,
    format: String,
    timeout_ms: Option<u64>,
    build: bool,
    initial_check: bool,
}

#[derive(Serialize)]
struct InputInfo {
    path: String,
    sha256: String,
}

#[derive(Serialize)]
struct ResultInfo {
    original_len: usize,
    minimized_len: usize,
    stats: Option<MinimizeStats>,
    oracle: OracleCounters,
    written: WrittenFiles,
}

fn main() {
    let cli = Cli::parse();
    init_tracing();
    let exit_code = match run(cli) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("tool error: {err:#}");
            2
        }
    };
    std::process::exit(exit_code);
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: Cli) -> Result<i32> {
    let started_at = Utc::now();
    let timer = Instant::now();

    let config = match &cli.config {
        Some(path) => ReduceConfig::load(path)?,
        None => ReduceConfig::default(),
    };

    let session = Session::new(SessionConfig {
        container: cli.container.clone(),
        unit: cli.unit.clone(),
        project: cli.project.clone(),
        output_dir: cli.output_dir.clone(),
        check_initial: !cli.skip_initial_check,
    })
    .context("invalid input")?;

    let inputs = build_inputs(&session, cli.config.as_deref())?;

    let accessor = BlockSourceAccessor::with_lock_policy(Some(config.lock_policy()));
    let mut oracle = CommandOracle::new(
        CommandOracleConfig {
            container: session.config().container.clone(),
            unit: session.config().unit.clone(),
            project: session.config().project.clone(),
            build: config.build_command(!cli.no_build, cli.timeout_ms),
            test: config.test_command(cli.timeout_ms),
        },
        accessor.clone(),
    )
    .context("prepare test oracle")?;

    let report = session
        .run(&accessor, &mut oracle)
        .with_context(|| format!("minimize {} in {}", cli.unit, cli.container.display()))?;

    let exit_code = match report.status {
        Status::Minimized => 0,
        Status::NotReproducible => 1,
    };
    info!(
        status = status_label(&report.status),
        from = report.original_len,
        to = report.minimized_len,
        "done"
    );

    let finished_at = Utc::now();
    let duration_ms = timer.elapsed().as_millis() as u64;

    let result = ReportJson {
        schema_version: "0.1".to_string(),
        tool: ToolInfo {
            name: "reducto".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            git_sha: std::env::var("REDUCTO_GIT_SHA").unwrap_or_else(|_| "UNKNOWN".to_string()),
        },
        invocation: Invocation {
            container: cli.container.to_string_lossy().to_string(),
            unit: cli.unit.clone(),
            project: cli.project.to_string_lossy().to_string(),
            output_dir: cli
                .output_dir
                .as_ref()
                .map(|dir| dir.to_string_lossy().to_string()),
            config: cli
                .config
                .as_ref()
                .map(|path| path.to_string_lossy().to_string()),
            format: cli.format.as_str().to_string(),
            timeout_ms: cli.timeout_ms,
            build: !cli.no_build,
            initial_check: !cli.skip_initial_check,
        },
        inputs,
        status: report.status,
        exit_code,
        started_at: started_at.to_rfc3339_opts(SecondsFormat::Secs, true),
        finished_at: finished_at.to_rfc3339_opts(SecondsFormat::Secs, true),
        duration_ms,
        result: ResultInfo {
            original_len: report.original_len,
            minimized_len: report.minimized_len,
            stats: report.stats,
            oracle: oracle.counters().clone(),
            written: report.written,
        },
    };

    match cli.format {
        OutputFormat::Json => emit_json(&result, cli.report.as_deref()),
        OutputFormat::Text => emit_text(&result, cli.report.as_deref()),
    }?;

    Ok(exit_code)
}

/// Hashes are taken before the search so they describe the unmodified inputs.
fn build_inputs(session: &Session, config: Option<&Path>) -> Result<Vec<InputInfo>> {
    let mut paths = vec![session.config().container.clone()];
    if session.config().project.is_file() {
        paths.push(session.config().project.clone());
    }
    if let Some(config) = config {
        paths.push(config.to_path_buf());
    }

    paths
        .iter()
        .map(|path| {
            Ok(InputInfo {
                path: path.to_string_lossy().to_string(),
                sha256: compute_sha256(path)?,
            })
        })
        .collect()
}

fn compute_sha256(path: &Path) -> Result<String> {
    let data = fs::read(path).with_context(|| format!("read {}", path.display()))?;
    let mut hasher = Sha256::new();
    hasher.update(&data);
    Ok(hex::encode(hasher.finalize()))
}

fn emit_json(result: &ReportJson, output: Option<&Path>) -> Result<()> {
    let payload = serde_json::to_string_pretty(result).context("serialize report json")?;
    if let Some(path) = output {
        write_atomic(path, payload.as_bytes())?;
        return Ok(());
    }

    println!("{payload}");
    Ok(())
}

fn emit_text(result: &ReportJson, output: Option<&Path>) -> Result<()> {
    let mut summary = format!(
        "status={} exit_code={} original_len={} minimized_len={}",
        status_label(&result.status),
        result.exit_code,
        result.result.original_len,
        result.result.minimized_len
    );
    if let Some(path) = &result.result.written.simplified {
        summary.push_str(&format!(" simplified={}", path.display()));
    }
    if let Some(path) = output {
        write_atomic(path, summary.as_bytes())?;
        return Ok(());
    }
    println!("{summary}");
    Ok(())
}

fn write_atomic(path: &Path, contents: &[u8]) -> Result<()> {
    let tmp_path = path.with_extension("tmp");
    fs::write(&tmp_path, contents).with_context(|| format!("write {}", tmp_path.display()))?;
    fs::rename(&tmp_path, path).with_context(|| format!("rename {}", path.display()))?;
    Ok(())
}

fn status_label(status: &Status) -> &'static str {
    match status {
        Status::Minimized => "minimized",
        Status::NotReproducible => "not_reproducible",
    }
}
