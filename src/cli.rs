use crate::{
    config::Config,
    engine::build_backends,
    install::{prompter_for, CommandInstaller},
    pipeline::Pipeline,
    probe::{probe_all, resolve},
    report::RunReport,
    util::ensure_dir,
};
use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

#[derive(Parser, Debug)]
#[command(name = "rtf2md")]
#[command(about = "Convert RTF documents to Markdown (pandoc with a native striprtf fallback)")]
pub struct Args {
    #[command(subcommand)]
    pub cmd: Command,

    /// Path to config TOML. If omitted, uses ./rtf2md.toml if present.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Override log level (trace/debug/info/warn/error).
    #[arg(long)]
    pub log_level: Option<String>,

    /// Exit without waiting for Enter (for scripts).
    #[arg(long)]
    pub no_pause: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Probe every enabled backend and print what is available.
    Doctor {},
    /// Convert every matching document in the input directory.
    Convert {
        #[arg(long)]
        input_dir: Option<PathBuf>,
        #[arg(long)]
        out_dir: Option<PathBuf>,
        /// Install a missing pandoc without asking.
        #[arg(long, conflicts_with = "no_install")]
        yes: bool,
        /// Never install; fall back straight away.
        #[arg(long)]
        no_install: bool,
    },
}

/// Loads config and installs the tracing subscriber.
///
/// The returned guard flushes the log file on drop, so the caller keeps it
/// alive until its last log line.
pub fn init(args: &Args) -> Result<(Config, Option<WorkerGuard>)> {
    let cfg = Config::resolve(args.config.as_deref())?;
    let log_path = resolve_log_path(&cfg, &out_dir_for(args, &cfg));
    let guard = init_logging(args, &cfg, log_path.as_deref())?;
    Ok((cfg, guard))
}

pub fn dispatch(args: &Args, cfg: &Config) -> Result<()> {
    match &args.cmd {
        Command::Doctor {} => doctor(cfg),
        Command::Convert {
            input_dir,
            yes,
            no_install,
            ..
        } => convert(cfg, input_dir.as_deref(), &out_dir_for(args, cfg), *yes, *no_install),
    }
}

/// `--out-dir` when given, else `paths.out_dir`.
pub fn out_dir_for(args: &Args, cfg: &Config) -> PathBuf {
    match &args.cmd {
        Command::Convert {
            out_dir: Some(dir), ..
        } => dir.clone(),
        _ => PathBuf::from(&cfg.paths.out_dir),
    }
}

/// Pauses unless `--no-pause` is given or the config turns it off. A config
/// that fails to load keeps the pause so its error stays on screen.
pub fn pause_requested(args: &Args) -> bool {
    !args.no_pause
        && Config::resolve(args.config.as_deref())
            .map(|cfg| cfg.global.pause_on_exit)
            .unwrap_or(true)
}

fn init_logging(args: &Args, cfg: &Config, file_path: Option<&Path>) -> Result<Option<WorkerGuard>> {
    let level = args
        .log_level
        .as_deref()
        .unwrap_or(cfg.logging.level.as_str());

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let stdout_layer = if cfg.logging.json {
        tracing_subscriber::fmt::layer()
            .json()
            .with_target(false)
            .boxed()
    } else {
        tracing_subscriber::fmt::layer()
            .with_target(false)
            .boxed()
    };

    let (file_layer, guard) = if let Some(path) = file_path {
        let parent = path.parent().unwrap_or_else(|| Path::new("."));
        ensure_dir(parent)?;
        let file = std::fs::File::create(path)
            .with_context(|| format!("create log file: {}", path.display()))?;
        let (non_blocking, guard) = tracing_appender::non_blocking(file);
        let layer = tracing_subscriber::fmt::layer()
            .with_writer(non_blocking)
            .with_ansi(false)
            .with_target(true)
            .boxed();
        (Some(layer), Some(guard))
    } else {
        (None, None)
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stdout_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| anyhow!("failed to init logging: {e}"))?;

    Ok(guard)
}

pub fn resolve_log_path(cfg: &Config, out_dir: &Path) -> Option<PathBuf> {
    if !cfg.logging.write_to_file {
        return None;
    }
    if !cfg.logging.file_path.is_empty() {
        return Some(PathBuf::from(&cfg.logging.file_path));
    }
    Some(out_dir.join("rtf2md.log"))
}

fn doctor(cfg: &Config) -> Result<()> {
    let backends = build_backends(cfg);
    let statuses = probe_all(&backends);
    println!("{}", serde_json::to_string_pretty(&statuses)?);
    Ok(())
}

fn convert(
    cfg: &Config,
    input_override: Option<&Path>,
    out_dir: &Path,
    assume_yes: bool,
    no_install: bool,
) -> Result<()> {
    let input_dir = input_override
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(&cfg.paths.input_dir));

    let mut prompter = prompter_for(cfg, assume_yes, no_install);
    let installer = CommandInstaller::new(cfg);
    let resolution = resolve(build_backends(cfg), prompter.as_mut(), &installer);
    info!(
        "availability {:?} via {:?}; backends {:?}",
        resolution.state,
        resolution.trail,
        resolution.backend_ids()
    );

    let pipeline = Pipeline::new(cfg, resolution)?;
    let report = pipeline.run(&input_dir, out_dir)?;

    if cfg.global.print_summary {
        print_summary(&report);
    }
    Ok(())
}

fn print_summary(report: &RunReport) {
    let out_dir = Path::new(&report.output_dir);
    let shown = out_dir
        .canonicalize()
        .unwrap_or_else(|_| out_dir.to_path_buf());
    let rule = "=".repeat(50);
    println!("{rule}");
    println!("Conversion complete!");
    println!(
        "Source files processed: {}/{}",
        report.files_converted, report.files_found
    );
    println!("Output files created: {}", report.artifacts_created);
    println!("Output directory: {}", shown.display());
    println!("{rule}");
}
