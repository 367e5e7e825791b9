//! Command dependency resolver.
//!
//! Reads `cmdgraph.toml`, follows `/namespace:name` references from each
//! phase document through the configured search roots, and prints a
//! per-phase dependency report.

use std::path::{Path, PathBuf};

use anyhow::{Result, anyhow};
use clap::{Args, Parser, Subcommand};
use tracing::info;

use cmdgraph::check::check_report;
use cmdgraph::exit_codes;
use cmdgraph::io::config::{
    ConfigOverrides, DEFAULT_CONFIG_FILE, ResolverConfig, apply_overrides, load_config,
};
use cmdgraph::io::report_store::{ReportFormat, render_report, write_report};
use cmdgraph::logging;
use cmdgraph::refs::{document_refs, format_refs};
use cmdgraph::resolve::{generation_timestamp, resolve};

#[derive(Parser)]
#[command(
    name = "cmdgraph",
    version,
    about = "Resolve transitive command dependencies of phase documents"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Resolve every phase and print the dependency report.
    Resolve(ResolveArgs),
    /// Print the references a single document contains.
    Refs {
        /// Document to scan.
        file: PathBuf,
        /// Config file providing aliases [default: cmdgraph.toml if present].
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Check a JSON report against the schema and report invariants.
    Check {
        /// Report written by `cmdgraph resolve --format json`.
        report: PathBuf,
    },
}

#[derive(Args)]
struct ResolveArgs {
    /// Config file [default: cmdgraph.toml if present].
    #[arg(long)]
    config: Option<PathBuf>,
    /// Extra search root, searched after configured roots. Repeatable.
    #[arg(long = "root", value_name = "DIR")]
    roots: Vec<PathBuf>,
    /// Extra phase document, id taken from its file stem. Repeatable.
    #[arg(long = "phase", value_name = "FILE")]
    phases: Vec<PathBuf>,
    /// Override `max_depth`.
    #[arg(long)]
    max_depth: Option<u32>,
    /// Resolve phases on separate threads.
    #[arg(long)]
    parallel: bool,
    /// Ignore backtick-quoted `namespace:name` mentions.
    #[arg(long)]
    no_heuristic: bool,
    #[arg(long, value_enum, default_value_t = ReportFormat::Json)]
    format: ReportFormat,
    /// Write the report here instead of stdout.
    #[arg(short, long)]
    output: Option<PathBuf>,
}

impl ResolveArgs {
    fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            roots: self.roots.clone(),
            phases: self.phases.clone(),
            max_depth: self.max_depth,
            parallel: self.parallel,
            no_heuristic: self.no_heuristic,
        }
    }
}

fn main() {
    logging::init();
    if let Err(err) = run() {
        eprintln!("{:#}", err);
        std::process::exit(exit_codes::INVALID);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Command::Resolve(args) => cmd_resolve(&args),
        Command::Refs { file, config } => cmd_refs(&file, config.as_deref()),
        Command::Check { report } => cmd_check(&report),
    }
}

fn cmd_resolve(args: &ResolveArgs) -> Result<()> {
    let base = read_config(args.config.as_deref())?;
    let cfg = apply_overrides(base, &args.overrides())?;
    let source_date_epoch = std::env::var("SOURCE_DATE_EPOCH").ok();
    let generated_at = generation_timestamp(source_date_epoch.as_deref())?;
    let report = resolve(&cfg, generated_at)?;
    match &args.output {
        Some(path) => {
            write_report(path, &report, args.format)?;
            info!(path = %path.display(), "report written");
        }
        None => print!("{}", render_report(&report, args.format)?),
    }
    Ok(())
}

fn cmd_refs(file: &Path, config: Option<&Path>) -> Result<()> {
    let cfg = read_config(config)?;
    let refs = document_refs(file, &cfg)?;
    print!("{}", format_refs(&refs));
    Ok(())
}

fn cmd_check(report: &Path) -> Result<()> {
    let outcome = check_report(report)?;
    println!(
        "ok: {} phases, {} commands ({} unresolved), {} agents",
        outcome.phases, outcome.commands, outcome.unresolved, outcome.agents
    );
    Ok(())
}

/// An explicit `--config` must exist; the implicit default may be absent.
fn read_config(explicit: Option<&Path>) -> Result<ResolverConfig> {
    match explicit {
        Some(path) if !path.is_file() => Err(anyhow!("config not found: {}", path.display())),
        Some(path) => load_config(path),
        None => load_config(Path::new(DEFAULT_CONFIG_FILE)),
    }
}
