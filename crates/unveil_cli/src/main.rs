//! Unveil CLI
//!
//! Scaffold a report configuration, list its content, print the entrance
//! timeline a reader would see, and run headless scenarios.

mod project;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use unveil_app::{
    run_loaded_scenario, HeadlessRunConfig, HeadlessScenario, UnveilApp, UnveilConfig, CONFIG_FILE,
};
use unveil_layout::{BlockChangeKind, SectionKind};

#[derive(Parser)]
#[command(name = "unveil")]
#[command(about = "View-triggered entrance animations for report pages")]
#[command(version)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Config file or directory containing unveil.toml
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create unveil.toml and a sample scenario
    Init {
        /// Target directory
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Overwrite an existing unveil.toml
        #[arg(long)]
        force: bool,

        /// Export the built-in report to content.toml
        #[arg(long)]
        with_content: bool,
    },

    /// Run a headless scenario and print its report
    Run {
        /// Scenario JSON file
        scenario: PathBuf,

        /// Also write the report to this relative path
        #[arg(short, long)]
        report: Option<PathBuf>,

        /// Milliseconds per frame
        #[arg(long, default_value = "16")]
        tick_ms: u64,
    },

    /// Print block milestones while scrolling from top to bottom
    Timeline {
        /// Pixels scrolled per frame
        #[arg(long, default_value = "40")]
        px: f32,

        /// Milliseconds per frame
        #[arg(long, default_value = "16")]
        tick_ms: u64,

        #[arg(long, value_enum, default_value = "text")]
        format: Format,
    },

    /// List report content by section
    Content {
        #[arg(long, value_enum, default_value = "text")]
        format: Format,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Format {
    Text,
    Json,
}

/// Logs go to stderr so stdout stays clean for reports
fn init_tracing(verbose: bool) {
    let default = if verbose { "unveil=debug" } else { "unveil=info" };
    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| default.into()),
    );

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Init {
            path,
            force,
            with_content,
        } => {
            for file in project::init_project(&path, force, with_content)? {
                println!("created {}", file.display());
            }
            Ok(ExitCode::SUCCESS)
        }
        Commands::Run {
            scenario,
            report,
            tick_ms,
        } => cmd_run(cli.config.as_deref(), &scenario, report.as_deref(), tick_ms),
        Commands::Timeline { px, tick_ms, format } => {
            cmd_timeline(cli.config.as_deref(), px, tick_ms, format)?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Content { format } => {
            cmd_content(cli.config.as_deref(), format)?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

/// Explicit `--config`, else `unveil.toml` in the working directory, else
/// defaults with the built-in report
fn load_app(config: Option<&Path>) -> Result<UnveilApp> {
    let config = match config {
        Some(path) => UnveilConfig::load_from_path(path)?,
        None if Path::new(CONFIG_FILE).exists() => UnveilConfig::load_from_path(Path::new("."))?,
        None => {
            tracing::debug!("no {} found, using defaults", CONFIG_FILE);
            UnveilConfig::default()
        }
    };
    Ok(UnveilApp::new(config)?)
}

fn cmd_run(
    config: Option<&Path>,
    scenario_path: &Path,
    report_path: Option<&Path>,
    tick_ms: u64,
) -> Result<ExitCode> {
    let app = load_app(config)?;
    let scenario = HeadlessScenario::from_path(scenario_path)?;
    let mut runtime = app.headless(HeadlessRunConfig {
        tick_ms,
        ..Default::default()
    })?;

    tracing::info!(
        scenario = scenario.name.as_deref().unwrap_or("unnamed"),
        steps = scenario.steps.len(),
        "running scenario"
    );
    let outcome = run_loaded_scenario(&mut runtime, &scenario)?;
    let report = outcome.report();

    report.write_to_writer(&mut std::io::stdout().lock())?;
    if let Some(path) = report_path {
        report.write_to_path(path)?;
        tracing::info!(path = %path.display(), "report written");
    }

    if outcome.is_failed() {
        tracing::error!(
            step = ?report.failed_step_index,
            reason = report.message.as_deref().unwrap_or_default(),
            "scenario failed"
        );
        Ok(ExitCode::FAILURE)
    } else {
        Ok(ExitCode::SUCCESS)
    }
}

fn cmd_timeline(config: Option<&Path>, px: f32, tick_ms: u64, format: Format) -> Result<()> {
    let app = load_app(config)?;
    let timeline = app.timeline(
        HeadlessRunConfig {
            tick_ms,
            ..Default::default()
        },
        px,
    )?;

    match format {
        Format::Json => {
            let json = serde_json::to_string_pretty(&timeline).context("Failed to encode timeline")?;
            println!("{json}");
        }
        Format::Text => {
            for change in &timeline {
                let label = match change.kind {
                    BlockChangeKind::EnteredView => "entered",
                    BlockChangeKind::Started => "started",
                    BlockChangeKind::Settled => "settled",
                };
                println!("{:>6} ms  {:<8} {}", change.at_ms, label, change.key);
            }
        }
    }
    Ok(())
}

fn cmd_content(config: Option<&Path>, format: Format) -> Result<()> {
    let app = load_app(config)?;
    let catalog = app.catalog();

    if let Format::Json = format {
        let json = serde_json::to_string_pretty(catalog).context("Failed to encode content")?;
        println!("{json}");
        return Ok(());
    }

    for kind in SectionKind::ALL {
        println!("{kind}");
        for record in catalog.records_in(kind) {
            print!("  {:<20} [{}] {}", record.id, record.category, record.title);
            if !record.tags.is_empty() {
                print!("  ({})", record.tags.join(", "));
            }
            println!();
        }
    }
    Ok(())
}
