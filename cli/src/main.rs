//! Verity CLI - runs an analysis tool and reports the feedback it leaves.
//!
//! # Flow
//!
//! ```text
//! main() -> load config -> RunLifecycle::start() -> spawn tool ($feedback expanded)
//!                                |
//!                                v
//!            apply results until the tool exits -> drain -> end(outcome)
//!                                |
//!                                v
//!                  report on stdout, tool's exit code
//! ```
//!
//! Logs go to stderr so stdout carries only the report.

mod launch;
mod report;

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use verity_config::VerityConfig;
use verity_feedback::{DocumentId, FeedbackOptions, MemoryHost, RunLifecycle, RunOutcome};

/// How long to keep listening for late result files once the tool exits.
const DRAIN_GRACE: Duration = Duration::from_millis(300);

#[derive(Parser)]
#[command(name = "verity", version)]
#[command(about = "Run an analysis tool and collect its feedback as line annotations")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a tool against a fresh feedback directory and print its annotations
    Run {
        /// Source file to treat as open; repeat for several
        #[arg(long = "open", value_name = "FILE")]
        open: Vec<PathBuf>,
        /// Config file to use instead of ~/.verity/config.toml
        #[arg(long, value_name = "PATH")]
        config: Option<PathBuf>,
        /// Program and arguments; `$feedback` expands to `--feedback <dir>`
        #[arg(
            required = true,
            trailing_var_arg = true,
            allow_hyphen_values = true,
            value_name = "PROGRAM"
        )]
        command: Vec<String>,
    },
    /// Decode one result file and print the event as JSON
    Decode {
        /// Result file to decode
        file: PathBuf,
    },
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .with(env_filter)
        .init();
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            open,
            config,
            command,
        } => run(&open, config.as_deref(), &command).await,
        Commands::Decode { file } => decode_file(&file),
    }
}

fn load_options(config: Option<&Path>) -> Result<FeedbackOptions> {
    let loaded = match config {
        Some(path) => Some(
            VerityConfig::load_from(path)?
                .ok_or_else(|| anyhow!("config file not found: {}", path.display()))?,
        ),
        None => VerityConfig::load()?,
    };
    Ok(loaded.unwrap_or_default().into_options())
}

fn open_document(path: &Path) -> DocumentId {
    let absolute = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
    DocumentId::from_path(&absolute)
}

async fn run(open: &[PathBuf], config: Option<&Path>, command: &[String]) -> Result<ExitCode> {
    let options = load_options(config)?;
    let host = MemoryHost::with_documents(open.iter().map(|p| open_document(p)));
    let mut lifecycle = RunLifecycle::new(host, options);

    let dir = lifecycle
        .start()
        .context("failed to start feedback run")?;
    let mut child = launch::command(command, &dir)?
        .spawn()
        .with_context(|| format!("failed to start {}", command[0]))?;

    let mut watching = true;
    let status = loop {
        if !watching {
            break child.wait().await;
        }
        tokio::select! {
            status = child.wait() => break status,
            applied = lifecycle.next_event() => watching = applied,
        }
    }
    .context("failed to wait for the tool")?;

    // Results written just before exit may still be in flight.
    while let Ok(true) = tokio::time::timeout(DRAIN_GRACE, lifecycle.next_event()).await {}
    lifecycle.poll_events(usize::MAX);

    let outcome = status.code().map_or(RunOutcome::Signaled, RunOutcome::Exited);
    lifecycle.end(Some(outcome));

    print!("{}", report::render(lifecycle.store(), lifecycle.host().messages()));

    Ok(match outcome {
        RunOutcome::Exited(code) => ExitCode::from(u8::try_from(code).unwrap_or(1)),
        RunOutcome::Signaled => ExitCode::FAILURE,
    })
}

fn decode_file(path: &Path) -> Result<ExitCode> {
    let bytes =
        std::fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    let event = verity_feedback::decode(&bytes)
        .with_context(|| format!("failed to decode {}", path.display()))?;
    println!("{}", serde_json::to_string_pretty(&event)?);
    Ok(ExitCode::SUCCESS)
}
