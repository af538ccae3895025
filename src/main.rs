use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;

use inventory_verify::config::InventoryVerifyConfig;
use inventory_verify::telemetry::{init_telemetry, shutdown_telemetry};
use inventory_verify::verification::{
    ActionKind, Location, PendingFile, Signal, SignalLog, SignalSink, SubmissionResult,
    TracingSignals, VerificationWorkflow,
};

#[derive(Parser)]
#[command(name = "inventory-verify")]
#[command(about = "Physical inventory verification with photo evidence")]
#[command(long_about = "Records physical counts for each FRC location, stages photo evidence, \
                       and submits either a verification or a discrepancy report after confirmation.")]
struct Cli {
    /// Configuration file (defaults to inventory-verify.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one verification session and submit it
    Run {
        /// Physical count for a location, e.g. --count north-island=10
        #[arg(long = "count", value_name = "LOCATION=VALUE")]
        counts: Vec<String>,
        /// Free-text notes (optional but recommended)
        #[arg(long)]
        notes: Option<String>,
        /// Photo evidence to attach (JPG, PNG or GIF, up to 10MB)
        #[arg(long = "attach", value_name = "PATH")]
        attachments: Vec<PathBuf>,
        /// Action to submit
        #[arg(long, value_enum)]
        action: ActionArg,
        /// Skip the interactive confirmation
        #[arg(long, short = 'y')]
        yes: bool,
        /// Print the submitted snapshot as JSON
        #[arg(long)]
        json: bool,
    },
    /// Write the effective configuration to a file
    WriteConfig {
        #[arg(default_value = "inventory-verify.toml")]
        path: PathBuf,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum ActionArg {
    Verify,
    Discrepancy,
}

impl From<ActionArg> for ActionKind {
    fn from(arg: ActionArg) -> Self {
        match arg {
            ActionArg::Verify => ActionKind::Verify,
            ActionArg::Discrepancy => ActionKind::Discrepancy,
        }
    }
}

/// Prints user-facing signals and keeps a log of them
struct ConsoleSignals {
    log: SignalLog,
}

impl SignalSink for ConsoleSignals {
    fn emit(&self, signal: &Signal) {
        TracingSignals.emit(signal);
        self.log.emit(signal);
        match signal {
            Signal::LocationStatus { location, status } => {
                println!("  {:<18} {}", location.display_name(), status.label());
            }
            Signal::Banner(banner) => println!("== {} ==", banner.message),
            Signal::Notification(n) => println!("[{:?}] {}", n.severity, n.message),
            Signal::Prompt(_) => {}
        }
    }
}

fn parse_count(arg: &str) -> Result<(Location, String)> {
    let (name, value) = arg
        .split_once('=')
        .ok_or_else(|| anyhow!("Expected LOCATION=VALUE, got '{arg}'"))?;
    let location =
        Location::parse(name).ok_or_else(|| anyhow!("Unknown location '{name}'"))?;
    Ok((location, value.to_string()))
}

fn confirm(title: &str, message: &str) -> Result<bool> {
    println!("{title}");
    print!("{message} [y/N] ");
    io::stdout().flush()?;
    let mut answer = String::new();
    io::stdin().lock().read_line(&mut answer)?;
    Ok(matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"))
}

fn load_config(path: Option<&PathBuf>) -> Result<InventoryVerifyConfig> {
    InventoryVerifyConfig::load_env_file()?;
    match path {
        Some(path) => InventoryVerifyConfig::load_from(path),
        None => InventoryVerifyConfig::load(),
    }
}

async fn run_session(
    config: &InventoryVerifyConfig,
    counts: Vec<String>,
    notes: Option<String>,
    attachments: Vec<PathBuf>,
    action: ActionKind,
    yes: bool,
    json: bool,
) -> Result<()> {
    let signals = Arc::new(ConsoleSignals {
        log: SignalLog::new(),
    });
    let mut workflow = VerificationWorkflow::from_config(config, signals);

    for arg in &counts {
        let (location, value) = parse_count(arg)?;
        workflow.set_location_count(location, &value)?;
    }
    if let Some(notes) = notes {
        workflow.set_notes(&notes)?;
    }
    for path in attachments {
        let file = PendingFile::from_path(&path).await?;
        // Rejections are already reported through the notification surface
        let _ = workflow.add_attachment(file);
    }
    let previews = workflow.wait_for_previews().await.len();
    tracing::debug!(previews, "Attachment previews rendered");

    let prompt = workflow.request_action(action)?;
    if !yes && !confirm(&prompt.title, &prompt.message)? {
        workflow.cancel_action();
        println!("Cancelled.");
        return Ok(());
    }

    match workflow.confirm_action().await {
        SubmissionResult::Completed { snapshot, .. } => {
            if json {
                println!("{}", serde_json::to_string_pretty(&snapshot)?);
            }
            Ok(())
        }
        SubmissionResult::Failed { error, .. } => Err(error.into()),
        SubmissionResult::NothingPending => Err(anyhow!("No action was pending confirmation")),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(cli.config.as_ref())?;
    init_telemetry(&config.observability)?;

    let result = match cli.command {
        Commands::Run {
            counts,
            notes,
            attachments,
            action,
            yes,
            json,
        } => run_session(&config, counts, notes, attachments, action.into(), yes, json).await,
        Commands::WriteConfig { path } => {
            config.save_to_file(&path)?;
            println!("Wrote configuration to {}", path.display());
            Ok(())
        }
    };

    shutdown_telemetry();
    result
}
