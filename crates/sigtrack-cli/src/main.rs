mod signals;
mod tools;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use serde::Serialize;
use sigtrack_core::{Sentiment, SignalType};
use tracing_subscriber::EnvFilter;

use crate::tools::ToolsCommands;

#[derive(Debug, Parser)]
#[command(name = "sigtrack")]
#[command(about = "Record interaction signals, check aggregates, and escalate patterns")]
struct Cli {
    /// Override the data directory (defaults to `SIGTRACK_DATA_DIR` or `data`)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Record one interaction signal
    Record {
        /// High-level user intent (e.g., `product_search`, complaint)
        #[arg(long)]
        intent: String,
        /// Primary subject of the interaction
        #[arg(long)]
        entity: String,
        /// The request was fully resolved
        #[arg(long)]
        resolved: bool,
        /// Confidence in the response quality, 0.0 to 1.0
        #[arg(long)]
        confidence: f64,
        /// positive, neutral, frustrated, or angry
        #[arg(long)]
        sentiment: Sentiment,
    },
    /// Aggregate signals for an entity over a time window
    Check {
        #[arg(long)]
        entity: String,
        /// Hours to look back
        #[arg(long, default_value_t = sigtrack_store::aggregate::DEFAULT_WINDOW_HOURS)]
        window_hours: f64,
    },
    /// Escalate a signal to the configured webhook
    Escalate {
        /// demand, confusion, risk, or memory
        #[arg(long)]
        signal_type: SignalType,
        #[arg(long)]
        summary: String,
        /// One observation; repeat for more
        #[arg(long)]
        evidence: Vec<String>,
        #[arg(long)]
        recommendation: Option<String>,
    },
    /// Print escalations logged locally instead of delivered
    Escalations,
    /// Inspect or invoke the host-facing tools
    Tools {
        #[command(subcommand)]
        command: ToolsCommands,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = sigtrack_core::load_app_config()?;
    if let Some(dir) = cli.data_dir {
        config.data_dir = dir;
    }

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    tracing::debug!(?config, "loaded configuration");

    match cli.command {
        Commands::Record {
            intent,
            entity,
            resolved,
            confidence,
            sentiment,
        } => {
            signals::run_record(&config, &intent, &entity, resolved, confidence, sentiment).await?;
        }
        Commands::Check {
            entity,
            window_hours,
        } => signals::run_check(&config, &entity, window_hours).await?,
        Commands::Escalate {
            signal_type,
            summary,
            evidence,
            recommendation,
        } => {
            signals::run_escalate(&config, signal_type, summary, evidence, recommendation).await?;
        }
        Commands::Escalations => signals::run_escalations(&config).await?,
        Commands::Tools { command } => tools::run(&config, command).await?,
    }

    Ok(())
}

/// Write `value` to stdout as pretty JSON.
pub(crate) fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
