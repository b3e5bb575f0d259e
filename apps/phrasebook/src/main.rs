mod config;
mod errors;
mod harvest;
mod inputs;
mod knowledge;
mod library;
mod llm_client;
mod mining;
mod models;
mod schema;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::errors::PipelineError;

/// Survey phrase library pipeline. Run the stages in order:
/// setup, harvest, build-kb, mine.
#[derive(Debug, Parser)]
#[command(name = "phrasebook", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Create the blank phrase library spreadsheet
    Setup,
    /// Import legacy standard-phrase Word documents
    Harvest,
    /// Build the knowledge bank from reference documents
    BuildKb,
    /// Mine PDF reports with the classification service
    Mine,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Phrasebook v{}", env!("CARGO_PKG_VERSION"));

    let outcome = match cli.command {
        Command::Setup => library::setup::run(&config),
        Command::Harvest => harvest::run(&config).map(|summary| {
            info!(
                documents = summary.documents,
                skipped = summary.skipped_documents,
                phrases = summary.phrases,
                too_short = summary.too_short,
                "Harvest complete"
            );
        }),
        Command::BuildKb => knowledge::run(&config).map(|bank| {
            info!(documents = bank.len(), "Knowledge bank complete");
        }),
        Command::Mine => mining::run(&config).await.map(|summary| {
            info!(
                reports = summary.reports,
                skipped = summary.skipped_reports,
                phrases = summary.phrases,
                too_short = summary.too_short,
                domain_violations = summary.violations,
                "Mining complete"
            );
        }),
    };

    if let Err(e) = outcome {
        report_failure(&e);
        std::process::exit(1);
    }
    Ok(())
}

fn report_failure(e: &PipelineError) {
    if e.is_precondition() {
        error!("Cannot start: {e}");
    } else {
        error!("Stage failed: {e}");
    }
    if let Some(remedy) = e.remedy() {
        error!("{remedy}");
    }
}
