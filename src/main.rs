mod console;
mod render;

use anyhow::{Context, Result};
use clap::Parser;
use nlcal_core::{Config, DateTimeResolver, InteractionLoop, SchedulingPipeline};
use nlcal_google::GoogleCalendar;
use nlcal_llm::HuggingFaceExtractor;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use console::TerminalConsole;

#[derive(Parser)]
#[command(name = "nlcal")]
#[command(version)]
#[command(about = "Schedule Google Calendar events by describing them in plain English")]
struct Cli {}

#[tokio::main]
async fn main() -> Result<()> {
    let _cli = Cli::parse();

    // Real environment variables take precedence over .env
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = Config::from_env();
    debug!(?config, "Configuration loaded");

    println!("Initializing nlcal...");

    let calendar = GoogleCalendar::connect(&config)
        .await
        .context("Failed to authenticate with Google Calendar. Please check your credentials")?;

    let extractor = HuggingFaceExtractor::new(&config)
        .context("Failed to initialize the language model client. Please check LLM_MODEL and LLM_ENDPOINT")?;

    let resolver = DateTimeResolver::with_local_timezone();
    debug!(timezone = ?resolver.timezone(), "Resolving dates");

    let console = TerminalConsole::new().context("Failed to open the terminal")?;

    let pipeline = SchedulingPipeline::new(extractor, calendar, resolver);
    InteractionLoop::new(pipeline, console).run().await;

    Ok(())
}
