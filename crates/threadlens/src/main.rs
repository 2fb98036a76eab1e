//! threadlens daemon - extracts email-thread pages and analyzes them with an LLM

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use threadlens::analyzer::Analyzer;
use threadlens::cache::AnalysisCache;
use threadlens::config::{Config, load_config};
use threadlens::error::Result;
use threadlens::extractor::DomSnapshot;
use threadlens::server::Server;
use threadlens::ThreadlensError;

/// threadlens - local daemon that extracts email threads and analyzes them with an LLM
#[derive(Parser)]
#[command(name = "threadlens")]
#[command(about = "Local daemon that extracts email threads and analyzes them with an LLM")]
#[command(version)]
pub struct Cli {
    /// Path to config file
    #[arg(long, short = 'c', global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Start the analysis daemon (default command)
    Serve,
    /// Analyze a saved thread page and print the result
    Analyze {
        /// Path to a saved HTML file
        file: PathBuf,
        /// Address the page was captured from; participates in thread identity
        #[arg(long, default_value = "file:///saved-thread.html")]
        url: String,
    },
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    init_logging();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        None | Some(Command::Serve) => serve(config).await,
        Some(Command::Analyze { file, url }) => analyze_file(config, &file, &url).await,
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,threadlens=debug"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

async fn serve(config: Config) -> Result<()> {
    tracing::info!("Starting threadlens daemon");
    Server::new(config).serve().await
}

/// One-shot mode: extract a saved page, analyze it with the configured
/// credential, and print the analysis as JSON.
async fn analyze_file(config: Config, file: &PathBuf, url: &str) -> Result<()> {
    let settings = config.credentials.resolve()?;
    let html = std::fs::read_to_string(file)?;

    let (thread_id, messages) = {
        let snapshot = DomSnapshot::parse(&html, url);
        (snapshot.thread_id(), snapshot.messages())
    };

    let thread_id = thread_id.ok_or_else(|| {
        ThreadlensError::Extraction("No conversation detected in page".to_string())
    })?;
    tracing::info!(
        "Extracted {} messages from thread {thread_id}",
        messages.len()
    );

    let cache = Arc::new(AnalysisCache::new(config.cache.capacity));
    let analyzer = Analyzer::new(&config.server, config.endpoints.clone(), cache)?;
    let analysis = analyzer
        .analyze_thread(&thread_id, &messages, &settings)
        .await?;

    let rendered = serde_json::to_string_pretty(&analysis)
        .map_err(|e| ThreadlensError::Serialization(e.to_string()))?;
    println!("{rendered}");

    Ok(())
}
