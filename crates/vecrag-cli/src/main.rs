//! vecrag CLI - Command-line interface
//!
//! Usage:
//!   vecrag init
//!   vecrag upsert <items.jsonl>
//!   vecrag search <query> [--top-k N] [--score-threshold F]
//!
//! Author: hephaex@gmail.com

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use vecrag_core::{AppConfig, Item};
use vecrag_rag::{RetrievalService, DEFAULT_TOP_K};

#[derive(Parser)]
#[command(name = "vecrag")]
#[command(about = "Text ingestion and similarity search over Qdrant")]
#[command(version)]
struct Cli {
    /// TOML config file; environment variables override its values
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the collection if it does not exist
    Init,
    /// Ingest items from a JSON Lines file, one item per line
    Upsert {
        /// Path to the .jsonl file
        path: PathBuf,
    },
    /// Search stored items by similarity
    Search {
        /// Query text
        query: String,
        /// Maximum number of results
        #[arg(long, default_value_t = DEFAULT_TOP_K)]
        top_k: usize,
        /// Minimum similarity score
        #[arg(long)]
        score_threshold: Option<f32>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.logging.level.clone().into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let service = RetrievalService::from_config(&config)?;

    match cli.command {
        Commands::Init => {
            service.init().await?;
            println!("Collection ready: {}", service.collection());
        }
        Commands::Upsert { path } => {
            let items = read_items(&path)?;
            let ids = service.ingest(&items).await?;
            for id in ids {
                println!("{id}");
            }
        }
        Commands::Search {
            query,
            top_k,
            score_threshold,
        } => {
            let results = service.query(&query, top_k, score_threshold).await?;
            println!("{}", serde_json::to_string_pretty(&results)?);
        }
    }

    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<AppConfig> {
    let config = match path {
        Some(path) => AppConfig::from_file(path)?.with_env_override()?,
        None => AppConfig::from_env()?,
    };
    Ok(config)
}

fn read_items(path: &Path) -> Result<Vec<Item>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    parse_items(&content)
}

/// Parse JSON Lines into items; blank lines are skipped
fn parse_items(content: &str) -> Result<Vec<Item>> {
    content
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(i, line)| {
            serde_json::from_str(line).with_context(|| format!("Invalid item on line {}", i + 1))
        })
        .collect()
}
