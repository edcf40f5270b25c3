mod commands;

use clap::{Parser, Subcommand};
use signalsift_core::SourceKind;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "signalsift")]
#[command(about = "SignalSift keyword relevance and classification engine")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// List keyword matches in a piece of text
    Match {
        text: String,
    },
    /// Classify a piece of text
    Classify {
        text: String,
    },
    /// Match, classify, and score a content item read from a JSON file
    Score {
        /// Source platform: reddit, youtube, or hackernews
        #[arg(long)]
        kind: SourceKind,

        /// Source tier, 1 (highest) to 3
        #[arg(long, default_value_t = 2, value_parser = clap::value_parser!(u8).range(1..=3))]
        tier: u8,

        /// Path to the item JSON, or `-` for stdin
        item: String,
    },
    /// Show semantic expansions for one keyword
    Expand {
        keyword: String,

        #[arg(long)]
        category: String,

        #[arg(long, default_value_t = 1.0)]
        weight: f64,
    },
    /// Load or build the vocabulary index and print its shape
    Index,
    /// Manage on-disk caches
    Cache {
        #[command(subcommand)]
        command: CacheCommands,
    },
}

#[derive(Debug, Subcommand)]
enum CacheCommands {
    /// Delete the expansion cache and the persisted vocabulary index
    Clear,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    dotenvy::dotenv().ok();
    let config = signalsift_core::load_engine_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Match { text } => commands::run_match(&config, &text),
        Commands::Classify { text } => commands::run_classify(&config, &text),
        Commands::Score { kind, tier, item } => commands::run_score(&config, kind, tier, &item),
        Commands::Expand {
            keyword,
            category,
            weight,
        } => commands::run_expand(&config, &keyword, &category, weight),
        Commands::Index => commands::run_index(&config),
        Commands::Cache {
            command: CacheCommands::Clear,
        } => commands::run_cache_clear(&config),
    }
}
