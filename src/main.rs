mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use catalog_search::SearchConfig;

#[derive(Parser)]
#[command(name = "catalog-search")]
#[command(about = "Hybrid keyword and vector search for the artifact catalog", long_about = None)]
#[command(version)]
struct Cli {
    #[arg(short, long, global = true, default_value = "catalog-search.yaml", help = "Config file")]
    config: PathBuf,

    #[arg(short, long, global = true, help = "Debug logging")]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum SearchMode {
    Hybrid,
    Vector,
    Text,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP API
    Serve {
        #[arg(long, help = "Listen address (overrides server.bind)")]
        bind: Option<String>,
    },
    /// Load catalog items from a YAML or JSON file
    Seed { file: PathBuf },
    /// Recompute item embeddings
    Index {
        #[arg(long, help = "Reindex a single item")]
        item: Option<String>,
        #[arg(long, help = "JSON output")]
        json: bool,
    },
    /// Run a search against the local catalog
    Search {
        query: String,
        #[arg(long, short, value_enum, default_value = "hybrid")]
        mode: SearchMode,
        #[arg(long, short, help = "Limit results")]
        limit: Option<usize>,
        #[arg(long, help = "JSON output")]
        json: bool,
    },
    /// Show catalog and vector index status
    Status {
        #[arg(long, help = "JSON output")]
        json: bool,
    },
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = SearchConfig::load(&cli.config)?;

    match cli.command {
        Commands::Serve { bind } => commands::serve::run(config, bind).await,
        Commands::Seed { file } => commands::seed::run(&config, &file),
        Commands::Index { item, json } => commands::index::run(&config, item.as_deref(), json).await,
        Commands::Search {
            query,
            mode,
            limit,
            json,
        } => commands::search::run(&config, &query, mode, limit, json).await,
        Commands::Status { json } => commands::status::run(&config, json).await,
    }
}
