//! Status command - catalog size and vector index health

use anyhow::Result;
use colored::Colorize;

use catalog_search::config::SearchConfig;
use catalog_search::{SearchApp, VectorIndexStatus};

pub async fn run(config: &SearchConfig, json: bool) -> Result<()> {
    let app = SearchApp::start(config).await?;
    let items = app.catalog.count()?;
    let embedded = app.catalog.embedded_count()?;
    let status = app.state.vector.status();
    let stats = app.state.vector.stats()?;
    let last_indexed = stats.last_indexed.and_then(format_ts);
    let last_hydrate = stats.last_hydrate.and_then(format_ts);

    if json {
        println!(
            "{}",
            serde_json::json!({
                "catalog": config.database_path.display().to_string(),
                "items": items,
                "embedded_items": embedded,
                "vector_index": status,
                "vector_entries": stats.entry_count,
                "last_indexed": last_indexed,
                "last_hydrate": last_hydrate,
                "remote_embedding": config.embedding.remote_endpoint(),
            })
        );
        return Ok(());
    }

    println!("{}", "Catalog Search Status".bold());
    println!();
    println!(
        "  {} {} items in {}",
        "→".dimmed(),
        items.to_string().cyan(),
        config.database_path.display()
    );
    println!(
        "  {} {} items with embeddings",
        "→".dimmed(),
        embedded.to_string().cyan()
    );

    match status {
        VectorIndexStatus::Ready { backend } => {
            println!(
                "  {} Vector index: {} ({}, {} entries)",
                "✓".green(),
                "ready".green(),
                backend.as_str(),
                stats.entry_count
            );
        }
        VectorIndexStatus::Disabled { reason } => {
            println!(
                "  {} Vector index: {} ({})",
                "!".yellow(),
                "disabled".yellow(),
                reason
            );
        }
    }

    if let Some(dt) = last_indexed {
        println!("  {} Last indexed: {}", "→".dimmed(), dt);
    }
    if let Some(dt) = last_hydrate {
        println!("  {} Loaded from catalog: {}", "→".dimmed(), dt);
    }

    match config.embedding.remote_endpoint() {
        Some(endpoint) => println!("  {} Embeddings: {}", "→".dimmed(), endpoint),
        None => println!("  {} Embeddings: {}", "→".dimmed(), "offline fallback".dimmed()),
    }

    if embedded < items {
        println!();
        println!(
            "{} {} items have no embedding. Run {}",
            "!".yellow().bold(),
            items - embedded,
            "catalog-search index".cyan()
        );
    }

    Ok(())
}

fn format_ts(ts: i64) -> Option<String> {
    chrono::DateTime::from_timestamp(ts, 0).map(|d| d.format("%Y-%m-%d %H:%M:%S").to_string())
}
