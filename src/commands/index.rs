//! Index command - recompute embeddings for the catalog

use anyhow::{Context, Result};
use colored::Colorize;
use std::time::Instant;

use catalog_search::config::SearchConfig;
use catalog_search::{SearchApp, SearchError};

/// Run the reindex pipeline locally; no admin secret on the operator CLI
pub async fn run(config: &SearchConfig, item: Option<&str>, json: bool) -> Result<()> {
    let app = SearchApp::start(config).await?;
    let pipeline = &app.state.pipeline;
    let start = Instant::now();

    if let Some(id) = item {
        match pipeline.reindex_one(id).await {
            Ok(()) => {}
            Err(SearchError::NotFound(_)) => {
                if json {
                    println!("{}", serde_json::json!({ "error": "Item not found", "id": id }));
                } else {
                    eprintln!("{} Item not found: {}", "Error:".red().bold(), id);
                }
                std::process::exit(1);
            }
            Err(e) => return Err(e).with_context(|| format!("Failed to reindex item {}", id)),
        }

        if json {
            println!(
                "{}",
                serde_json::json!({
                    "indexed": 1,
                    "id": id,
                    "duration_ms": start.elapsed().as_millis() as u64,
                })
            );
        } else {
            println!("{} Reindexed item {}", "✓".green().bold(), id.cyan());
        }
        return Ok(());
    }

    if !json {
        println!("{} Reindexing catalog...", "→".dimmed());
    }

    let indexed = pipeline
        .reindex_all()
        .await
        .context("Reindex aborted")?;
    let duration_ms = start.elapsed().as_millis() as u64;
    let stats = app.state.vector.stats()?;

    if json {
        println!(
            "{}",
            serde_json::json!({
                "indexed": indexed,
                "vector_entries": stats.entry_count,
                "vector_ready": app.state.vector.is_ready(),
                "duration_ms": duration_ms,
            })
        );
    } else {
        println!();
        println!(
            "{} Indexed {} items in {:.2}s",
            "✓".green().bold(),
            indexed.to_string().cyan(),
            duration_ms as f64 / 1000.0
        );
        if app.state.vector.is_ready() {
            println!(
                "  {} {} entries in vector index",
                "→".dimmed(),
                stats.entry_count
            );
        } else {
            println!(
                "  {} vector index disabled, embeddings stored on the catalog only",
                "!".yellow()
            );
        }
    }

    Ok(())
}
