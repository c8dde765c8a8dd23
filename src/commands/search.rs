//! Search command - query the local catalog

use anyhow::Result;
use colored::Colorize;

use catalog_search::config::SearchConfig;
use catalog_search::{CatalogItem, Provenance, SearchApp, SearchHit};

use crate::SearchMode;

pub async fn run(
    config: &SearchConfig,
    query: &str,
    mode: SearchMode,
    limit: Option<usize>,
    json: bool,
) -> Result<()> {
    let query = query.trim();
    anyhow::ensure!(!query.is_empty(), "Query must not be empty");

    let app = SearchApp::start(config).await?;
    let state = &app.state;
    let limit = limit
        .unwrap_or(state.limits.default_limit)
        .min(state.limits.max_limit);

    let hits = match mode {
        SearchMode::Hybrid => state.hybrid.search(query, limit).await,
        SearchMode::Vector => state.vector.query(query, limit).await?,
        SearchMode::Text => state.keyword.query(query, limit).await?,
    };

    let mut results = Vec::with_capacity(hits.len());
    for hit in hits {
        let item = app.catalog.get(&hit.item_id)?;
        results.push((hit, item));
    }

    if json {
        let json_results: Vec<_> = results
            .iter()
            .map(|(hit, item)| {
                serde_json::json!({
                    "itemId": hit.item_id,
                    "score": hit.score,
                    "source": hit.source,
                    "name": item.as_ref().map(|i| i.name.as_str()),
                    "artisan": item.as_ref().map(|i| i.artisan.as_str()),
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&json_results)?);
        return Ok(());
    }

    if results.is_empty() {
        println!("{} No results found for: {}", "→".dimmed(), query.cyan());
        return Ok(());
    }

    if matches!(mode, SearchMode::Vector) && !state.vector.is_ready() {
        println!(
            "{} Vector index disabled, showing keyword matches",
            "!".yellow()
        );
        println!();
    }

    println!(
        "{} {} results for: {}",
        "→".dimmed(),
        results.len(),
        query.cyan()
    );
    println!();

    for (i, (hit, item)) in results.iter().enumerate() {
        print_result(i + 1, hit, item.as_ref());
    }

    Ok(())
}

fn print_result(rank: usize, hit: &SearchHit, item: Option<&CatalogItem>) {
    let score_str = format!("{:.2}", hit.score);
    let score_colored = match hit.source {
        Provenance::Text => score_str.green(),
        Provenance::Vector if hit.score > 0.6 => score_str.yellow(),
        Provenance::Vector => score_str.dimmed(),
    };

    let name = item.map(|i| i.name.as_str()).unwrap_or("(missing item)");
    println!(
        "{}. [{} {}] {}",
        rank.to_string().bold(),
        hit.source.as_str().dimmed(),
        score_colored,
        name.cyan()
    );

    if let Some(item) = item {
        if !item.description.is_empty() {
            let description = if item.description.chars().count() > 100 {
                format!("{}...", item.description.chars().take(100).collect::<String>())
            } else {
                item.description.clone()
            };
            println!("   {}", description.dimmed());
        }
        if !item.artisan.is_empty() {
            println!("   by {}", item.artisan);
        }
    }
    println!();
}
