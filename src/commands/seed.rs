//! Seed command - load catalog items from a file

use anyhow::{Context, Result};
use colored::Colorize;
use std::fs;
use std::path::Path;

use catalog_search::config::SearchConfig;
use catalog_search::{CatalogItem, SearchApp};

pub fn run(config: &SearchConfig, file: &Path) -> Result<()> {
    let items = read_items(file)?;

    let catalog = SearchApp::open_catalog(config)?;
    for item in &items {
        catalog
            .upsert(item)
            .with_context(|| format!("Failed to store item {}", item.id))?;
    }

    println!(
        "{} Seeded {} items into {}",
        "✓".green().bold(),
        items.len().to_string().cyan(),
        config.database_path.display()
    );
    println!(
        "  {} Run {} to compute embeddings",
        "→".dimmed(),
        "catalog-search index".cyan()
    );
    Ok(())
}

/// YAML or JSON list of items (JSON parses as YAML)
fn read_items(file: &Path) -> Result<Vec<CatalogItem>> {
    let raw = fs::read_to_string(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let items: Vec<CatalogItem> = serde_yaml::from_str(&raw)
        .with_context(|| format!("Failed to parse items from {}", file.display()))?;

    if let Some(item) = items.iter().find(|i| i.id.trim().is_empty()) {
        anyhow::bail!("Item '{}' has an empty id", item.name);
    }
    Ok(items)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_yaml_items() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("items.yaml");
        fs::write(
            &path,
            "- id: \"1\"\n  name: Emerald Pendant\n  materials: [emerald, silver]\n  artisan: Ana\n- id: \"2\"\n  name: Gold Ring\n  price: 120.5\n",
        )
        .unwrap();

        let items = read_items(&path).unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].materials, vec!["emerald", "silver"]);
        assert_eq!(items[1].price, Some(120.5));
        assert!(items[1].embedding.is_none());
    }

    #[test]
    fn test_read_json_items() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("items.json");
        fs::write(
            &path,
            r#"[{"id": "3", "name": "Silver Necklace", "imageUrl": "/img/3.png"}]"#,
        )
        .unwrap();

        let items = read_items(&path).unwrap();
        assert_eq!(items[0].image_url.as_deref(), Some("/img/3.png"));
    }

    #[test]
    fn test_rejects_empty_id() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("items.yaml");
        fs::write(&path, "- id: \"\"\n  name: Nameless\n").unwrap();
        assert!(read_items(&path).is_err());
    }
}
