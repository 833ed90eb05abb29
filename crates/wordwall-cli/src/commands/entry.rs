//! Entry command handlers

use std::path::PathBuf;

use anyhow::{bail, Context, Result};

use wordwall_core::{Config, EntryStore, FeedSettings, ItemsClient};

use crate::output::{Output, OutputFormat};

/// Submit a new entry to the wall
pub async fn add(content: String, config_path: Option<&PathBuf>, output: &Output) -> Result<()> {
    let config =
        Config::load_with_cli_override(config_path).context("Failed to load configuration")?;
    let client = items_client(&config)?;

    let entry = client
        .create_entry(&config.collection, &content)
        .await
        .context("Failed to create entry")?;

    match output.format {
        OutputFormat::Human => output.success(&format!("Added entry {}", entry.id)),
        _ => output.print_entry(&entry),
    }
    Ok(())
}

/// List entries in the order the wall shows them
pub async fn list(config_path: Option<&PathBuf>, output: &Output) -> Result<()> {
    let config =
        Config::load_with_cli_override(config_path).context("Failed to load configuration")?;
    let client = items_client(&config)?;

    let entries = client
        .list_entries(&config.collection)
        .await
        .with_context(|| format!("Failed to list entries in '{}'", config.collection))?;

    let mut store = EntryStore::new();
    store.merge(entries);
    output.print_entries(store.get());
    Ok(())
}

fn items_client(config: &Config) -> Result<ItemsClient> {
    let settings = config.feed_settings();
    if let FeedSettings::Unconfigured { missing } = settings {
        bail!(
            "Item store {} not set.\n\
             Set it with: wordwall config set {} <value>  (or WORDWALL_{})",
            missing,
            missing,
            missing.to_uppercase()
        );
    }
    ItemsClient::from_settings(&settings).context("Invalid item store settings")
}
