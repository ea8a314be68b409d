//! Shelfsync CLI - sync a novel source tree into a cache and index.
//!
//! Reads everything from the config file; takes no arguments.

use anyhow::Context;
use shelfsync::config::Config;
use shelfsync::console::Console;
use shelfsync::error::Result;
use shelfsync::library::LibraryManager;

#[tokio::main]
async fn main() -> Result<()> {
    shelfsync::logging::init()?;
    let console = Console::new();

    console.section("Shelfsync - Novel Library Sync");

    let config = Config::load().context("Failed to load configuration")?;
    config.validate().context("Invalid configuration")?;
    let store = config.library_store();
    let manager = LibraryManager::from_config(&config);
    console.info(&format!("Source: {}", manager.source_dir().display()));
    console.info(&format!("Cache: {}", store.cache_path().display()));
    console.info(&format!("Index: {}", store.index_path().display()));

    let outcome = manager
        .sync(&store)
        .await
        .context("Library sync failed")?;

    console.report(&outcome);

    if !outcome.is_persisted() {
        anyhow::bail!("Library state was not fully saved");
    }

    console.success(&format!(
        "{} novels need page rebuilds",
        outcome.changed_novels().count()
    ));
    Ok(())
}
