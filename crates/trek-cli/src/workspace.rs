use std::path::Path;
use trek_filter::FilterEngine;
use trek_store::{SqliteStore, TrekConfig, TrekPaths};

/// Paths for an initialized workspace, or an error pointing at `trek init`.
pub fn require(repo_root: &Path) -> anyhow::Result<TrekPaths> {
    let paths = TrekPaths::discover(repo_root);
    if !paths.is_initialized() {
        anyhow::bail!("No .trek/ workspace found. Run `trek init` first.");
    }
    Ok(paths)
}

pub fn open_store(repo_root: &Path) -> anyhow::Result<SqliteStore> {
    let paths = require(repo_root)?;
    Ok(SqliteStore::open(&paths.db_path)?)
}

/// Engine seeded from `.trek/config.json`, with an optional mode override.
pub fn open_engine(
    repo_root: &Path,
    mode: Option<&str>,
) -> anyhow::Result<FilterEngine<SqliteStore>> {
    let paths = require(repo_root)?;
    let config = TrekConfig::load(&paths.config_json)?;
    let store = SqliteStore::open(&paths.db_path)?;
    let engine = FilterEngine::from_config(store, &config);
    if let Some(mode) = mode {
        engine.set_mode(mode)?;
    }
    Ok(engine)
}

pub fn print_json<T: serde::Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
