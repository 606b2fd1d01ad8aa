use clap::Subcommand;
use std::path::Path;
use trek_store::config::{parse_value, read_config_map, write_config_map, CAPABILITY_FILTERING_KEY};

use crate::workspace::require;

// ── CLI Schema ──

#[derive(Subcommand)]
pub enum ConfigCmd {
    /// Set a config value
    Set {
        /// Config key (e.g. capability_filtering)
        key: String,
        /// Config value (true/false/number/string)
        value: String,
    },
    /// Get a config value
    Get {
        /// Config key
        key: String,
    },
    /// List all config values
    List,
}

// ── Dispatch ──

pub fn run(cmd: ConfigCmd, repo_root: &Path) -> anyhow::Result<()> {
    match cmd {
        ConfigCmd::Set { key, value } => set(repo_root, &key, &value),
        ConfigCmd::Get { key } => get(repo_root, &key),
        ConfigCmd::List => list(repo_root),
    }
}

// ── Command Implementations ──

/// `trek config set <key> <value>`
pub fn set(repo_root: &Path, key: &str, value: &str) -> anyhow::Result<()> {
    let paths = require(repo_root)?;
    let parsed = parse_value(value);
    if key == CAPABILITY_FILTERING_KEY && !parsed.is_boolean() {
        anyhow::bail!("{CAPABILITY_FILTERING_KEY} must be true or false, got {value:?}");
    }
    let mut config = read_config_map(&paths.config_json)?;
    config.insert(key.to_string(), parsed);
    write_config_map(&paths.config_json, &config)?;
    println!("{key} = {value}");
    Ok(())
}

/// `trek config get <key>`
pub fn get(repo_root: &Path, key: &str) -> anyhow::Result<()> {
    let paths = require(repo_root)?;
    let config = read_config_map(&paths.config_json)?;
    match config.get(key) {
        Some(val) => println!("{val}"),
        None => println!("(not set)"),
    }
    Ok(())
}

/// `trek config list`
pub fn list(repo_root: &Path) -> anyhow::Result<()> {
    let paths = require(repo_root)?;
    let config = read_config_map(&paths.config_json)?;
    if config.is_empty() {
        println!("(no config set)");
    } else {
        for (k, v) in &config {
            println!("{k} = {v}");
        }
    }
    Ok(())
}
