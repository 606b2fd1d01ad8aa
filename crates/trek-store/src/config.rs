//! Workspace configuration in `.trek/config.json`.
//!
//! The engines only consume [`TrekConfig`]; the map-level helpers exist for
//! `trek config` so keys this build does not know about survive a rewrite.

use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::Path;

use crate::error::StoreError;

/// Config key for the persisted capability-filtering flag.
pub const CAPABILITY_FILTERING_KEY: &str = "capability_filtering";

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct TrekConfig {
    /// Seeds the filter policy's `enabled` flag at process start.
    #[serde(default)]
    pub capability_filtering: bool,
}

impl TrekConfig {
    /// Load config, returning defaults if the file does not exist.
    pub fn load(path: &Path) -> Result<Self, StoreError> {
        let map = read_config_map(path)?;
        serde_json::from_value(serde_json::Value::Object(map))
            .map_err(|e| StoreError::Config(format!("{}: {e}", path.display())))
    }
}

/// Read the raw config object. Missing file or a non-object document yields an empty map.
pub fn read_config_map(
    path: &Path,
) -> Result<serde_json::Map<String, serde_json::Value>, StoreError> {
    if !path.exists() {
        return Ok(serde_json::Map::new());
    }
    let content = std::fs::read_to_string(path)?;
    let val: serde_json::Value = serde_json::from_str(&content)
        .map_err(|e| StoreError::Config(format!("{}: {e}", path.display())))?;
    match val {
        serde_json::Value::Object(map) => Ok(map),
        _ => Ok(serde_json::Map::new()),
    }
}

/// Write the config object atomically (temp file in the same dir, then rename).
pub fn write_config_map(
    path: &Path,
    config: &serde_json::Map<String, serde_json::Value>,
) -> Result<(), StoreError> {
    let json = serde_json::to_string_pretty(config)
        .map_err(|e| StoreError::Config(e.to_string()))?;
    let parent = path
        .parent()
        .ok_or_else(|| StoreError::Config(format!("no parent dir for {}", path.display())))?;
    std::fs::create_dir_all(parent)?;
    let mut tmp = tempfile::NamedTempFile::new_in(parent)?;
    tmp.write_all(json.as_bytes())?;
    tmp.flush()?;
    tmp.persist(path).map_err(|e| StoreError::Io(e.error))?;
    Ok(())
}

/// Parse a CLI string into a JSON value (bool, number, or string).
pub fn parse_value(s: &str) -> serde_json::Value {
    match s {
        "true" => serde_json::Value::Bool(true),
        "false" => serde_json::Value::Bool(false),
        _ => {
            if let Ok(n) = s.parse::<i64>() {
                serde_json::Value::Number(n.into())
            } else if let Ok(f) = s.parse::<f64>() {
                serde_json::json!(f)
            } else {
                serde_json::Value::String(s.to_string())
            }
        }
    }
}
