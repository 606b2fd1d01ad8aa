use std::path::Path;
use trek_store::config::{read_config_map, write_config_map, CAPABILITY_FILTERING_KEY};
use trek_store::{SqliteStore, TrekPaths};

pub fn execute(repo_root: &Path) -> anyhow::Result<()> {
    let paths = TrekPaths::discover(repo_root);
    let already = paths.is_initialized();

    paths.ensure_layout()?;
    // Schema creation is idempotent, so re-running init repairs a partial layout.
    SqliteStore::open_or_create(&paths.db_path)?;

    let mut config = read_config_map(&paths.config_json)?;
    if !config.contains_key(CAPABILITY_FILTERING_KEY) {
        config.insert(
            CAPABILITY_FILTERING_KEY.to_string(),
            serde_json::Value::Bool(false),
        );
        write_config_map(&paths.config_json, &config)?;
    }

    if already {
        println!("Already initialized at {}", paths.trek_dir.display());
    } else {
        println!("Initialized .trek/ (capability filtering off)");
        println!("  enable with: trek config set {CAPABILITY_FILTERING_KEY} true");
    }
    Ok(())
}
