use std::path::PathBuf;

/// All well-known paths under `.trek/`.
#[derive(Debug, Clone)]
pub struct TrekPaths {
    pub root: PathBuf,
    pub trek_dir: PathBuf,
    pub db_path: PathBuf,
    pub config_json: PathBuf,
}

impl TrekPaths {
    /// Derive all paths from a repo root. Pure computation, no I/O.
    pub fn discover(repo_root: impl Into<PathBuf>) -> Self {
        let root = repo_root.into();
        let trek_dir = root.join(".trek");
        Self {
            db_path: trek_dir.join("trek.db"),
            config_json: trek_dir.join("config.json"),
            trek_dir,
            root,
        }
    }

    /// Create the `.trek/` directory. Idempotent.
    pub fn ensure_layout(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.trek_dir)
    }

    /// Check whether `.trek/` exists.
    pub fn is_initialized(&self) -> bool {
        self.trek_dir.is_dir()
    }
}
