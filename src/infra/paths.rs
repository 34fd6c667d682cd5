// src/infra/paths.rs — Config and data locations
//
// PROMPTSPEC_HOME overrides everything: config lives directly under it and
// data under $PROMPTSPEC_HOME/data. Otherwise config uses ~/.promptspec/ and
// data uses the platform data directory.

use directories::{BaseDirs, ProjectDirs};
use std::path::PathBuf;

fn promptspec_home() -> Option<PathBuf> {
    std::env::var_os("PROMPTSPEC_HOME").map(PathBuf::from)
}

/// Home directory, or the current directory when none can be determined.
pub fn dirs_home() -> PathBuf {
    BaseDirs::new()
        .map(|b| b.home_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Configuration directory: $PROMPTSPEC_HOME/ or ~/.promptspec/
pub fn config_dir() -> PathBuf {
    if let Some(home) = promptspec_home() {
        return home;
    }
    dirs_home().join(".promptspec")
}

/// Data directory: $PROMPTSPEC_HOME/data/ or the platform data dir.
pub fn data_dir() -> PathBuf {
    if let Some(home) = promptspec_home() {
        return home.join("data");
    }
    ProjectDirs::from("", "", "promptspec")
        .map(|p| p.data_local_dir().to_path_buf())
        .unwrap_or_else(|| config_dir().join("data"))
}

pub fn config_file_path() -> PathBuf {
    config_dir().join("config.toml")
}

/// Default database path.
pub fn db_path() -> PathBuf {
    data_dir().join("promptspec.db")
}

/// Create the parent directory of `path` if needed.
pub fn ensure_parent(path: &std::path::Path) -> std::io::Result<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => std::fs::create_dir_all(parent),
        _ => Ok(()),
    }
}
