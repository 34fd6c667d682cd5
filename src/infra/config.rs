// src/infra/config.rs — Configuration loading (TOML + environment)

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::core::engine::{MAX_ITERS, MIN_ITERS};
use crate::infra::errors::SpecError;
use crate::infra::paths;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub database: DatabaseConfig,

    #[serde(default)]
    pub engine: EngineConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Debug mode allows any CORS origin.
    pub debug: bool,
    #[serde(default = "default_cors_origins")]
    pub cors_origins: Vec<String>,
    /// When set, every route except /health requires this bearer token.
    #[serde(default)]
    pub api_token: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 8000,
            debug: true,
            cors_origins: default_cors_origins(),
            api_token: None,
        }
    }
}

fn default_cors_origins() -> Vec<String> {
    vec![
        "http://localhost:3000".into(),
        "http://127.0.0.1:3000".into(),
        "http://localhost:8080".into(),
    ]
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// SQLite file. Defaults to the data directory when unset.
    #[serde(default)]
    pub path: Option<PathBuf>,
}

impl DatabaseConfig {
    pub fn resolved_path(&self) -> PathBuf {
        self.path.clone().unwrap_or_else(paths::db_path)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    pub default_max_iters: u32,
    pub max_prompt_chars: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_max_iters: 2,
            max_prompt_chars: 2000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
        }
    }
}

impl Config {
    /// Load config from the default location, falling back to defaults, then
    /// apply environment overrides.
    pub fn load() -> anyhow::Result<Self> {
        let path = paths::config_file_path();
        let mut config = if path.exists() {
            Self::load_from(&path)?
        } else {
            Self::default()
        };
        config.apply_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Apply `PROMPTSPEC_*` overrides using the given variable lookup.
    pub fn apply_overrides(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), SpecError> {
        if let Some(db) = lookup("PROMPTSPEC_DATABASE") {
            self.database.path = Some(PathBuf::from(db));
        }
        if let Some(port) = lookup("PROMPTSPEC_PORT") {
            self.server.port = port
                .parse()
                .map_err(|_| SpecError::Config(format!("PROMPTSPEC_PORT is not a port: {port}")))?;
        }
        if let Some(debug) = lookup("PROMPTSPEC_DEBUG") {
            self.server.debug = matches!(debug.to_lowercase().as_str(), "1" | "true" | "yes");
        }
        if let Some(token) = lookup("PROMPTSPEC_API_TOKEN") {
            self.server.api_token = Some(token).filter(|t| !t.is_empty());
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), SpecError> {
        let iters = self.engine.default_max_iters;
        if !(MIN_ITERS..=MAX_ITERS).contains(&iters) {
            return Err(SpecError::Config(format!(
                "engine.default_max_iters must be between {MIN_ITERS} and {MAX_ITERS}, got {iters}"
            )));
        }
        if self.engine.max_prompt_chars == 0 {
            return Err(SpecError::Config(
                "engine.max_prompt_chars must be positive".into(),
            ));
        }
        Ok(())
    }
}
