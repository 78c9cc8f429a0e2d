//! Layered configuration
//!
//! Sources, lowest priority first: built-in defaults, an optional TOML file,
//! then `GM_TICKET__*` environment variables (`GM_TICKET__DATABASE__PATH`).

use crate::error::Result;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Config file read when `--config` is not given
pub const DEFAULT_CONFIG_FILE: &str = "gm-ticket.toml";

const ENV_PREFIX: &str = "GM_TICKET";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// SQLite file holding the `character_ticket` table
    pub path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        let path = ProjectDirs::from("org", "gm-ticket", "gm-ticket").map_or_else(
            || PathBuf::from("gm_tickets.db"),
            |dirs| dirs.data_dir().join("gm_tickets.db"),
        );
        Self { path }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// `tracing_subscriber::EnvFilter` directive
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "warn".to_string(),
        }
    }
}

impl AppConfig {
    /// Loads configuration; a missing file is not an error
    pub fn load(file: Option<&Path>) -> Result<Self> {
        let defaults = Self::default();
        let file = file.unwrap_or_else(|| Path::new(DEFAULT_CONFIG_FILE));

        let settings = config::Config::builder()
            .set_default(
                "database.path",
                defaults.database.path.to_string_lossy().into_owned(),
            )?
            .set_default("logging.filter", defaults.logging.filter)?
            .add_source(config::File::from(file).required(false))
            .add_source(config::Environment::with_prefix(ENV_PREFIX).separator("__"))
            .build()?;

        Ok(settings.try_deserialize()?)
    }
}
