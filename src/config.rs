use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::storage::{Database, MySqlDb, MySqlSettings, SqliteDb};

/// The closed set of selectable storage backends.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    #[default]
    Sqlite,
    Mysql,
}

impl BackendKind {
    /// Parse a configuration identifier; `None` for anything outside the
    /// closed set.
    pub fn parse(name: &str) -> Option<BackendKind> {
        match name.to_lowercase().as_str() {
            "sqlite" => Some(BackendKind::Sqlite),
            "mysql" => Some(BackendKind::Mysql),
            _ => None,
        }
    }

    pub fn config_name(self) -> &'static str {
        match self {
            BackendKind::Sqlite => "sqlite",
            BackendKind::Mysql => "mysql",
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.config_name())
    }
}

/// Storage backend configuration
///
/// Both engine sections may be present at the same time; `backend` selects
/// which one is active. Hotswap rewrites only the selector.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default)]
    pub backend: BackendKind,

    /// Path to the SQLite database file
    #[serde(default = "default_sqlite_file")]
    pub sqlite_file: PathBuf,

    #[serde(default)]
    pub mysql: Option<MySqlSettings>,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        DatabaseConfig {
            backend: BackendKind::Sqlite,
            sqlite_file: default_sqlite_file(),
            mysql: None,
        }
    }
}

fn default_sqlite_file() -> PathBuf {
    PathBuf::from("./analytics.db")
}

impl DatabaseConfig {
    /// Construct an unopened backend instance of the given kind from this
    /// configuration.
    pub fn build_backend(&self, kind: BackendKind) -> anyhow::Result<Arc<dyn Database>> {
        match kind {
            BackendKind::Sqlite => Ok(Arc::new(SqliteDb::new(&self.sqlite_file))),
            BackendKind::Mysql => {
                let settings = self
                    .mysql
                    .clone()
                    .context("mysql backend selected but no mysql section configured")?;
                Ok(Arc::new(MySqlDb::new(settings)))
            }
        }
    }

    /// Construct the currently selected backend.
    pub fn active_backend(&self) -> anyhow::Result<Arc<dyn Database>> {
        self.build_backend(self.backend)
    }
}

/// Cadence of the performance sampler.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SamplingConfig {
    #[serde(default = "default_sample_interval")]
    pub interval_secs: u64,

    /// How often retention pruning runs.
    #[serde(default = "default_cleanup_interval")]
    pub cleanup_interval_secs: u64,
}

impl Default for SamplingConfig {
    fn default() -> Self {
        SamplingConfig {
            interval_secs: default_sample_interval(),
            cleanup_interval_secs: default_cleanup_interval(),
        }
    }
}

fn default_sample_interval() -> u64 {
    60
}

fn default_cleanup_interval() -> u64 {
    60 * 60
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub database: DatabaseConfig,

    #[serde(default)]
    pub sampling: SamplingConfig,
}

pub fn read_config_file(path: &std::path::Path) -> anyhow::Result<Config> {
    let file_content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read configuration file {}", path.display()))?;
    serde_json::from_str(&file_content)
        .map_err(|_| anyhow::anyhow!("Invalid configuration file provided!"))
        .inspect(|config| trace!("loaded config: {config:?}"))
}

/// Persist the configuration. Called after a hotswap validated and migrated
/// to the new backend, never before.
pub fn write_config_file(path: &std::path::Path, config: &Config) -> anyhow::Result<()> {
    let content = serde_json::to_string_pretty(config)?;
    std::fs::write(path, content)
        .with_context(|| format!("failed to write configuration file {}", path.display()))
}
