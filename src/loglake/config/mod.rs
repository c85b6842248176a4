//! Pipeline configuration.
//!
//! Loaded from a YAML file and validated at construction, so the pipeline
//! and SQL builders can assume a well-formed shape: unique source names, a
//! join graph that only references configured sources, non-empty ordering
//! keys. Database connection settings can be overridden from the
//! environment (`LOGLAKE_DB_*`) for deployments that keep credentials out of
//! the config file.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use log::warn;
use serde::{Deserialize, Serialize};

use crate::loglake::ingest::LogSource;
use crate::loglake::normalize::ExplodeRule;
use crate::loglake::sql::{JoinEdge, DEFAULT_REFRESH_MINUTES};

#[derive(Debug)]
pub enum ConfigError {
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    Parse(serde_yaml::Error),

    NoSources,

    DuplicateSource { name: String },

    EmptyOrderingKey { source: String },

    UnknownViewTable { table: String },
}

// Hand-written in place of `#[derive(thiserror::Error)]`: the `EmptyOrderingKey`
// variant has a field named `source` (the log source name, not an error source),
// which thiserror's convention would force to implement `std::error::Error`.
// These impls reproduce the same Display strings and `source()` behavior.
impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io { path, source } => {
                write!(f, "failed to read config file '{}': {source}", path.display())
            }
            ConfigError::Parse(e) => write!(f, "failed to parse config: {e}"),
            ConfigError::NoSources => write!(f, "configuration defines no log sources"),
            ConfigError::DuplicateSource { name } => {
                write!(f, "log source '{name}' is configured more than once")
            }
            ConfigError::EmptyOrderingKey { source } => {
                write!(f, "log source '{source}' has an empty ordering key")
            }
            ConfigError::UnknownViewTable { table } => {
                write!(f, "view references '{table}', which is not a configured source")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io { source, .. } => Some(source),
            ConfigError::Parse(e) => Some(e),
            _ => None,
        }
    }
}

impl From<serde_yaml::Error> for ConfigError {
    fn from(e: serde_yaml::Error) -> Self {
        ConfigError::Parse(e)
    }
}

/// Column-store connection parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_user")]
    pub user: String,
    #[serde(default)]
    pub password: String,
    pub database: String,
}

fn default_host() -> String {
    "localhost".to_string()
}

fn default_port() -> u16 {
    8123
}

fn default_user() -> String {
    "default".to_string()
}

impl DatabaseConfig {
    /// Override connection settings from `LOGLAKE_DB_*` environment
    /// variables where present.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(host) = std::env::var("LOGLAKE_DB_HOST") {
            self.host = host;
        }
        if let Ok(port) = std::env::var("LOGLAKE_DB_PORT") {
            match port.parse() {
                Ok(port) => self.port = port,
                Err(_) => warn!("ignoring unparsable LOGLAKE_DB_PORT '{}'", port),
            }
        }
        if let Ok(user) = std::env::var("LOGLAKE_DB_USER") {
            self.user = user;
        }
        if let Ok(password) = std::env::var("LOGLAKE_DB_PASSWORD") {
            self.password = password;
        }
        if let Ok(database) = std::env::var("LOGLAKE_DB_NAME") {
            self.database = database;
        }
    }
}

/// One configured log source.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Source name; doubles as the target table name.
    pub name: String,
    /// Append-only log file to ingest.
    pub log_path: PathBuf,
    /// File persisting the consumed byte offset.
    pub offset_path: PathBuf,
    /// Ordering/dedup key of the target table.
    pub order_by: Vec<String>,
    /// Optional array-expansion rule for nested sub-records.
    #[serde(default)]
    pub explode: Option<ExplodeRule>,
}

impl SourceConfig {
    pub fn log_source(&self) -> LogSource {
        LogSource::new(&self.name, &self.log_path, &self.offset_path)
    }
}

/// One join edge in the view's relationship graph.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EdgeConfig {
    pub from: String,
    pub to: String,
    /// Column equated between the two tables.
    pub column: String,
}

impl EdgeConfig {
    pub fn join_edge(&self) -> JoinEdge {
        JoinEdge::new(&self.from, &self.to, &self.column)
    }
}

/// Materialized-view configuration over the configured sources.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViewConfig {
    pub name: String,
    pub base_table: String,
    pub edges: Vec<EdgeConfig>,
    /// Ordering key over the flattened (alias-prefixed) columns.
    pub order_by: Vec<String>,
    #[serde(default = "default_refresh_minutes")]
    pub refresh_minutes: u32,
}

fn default_refresh_minutes() -> u32 {
    DEFAULT_REFRESH_MINUTES
}

impl ViewConfig {
    /// Participating tables: the base first, then each edge target in edge
    /// order. This is also the projection order of the compiled join.
    pub fn participant_tables(&self) -> Vec<String> {
        let mut tables = vec![self.base_table.clone()];
        for edge in &self.edges {
            for endpoint in [&edge.from, &edge.to] {
                if !tables.contains(endpoint) {
                    tables.push(endpoint.clone());
                }
            }
        }
        tables
    }
}

/// Complete pipeline configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub database: DatabaseConfig,
    pub sources: Vec<SourceConfig>,
    #[serde(default)]
    pub view: Option<ViewConfig>,
}

impl PipelineConfig {
    pub fn from_yaml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.sources.is_empty() {
            return Err(ConfigError::NoSources);
        }
        let mut names = HashSet::new();
        for source in &self.sources {
            if !names.insert(source.name.as_str()) {
                return Err(ConfigError::DuplicateSource {
                    name: source.name.clone(),
                });
            }
            if source.order_by.is_empty() {
                return Err(ConfigError::EmptyOrderingKey {
                    source: source.name.clone(),
                });
            }
        }
        if let Some(view) = &self.view {
            for table in view.participant_tables() {
                if !names.contains(table.as_str()) {
                    return Err(ConfigError::UnknownViewTable { table });
                }
            }
        }
        Ok(())
    }
}
