//! Store and search configuration.
//!
//! # Responsibility
//! - Describe where the database lives and how searches are bounded.
//! - Load configuration from `scholaria.json`, writing defaults on first run.
//!
//! # Invariants
//! - `1 <= default_page_size <= max_page_size` after `validate()`.
//! - `default_sort` is never blank.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::fs;
use std::path::{Path, PathBuf};

const DEFAULT_CONFIG_NAME: &str = "scholaria.json";
const DEFAULT_DB_FILE_NAME: &str = "scholaria.sqlite3";
const DEFAULT_PAGE_SIZE: u32 = 20;
const MAX_PAGE_SIZE: u32 = 100;
const DEFAULT_SORT: &str = "-updated_date";

pub type ConfigResult<T> = Result<T, ConfigError>;

#[derive(Debug)]
pub enum ConfigError {
    Io { path: PathBuf, source: std::io::Error },
    Parse { path: PathBuf, source: serde_json::Error },
    Serialize(serde_json::Error),
    Invalid(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => write!(f, "config io `{}`: {source}", path.display()),
            Self::Parse { path, source } => {
                write!(f, "config parse `{}`: {source}", path.display())
            }
            Self::Serialize(err) => write!(f, "config serialize: {err}"),
            Self::Invalid(message) => write!(f, "invalid config: {message}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Parse { source, .. } => Some(source),
            Self::Serialize(err) => Some(err),
            Self::Invalid(_) => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Relative paths resolve against the config directory.
    pub path: Option<String>,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: Some(DEFAULT_DB_FILE_NAME.to_string()),
        }
    }
}

/// Bounds applied by the search option normalizer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchConfig {
    pub default_page_size: u32,
    pub max_page_size: u32,
    /// Field name, `-` prefixed for descending order.
    pub default_sort: String,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            default_page_size: DEFAULT_PAGE_SIZE,
            max_page_size: MAX_PAGE_SIZE,
            default_sort: DEFAULT_SORT.to_string(),
        }
    }
}

impl SearchConfig {
    pub fn validate(&self) -> ConfigResult<()> {
        if self.max_page_size == 0 {
            return Err(ConfigError::Invalid(
                "search.max_page_size must be at least 1".to_string(),
            ));
        }
        if self.default_page_size == 0 || self.default_page_size > self.max_page_size {
            return Err(ConfigError::Invalid(format!(
                "search.default_page_size must be within 1..={}, got {}",
                self.max_page_size, self.default_page_size
            )));
        }
        if self.default_sort.trim().trim_start_matches('-').is_empty() {
            return Err(ConfigError::Invalid(
                "search.default_sort must name a field".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// `trace|debug|info|warn|error`; build-mode default when absent.
    pub level: Option<String>,
    /// Absolute directory for rolling log files; `<config dir>/logs` when absent.
    pub dir: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScholariaConfig {
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for ScholariaConfig {
    fn default() -> Self {
        Self {
            database: DatabaseConfig::default(),
            search: SearchConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl ScholariaConfig {
    /// Reads `scholaria.json` from `base_dir`, creating it with defaults when
    /// missing. The loaded config is validated before it is returned.
    pub fn load_or_init(base_dir: &Path) -> ConfigResult<Self> {
        fs::create_dir_all(base_dir).map_err(|source| ConfigError::Io {
            path: base_dir.to_path_buf(),
            source,
        })?;
        let config_path = base_dir.join(DEFAULT_CONFIG_NAME);

        if config_path.exists() {
            let raw = fs::read_to_string(&config_path).map_err(|source| ConfigError::Io {
                path: config_path.clone(),
                source,
            })?;
            let config: ScholariaConfig =
                serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
                    path: config_path.clone(),
                    source,
                })?;
            config.validate()?;
            return Ok(config);
        }

        let default = ScholariaConfig::default();
        let payload = serde_json::to_string_pretty(&default).map_err(ConfigError::Serialize)?;
        fs::write(&config_path, payload).map_err(|source| ConfigError::Io {
            path: config_path,
            source,
        })?;
        Ok(default)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if let Some(path) = self.database.path.as_deref() {
            if path.trim().is_empty() {
                return Err(ConfigError::Invalid(
                    "database.path must not be blank".to_string(),
                ));
            }
        }
        self.search.validate()
    }

    /// Resolves the database file path against `base_dir`.
    pub fn database_path(&self, base_dir: &Path) -> PathBuf {
        let path = self
            .database
            .path
            .clone()
            .unwrap_or_else(|| DEFAULT_DB_FILE_NAME.to_string());
        let candidate = PathBuf::from(path);
        if candidate.is_absolute() {
            candidate
        } else {
            base_dir.join(candidate)
        }
    }

    /// Resolves the log directory against `base_dir`.
    pub fn log_dir(&self, base_dir: &Path) -> PathBuf {
        match self.logging.dir.as_deref() {
            Some(dir) if Path::new(dir).is_absolute() => PathBuf::from(dir),
            Some(dir) => base_dir.join(dir),
            None => base_dir.join("logs"),
        }
    }
}
