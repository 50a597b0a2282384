//! Run configuration.
//!
//! Values are layered: built-in defaults, then a TOML file, then environment
//! variables. The resulting [`DedupConfig`] is handed to each component
//! explicitly.

use std::path::{Path, PathBuf};

use derive_builder::Builder;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::format::FormatPriorities;

/// Bonus for files organized as `Author/Title/file`.
pub const DEFAULT_STRUCTURED_BONUS: i32 = 5;

/// Penalty for file names that look like copies (`(1)`, `copy`, `tmp`).
pub const DEFAULT_TEMP_PENALTY: i32 = 10;

/// Library root as seen from inside the library database's container.
pub const DEFAULT_CONTAINER_ROOT: &str = "/books";

const ENV_BOOKS_DIR: &str = "SHELFSWEEP_BOOKS_DIR";
const ENV_LOG_DIR: &str = "SHELFSWEEP_LOG_DIR";
const ENV_LIBRARY_DB: &str = "SHELFSWEEP_LIBRARY_DB";
const ENV_CONTAINER_ROOT: &str = "SHELFSWEEP_CONTAINER_ROOT";
const ENV_JELLYFIN_URL: &str = "JELLYFIN_URL";
const ENV_JELLYFIN_API_KEY: &str = "JELLYFIN_API_KEY";

/// Errors raised while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("Cannot read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The configuration file is not valid TOML for this schema.
    #[error("Invalid config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    /// A required value was not provided by any source.
    #[error("Missing required setting `{field}` (set it in the config file or via {hint})")]
    Missing { field: &'static str, hint: &'static str },

    /// A value was provided but is unusable.
    #[error("Invalid configuration: {message}")]
    Invalid { message: String },
}

impl From<DedupConfigBuilderError> for ConfigError {
    fn from(err: DedupConfigBuilderError) -> Self {
        match err {
            DedupConfigBuilderError::UninitializedField("books_dir") => Self::Missing {
                field: "books_dir",
                hint: ENV_BOOKS_DIR,
            },
            DedupConfigBuilderError::UninitializedField(field) => Self::Missing {
                field,
                hint: "the config file",
            },
            DedupConfigBuilderError::ValidationError(message) => Self::Invalid { message },
        }
    }
}

/// Endpoints of the external indexes reconciled after a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SyncConfig {
    /// LazyLibrarian SQLite database.
    pub library_db: Option<PathBuf>,
    /// Library root as stored in the database (host root is rewritten to this).
    pub container_root: String,
    /// Jellyfin base URL, e.g. `http://localhost:8096`.
    pub jellyfin_url: Option<String>,
    /// Jellyfin API key.
    pub jellyfin_api_key: Option<String>,
    /// HTTP timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            library_db: None,
            container_root: DEFAULT_CONTAINER_ROOT.to_string(),
            jellyfin_url: None,
            jellyfin_api_key: None,
            timeout_secs: 30,
        }
    }
}

impl SyncConfig {
    /// Jellyfin base URL and API key, if both are configured.
    pub fn jellyfin(&self) -> Option<(&str, &str)> {
        match (&self.jellyfin_url, &self.jellyfin_api_key) {
            (Some(url), Some(key)) => Some((url.as_str(), key.as_str())),
            _ => None,
        }
    }
}

/// Configuration for a deduplication run.
#[derive(Debug, Clone, Builder, Serialize, Deserialize)]
#[builder(setter(into), build_fn(validate = "Self::validate"))]
pub struct DedupConfig {
    /// Root of the ebook library.
    pub books_dir: PathBuf,

    /// Directory for run log files (None = console only).
    #[builder(default)]
    #[serde(default)]
    pub log_dir: Option<PathBuf>,

    /// Include hidden files and directories (starting with .).
    #[builder(default = "false")]
    #[serde(default)]
    pub include_hidden: bool,

    /// Glob patterns matched against entry names; matches are skipped.
    #[builder(default)]
    #[serde(default)]
    pub ignore_patterns: Vec<String>,

    /// Format priority table.
    #[builder(default)]
    #[serde(default)]
    pub priorities: FormatPriorities,

    /// Score bonus for `Author/Title/file` placement.
    #[builder(default = "DEFAULT_STRUCTURED_BONUS")]
    #[serde(default = "default_structured_bonus")]
    pub structured_bonus: i32,

    /// Score penalty for copy-like file names.
    #[builder(default = "DEFAULT_TEMP_PENALTY")]
    #[serde(default = "default_temp_penalty")]
    pub temp_penalty: i32,

    /// External index endpoints.
    #[builder(default)]
    #[serde(default)]
    pub sync: SyncConfig,
}

fn default_structured_bonus() -> i32 {
    DEFAULT_STRUCTURED_BONUS
}

fn default_temp_penalty() -> i32 {
    DEFAULT_TEMP_PENALTY
}

impl DedupConfigBuilder {
    fn validate(&self) -> Result<(), String> {
        if self
            .books_dir
            .as_ref()
            .is_some_and(|root| root.as_os_str().is_empty())
        {
            return Err("books_dir cannot be empty".to_string());
        }
        if let Some(ref priorities) = self.priorities {
            priorities.validate()?;
        }
        if self.structured_bonus.is_some_and(|b| b < 0) {
            return Err("structured_bonus must not be negative".to_string());
        }
        if self.temp_penalty.is_some_and(|p| p < 0) {
            return Err("temp_penalty must not be negative".to_string());
        }
        Ok(())
    }
}

/// Shape of the TOML file: every key optional so that later layers can fill gaps.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileLayer {
    books_dir: Option<PathBuf>,
    log_dir: Option<PathBuf>,
    include_hidden: Option<bool>,
    ignore_patterns: Option<Vec<String>>,
    priorities: Option<FormatPriorities>,
    structured_bonus: Option<i32>,
    temp_penalty: Option<i32>,
    sync: Option<SyncConfig>,
}

impl DedupConfig {
    /// Create a new config builder.
    pub fn builder() -> DedupConfigBuilder {
        DedupConfigBuilder::default()
    }

    /// Create a config with defaults for everything but the library root.
    pub fn new(books_dir: impl Into<PathBuf>) -> Self {
        Self {
            books_dir: books_dir.into(),
            log_dir: None,
            include_hidden: false,
            ignore_patterns: Vec::new(),
            priorities: FormatPriorities::default(),
            structured_bonus: DEFAULT_STRUCTURED_BONUS,
            temp_penalty: DEFAULT_TEMP_PENALTY,
            sync: SyncConfig::default(),
        }
    }

    /// Default location of the config file (`<config_dir>/shelfsweep/config.toml`).
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("shelfsweep").join("config.toml"))
    }

    /// Load configuration from `path` (or the default location) and the process environment.
    ///
    /// An explicitly given file must exist; the default file is optional.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        Self::load_with_env(path, |key| std::env::var(key).ok())
    }

    /// Same as [`DedupConfig::load`] with an injectable environment lookup.
    pub fn load_with_env(
        path: Option<&Path>,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let layer = match path {
            Some(path) => read_layer(path)?,
            None => match Self::default_path() {
                Some(default) if default.is_file() => read_layer(&default)?,
                _ => FileLayer::default(),
            },
        };

        let mut builder = Self::builder();
        let mut sync = layer.sync.unwrap_or_default();

        if let Some(v) = layer.books_dir {
            builder.books_dir(v);
        }
        if let Some(v) = layer.log_dir {
            builder.log_dir(v);
        }
        if let Some(v) = layer.include_hidden {
            builder.include_hidden(v);
        }
        if let Some(v) = layer.ignore_patterns {
            builder.ignore_patterns(v);
        }
        if let Some(v) = layer.priorities {
            builder.priorities(v);
        }
        if let Some(v) = layer.structured_bonus {
            builder.structured_bonus(v);
        }
        if let Some(v) = layer.temp_penalty {
            builder.temp_penalty(v);
        }

        let lookup = |key: &str| env(key).filter(|v| !v.trim().is_empty());
        if let Some(v) = lookup(ENV_BOOKS_DIR) {
            builder.books_dir(v);
        }
        if let Some(v) = lookup(ENV_LOG_DIR) {
            builder.log_dir(PathBuf::from(v));
        }
        if let Some(v) = lookup(ENV_LIBRARY_DB) {
            sync.library_db = Some(PathBuf::from(v));
        }
        if let Some(v) = lookup(ENV_CONTAINER_ROOT) {
            sync.container_root = v;
        }
        if let Some(v) = lookup(ENV_JELLYFIN_URL) {
            sync.jellyfin_url = Some(v);
        }
        if let Some(v) = lookup(ENV_JELLYFIN_API_KEY) {
            sync.jellyfin_api_key = Some(v);
        }

        builder.sync(sync);
        Ok(builder.build()?)
    }
}

fn read_layer(path: &Path) -> Result<FileLayer, ConfigError> {
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&text).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}
