//! Bootstrap configuration loading
//!
//! Settings are resolved in priority order:
//! 1. Command-line argument (highest priority, handled by the binary)
//! 2. Environment variable (handled by the binary)
//! 3. TOML config file
//! 4. OS-dependent compiled default (fallback)
//!
//! A missing or unreadable TOML file never stops startup: a warning is logged
//! and compiled defaults are used instead.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Environment variable naming an explicit config file
pub const CONFIG_ENV_VAR: &str = "SHELF_CONFIG";

/// Config file name looked up in the platform config directory
pub const CONFIG_FILE_NAME: &str = "shelf-importer.toml";

/// Bootstrap configuration loaded from TOML file
///
/// Every field is optional so that partial files are accepted.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TomlConfig {
    /// Path to SQLite database file
    #[serde(default)]
    pub database_path: Option<PathBuf>,

    /// HTTP server port
    #[serde(default)]
    pub port: Option<u16>,

    /// HTTP server bind address
    #[serde(default)]
    pub bind_address: Option<String>,

    /// Directory where downloaded images are stored
    #[serde(default)]
    pub images_dir: Option<PathBuf>,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Importer configuration
    #[serde(default)]
    pub importer: ImporterConfig,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// External source importer configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImporterConfig {
    /// User-Agent sent to external sources (defaults to crate name/version)
    #[serde(default)]
    pub user_agent: Option<String>,

    /// HTTP client timeout applied to every external request
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// How concurrent imports of the same code are guarded
    #[serde(default)]
    pub duplicate_code_guard: DuplicateCodeGuard,
}

impl Default for ImporterConfig {
    fn default() -> Self {
        Self {
            user_agent: None,
            request_timeout_secs: default_request_timeout_secs(),
            duplicate_code_guard: DuplicateCodeGuard::default(),
        }
    }
}

/// Guard against two imports of the same code racing past the duplicate check
///
/// The pre-creation check always runs. The unique index on `(library_id, code)`
/// always exists too; this setting only decides how a violation of it is reported.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DuplicateCodeGuard {
    /// Only the pre-check reports duplicates; an index violation surfaces as a database error
    Precondition,
    /// An index violation during creation is reported as a duplicate code
    #[default]
    Constraint,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_request_timeout_secs() -> u64 {
    15
}

impl TomlConfig {
    /// Load and parse a TOML config file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Read {} failed: {}", path.display(), e)))?;

        toml::from_str(&content)
            .map_err(|e| Error::Config(format!("Parse {} failed: {}", path.display(), e)))
    }

    /// Load the config file if one is available, otherwise fall back to defaults
    ///
    /// `explicit` is the path given on the command line, if any.
    pub fn load_or_default(explicit: Option<&Path>) -> Self {
        let Some(path) = resolve_config_path(explicit) else {
            info!("No config file found, using compiled defaults");
            return Self::default();
        };

        match Self::load(&path) {
            Ok(config) => {
                info!("Loaded configuration from {}", path.display());
                config
            }
            Err(e) => {
                warn!("{}; using compiled defaults", e);
                Self::default()
            }
        }
    }
}

/// Locate the config file: explicit path, then `SHELF_CONFIG`, then the platform config dir
pub fn resolve_config_path(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }

    if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
        if !path.trim().is_empty() {
            return Some(PathBuf::from(path));
        }
    }

    dirs::config_dir()
        .map(|d| d.join("shelf").join(CONFIG_FILE_NAME))
        .filter(|p| p.exists())
}

/// OS-dependent compiled defaults
#[derive(Debug, Clone)]
pub struct CompiledDefaults {
    pub data_dir: PathBuf,
    pub database_path: PathBuf,
    pub images_dir: PathBuf,
    pub port: u16,
    pub bind_address: String,
}

impl CompiledDefaults {
    pub fn for_current_platform() -> Self {
        let data_dir = dirs::data_local_dir()
            .map(|d| d.join("shelf"))
            .unwrap_or_else(|| PathBuf::from("./shelf_data"));

        Self {
            database_path: data_dir.join("shelf.db"),
            images_dir: data_dir.join("images"),
            data_dir,
            port: 5780,
            bind_address: "127.0.0.1".to_string(),
        }
    }
}
