//! Runtime configuration resolved from environment variables.
//!
//! # Responsibility
//! - Resolve the AI credential, model and endpoint.
//! - Resolve where the vault database and log files live.
//!
//! # Invariants
//! - Missing variables fall back to defaults; only malformed values error.
//! - `log_dir` is always absolute, as `init_logging` requires.

use crate::logging::{default_log_level, normalize_level};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

/// Environment variable names.
pub mod env_vars {
    /// Provider credential. `GEMINI_API_KEY` is accepted as a fallback.
    pub const API_KEY: &str = "API_KEY";
    pub const GEMINI_API_KEY: &str = "GEMINI_API_KEY";
    pub const MODEL: &str = "RVAULT_MODEL";
    pub const AI_BASE_URL: &str = "RVAULT_AI_BASE_URL";
    pub const HOME_DIR: &str = "RVAULT_HOME";
    pub const DB_PATH: &str = "RVAULT_DB_PATH";
    pub const LOG_DIR: &str = "RVAULT_LOG_DIR";
    pub const LOG_LEVEL: &str = "RVAULT_LOG_LEVEL";
}

/// Default values.
pub mod defaults {
    pub const MODEL: &str = "gemini-2.5-flash";
    pub const AI_BASE_URL: &str = "https://generativelanguage.googleapis.com";
    pub const HOME_DIR_NAME: &str = ".rvault";
    pub const DB_FILE_NAME: &str = "rvault.sqlite3";
    pub const LOG_DIR_NAME: &str = "logs";
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    InvalidValue { key: &'static str, message: String },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidValue { key, message } => write!(f, "invalid `{key}`: {message}"),
        }
    }
}

impl Error for ConfigError {}

/// Text-generation provider settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AiConfig {
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: String,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: defaults::MODEL.to_string(),
            base_url: defaults::AI_BASE_URL.to_string(),
        }
    }
}

/// Fully resolved settings for one process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VaultConfig {
    pub ai: AiConfig,
    pub db_path: PathBuf,
    pub log_dir: PathBuf,
    pub log_level: &'static str,
}

impl VaultConfig {
    /// Resolves configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolves configuration through an arbitrary lookup function.
    ///
    /// Blank values are treated as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let ai = AiConfig {
            api_key: get(env_vars::API_KEY).or_else(|| get(env_vars::GEMINI_API_KEY)),
            model: get(env_vars::MODEL).unwrap_or_else(|| defaults::MODEL.to_string()),
            base_url: get(env_vars::AI_BASE_URL)
                .unwrap_or_else(|| defaults::AI_BASE_URL.to_string()),
        };

        let home = match get(env_vars::HOME_DIR) {
            Some(dir) => absolute_dir(env_vars::HOME_DIR, &dir)?,
            None => default_home(get("HOME")),
        };

        let db_path = get(env_vars::DB_PATH)
            .map(PathBuf::from)
            .unwrap_or_else(|| home.join(defaults::DB_FILE_NAME));

        let log_dir = match get(env_vars::LOG_DIR) {
            Some(dir) => absolute_dir(env_vars::LOG_DIR, &dir)?,
            None => home.join(defaults::LOG_DIR_NAME),
        };

        let log_level = match get(env_vars::LOG_LEVEL) {
            Some(level) => normalize_level(&level).map_err(|err| ConfigError::InvalidValue {
                key: env_vars::LOG_LEVEL,
                message: err.to_string(),
            })?,
            None => default_log_level(),
        };

        Ok(Self {
            ai,
            db_path,
            log_dir,
            log_level,
        })
    }
}

fn absolute_dir(key: &'static str, value: &str) -> Result<PathBuf, ConfigError> {
    let path = Path::new(value);
    if !path.is_absolute() {
        return Err(ConfigError::InvalidValue {
            key,
            message: format!("must be an absolute path, got `{value}`"),
        });
    }
    Ok(path.to_path_buf())
}

fn default_home(user_home: Option<String>) -> PathBuf {
    match user_home {
        Some(home) if Path::new(&home).is_absolute() => {
            PathBuf::from(home).join(defaults::HOME_DIR_NAME)
        }
        _ => std::env::temp_dir().join("rvault"),
    }
}
