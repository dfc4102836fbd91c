//! TOML-based configuration for triplewrite.
//!
//! Environment variables are expanded in the raw text before parsing.
//!
//! Example configuration:
//! ```toml
//! [execution]
//! batch = "auto"           # auto | always | never
//! verify_row_counts = true
//!
//! [database]
//! name = "crm"
//! dialect = "sqlite"
//! path = "${CRM_HOME}/crm.sqlite"
//! ```

use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use crate::sql::Dialect;

/// Error type for settings.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("Config file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

pub type SettingsResult<T> = Result<T, SettingsError>;

/// Root configuration structure.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// How statements are submitted.
    pub execution: ExecutionSettings,

    /// Database the updater writes to.
    pub database: DatabaseSettings,
}

/// When statement lists are submitted as one batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BatchMode {
    /// Batch when the connection reports batch support.
    #[default]
    Auto,
    /// Always batch; falls back to sequential if the connection cannot.
    Always,
    /// Execute each statement on its own.
    Never,
}

impl BatchMode {
    pub fn use_batch(self, supported: bool) -> bool {
        match self {
            BatchMode::Auto | BatchMode::Always => supported,
            BatchMode::Never => false,
        }
    }
}

/// Execution policy.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ExecutionSettings {
    pub batch: BatchMode,

    /// Fail a statement that affects fewer rows than its minimum.
    pub verify_row_counts: bool,
}

impl Default for ExecutionSettings {
    fn default() -> Self {
        Self {
            batch: BatchMode::Auto,
            verify_row_counts: true,
        }
    }
}

/// Database location and identity.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseSettings {
    /// Handle name compared against every mapping rule's database.
    pub name: String,

    pub dialect: Dialect,

    /// SQLite file path, or `:memory:`.
    pub path: String,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            name: "default".to_string(),
            dialect: Dialect::Sqlite,
            path: ":memory:".to_string(),
        }
    }
}

impl DatabaseSettings {
    pub fn is_in_memory(&self) -> bool {
        self.path == ":memory:"
    }
}

impl Settings {
    /// Load settings from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> SettingsResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(SettingsError::FileNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse settings from TOML text, expanding environment variables first.
    pub fn from_toml(content: &str) -> SettingsResult<Self> {
        let expanded = expand_env_vars(content)?;
        let settings: Settings = toml::from_str(&expanded)?;
        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> SettingsResult<()> {
        if self.database.name.trim().is_empty() {
            return Err(SettingsError::InvalidConfig(
                "database.name must not be empty".to_string(),
            ));
        }
        if self.database.path.trim().is_empty() {
            return Err(SettingsError::InvalidConfig(
                "database.path must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Expand environment variables in a string.
///
/// Supports `${VAR}` and `$VAR` syntax.
pub fn expand_env_vars(s: &str) -> SettingsResult<String> {
    let mut result = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '$' {
            result.push(c);
            continue;
        }

        let mut var_name = String::new();
        if chars.peek() == Some(&'{') {
            chars.next();
            for ch in chars.by_ref() {
                if ch == '}' {
                    break;
                }
                var_name.push(ch);
            }
        } else {
            while let Some(&ch) = chars.peek() {
                if ch.is_alphanumeric() || ch == '_' {
                    var_name.push(ch);
                    chars.next();
                } else {
                    break;
                }
            }
            if var_name.is_empty() {
                // Lone $
                result.push('$');
                continue;
            }
        }

        let value =
            env::var(&var_name).map_err(|_| SettingsError::MissingEnvVar(var_name.clone()))?;
        result.push_str(&value);
    }

    Ok(result)
}
