//! Configuration for triplewrite.
//!
//! Execution policy and database location, loaded from TOML.

mod settings;

pub use settings::{
    expand_env_vars, BatchMode, DatabaseSettings, ExecutionSettings, Settings, SettingsError,
    SettingsResult,
};
