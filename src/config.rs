//! Configuration System
//!
//! Layered configuration for the context tree and logging. Sources, lowest to
//! highest priority: built-in defaults, the user config file, an explicit
//! config file, then `AMBIENT_CTX__*` environment variables.

use crate::error::ContextError;
use crate::logging::LoggingConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;

mod defaults;
mod sources;

pub use sources::user_config_path;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContextConfig {
    /// Context tree settings
    #[serde(default)]
    pub tree: TreeConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Context tree settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreeConfig {
    /// Warn when this many nodes are tracked, and again each time the count
    /// grows by this much more. Work that never finishes is never reclaimed,
    /// so steady growth usually means abandoned work. `0` disables the warning.
    #[serde(default = "default_leak_warning_threshold")]
    pub leak_warning_threshold: usize,
}

pub(crate) fn default_leak_warning_threshold() -> usize {
    10_000
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            leak_warning_threshold: default_leak_warning_threshold(),
        }
    }
}

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error", "off"];
const LOG_FORMATS: &[&str] = &["text", "json"];
const LOG_OUTPUTS: &[&str] = &["stdout", "stderr", "file", "both"];

impl ContextConfig {
    /// Load configuration from all sources.
    ///
    /// `explicit` must exist if given; the user config file is optional.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ContextError> {
        let mut builder = defaults::builder_with_defaults()?;
        builder = sources::add_user_file(builder)?;
        if let Some(path) = explicit {
            builder = sources::add_explicit_file(builder, path)?;
        }
        builder = sources::add_environment(builder);

        let config: ContextConfig = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the entire configuration
    pub fn validate(&self) -> Result<(), ContextError> {
        let logging = &self.logging;
        if !LOG_LEVELS.contains(&logging.level.as_str()) {
            return Err(ContextError::InvalidConfig(format!(
                "Invalid log level: {} (must be one of {})",
                logging.level,
                LOG_LEVELS.join(", ")
            )));
        }
        if !LOG_FORMATS.contains(&logging.format.as_str()) {
            return Err(ContextError::InvalidConfig(format!(
                "Invalid log format: {} (must be 'json' or 'text')",
                logging.format
            )));
        }
        if !LOG_OUTPUTS.contains(&logging.output.as_str()) {
            return Err(ContextError::InvalidConfig(format!(
                "Invalid log output: {} (must be 'stdout', 'stderr', 'file', or 'both')",
                logging.output
            )));
        }
        for (module, level) in &logging.modules {
            if !LOG_LEVELS.contains(&level.as_str()) {
                return Err(ContextError::InvalidConfig(format!(
                    "Invalid log level for module '{}': {}",
                    module, level
                )));
            }
        }
        Ok(())
    }
}
