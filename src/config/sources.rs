//! Config sources: user file, explicit file, environment.

use config::builder::DefaultState;
use config::ConfigBuilder;
use config::ConfigError;
use config::{Environment, File};
use directories::ProjectDirs;
use std::path::{Path, PathBuf};
use tracing::debug;

const ENV_PREFIX: &str = "AMBIENT_CTX";

/// Path to the user config file, e.g. `$XDG_CONFIG_HOME/ambient-ctx/config.toml`.
pub fn user_config_path() -> Option<PathBuf> {
    ProjectDirs::from("", "", "ambient-ctx").map(|dirs| dirs.config_dir().join("config.toml"))
}

/// Add the user config file to the builder if it exists.
pub fn add_user_file(
    builder: ConfigBuilder<DefaultState>,
) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    match user_config_path() {
        Some(path) if path.exists() => Ok(builder.add_source(File::from(path).required(false))),
        Some(path) => {
            debug!(config_path = %path.display(), "No user config file; using defaults");
            Ok(builder)
        }
        None => Ok(builder),
    }
}

/// Add an explicitly requested config file. Missing files are an error.
pub fn add_explicit_file(
    builder: ConfigBuilder<DefaultState>,
    path: &Path,
) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::NotFound(path.display().to_string()));
    }
    Ok(builder.add_source(File::from(path.to_path_buf()).required(true)))
}

/// `AMBIENT_CTX__TREE__LEAK_WARNING_THRESHOLD=500` overrides `tree.leak_warning_threshold`.
pub fn add_environment(builder: ConfigBuilder<DefaultState>) -> ConfigBuilder<DefaultState> {
    builder.add_source(
        Environment::with_prefix(ENV_PREFIX)
            .prefix_separator("__")
            .separator("__")
            .try_parsing(true),
    )
}
