//! Layered configuration loading.

use ambient_ctx::{ContextConfig, ContextError};
use std::fs;
use std::sync::Mutex;
use tempfile::TempDir;

static ENV_MUTEX: Mutex<()> = Mutex::new(());

fn with_clean_env<F, R>(temp_dir: &TempDir, f: F) -> R
where
    F: FnOnce() -> R,
{
    let _guard = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    let saved_config_home = std::env::var("XDG_CONFIG_HOME").ok();
    let saved_home = std::env::var("HOME").ok();
    std::env::set_var("XDG_CONFIG_HOME", temp_dir.path().join("config"));
    std::env::set_var("HOME", temp_dir.path().join("home"));

    let result = f();

    match saved_config_home {
        Some(value) => std::env::set_var("XDG_CONFIG_HOME", value),
        None => std::env::remove_var("XDG_CONFIG_HOME"),
    }
    match saved_home {
        Some(value) => std::env::set_var("HOME", value),
        None => std::env::remove_var("HOME"),
    }
    result
}

#[test]
fn test_defaults_without_any_source() {
    let temp_dir = TempDir::new().unwrap();
    let config = with_clean_env(&temp_dir, || ContextConfig::load(None)).unwrap();
    assert_eq!(config.tree.leak_warning_threshold, 10_000);
    assert_eq!(config.logging.level, "info");
    assert_eq!(config.logging.format, "text");
}

#[test]
fn test_explicit_file_overrides_defaults() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("ambient.toml");
    fs::write(
        &path,
        r#"
[tree]
leak_warning_threshold = 250

[logging]
level = "debug"
format = "json"

[logging.modules]
"ambient_ctx::tree" = "trace"
"#,
    )
    .unwrap();

    let config = with_clean_env(&temp_dir, || ContextConfig::load(Some(&path))).unwrap();
    assert_eq!(config.tree.leak_warning_threshold, 250);
    assert_eq!(config.logging.level, "debug");
    assert_eq!(config.logging.format, "json");
    assert_eq!(
        config.logging.modules.get("ambient_ctx::tree").map(String::as_str),
        Some("trace")
    );
}

#[test]
fn test_environment_overrides_file() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("ambient.toml");
    fs::write(&path, "[tree]\nleak_warning_threshold = 250\n").unwrap();

    let config = with_clean_env(&temp_dir, || {
        std::env::set_var("AMBIENT_CTX__TREE__LEAK_WARNING_THRESHOLD", "42");
        let config = ContextConfig::load(Some(&path));
        std::env::remove_var("AMBIENT_CTX__TREE__LEAK_WARNING_THRESHOLD");
        config
    })
    .unwrap();
    assert_eq!(config.tree.leak_warning_threshold, 42);
}

#[test]
fn test_missing_explicit_file_is_an_error() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("missing.toml");
    let err = with_clean_env(&temp_dir, || ContextConfig::load(Some(&path))).unwrap_err();
    assert!(matches!(err, ContextError::ConfigError(_)));
}

#[test]
fn test_invalid_values_fail_validation() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("ambient.toml");
    fs::write(&path, "[logging]\noutput = \"syslog\"\n").unwrap();

    let err = with_clean_env(&temp_dir, || ContextConfig::load(Some(&path))).unwrap_err();
    assert!(matches!(err, ContextError::InvalidConfig(_)));
}
