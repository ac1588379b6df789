//! Configuration Loader - File Loading and Validation
//!
//! Handles loading the TOML file, validating all parameters,
//! and providing clear error messages for misconfiguration.

use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;

use super::StoreConfig;

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Load and validate configuration from a TOML file.
///
/// # Errors
/// Returns detailed error if:
/// - File doesn't exist or can't be read
/// - TOML parsing fails
/// - Validation rules are violated
pub fn load_config(path: impl AsRef<Path>) -> Result<StoreConfig> {
  let path = path.as_ref();

  let content = std::fs::read_to_string(path)
    .with_context(|| format!("Failed to read config file: {}", path.display()))?;

  let config = parse_config(&content)?;

  info!(
    data_dir = %config.storage.data_dir,
    default_delay_ms = config.scheduler.default_delay_ms,
    "Configuration loaded successfully"
  );

  Ok(config)
}

/// Parse and validate configuration from TOML text.
pub fn parse_config(content: &str) -> Result<StoreConfig> {
  let config: StoreConfig =
    toml::from_str(content).with_context(|| "Failed to parse store configuration")?;
  validate_config(&config)?;
  Ok(config)
}

/// Validate all configuration parameters.
fn validate_config(config: &StoreConfig) -> Result<()> {
  anyhow::ensure!(
    !config.storage.data_dir.trim().is_empty(),
    "storage.data_dir must not be empty"
  );

  anyhow::ensure!(
    config.scheduler.default_delay_ms > 0,
    "scheduler.default_delay_ms must be positive"
  );

  // EnvFilter directives (e.g. "versioned_store=debug") are accepted as-is;
  // a bare word must be a known level.
  let level = config.logging.level.trim();
  anyhow::ensure!(
    level.contains('=') || LOG_LEVELS.contains(&level.to_ascii_lowercase().as_str()),
    "logging.level must be one of {:?} or a filter directive, got {:?}",
    LOG_LEVELS,
    config.logging.level
  );

  if config.metrics.enabled {
    let ns = &config.metrics.namespace;
    anyhow::ensure!(
      !ns.is_empty()
        && !ns.starts_with(|c: char| c.is_ascii_digit())
        && ns.chars().all(|c| c.is_ascii_alphanumeric() || c == '_'),
      "metrics.namespace must be a valid Prometheus name prefix, got {ns:?}"
    );
  }

  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_load_nonexistent_file() {
    let result = load_config("nonexistent.toml");
    assert!(result.is_err());
  }

  #[test]
  fn test_empty_config_uses_defaults() {
    let config = parse_config("").unwrap();
    assert_eq!(config.storage.data_dir, ".storage");
    assert!(config.storage.atomic_writes);
    assert_eq!(config.scheduler.default_delay_ms, 1_000);
    assert_eq!(config.logging.level, "info");
    assert_eq!(config.metrics.namespace, "versioned_store");
  }

  #[test]
  fn test_overrides() {
    let config = parse_config(
      r#"
      [storage]
      data_dir = "/var/lib/app/.storage"
      atomic_writes = false

      [scheduler]
      default_delay_ms = 250

      [logging]
      level = "versioned_store=debug"
      json = true
      "#,
    )
    .unwrap();
    assert_eq!(config.storage.data_dir, "/var/lib/app/.storage");
    assert!(!config.storage.atomic_writes);
    assert!(config.storage.pretty_json);
    assert_eq!(config.scheduler.default_delay_ms, 250);
    assert!(config.logging.json);
  }

  #[test]
  fn test_rejects_invalid_values() {
    assert!(parse_config("[scheduler]\ndefault_delay_ms = 0").is_err());
    assert!(parse_config("[storage]\ndata_dir = \"  \"").is_err());
    assert!(parse_config("[logging]\nlevel = \"loud\"").is_err());
    assert!(parse_config("[metrics]\nnamespace = \"9-bad\"").is_err());
    assert!(parse_config("[metrics]\nenabled = false\nnamespace = \"9-bad\"").is_ok());
  }

  #[test]
  fn test_load_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("store.toml");
    std::fs::write(&path, "[storage]\ndata_dir = \"data\"\n").unwrap();
    assert_eq!(load_config(&path).unwrap().storage.data_dir, "data");
  }
}
