//! Configuration Module - TOML-based Store Configuration
//!
//! Loads and validates configuration from a TOML file. Every section
//! and field has a default, so an empty file is a valid configuration.

pub mod loader;

use serde::Deserialize;

/// Top-level configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StoreConfig {
  /// Where and how store files are written.
  #[serde(default)]
  pub storage: StorageConfig,
  /// Deferred write settings.
  #[serde(default)]
  pub scheduler: SchedulerConfig,
  /// Log output.
  #[serde(default)]
  pub logging: LoggingConfig,
  /// Prometheus counters.
  #[serde(default)]
  pub metrics: MetricsConfig,
}

/// Storage backend configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
  /// Directory holding one file per store key.
  #[serde(default = "default_data_dir")]
  pub data_dir: String,
  /// Write through a temp file + rename.
  #[serde(default = "default_true")]
  pub atomic_writes: bool,
  /// Indent persisted JSON.
  #[serde(default = "default_true")]
  pub pretty_json: bool,
}

/// Deferred write configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct SchedulerConfig {
  /// Delay used by `Store::schedule_save` (milliseconds).
  #[serde(default = "default_delay_ms")]
  pub default_delay_ms: u64,
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
  /// Log level (trace, debug, info, warn, error).
  #[serde(default = "default_log_level")]
  pub level: String,
  /// Emit JSON lines instead of human-readable output.
  #[serde(default)]
  pub json: bool,
}

/// Metrics configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct MetricsConfig {
  /// Register Prometheus counters.
  #[serde(default = "default_true")]
  pub enabled: bool,
  /// Metric name prefix.
  #[serde(default = "default_namespace")]
  pub namespace: String,
}

impl Default for StorageConfig {
  fn default() -> Self {
    Self {
      data_dir: default_data_dir(),
      atomic_writes: true,
      pretty_json: true,
    }
  }
}

impl Default for SchedulerConfig {
  fn default() -> Self {
    Self {
      default_delay_ms: default_delay_ms(),
    }
  }
}

impl Default for LoggingConfig {
  fn default() -> Self {
    Self {
      level: default_log_level(),
      json: false,
    }
  }
}

impl Default for MetricsConfig {
  fn default() -> Self {
    Self {
      enabled: true,
      namespace: default_namespace(),
    }
  }
}

// Default value functions for serde

fn default_data_dir() -> String {
  ".storage".to_string()
}

fn default_true() -> bool {
  true
}

fn default_delay_ms() -> u64 {
  1_000
}

fn default_log_level() -> String {
  "info".to_string()
}

fn default_namespace() -> String {
  "versioned_store".to_string()
}
