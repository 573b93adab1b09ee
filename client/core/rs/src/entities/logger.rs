use serde::{Deserialize, Serialize};
use strum::Display;

/// Logging configuration shared by the manager and edge binaries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
  /// The logging verbosity. Default: `info`
  #[serde(default)]
  pub level: LogLevel,

  /// How logs are written to stdio. Default: `standard`
  #[serde(default)]
  pub stdio: StdioLogMode,

  /// Use pretty (multi-line) stdio logging.
  #[serde(default)]
  pub pretty: bool,

  /// Include the emitting module in log lines.
  #[serde(default)]
  pub location: bool,

  /// Enable ansi colors in stdio logs. Default: `true`
  #[serde(default = "default_ansi")]
  pub ansi: bool,
}

fn default_ansi() -> bool {
  true
}

impl Default for LogConfig {
  fn default() -> LogConfig {
    LogConfig {
      level: Default::default(),
      stdio: Default::default(),
      pretty: false,
      location: false,
      ansi: default_ansi(),
    }
  }
}

#[derive(
  Debug,
  Clone,
  Copy,
  Default,
  PartialEq,
  Eq,
  Serialize,
  Deserialize,
  Display,
  strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum LogLevel {
  Trace,
  Debug,
  #[default]
  Info,
  Warn,
  Error,
}

impl From<LogLevel> for tracing::Level {
  fn from(value: LogLevel) -> tracing::Level {
    match value {
      LogLevel::Trace => tracing::Level::TRACE,
      LogLevel::Debug => tracing::Level::DEBUG,
      LogLevel::Info => tracing::Level::INFO,
      LogLevel::Warn => tracing::Level::WARN,
      LogLevel::Error => tracing::Level::ERROR,
    }
  }
}

#[derive(
  Debug,
  Clone,
  Copy,
  Default,
  PartialEq,
  Eq,
  Serialize,
  Deserialize,
  Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum StdioLogMode {
  #[default]
  Standard,
  Json,
  None,
}
