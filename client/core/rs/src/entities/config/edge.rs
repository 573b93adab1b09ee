use std::path::PathBuf;

use clap::Parser;
use serde::Deserialize;

use crate::entities::logger::{LogConfig, LogLevel};

use super::default_max_message_size_bytes;

/// Bounds on the collection interval.
pub const MIN_SYNC_INTERVAL: u64 = 1;
pub const MAX_SYNC_INTERVAL: u64 = 600;

/// Edge CLI arguments.
#[derive(Parser, Debug, Clone)]
#[command(name = "edge", version)]
pub struct CliArgs {
  /// Override the cluster id this edge owns.
  #[arg(long)]
  pub cluster_id: Option<String>,

  /// Override the manager address.
  #[arg(long)]
  pub manager_address: Option<String>,

  /// Override the log level.
  #[arg(long)]
  pub log_level: Option<LogLevel>,
}

/// Environment overrides for [EdgeConfig], prefixed `EDGE_`.
#[derive(Debug, Clone, Deserialize)]
pub struct Env {
  pub edge_cluster_id: Option<String>,
  pub edge_manager_address: Option<String>,
  pub edge_sync_interval: Option<u64>,
  pub edge_reconnect_backoff_initial: Option<u64>,
  pub edge_reconnect_backoff_max: Option<u64>,
  pub edge_reconnect_jitter_ratio: Option<f64>,
  pub edge_max_consecutive_rejections: Option<u32>,
  pub edge_envoy_admin_port: Option<u16>,
  pub edge_state_file: Option<PathBuf>,
  pub edge_max_message_size_bytes: Option<usize>,
  pub edge_log_level: Option<LogLevel>,
}

/// Edge configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct EdgeConfig {
  /// The cluster this edge owns. Must be unique across every
  /// edge connected to the manager. Required.
  #[serde(default)]
  pub cluster_id: String,

  /// Manager address to dial.
  /// Default: `http://localhost:7000`
  #[serde(default = "default_manager_address")]
  pub manager_address: String,

  /// Seconds between cluster state collections. Clamped to
  /// [1s, 10min]. Default: 30
  #[serde(default = "default_sync_interval")]
  pub sync_interval: u64,

  /// First reconnect backoff delay, seconds. Default: 1
  #[serde(default = "default_backoff_initial")]
  pub reconnect_backoff_initial: u64,

  /// Reconnect backoff cap, seconds. Default: 60
  #[serde(default = "default_backoff_max")]
  pub reconnect_backoff_max: u64,

  /// Jitter applied to each backoff delay. Default: 0.2
  #[serde(default = "default_jitter_ratio")]
  pub reconnect_jitter_ratio: f64,

  /// Consecutive identification rejections tolerated before the
  /// session is considered fatal. Default: 5
  #[serde(default = "default_max_consecutive_rejections")]
  pub max_consecutive_rejections: u32,

  /// Admin port of the Envoy proxies in this cluster.
  /// Default: 15000
  #[serde(default = "default_envoy_admin_port")]
  pub envoy_admin_port: u16,

  /// Path to a ClusterState JSON snapshot to collect from,
  /// instead of a live cluster.
  #[serde(default)]
  pub state_file: Option<PathBuf>,

  /// Cap on a single inbound wire message. Default: 4 MiB
  #[serde(default = "default_max_message_size_bytes")]
  pub max_message_size_bytes: usize,

  /// Logging configuration.
  #[serde(default)]
  pub logging: LogConfig,
}

impl Default for EdgeConfig {
  fn default() -> EdgeConfig {
    EdgeConfig {
      cluster_id: String::new(),
      manager_address: default_manager_address(),
      sync_interval: default_sync_interval(),
      reconnect_backoff_initial: default_backoff_initial(),
      reconnect_backoff_max: default_backoff_max(),
      reconnect_jitter_ratio: default_jitter_ratio(),
      max_consecutive_rejections:
        default_max_consecutive_rejections(),
      envoy_admin_port: default_envoy_admin_port(),
      state_file: None,
      max_message_size_bytes: default_max_message_size_bytes(),
      logging: Default::default(),
    }
  }
}

impl EdgeConfig {
  /// Apply environment and CLI overrides, then clamp the sync
  /// interval into its allowed range.
  pub fn merge(mut self, env: Env, args: &CliArgs) -> EdgeConfig {
    if let Some(cluster_id) =
      args.cluster_id.clone().or(env.edge_cluster_id)
    {
      self.cluster_id = cluster_id;
    }
    if let Some(address) = args
      .manager_address
      .clone()
      .or(env.edge_manager_address)
    {
      self.manager_address = address;
    }
    if let Some(sync_interval) = env.edge_sync_interval {
      self.sync_interval = sync_interval;
    }
    if let Some(initial) = env.edge_reconnect_backoff_initial {
      self.reconnect_backoff_initial = initial;
    }
    if let Some(max) = env.edge_reconnect_backoff_max {
      self.reconnect_backoff_max = max;
    }
    if let Some(ratio) = env.edge_reconnect_jitter_ratio {
      self.reconnect_jitter_ratio = ratio;
    }
    if let Some(max) = env.edge_max_consecutive_rejections {
      self.max_consecutive_rejections = max;
    }
    if let Some(port) = env.edge_envoy_admin_port {
      self.envoy_admin_port = port;
    }
    if let Some(path) = env.edge_state_file {
      self.state_file = Some(path);
    }
    if let Some(max) = env.edge_max_message_size_bytes {
      self.max_message_size_bytes = max;
    }
    if let Some(level) = args.log_level.or(env.edge_log_level) {
      self.logging.level = level;
    }
    self.sync_interval = self
      .sync_interval
      .clamp(MIN_SYNC_INTERVAL, MAX_SYNC_INTERVAL);
    self
  }
}

fn default_manager_address() -> String {
  String::from("http://localhost:7000")
}

fn default_sync_interval() -> u64 {
  30
}

fn default_backoff_initial() -> u64 {
  1
}

fn default_backoff_max() -> u64 {
  60
}

fn default_jitter_ratio() -> f64 {
  0.2
}

fn default_max_consecutive_rejections() -> u32 {
  5
}

fn default_envoy_admin_port() -> u16 {
  15000
}
