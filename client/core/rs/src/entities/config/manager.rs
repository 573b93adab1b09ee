use clap::Parser;
use serde::Deserialize;

use crate::entities::logger::{LogConfig, LogLevel};

use super::default_max_message_size_bytes;

/// Manager CLI arguments. Everything here can also come from the
/// environment; flags win.
#[derive(Parser, Debug, Clone)]
#[command(name = "manager", version)]
pub struct CliArgs {
  /// Override the log level.
  #[arg(long)]
  pub log_level: Option<LogLevel>,
}

/// Environment overrides for [ManagerConfig], prefixed
/// `NAVIGATOR_`.
#[derive(Debug, Clone, Deserialize)]
pub struct Env {
  pub navigator_port: Option<u16>,
  pub navigator_bind_ip: Option<String>,
  pub navigator_sync_interval: Option<u64>,
  pub navigator_sync_healthy_multiplier: Option<i64>,
  pub navigator_sync_stale_multiplier: Option<i64>,
  pub navigator_proxy_request_timeout: Option<u64>,
  pub navigator_istio_root_namespace: Option<String>,
  pub navigator_max_message_size_bytes: Option<usize>,
  pub navigator_allow_duplicate_cluster_registration: Option<bool>,
  pub navigator_log_level: Option<LogLevel>,
}

/// Manager configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ManagerConfig {
  /// Port serving both the public API and the edge websocket.
  /// Default: 7000
  #[serde(default = "default_port")]
  pub port: u16,

  /// IP the server binds. Default: `0.0.0.0`
  #[serde(default = "default_bind_ip")]
  pub bind_ip: String,

  /// The sync interval (in seconds) edges are expected to push
  /// state at. Only used to derive cluster sync status.
  /// Default: 30
  #[serde(default = "default_sync_interval")]
  pub sync_interval: u64,

  /// A cluster is healthy while its last update is within
  /// `sync_healthy_multiplier * sync_interval`. Default: 2
  #[serde(default = "default_sync_healthy_multiplier")]
  pub sync_healthy_multiplier: i64,

  /// A cluster is stale (rather than disconnected) while its last
  /// update is within `sync_stale_multiplier * sync_interval`.
  /// Default: 5
  #[serde(default = "default_sync_stale_multiplier")]
  pub sync_stale_multiplier: i64,

  /// Seconds a proxy-config request may wait on the owning edge.
  /// Default: 15
  #[serde(default = "default_proxy_request_timeout")]
  pub proxy_request_timeout: u64,

  /// The mesh root namespace whose policy resources apply
  /// cluster-wide. Default: `istio-system`
  #[serde(default = "default_istio_root_namespace")]
  pub istio_root_namespace: String,

  /// Cap on a single inbound wire message. Default: 4 MiB
  #[serde(default = "default_max_message_size_bytes")]
  pub max_message_size_bytes: usize,

  /// Let a newly identifying edge displace the live connection
  /// for its cluster id instead of being rejected.
  /// Default: false
  #[serde(default)]
  pub allow_duplicate_cluster_registration: bool,

  /// Logging configuration.
  #[serde(default)]
  pub logging: LogConfig,
}

impl Default for ManagerConfig {
  fn default() -> ManagerConfig {
    ManagerConfig {
      port: default_port(),
      bind_ip: default_bind_ip(),
      sync_interval: default_sync_interval(),
      sync_healthy_multiplier: default_sync_healthy_multiplier(),
      sync_stale_multiplier: default_sync_stale_multiplier(),
      proxy_request_timeout: default_proxy_request_timeout(),
      istio_root_namespace: default_istio_root_namespace(),
      max_message_size_bytes: default_max_message_size_bytes(),
      allow_duplicate_cluster_registration: false,
      logging: Default::default(),
    }
  }
}

impl ManagerConfig {
  /// Apply environment and CLI overrides.
  pub fn merge(mut self, env: Env, args: &CliArgs) -> ManagerConfig {
    if let Some(port) = env.navigator_port {
      self.port = port;
    }
    if let Some(bind_ip) = env.navigator_bind_ip {
      self.bind_ip = bind_ip;
    }
    if let Some(sync_interval) = env.navigator_sync_interval {
      self.sync_interval = sync_interval;
    }
    if let Some(multiplier) = env.navigator_sync_healthy_multiplier
    {
      self.sync_healthy_multiplier = multiplier;
    }
    if let Some(multiplier) = env.navigator_sync_stale_multiplier {
      self.sync_stale_multiplier = multiplier;
    }
    if let Some(timeout) = env.navigator_proxy_request_timeout {
      self.proxy_request_timeout = timeout;
    }
    if let Some(namespace) = env.navigator_istio_root_namespace {
      self.istio_root_namespace = namespace;
    }
    if let Some(max) = env.navigator_max_message_size_bytes {
      self.max_message_size_bytes = max;
    }
    if let Some(allow) =
      env.navigator_allow_duplicate_cluster_registration
    {
      self.allow_duplicate_cluster_registration = allow;
    }
    if let Some(level) =
      args.log_level.or(env.navigator_log_level)
    {
      self.logging.level = level;
    }
    self
  }
}

fn default_port() -> u16 {
  7000
}

fn default_bind_ip() -> String {
  String::from("0.0.0.0")
}

fn default_sync_interval() -> u64 {
  30
}

fn default_sync_healthy_multiplier() -> i64 {
  2
}

fn default_sync_stale_multiplier() -> i64 {
  5
}

fn default_proxy_request_timeout() -> u64 {
  15
}

fn default_istio_root_namespace() -> String {
  String::from("istio-system")
}
