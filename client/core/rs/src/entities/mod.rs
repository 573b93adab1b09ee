use anyhow::{Context, anyhow};
use serde::{Deserialize, Serialize};

pub mod cluster;
pub mod config;
pub mod istio;
pub mod logger;
pub mod proxy;
pub mod service;

/// Unix timestamp in milliseconds.
pub type I64 = i64;

pub fn unix_timestamp_ms() -> I64 {
  chrono::Utc::now().timestamp_millis()
}

pub fn optional_str(string: &str) -> Option<&str> {
  if string.is_empty() { None } else { Some(string) }
}

/// Compute the global service id: `{namespace}:{name}`.
pub fn service_id(namespace: &str, name: &str) -> String {
  format!("{namespace}:{name}")
}

/// Split a service id back into `(namespace, name)`.
pub fn parse_service_id(id: &str) -> anyhow::Result<(&str, &str)> {
  match id.split(':').collect::<Vec<_>>()[..] {
    [namespace, name] if !namespace.is_empty() && !name.is_empty() => {
      Ok((namespace, name))
    }
    _ => Err(anyhow!(
      "Invalid service id '{id}' | expected '{{namespace}}:{{name}}'"
    )),
  }
}

/// Identifies a single workload instance globally:
/// `{cluster_id}:{namespace}:{pod_name}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct InstanceId {
  pub cluster_id: String,
  pub namespace: String,
  pub pod_name: String,
}

impl InstanceId {
  pub fn new(
    cluster_id: impl Into<String>,
    namespace: impl Into<String>,
    pod_name: impl Into<String>,
  ) -> InstanceId {
    InstanceId {
      cluster_id: cluster_id.into(),
      namespace: namespace.into(),
      pod_name: pod_name.into(),
    }
  }
}

impl std::fmt::Display for InstanceId {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(
      f,
      "{}:{}:{}",
      self.cluster_id, self.namespace, self.pod_name
    )
  }
}

impl std::str::FromStr for InstanceId {
  type Err = anyhow::Error;
  fn from_str(id: &str) -> anyhow::Result<InstanceId> {
    match id.split(':').collect::<Vec<_>>()[..] {
      [cluster_id, namespace, pod_name]
        if !cluster_id.is_empty()
          && !namespace.is_empty()
          && !pod_name.is_empty() =>
      {
        Ok(InstanceId::new(cluster_id, namespace, pod_name))
      }
      _ => Err(anyhow!(
        "Invalid instance id '{id}' | expected '{{cluster_id}}:{{namespace}}:{{pod_name}}'"
      )),
    }
  }
}

pub fn parse_instance_id(id: &str) -> anyhow::Result<InstanceId> {
  id.parse().context("Failed to parse instance id")
}

/// Declares an enum whose wire representation is the pinned
/// integer code of each variant, in both directions.
macro_rules! wire_enum {
  ($(#[$meta:meta])* $name:ident {
    $($(#[$vmeta:meta])* $variant:ident = $code:literal,)+
  }) => {
    $(#[$meta])*
    #[derive(
      Debug, Clone, Copy, PartialEq, Eq, Hash,
      serde::Serialize, serde::Deserialize, strum::Display,
    )]
    #[serde(try_from = "i32", into = "i32")]
    pub enum $name {
      $($(#[$vmeta])* $variant,)+
    }

    impl From<$name> for i32 {
      fn from(value: $name) -> i32 {
        match value {
          $($name::$variant => $code,)+
        }
      }
    }

    impl TryFrom<i32> for $name {
      type Error = String;
      fn try_from(value: i32) -> Result<$name, String> {
        match value {
          $($code => Ok($name::$variant),)+
          other => Err(format!(
            "Unrecognized {} code: {other}",
            stringify!($name)
          )),
        }
      }
    }
  };
}

pub(crate) use wire_enum;

/// The error taxonomy surfaced by every public API call
/// and by manager -> edge Error messages.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Serialize,
  Deserialize,
  strum::Display,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
  NotFound,
  Unavailable,
  DeadlineExceeded,
  AlreadyExists,
  InvalidArgument,
  Internal,
}

/// The structured error body returned by the public API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiErrorBody {
  pub code: ErrorCode,
  pub message: String,
}
