//! Cluster state collection seam.
//!
//! The collector produces a full [ClusterState] snapshot each
//! cycle; the session ships it to the manager wholesale. The
//! Kubernetes / Istio API clients sit behind this boundary.

use std::path::PathBuf;

use anyhow::Context;
use navigator_client::entities::{
  cluster::ClusterState, config::edge::EdgeConfig,
};

pub enum Collector {
  /// Reads a full snapshot from a JSON document on each cycle.
  /// For demo setups and air-gapped testing.
  File(FileCollector),
  /// A fixed in-memory snapshot.
  Static(StaticCollector),
}

impl Collector {
  pub fn from_config(config: &EdgeConfig) -> Collector {
    match &config.state_file {
      Some(path) => Collector::File(FileCollector {
        path: path.clone(),
      }),
      None => {
        warn!(
          "No state file configured, collecting an empty cluster state"
        );
        Collector::Static(StaticCollector {
          state: Default::default(),
        })
      }
    }
  }

  pub async fn collect(&self) -> anyhow::Result<ClusterState> {
    match self {
      Collector::File(collector) => collector.collect().await,
      Collector::Static(collector) => {
        Ok(collector.state.clone())
      }
    }
  }
}

pub struct FileCollector {
  pub path: PathBuf,
}

impl FileCollector {
  async fn collect(&self) -> anyhow::Result<ClusterState> {
    let contents = tokio::fs::read_to_string(&self.path)
      .await
      .with_context(|| {
        format!(
          "Failed to read state file at {}",
          self.path.display()
        )
      })?;
    serde_json::from_str(&contents).with_context(|| {
      format!(
        "Failed to parse state file at {}",
        self.path.display()
      )
    })
  }
}

pub struct StaticCollector {
  pub state: ClusterState,
}

#[cfg(test)]
mod tests {
  use navigator_client::entities::service::Service;

  use super::*;

  #[tokio::test]
  async fn file_collector_reads_full_snapshots() {
    let state = ClusterState {
      services: vec![Service {
        name: "svc1".to_string(),
        namespace: "default".to_string(),
        ..Default::default()
      }],
      ..Default::default()
    };
    let path = std::env::temp_dir()
      .join("navigator-edge-collect-test.json");
    tokio::fs::write(
      &path,
      serde_json::to_vec(&state).unwrap(),
    )
    .await
    .unwrap();

    let collector =
      Collector::File(FileCollector { path: path.clone() });
    let collected = collector.collect().await.unwrap();
    assert_eq!(collected, state);

    tokio::fs::remove_file(&path).await.unwrap();
    assert!(collector.collect().await.is_err());
  }

  #[tokio::test]
  async fn static_collector_returns_its_snapshot() {
    let collector = Collector::Static(StaticCollector {
      state: Default::default(),
    });
    let collected = collector.collect().await.unwrap();
    assert!(collected.services.is_empty());
  }
}
