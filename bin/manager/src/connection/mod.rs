use std::{
  collections::HashMap,
  sync::{
    Arc, RwLock,
    atomic::{AtomicI64, Ordering},
  },
};

use anyhow::{Context, anyhow};
use arc_swap::ArcSwap;
use cache::CloneCache;
use edge_client::transport::EncodedWireMessage;
use navigator_client::entities::{
  cluster::ClusterState, proxy::ProxyConfig, unix_timestamp_ms,
};
use tokio::sync::{Mutex, oneshot};
use tokio_util::sync::CancellationToken;
use transport::channel::{Receiver, Sender, channel};
use uuid::Uuid;

use crate::indexes::{self, Indexes};

pub mod server;

/// How a pending proxy-config request resolved. Produced exactly
/// once per request: by the correlated response, by timeout, or by
/// connection teardown.
#[derive(Debug)]
pub enum ProxyConfigOutcome {
  Config(Box<ProxyConfig>),
  EdgeError(String),
  ConnectionLost,
}

/// Single-use result slot for one in-flight proxy-config request.
#[derive(Debug, Clone)]
pub struct PendingProxyRequest {
  sender:
    Arc<Mutex<Option<oneshot::Sender<ProxyConfigOutcome>>>>,
}

impl PendingProxyRequest {
  pub fn new() -> (
    PendingProxyRequest,
    oneshot::Receiver<ProxyConfigOutcome>,
  ) {
    let (sender, receiver) = oneshot::channel();
    (
      PendingProxyRequest {
        sender: Arc::new(Mutex::new(Some(sender))),
      },
      receiver,
    )
  }

  /// Consumes the slot. Returns false if it was already resolved.
  pub async fn resolve(&self, outcome: ProxyConfigOutcome) -> bool {
    let Some(sender) = self.sender.lock().await.take() else {
      return false;
    };
    sender.send(outcome).is_ok()
  }
}

/// request id => result slot
pub type PendingProxyRequests =
  CloneCache<Uuid, PendingProxyRequest>;

/// One live edge stream and the latest state it shipped.
#[derive(Debug)]
pub struct EdgeConnection {
  pub cluster_id: String,
  /// When identification was accepted (unix ms).
  pub connected_at: i64,
  last_update: AtomicI64,
  /// Enqueue outbound frames; one writer task drains these onto
  /// the websocket.
  pub sender: Sender<EncodedWireMessage>,
  /// Cancels the stream tasks.
  pub cancel: CancellationToken,
  /// Latest full snapshot. Replaced only under the registry's
  /// write lock.
  state: RwLock<Arc<ClusterState>>,
  /// In-flight proxy-config requests awaiting this edge.
  pub pending: PendingProxyRequests,
}

impl EdgeConnection {
  fn new(
    cluster_id: &str,
  ) -> (Arc<EdgeConnection>, Receiver<EncodedWireMessage>) {
    let (sender, receiver) = channel();
    (
      EdgeConnection {
        cluster_id: cluster_id.to_string(),
        connected_at: unix_timestamp_ms(),
        last_update: AtomicI64::new(0),
        sender,
        cancel: CancellationToken::new(),
        state: RwLock::new(Default::default()),
        pending: Default::default(),
      }
      .into(),
      receiver,
    )
  }

  pub fn state(&self) -> Arc<ClusterState> {
    self.state.read().unwrap_or_else(|e| e.into_inner()).clone()
  }

  fn set_state(&self, state: Arc<ClusterState>) {
    *self.state.write().unwrap_or_else(|e| e.into_inner()) =
      state;
    self
      .last_update
      .store(unix_timestamp_ms(), Ordering::Relaxed);
  }

  pub fn last_update(&self) -> i64 {
    self.last_update.load(Ordering::Relaxed)
  }

  /// Resolve every pending request as lost and cancel the stream.
  /// Called after the connection leaves the registry.
  pub async fn teardown(&self) {
    self.cancel.cancel();
    for (request_id, pending) in self.pending.drain().await {
      if !pending
        .resolve(ProxyConfigOutcome::ConnectionLost)
        .await
      {
        warn!(
          "Pending proxy config request {request_id} was already resolved during teardown"
        );
      }
    }
  }
}

pub struct Registration {
  pub connection: Arc<EdgeConnection>,
  pub receiver: Receiver<EncodedWireMessage>,
  /// The displaced connection, when duplicate registration is
  /// allowed. Must be torn down by the caller.
  pub replaced: Option<Arc<EdgeConnection>>,
}

/// The authoritative `cluster_id => connection` map plus the
/// atomically published [Indexes].
///
/// The write lock guards only the map and the state pointers;
/// it is never held across IO. Index rebuilds run inside the
/// critical section (pure CPU work) so every rebuild sees a
/// consistent snapshot; readers load the indexes pointer without
/// ever touching the lock.
#[derive(Default)]
pub struct EdgeConnections {
  connections: RwLock<HashMap<String, Arc<EdgeConnection>>>,
  indexes: ArcSwap<Indexes>,
}

impl EdgeConnections {
  /// Claim exclusive ownership of `cluster_id`. Rejects when the
  /// cluster already has a live connection, unless
  /// `allow_duplicate` displaces it.
  pub fn register(
    &self,
    cluster_id: &str,
    allow_duplicate: bool,
  ) -> anyhow::Result<Registration> {
    let mut connections =
      self.connections.write().unwrap_or_else(|e| e.into_inner());

    let replaced = match connections.get(cluster_id) {
      Some(_) if !allow_duplicate => {
        return Err(anyhow!(
          "Cluster '{cluster_id}' already has an active connection"
        ));
      }
      Some(_) => connections.remove(cluster_id),
      None => None,
    };

    let (connection, receiver) = EdgeConnection::new(cluster_id);
    connections
      .insert(cluster_id.to_string(), connection.clone());

    // A displaced connection's state must leave the indexes now.
    if replaced.is_some() {
      self.rebuild(&connections);
    }

    Ok(Registration {
      connection,
      receiver,
      replaced,
    })
  }

  /// Remove `connection` from the registry if it still owns its
  /// cluster id, and republish the indexes without it. Returns
  /// whether the entry was removed; the caller then tears the
  /// connection down.
  pub fn unregister(
    &self,
    connection: &Arc<EdgeConnection>,
  ) -> bool {
    let mut connections =
      self.connections.write().unwrap_or_else(|e| e.into_inner());
    match connections.get(&connection.cluster_id) {
      Some(current) if Arc::ptr_eq(current, connection) => {
        connections.remove(&connection.cluster_id);
        self.rebuild(&connections);
        true
      }
      _ => false,
    }
  }

  /// Replace a cluster's snapshot and republish the indexes.
  pub fn update_cluster_state(
    &self,
    cluster_id: &str,
    state: ClusterState,
  ) -> anyhow::Result<()> {
    let connections =
      self.connections.write().unwrap_or_else(|e| e.into_inner());
    let connection =
      connections.get(cluster_id).with_context(|| {
        format!("No connection for cluster '{cluster_id}'")
      })?;
    connection.set_state(Arc::new(state));
    self.rebuild(&connections);
    Ok(())
  }

  pub fn get(
    &self,
    cluster_id: &str,
  ) -> Option<Arc<EdgeConnection>> {
    self
      .connections
      .read()
      .unwrap_or_else(|e| e.into_inner())
      .get(cluster_id)
      .cloned()
  }

  pub fn list(&self) -> Vec<Arc<EdgeConnection>> {
    self
      .connections
      .read()
      .unwrap_or_else(|e| e.into_inner())
      .values()
      .cloned()
      .collect()
  }

  /// Look up under the read lock, write outside it.
  pub async fn send_to_cluster(
    &self,
    cluster_id: &str,
    message: EncodedWireMessage,
  ) -> anyhow::Result<()> {
    let connection = self.get(cluster_id).with_context(|| {
      format!("Connection to cluster '{cluster_id}' lost")
    })?;
    connection
      .sender
      .send(message)
      .await
      .with_context(|| {
        format!("Connection to cluster '{cluster_id}' lost")
      })
  }

  /// Wait-free read of the current indexes.
  pub fn indexes(&self) -> Arc<Indexes> {
    self.indexes.load_full()
  }

  /// Rebuild from scratch and publish. Only called while holding
  /// the registry lock so the input snapshot is consistent.
  fn rebuild(
    &self,
    connections: &HashMap<String, Arc<EdgeConnection>>,
  ) {
    let states = connections
      .iter()
      .map(|(cluster_id, connection)| {
        (cluster_id.clone(), connection.state())
      })
      .collect::<Vec<_>>();
    self.indexes.store(Arc::new(indexes::build(&states)));
  }
}
