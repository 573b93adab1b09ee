use serde::{Deserialize, Serialize};

use crate::entities::{
  I64,
  istio::{
    AuthorizationPolicy, DestinationRule, EnvoyFilter, Gateway,
    IstioControlPlaneConfig, PeerAuthentication,
    RequestAuthentication, ServiceEntry, Sidecar, VirtualService,
    WasmPlugin,
  },
  service::Service,
  wire_enum,
};

/// The full snapshot of one cluster, shipped edge -> manager.
/// Always replaces the previous snapshot wholesale, never a delta.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClusterState {
  #[serde(default)]
  pub services: Vec<Service>,
  #[serde(default)]
  pub virtual_services: Vec<VirtualService>,
  #[serde(default)]
  pub destination_rules: Vec<DestinationRule>,
  #[serde(default)]
  pub gateways: Vec<Gateway>,
  #[serde(default)]
  pub sidecars: Vec<Sidecar>,
  #[serde(default)]
  pub envoy_filters: Vec<EnvoyFilter>,
  #[serde(default)]
  pub service_entries: Vec<ServiceEntry>,
  #[serde(default)]
  pub peer_authentications: Vec<PeerAuthentication>,
  #[serde(default)]
  pub request_authentications: Vec<RequestAuthentication>,
  #[serde(default)]
  pub wasm_plugins: Vec<WasmPlugin>,
  #[serde(default)]
  pub authorization_policies: Vec<AuthorizationPolicy>,
  #[serde(default)]
  pub istio_control_plane_config: IstioControlPlaneConfig,
}

wire_enum! {
  /// Freshness of a cluster's state relative to its sync interval.
  SyncStatus {
    Unspecified = 0,
    Healthy = 1,
    Stale = 2,
    Disconnected = 3,
  }
}

impl Default for SyncStatus {
  fn default() -> SyncStatus {
    SyncStatus::Unspecified
  }
}

impl SyncStatus {
  /// Derive freshness from the age of the last update.
  /// `healthy_multiplier` and `stale_multiplier` scale the
  /// configured sync interval.
  pub fn derive(
    age_ms: I64,
    sync_interval_ms: I64,
    healthy_multiplier: I64,
    stale_multiplier: I64,
  ) -> SyncStatus {
    if age_ms <= healthy_multiplier * sync_interval_ms {
      SyncStatus::Healthy
    } else if age_ms <= stale_multiplier * sync_interval_ms {
      SyncStatus::Stale
    } else {
      SyncStatus::Disconnected
    }
  }
}

/// One entry of the ListClusters response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClusterInfo {
  pub cluster_id: String,
  /// When the edge stream was accepted (unix ms).
  pub connected_at: I64,
  /// When the last ClusterState arrived (unix ms).
  pub last_update: I64,
  pub service_count: usize,
  pub sync_status: SyncStatus,
}
