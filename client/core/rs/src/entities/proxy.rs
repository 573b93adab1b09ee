use serde::{Deserialize, Serialize};

use crate::entities::wire_enum;

wire_enum! {
  /// Role of an Envoy instance, inferred from its node id.
  ProxyMode {
    Unknown = 0,
    Sidecar = 1,
    Gateway = 2,
    Router = 3,
  }
}

impl Default for ProxyMode {
  fn default() -> ProxyMode {
    ProxyMode::Unknown
  }
}

wire_enum! {
  /// Classification of an Envoy listener by its role
  /// in the mesh data / admin plane.
  ListenerType {
    VirtualInbound = 0,
    VirtualOutbound = 1,
    ServiceOutbound = 2,
    PortOutbound = 3,
    ProxyMetrics = 4,
    ProxyHealthcheck = 5,
    AdminXds = 6,
    AdminWebhook = 7,
    AdminDebug = 8,
  }
}

wire_enum! {
  /// Envoy cluster discovery type.
  ClusterType {
    Unknown = 0,
    Eds = 1,
    Static = 2,
    StrictDns = 3,
    LogicalDns = 4,
    OriginalDst = 5,
  }
}

impl Default for ClusterType {
  fn default() -> ClusterType {
    ClusterType::Unknown
  }
}

wire_enum! {
  /// Traffic direction parsed from the Istio cluster name prefix.
  ClusterDirection {
    Unspecified = 0,
    Inbound = 1,
    Outbound = 2,
  }
}

impl Default for ClusterDirection {
  fn default() -> ClusterDirection {
    ClusterDirection::Unspecified
  }
}

wire_enum! {
  /// Kind of address a listener binds.
  AddressType {
    Unknown = 0,
    Socket = 1,
    EnvoyInternal = 2,
    Pipe = 3,
  }
}

impl Default for AddressType {
  fn default() -> AddressType {
    AddressType::Unknown
  }
}

wire_enum! {
  /// Classification of a route configuration by its name.
  RouteType {
    PortBased = 0,
    ServiceSpecific = 1,
    Static = 2,
  }
}

impl Default for RouteType {
  fn default() -> RouteType {
    RouteType::Static
  }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Locality {
  #[serde(default)]
  pub region: String,
  #[serde(default)]
  pub zone: String,
  #[serde(default)]
  pub sub_zone: String,
}

/// Identity section extracted from the Envoy bootstrap.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BootstrapSummary {
  pub node_id: String,
  #[serde(default)]
  pub cluster: String,
  #[serde(default)]
  pub locality: Locality,
  #[serde(default)]
  pub proxy_mode: ProxyMode,
  /// Configured xDS sources (cluster names or addresses).
  #[serde(default)]
  pub xds_sources: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListenerSummary {
  pub name: String,
  #[serde(default)]
  pub address: String,
  #[serde(default)]
  pub address_type: AddressType,
  #[serde(default)]
  pub port: u32,
  #[serde(default)]
  pub use_original_dst: bool,
  pub listener_type: ListenerType,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClusterSummary {
  pub name: String,
  #[serde(default)]
  pub cluster_type: ClusterType,
  #[serde(default)]
  pub direction: ClusterDirection,
  /// Port from `direction|port|subset|fqdn` names.
  #[serde(default)]
  pub port: Option<u32>,
  #[serde(default)]
  pub subset: String,
  #[serde(default)]
  pub service_fqdn: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RouteSummary {
  pub name: String,
  pub route_type: RouteType,
  #[serde(default)]
  pub virtual_host_count: usize,
}

/// One upstream endpoint from the admin `/clusters` output.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EndpointSummary {
  pub cluster: String,
  pub address: String,
  #[serde(default)]
  pub port: u32,
  #[serde(default)]
  pub healthy: bool,
}

/// Normalized summary of one pod's live Envoy configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProxyConfig {
  /// Envoy version string from the bootstrap node.
  #[serde(default)]
  pub version: String,
  #[serde(default)]
  pub proxy_mode: ProxyMode,
  pub bootstrap: BootstrapSummary,
  pub listeners: Vec<ListenerSummary>,
  pub clusters: Vec<ClusterSummary>,
  pub endpoints: Vec<EndpointSummary>,
  pub routes: Vec<RouteSummary>,
  /// Original `/config_dump` body, untouched.
  #[serde(default)]
  pub raw_config_dump: String,
  /// Original `/clusters` body, untouched.
  #[serde(default)]
  pub raw_clusters: String,
}
