use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Reference from a policy resource to a Service or Gateway
/// the policy should attach to.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PolicyTargetRef {
  #[serde(default)]
  pub group: String,
  pub kind: String,
  pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VirtualService {
  pub name: String,
  pub namespace: String,
  #[serde(default)]
  pub hosts: Vec<String>,
  #[serde(default)]
  pub gateways: Vec<String>,
  /// Namespaces this resource is visible to. Empty means all.
  #[serde(default)]
  pub export_to: Vec<String>,
  /// The remaining spec body, carried through for display.
  #[serde(default)]
  pub spec: serde_json::Value,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DestinationRule {
  pub name: String,
  pub namespace: String,
  #[serde(default)]
  pub host: String,
  #[serde(default)]
  pub export_to: Vec<String>,
  #[serde(default)]
  pub spec: serde_json::Value,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServiceEntry {
  pub name: String,
  pub namespace: String,
  #[serde(default)]
  pub hosts: Vec<String>,
  #[serde(default)]
  pub export_to: Vec<String>,
  #[serde(default)]
  pub spec: serde_json::Value,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Gateway {
  pub name: String,
  pub namespace: String,
  /// Label selector over gateway workloads. Empty matches all.
  #[serde(default)]
  pub selector: HashMap<String, String>,
  #[serde(default)]
  pub spec: serde_json::Value,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Sidecar {
  pub name: String,
  pub namespace: String,
  #[serde(default)]
  pub workload_selector: HashMap<String, String>,
  #[serde(default)]
  pub spec: serde_json::Value,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EnvoyFilter {
  pub name: String,
  pub namespace: String,
  #[serde(default)]
  pub workload_selector: HashMap<String, String>,
  #[serde(default)]
  pub target_refs: Vec<PolicyTargetRef>,
  #[serde(default)]
  pub spec: serde_json::Value,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WasmPlugin {
  pub name: String,
  pub namespace: String,
  #[serde(default)]
  pub selector: HashMap<String, String>,
  #[serde(default)]
  pub target_refs: Vec<PolicyTargetRef>,
  #[serde(default)]
  pub spec: serde_json::Value,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PeerAuthentication {
  pub name: String,
  pub namespace: String,
  #[serde(default)]
  pub selector: HashMap<String, String>,
  #[serde(default)]
  pub spec: serde_json::Value,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RequestAuthentication {
  pub name: String,
  pub namespace: String,
  #[serde(default)]
  pub selector: HashMap<String, String>,
  #[serde(default)]
  pub spec: serde_json::Value,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AuthorizationPolicy {
  pub name: String,
  pub namespace: String,
  #[serde(default)]
  pub selector: HashMap<String, String>,
  /// Null entries are tolerated on the wire and skipped
  /// during selection.
  #[serde(default)]
  pub target_refs: Vec<Option<PolicyTargetRef>>,
  #[serde(default)]
  pub spec: serde_json::Value,
}

/// Mesh control plane flags shipped with each cluster snapshot.
#[derive(
  Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize,
)]
pub struct IstioControlPlaneConfig {
  /// When set, pilot restricts Gateway resources to
  /// workloads in the Gateway's own namespace.
  #[serde(default)]
  pub pilot_scope_gateway_to_namespace: bool,
}

/// All Istio resources applying to one workload instance,
/// grouped by kind. The response of GetIstioResources.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IstioResources {
  pub virtual_services: Vec<VirtualService>,
  pub destination_rules: Vec<DestinationRule>,
  pub gateways: Vec<Gateway>,
  pub sidecars: Vec<Sidecar>,
  pub envoy_filters: Vec<EnvoyFilter>,
  pub service_entries: Vec<ServiceEntry>,
  pub peer_authentications: Vec<PeerAuthentication>,
  pub request_authentications: Vec<RequestAuthentication>,
  pub wasm_plugins: Vec<WasmPlugin>,
  pub authorization_policies: Vec<AuthorizationPolicy>,
}
