use std::collections::HashMap;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use strum::Display;

use crate::entities::{I64, service_id};

/// A Kubernetes service as discovered inside a single cluster.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Service {
  pub name: String,
  pub namespace: String,
  /// The in-cluster virtual ip, if assigned.
  #[serde(default)]
  pub cluster_ip: Option<String>,
  /// The externally reachable ip, if assigned.
  #[serde(default)]
  pub external_ip: Option<String>,
  /// Kubernetes service type (ClusterIP, NodePort, LoadBalancer, ...)
  #[serde(default)]
  pub service_type: String,
  /// The backing workload instances.
  #[serde(default)]
  pub instances: Vec<ServiceInstance>,
}

impl Service {
  pub fn id(&self) -> String {
    service_id(&self.namespace, &self.name)
  }
}

/// A single pod backing one or more services.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServiceInstance {
  pub ip: String,
  pub pod_name: String,
  pub namespace: String,
  /// The owning cluster. Filled by the manager from the
  /// connection registry key on every rebuild.
  #[serde(default)]
  pub cluster_name: String,
  /// Whether an Envoy proxy runs beside the workload.
  #[serde(default)]
  pub envoy_present: bool,
  #[serde(default)]
  pub pod_status: String,
  #[serde(default)]
  pub node_name: String,
  /// Pod creation timestamp (unix ms).
  #[serde(default)]
  pub created_at: I64,
  #[serde(default)]
  pub labels: HashMap<String, String>,
  #[serde(default)]
  pub annotations: HashMap<String, String>,
  #[serde(default)]
  pub containers: Vec<Container>,
  #[serde(default)]
  pub proxy_type: ProxyType,
  /// Names of the services this instance is a backend of.
  #[serde(default)]
  pub services: Vec<String>,
}

impl ServiceInstance {
  /// The global instance id: `{cluster_id}:{namespace}:{pod_name}`.
  pub fn id(&self) -> String {
    format!(
      "{}:{}:{}",
      self.cluster_name, self.namespace, self.pod_name
    )
  }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Container {
  pub name: String,
  #[serde(default)]
  pub image: String,
  #[serde(default)]
  pub status: String,
  #[serde(default)]
  pub ready: bool,
  #[serde(default)]
  pub restart_count: i32,
}

/// The role of the proxy attached to a workload instance,
/// as discovered from pod metadata.
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
pub enum ProxyType {
  #[default]
  None,
  Sidecar,
  Gateway,
  Router,
}

/// The across-cluster view of one `{namespace}:{name}` service.
/// Instances are held by value; the per-cluster maps reference
/// them by stable instance id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AggregatedService {
  pub id: String,
  pub name: String,
  pub namespace: String,
  /// All instances across every connected cluster.
  pub instances: Vec<ServiceInstance>,
  /// cluster id -> instance ids contributed by that cluster.
  pub cluster_map: IndexMap<String, Vec<String>>,
  /// cluster id -> cluster ip in that cluster, where assigned.
  pub cluster_ips: IndexMap<String, String>,
  /// cluster id -> external ip in that cluster, where assigned.
  pub external_ips: IndexMap<String, String>,
}

/// Detailed single-instance view returned by GetServiceInstance.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServiceInstanceDetail {
  pub instance_id: String,
  pub service_id: String,
  pub cluster_name: String,
  pub ip: String,
  pub pod_name: String,
  pub namespace: String,
  pub pod_status: String,
  pub node_name: String,
  pub created_at: I64,
  pub envoy_present: bool,
  /// Mirrors `envoy_present`.
  pub is_envoy_present: bool,
  pub proxy_type: ProxyType,
  pub labels: HashMap<String, String>,
  pub annotations: HashMap<String, String>,
  pub containers: Vec<Container>,
}

impl ServiceInstanceDetail {
  pub fn from_instance(
    instance: &ServiceInstance,
    service_id: String,
  ) -> ServiceInstanceDetail {
    ServiceInstanceDetail {
      instance_id: instance.id(),
      service_id,
      cluster_name: instance.cluster_name.clone(),
      ip: instance.ip.clone(),
      pod_name: instance.pod_name.clone(),
      namespace: instance.namespace.clone(),
      pod_status: instance.pod_status.clone(),
      node_name: instance.node_name.clone(),
      created_at: instance.created_at,
      envoy_present: instance.envoy_present,
      is_envoy_present: instance.envoy_present,
      proxy_type: instance.proxy_type,
      labels: instance.labels.clone(),
      annotations: instance.annotations.clone(),
      containers: instance.containers.clone(),
    }
  }
}
