//! Request / response types of the manager's public read API.
//!
//! Every operation is a GET under `/api/v1alpha1`; these types are
//! shared between the axum handlers and [crate::NavigatorClient].

use serde::{Deserialize, Serialize};

use crate::entities::{
  cluster::ClusterInfo,
  istio::IstioResources,
  proxy::ProxyConfig,
  service::{AggregatedService, ServiceInstanceDetail},
};

/// Query parameters of `GET /api/v1alpha1/services`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListServicesQuery {
  /// Restrict to services in this namespace.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub namespace: Option<String>,
  /// Restrict to services present in this cluster.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub cluster_id: Option<String>,
}

pub type ListServicesResponse = Vec<AggregatedService>;

pub type GetServiceResponse = AggregatedService;

pub type GetServiceInstanceResponse = ServiceInstanceDetail;

pub type GetProxyConfigResponse = ProxyConfig;

pub type GetIstioResourcesResponse = IstioResources;

pub type ListClustersResponse = Vec<ClusterInfo>;
