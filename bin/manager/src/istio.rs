//! Resolution of the Istio resources applying to one workload
//! instance: build the workload context from the indexed instance
//! and run every per-kind filter against the owning cluster's
//! snapshot.

use navigator_client::entities::{
  istio::IstioResources, parse_instance_id,
};
use selection::Workload;

use crate::{
  config::manager_config, error::ApiError,
  state::edge_connections,
};

pub fn get_istio_resources(
  service_id: &str,
  instance_id: &str,
) -> Result<IstioResources, ApiError> {
  let id = parse_instance_id(instance_id)
    .map_err(|e| ApiError::InvalidArgument(format!("{e:#}")))?;

  let indexes = edge_connections().indexes();
  if !indexes.services.contains_key(service_id) {
    return Err(ApiError::NotFound(format!(
      "No service '{service_id}'"
    )));
  }
  let instance =
    indexes.instances.get(instance_id).ok_or_else(|| {
      ApiError::NotFound(format!(
        "No instance '{instance_id}'"
      ))
    })?;

  let connection = edge_connections()
    .get(&id.cluster_id)
    .ok_or_else(|| {
      ApiError::Unavailable(format!(
        "Connection to cluster '{}' lost",
        id.cluster_id
      ))
    })?;
  let state = connection.state();

  let mut workload = Workload {
    labels: instance.labels.clone(),
    namespace: instance.namespace.clone(),
    bound_services: instance.services.clone(),
    bound_gateways: Vec::new(),
    proxy_type: instance.proxy_type,
    root_namespace: manager_config()
      .istio_root_namespace
      .clone(),
    pilot_scope_gateway_to_namespace: state
      .istio_control_plane_config
      .pilot_scope_gateway_to_namespace,
  };

  // The gateways selecting this workload double as its gateway
  // bindings for targetRef resolution.
  let gateways = selection::gateways(&state.gateways, &workload);
  workload.bound_gateways =
    gateways.iter().map(|gateway| gateway.name.clone()).collect();

  Ok(IstioResources {
    virtual_services: selection::virtual_services(
      &state.virtual_services,
      &workload,
    ),
    destination_rules: selection::destination_rules(
      &state.destination_rules,
      &workload,
    ),
    gateways,
    sidecars: selection::sidecars(&state.sidecars, &workload),
    envoy_filters: selection::envoy_filters(
      &state.envoy_filters,
      &workload,
    ),
    service_entries: selection::service_entries(
      &state.service_entries,
      &workload,
    ),
    peer_authentications: selection::peer_authentications(
      &state.peer_authentications,
      &workload,
    ),
    request_authentications: selection::request_authentications(
      &state.request_authentications,
      &workload,
    ),
    wasm_plugins: selection::wasm_plugins(
      &state.wasm_plugins,
      &workload,
    ),
    authorization_policies: selection::authorization_policies(
      &state.authorization_policies,
      &workload,
    ),
  })
}
