use navigator_client::entities::proxy::{
  BootstrapSummary, Locality, ProxyMode,
};
use serde_json::Value;

use crate::{config_section, str_field};

/// Infer the proxy's role from the `~`-separated Istio node id
/// (eg `sidecar~10.0.0.1~pod.ns~ns.svc.cluster.local`).
/// Unrecognized prefixes map to [ProxyMode::Unknown].
pub fn proxy_mode_from_node_id(node_id: &str) -> ProxyMode {
  match node_id.split('~').next().unwrap_or_default() {
    "sidecar" => ProxyMode::Sidecar,
    "gateway" => ProxyMode::Gateway,
    "router" => ProxyMode::Router,
    _ => ProxyMode::Unknown,
  }
}

fn node(dump: &Value) -> Option<&Value> {
  config_section(dump, "BootstrapConfigDump")?
    .get("bootstrap")?
    .get("node")
}

pub fn summarize(dump: &Value) -> BootstrapSummary {
  let Some(node) = node(dump) else {
    return BootstrapSummary::default();
  };

  let node_id = str_field(node, "id").to_string();
  let locality = node
    .get("locality")
    .map(|locality| Locality {
      region: str_field(locality, "region").to_string(),
      zone: str_field(locality, "zone").to_string(),
      sub_zone: str_field(locality, "sub_zone").to_string(),
    })
    .unwrap_or_default();

  BootstrapSummary {
    proxy_mode: proxy_mode_from_node_id(&node_id),
    node_id,
    cluster: str_field(node, "cluster").to_string(),
    locality,
    xds_sources: xds_sources(dump),
  }
}

/// Envoy build version from the bootstrap node, as
/// `major.minor.patch`.
pub fn version(dump: &Value) -> String {
  let Some(version) = node(dump)
    .and_then(|node| node.get("user_agent_build_version"))
    .and_then(|build| build.get("version"))
  else {
    return String::new();
  };
  let number = |field: &str| {
    version.get(field).and_then(Value::as_u64).unwrap_or_default()
  };
  format!(
    "{}.{}.{}",
    number("major_number"),
    number("minor_number"),
    number("patch")
  )
}

/// Configured ADS sources: grpc cluster names or target uris.
fn xds_sources(dump: &Value) -> Vec<String> {
  let Some(services) = config_section(dump, "BootstrapConfigDump")
    .and_then(|section| section.get("bootstrap"))
    .and_then(|bootstrap| bootstrap.get("dynamic_resources"))
    .and_then(|resources| resources.get("ads_config"))
    .and_then(|ads| ads.get("grpc_services"))
    .and_then(Value::as_array)
  else {
    return Vec::new();
  };
  services
    .iter()
    .filter_map(|service| {
      if let Some(envoy_grpc) = service.get("envoy_grpc") {
        Some(str_field(envoy_grpc, "cluster_name").to_string())
      } else {
        service.get("google_grpc").map(|google_grpc| {
          str_field(google_grpc, "target_uri").to_string()
        })
      }
    })
    .filter(|source| !source.is_empty())
    .collect()
}
