use navigator_client::entities::proxy::{
  ClusterDirection, ClusterSummary, ClusterType, EndpointSummary,
};
use serde_json::Value;

use crate::{config_section, str_field};

pub fn summarize(dump: &Value) -> Vec<ClusterSummary> {
  let Some(section) = config_section(dump, "ClustersConfigDump")
  else {
    return Vec::new();
  };

  let static_clusters = section
    .get("static_clusters")
    .and_then(Value::as_array)
    .into_iter()
    .flatten();
  let dynamic_clusters = section
    .get("dynamic_active_clusters")
    .and_then(Value::as_array)
    .into_iter()
    .flatten();

  static_clusters
    .chain(dynamic_clusters)
    .filter_map(|entry| entry.get("cluster"))
    .map(summarize_cluster)
    .collect()
}

fn summarize_cluster(cluster: &Value) -> ClusterSummary {
  let name = str_field(cluster, "name").to_string();
  let cluster_type =
    match str_field(cluster, "type") {
      "EDS" => ClusterType::Eds,
      "STATIC" => ClusterType::Static,
      "STRICT_DNS" => ClusterType::StrictDns,
      "LOGICAL_DNS" => ClusterType::LogicalDns,
      "ORIGINAL_DST" => ClusterType::OriginalDst,
      _ => ClusterType::Unknown,
    };
  let (direction, port, subset, service_fqdn) = parse_name(&name);

  ClusterSummary {
    name,
    cluster_type,
    direction,
    port,
    subset,
    service_fqdn,
  }
}

/// Istio cluster names follow `direction|port|subset|fqdn`.
/// Anything else is direction-unspecified.
fn parse_name(
  name: &str,
) -> (ClusterDirection, Option<u32>, String, String) {
  let mut parts = name.split('|');
  let direction = match parts.next() {
    Some("inbound") => ClusterDirection::Inbound,
    Some("outbound") => ClusterDirection::Outbound,
    _ => {
      return (
        ClusterDirection::Unspecified,
        None,
        String::new(),
        String::new(),
      );
    }
  };
  let port =
    parts.next().and_then(|port| port.parse::<u32>().ok());
  let subset = parts.next().unwrap_or_default().to_string();
  let service_fqdn = parts.next().unwrap_or_default().to_string();
  (direction, port, subset, service_fqdn)
}

/// Endpoints from the admin `/clusters?format=json` body.
/// An unparseable body yields no endpoints; the raw text is
/// preserved on the [navigator_client::entities::proxy::ProxyConfig]
/// either way.
pub fn endpoints(clusters_output: &str) -> Vec<EndpointSummary> {
  let Ok(parsed) =
    serde_json::from_str::<Value>(clusters_output)
  else {
    return Vec::new();
  };
  let Some(statuses) = parsed
    .get("cluster_statuses")
    .and_then(Value::as_array)
  else {
    return Vec::new();
  };

  let mut endpoints = Vec::new();
  for status in statuses {
    let cluster = str_field(status, "name");
    let hosts = status
      .get("host_statuses")
      .and_then(Value::as_array)
      .into_iter()
      .flatten();
    for host in hosts {
      let Some(socket) = host
        .get("address")
        .and_then(|address| address.get("socket_address"))
      else {
        continue;
      };
      let healthy = host
        .get("health_status")
        .map(|health| {
          str_field(health, "eds_health_status") == "HEALTHY"
        })
        .unwrap_or_default();
      endpoints.push(EndpointSummary {
        cluster: cluster.to_string(),
        address: str_field(socket, "address").to_string(),
        port: socket
          .get("port_value")
          .and_then(Value::as_u64)
          .unwrap_or_default() as u32,
        healthy,
      });
    }
  }
  endpoints
}
