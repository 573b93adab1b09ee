//! Normalizer for Envoy admin output.
//!
//! Consumes the `/config_dump` JSON and the `/clusters?format=json`
//! body of one proxy and produces the typed [ProxyConfig] summary.
//! Missing sections produce empty lists; only an unparseable body
//! is an error.

use anyhow::Context;
use navigator_client::entities::proxy::ProxyConfig;
use serde_json::Value;

mod bootstrap;
mod clusters;
mod listeners;
mod routes;

pub use bootstrap::proxy_mode_from_node_id;

/// Build the normalized [ProxyConfig] from raw admin output.
pub fn normalize(
  config_dump: &str,
  clusters_output: &str,
) -> anyhow::Result<ProxyConfig> {
  let dump: Value = serde_json::from_str(config_dump)
    .context("Failed to parse Envoy config dump")?;

  let bootstrap = bootstrap::summarize(&dump);
  let version = bootstrap::version(&dump);
  let proxy_mode = bootstrap.proxy_mode;

  Ok(ProxyConfig {
    version,
    proxy_mode,
    bootstrap,
    listeners: listeners::summarize(&dump),
    clusters: clusters::summarize(&dump),
    endpoints: clusters::endpoints(clusters_output),
    routes: routes::summarize(&dump),
    raw_config_dump: config_dump.to_string(),
    raw_clusters: clusters_output.to_string(),
  })
}

/// The `configs` sections of a dump, keyed by trailing `@type`
/// name (eg `BootstrapConfigDump`).
fn config_section<'a>(
  dump: &'a Value,
  section: &str,
) -> Option<&'a Value> {
  dump.get("configs")?.as_array()?.iter().find(|config| {
    config
      .get("@type")
      .and_then(Value::as_str)
      .is_some_and(|type_url| type_url.ends_with(section))
  })
}

fn str_field<'a>(value: &'a Value, field: &str) -> &'a str {
  value.get(field).and_then(Value::as_str).unwrap_or_default()
}

#[cfg(test)]
mod tests {
  use navigator_client::entities::proxy::{
    ClusterDirection, ClusterType, ListenerType, ProxyMode,
    RouteType,
  };

  use super::*;

  const CONFIG_DUMP: &str = r#"{
    "configs": [
      {
        "@type": "type.googleapis.com/envoy.admin.v3.BootstrapConfigDump",
        "bootstrap": {
          "node": {
            "id": "sidecar~10.0.0.1~pod1.default~default.svc.cluster.local",
            "cluster": "svc1.default",
            "locality": { "region": "us-east-1", "zone": "us-east-1a" },
            "user_agent_build_version": {
              "version": { "major_number": 1, "minor_number": 22, "patch": 1 }
            }
          },
          "dynamic_resources": {
            "ads_config": {
              "grpc_services": [
                { "envoy_grpc": { "cluster_name": "xds-grpc" } }
              ]
            }
          }
        }
      },
      {
        "@type": "type.googleapis.com/envoy.admin.v3.ListenersConfigDump",
        "dynamic_listeners": [
          {
            "name": "virtualOutbound",
            "active_state": {
              "listener": {
                "name": "virtualOutbound",
                "address": { "socket_address": { "address": "0.0.0.0", "port_value": 15001 } },
                "use_original_dst": true
              }
            }
          },
          {
            "name": "virtualInbound",
            "active_state": {
              "listener": {
                "name": "virtualInbound",
                "address": { "socket_address": { "address": "0.0.0.0", "port_value": 15006 } }
              }
            }
          },
          {
            "name": "10.96.0.10_9090",
            "active_state": {
              "listener": {
                "name": "10.96.0.10_9090",
                "address": { "socket_address": { "address": "10.96.0.10", "port_value": 9090 } }
              }
            }
          },
          {
            "name": "0.0.0.0_8080",
            "active_state": {
              "listener": {
                "name": "0.0.0.0_8080",
                "address": { "socket_address": { "address": "0.0.0.0", "port_value": 8080 } }
              }
            }
          },
          {
            "name": "15090",
            "active_state": {
              "listener": {
                "name": "15090",
                "address": { "socket_address": { "address": "0.0.0.0", "port_value": 15090 } }
              }
            }
          }
        ]
      },
      {
        "@type": "type.googleapis.com/envoy.admin.v3.ClustersConfigDump",
        "static_clusters": [
          {
            "cluster": {
              "name": "prometheus_stats",
              "type": "STATIC"
            }
          }
        ],
        "dynamic_active_clusters": [
          {
            "cluster": {
              "name": "outbound|9080|v1|reviews.default.svc.cluster.local",
              "type": "EDS"
            }
          },
          {
            "cluster": {
              "name": "inbound|8080||",
              "type": "ORIGINAL_DST"
            }
          }
        ]
      },
      {
        "@type": "type.googleapis.com/envoy.admin.v3.RoutesConfigDump",
        "static_route_configs": [
          {
            "route_config": {
              "name": "InboundPassthroughClusterIpv4",
              "virtual_hosts": [ {} ]
            }
          }
        ],
        "dynamic_route_configs": [
          {
            "route_config": {
              "name": "9080",
              "virtual_hosts": [ {}, {} ]
            }
          },
          {
            "route_config": {
              "name": "reviews.default.svc.cluster.local:9080",
              "virtual_hosts": [ {} ]
            }
          }
        ]
      }
    ]
  }"#;

  const CLUSTERS_JSON: &str = r#"{
    "cluster_statuses": [
      {
        "name": "outbound|9080|v1|reviews.default.svc.cluster.local",
        "host_statuses": [
          {
            "address": { "socket_address": { "address": "10.0.0.7", "port_value": 9080 } },
            "health_status": { "eds_health_status": "HEALTHY" }
          },
          {
            "address": { "socket_address": { "address": "10.0.0.8", "port_value": 9080 } },
            "health_status": { "eds_health_status": "UNHEALTHY" }
          }
        ]
      }
    ]
  }"#;

  #[test]
  fn normalizes_full_dump() {
    let config = normalize(CONFIG_DUMP, CLUSTERS_JSON).unwrap();

    assert_eq!(config.version, "1.22.1");
    assert_eq!(config.proxy_mode, ProxyMode::Sidecar);
    assert_eq!(
      config.bootstrap.node_id,
      "sidecar~10.0.0.1~pod1.default~default.svc.cluster.local"
    );
    assert_eq!(config.bootstrap.cluster, "svc1.default");
    assert_eq!(config.bootstrap.locality.region, "us-east-1");
    assert_eq!(
      config.bootstrap.xds_sources,
      vec!["xds-grpc".to_string()]
    );

    let types = config
      .listeners
      .iter()
      .map(|listener| (listener.name.as_str(), listener.listener_type))
      .collect::<Vec<_>>();
    assert_eq!(
      types,
      vec![
        ("virtualOutbound", ListenerType::VirtualOutbound),
        ("virtualInbound", ListenerType::VirtualInbound),
        ("10.96.0.10_9090", ListenerType::ServiceOutbound),
        ("0.0.0.0_8080", ListenerType::PortOutbound),
        ("15090", ListenerType::ProxyMetrics),
      ]
    );

    let outbound = &config.clusters[1];
    assert_eq!(outbound.cluster_type, ClusterType::Eds);
    assert_eq!(outbound.direction, ClusterDirection::Outbound);
    assert_eq!(outbound.port, Some(9080));
    assert_eq!(outbound.subset, "v1");
    assert_eq!(
      outbound.service_fqdn,
      "reviews.default.svc.cluster.local"
    );
    let inbound = &config.clusters[2];
    assert_eq!(inbound.direction, ClusterDirection::Inbound);
    assert_eq!(
      inbound.cluster_type,
      ClusterType::OriginalDst
    );
    assert_eq!(
      config.clusters[0].direction,
      ClusterDirection::Unspecified
    );

    let routes = config
      .routes
      .iter()
      .map(|route| (route.name.as_str(), route.route_type))
      .collect::<Vec<_>>();
    assert_eq!(
      routes,
      vec![
        ("InboundPassthroughClusterIpv4", RouteType::Static),
        ("9080", RouteType::PortBased),
        (
          "reviews.default.svc.cluster.local:9080",
          RouteType::ServiceSpecific
        ),
      ]
    );

    assert_eq!(config.endpoints.len(), 2);
    assert!(config.endpoints[0].healthy);
    assert!(!config.endpoints[1].healthy);
    assert_eq!(config.endpoints[0].address, "10.0.0.7");

    assert_eq!(config.raw_config_dump, CONFIG_DUMP);
    assert_eq!(config.raw_clusters, CLUSTERS_JSON);
  }

  #[test]
  fn missing_sections_produce_empty_lists() {
    let config = normalize(r#"{"configs": []}"#, "").unwrap();
    assert!(config.listeners.is_empty());
    assert!(config.clusters.is_empty());
    assert!(config.routes.is_empty());
    assert!(config.endpoints.is_empty());
    assert_eq!(config.proxy_mode, ProxyMode::Unknown);
  }

  #[test]
  fn unparseable_dump_is_an_error() {
    assert!(normalize("not json", "").is_err());
  }
}
