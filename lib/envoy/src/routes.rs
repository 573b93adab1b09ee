use navigator_client::entities::proxy::{RouteSummary, RouteType};
use serde_json::Value;

use crate::{config_section, str_field};

pub fn summarize(dump: &Value) -> Vec<RouteSummary> {
  let Some(section) = config_section(dump, "RoutesConfigDump")
  else {
    return Vec::new();
  };

  let static_routes = section
    .get("static_route_configs")
    .and_then(Value::as_array)
    .into_iter()
    .flatten();
  let dynamic_routes = section
    .get("dynamic_route_configs")
    .and_then(Value::as_array)
    .into_iter()
    .flatten();

  static_routes
    .chain(dynamic_routes)
    .filter_map(|entry| entry.get("route_config"))
    .map(|route_config| {
      let name = str_field(route_config, "name").to_string();
      let virtual_host_count = route_config
        .get("virtual_hosts")
        .and_then(Value::as_array)
        .map(Vec::len)
        .unwrap_or_default();
      RouteSummary {
        route_type: classify(&name),
        name,
        virtual_host_count,
      }
    })
    .collect()
}

/// Route config names in Istio are either a bare port (port-based
/// catch-all), `host:port` (service specific), or a fixed name for
/// the built-in static configs.
fn classify(name: &str) -> RouteType {
  if !name.is_empty() && name.chars().all(|c| c.is_ascii_digit())
  {
    RouteType::PortBased
  } else if name.rsplit_once(':').is_some_and(|(host, port)| {
    !host.is_empty()
      && !port.is_empty()
      && port.chars().all(|c| c.is_ascii_digit())
  }) {
    RouteType::ServiceSpecific
  } else {
    RouteType::Static
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn classifies_route_names() {
    assert_eq!(classify("9080"), RouteType::PortBased);
    assert_eq!(
      classify("reviews.default.svc.cluster.local:9080"),
      RouteType::ServiceSpecific
    );
    assert_eq!(
      classify("InboundPassthroughClusterIpv4"),
      RouteType::Static
    );
    assert_eq!(classify(""), RouteType::Static);
  }
}
