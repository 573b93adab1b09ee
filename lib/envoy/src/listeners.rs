use navigator_client::entities::proxy::{
  AddressType, ListenerSummary, ListenerType,
};
use serde_json::Value;

use crate::{config_section, str_field};

pub fn summarize(dump: &Value) -> Vec<ListenerSummary> {
  let Some(section) = config_section(dump, "ListenersConfigDump")
  else {
    return Vec::new();
  };

  let static_listeners = section
    .get("static_listeners")
    .and_then(Value::as_array)
    .into_iter()
    .flatten()
    .filter_map(|entry| entry.get("listener"));
  let dynamic_listeners = section
    .get("dynamic_listeners")
    .and_then(Value::as_array)
    .into_iter()
    .flatten()
    .filter_map(|entry| entry.get("active_state")?.get("listener"));

  static_listeners
    .chain(dynamic_listeners)
    .map(summarize_listener)
    .collect()
}

fn summarize_listener(listener: &Value) -> ListenerSummary {
  let name = str_field(listener, "name").to_string();
  let use_original_dst = listener
    .get("use_original_dst")
    .and_then(Value::as_bool)
    .unwrap_or_default();
  let (address, address_type, port) = extract_address(listener);

  ListenerSummary {
    listener_type: classify(
      &name,
      &address,
      port,
      use_original_dst,
    ),
    name,
    address,
    address_type,
    port,
    use_original_dst,
  }
}

fn extract_address(
  listener: &Value,
) -> (String, AddressType, u32) {
  let Some(address) = listener.get("address") else {
    return (String::new(), AddressType::Unknown, 0);
  };
  if let Some(socket) = address.get("socket_address") {
    let port = socket
      .get("port_value")
      .and_then(Value::as_u64)
      .unwrap_or_default() as u32;
    (
      str_field(socket, "address").to_string(),
      AddressType::Socket,
      port,
    )
  } else if let Some(pipe) = address.get("pipe") {
    (
      str_field(pipe, "path").to_string(),
      AddressType::Pipe,
      0,
    )
  } else if let Some(internal) =
    address.get("envoy_internal_address")
  {
    (
      str_field(internal, "server_listener_name").to_string(),
      AddressType::EnvoyInternal,
      0,
    )
  } else {
    (String::new(), AddressType::Unknown, 0)
  }
}

/// Classify by name pattern first, then by the original-dst
/// virtual ports, then by the well-known Istio agent / pilot
/// ports, then by bind address shape.
fn classify(
  name: &str,
  address: &str,
  port: u32,
  use_original_dst: bool,
) -> ListenerType {
  match name {
    "virtualInbound" => return ListenerType::VirtualInbound,
    "virtualOutbound" => return ListenerType::VirtualOutbound,
    _ => {}
  }
  if use_original_dst {
    return match port {
      15006 => ListenerType::VirtualInbound,
      _ => ListenerType::VirtualOutbound,
    };
  }
  match port {
    15090 => return ListenerType::ProxyMetrics,
    15021 => return ListenerType::ProxyHealthcheck,
    15010 | 15012 => return ListenerType::AdminXds,
    15017 => return ListenerType::AdminWebhook,
    15000 | 15004 => return ListenerType::AdminDebug,
    _ => {}
  }
  if is_wildcard(address) {
    ListenerType::PortOutbound
  } else {
    ListenerType::ServiceOutbound
  }
}

fn is_wildcard(address: &str) -> bool {
  matches!(address, "" | "0.0.0.0" | "::" | "[::]")
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn classification_by_name_port_and_address() {
    assert_eq!(
      classify("virtualInbound", "0.0.0.0", 15006, true),
      ListenerType::VirtualInbound
    );
    assert_eq!(
      classify("virtualOutbound", "0.0.0.0", 15001, true),
      ListenerType::VirtualOutbound
    );
    // Unnamed original-dst listeners fall back to their port.
    assert_eq!(
      classify("", "0.0.0.0", 15001, true),
      ListenerType::VirtualOutbound
    );
    assert_eq!(
      classify("", "0.0.0.0", 15006, true),
      ListenerType::VirtualInbound
    );
    assert_eq!(
      classify("15090", "0.0.0.0", 15090, false),
      ListenerType::ProxyMetrics
    );
    assert_eq!(
      classify("health", "0.0.0.0", 15021, false),
      ListenerType::ProxyHealthcheck
    );
    assert_eq!(
      classify("xds", "0.0.0.0", 15012, false),
      ListenerType::AdminXds
    );
    assert_eq!(
      classify("webhook", "0.0.0.0", 15017, false),
      ListenerType::AdminWebhook
    );
    assert_eq!(
      classify("admin", "127.0.0.1", 15000, false),
      ListenerType::AdminDebug
    );
    assert_eq!(
      classify("0.0.0.0_8080", "0.0.0.0", 8080, false),
      ListenerType::PortOutbound
    );
    assert_eq!(
      classify("10.96.0.10_9090", "10.96.0.10", 9090, false),
      ListenerType::ServiceOutbound
    );
  }
}
