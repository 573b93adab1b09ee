use std::sync::OnceLock;

use crate::connection::EdgeConnections;

/// cluster id => connection, plus the published indexes.
pub fn edge_connections() -> &'static EdgeConnections {
  static CONNECTIONS: OnceLock<EdgeConnections> = OnceLock::new();
  CONNECTIONS.get_or_init(Default::default)
}
