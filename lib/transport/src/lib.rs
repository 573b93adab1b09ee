//! Stream plumbing shared by the manager and edge binaries:
//! mpsc channels that serialize writes to a websocket, and
//! wrappers normalizing Tungstenite / Axum websockets behind
//! one trait.

pub mod channel;
pub mod websocket;

/// Normalize a configured manager address into a ws(s) url.
pub fn fix_ws_address(address: &str) -> String {
  let address = address.trim().trim_end_matches('/');
  if let Some(rest) = address.strip_prefix("http://") {
    format!("ws://{rest}")
  } else if let Some(rest) = address.strip_prefix("https://") {
    format!("wss://{rest}")
  } else if address.starts_with("ws://")
    || address.starts_with("wss://")
  {
    address.to_string()
  } else {
    format!("ws://{address}")
  }
}
