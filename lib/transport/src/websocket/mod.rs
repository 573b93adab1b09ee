//! Wrappers to normalize behavior of websockets between Tungstenite and Axum

use bytes::Bytes;
use edge_client::transport::EncodedWireMessage;
use tokio_util::sync::CancellationToken;

pub mod axum;
pub mod tungstenite;

/// Flattened websocket message possibilites
/// for easier handling.
pub enum WebsocketMessage {
  /// Standard message
  Message(EncodedWireMessage),
  /// Keepalive probe
  Ping,
  /// Graceful close message
  Close,
  /// Stream closed
  Closed,
}

/// Standard traits for websocket
pub trait Websocket: Send {
  /// Abstraction over websocket splitting
  fn split(self) -> (impl WebsocketSender, impl WebsocketReceiver);

  fn send(
    &mut self,
    bytes: Bytes,
  ) -> impl Future<Output = anyhow::Result<()>> + Send;

  /// Send close message
  fn close(
    &mut self,
  ) -> impl Future<Output = anyhow::Result<()>> + Send;

  /// Receive the next significant websocket message.
  fn recv(
    &mut self,
  ) -> impl Future<Output = anyhow::Result<WebsocketMessage>> + Send;
}

/// Traits for split websocket sender
pub trait WebsocketSender: Send {
  /// Keepalive probe
  fn ping(
    &mut self,
  ) -> impl Future<Output = anyhow::Result<()>> + Send;

  /// Streamlined sending of bytes
  fn send(
    &mut self,
    bytes: Bytes,
  ) -> impl Future<Output = anyhow::Result<()>> + Send;

  /// Send close message
  fn close(
    &mut self,
  ) -> impl Future<Output = anyhow::Result<()>> + Send;
}

/// Traits for split websocket receiver
pub trait WebsocketReceiver: Send {
  /// Cancellation sensitive receive.
  fn set_cancel(&mut self, cancel: CancellationToken);

  /// Receive the next significant websocket message.
  /// Must implement cancel support.
  fn recv(
    &mut self,
  ) -> impl Future<Output = anyhow::Result<WebsocketMessage>> + Send;
}
