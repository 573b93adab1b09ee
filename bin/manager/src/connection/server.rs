use std::sync::Arc;

use axum::{
  Router,
  extract::{WebSocketUpgrade, ws::WebSocket},
  response::Response,
  routing::get,
};
use edge_client::transport::{
  ClusterIdentification, ConnectionAck, EdgeMessage,
  EncodedWireMessage, ManagerMessage, ProxyConfigResponse,
  WireError,
};
use navigator_client::entities::ErrorCode;
use transport::websocket::{
  Websocket, WebsocketMessage, WebsocketReceiver as _,
  WebsocketSender as _, axum::AxumWebsocket,
};

use crate::{
  config::manager_config,
  connection::{EdgeConnection, ProxyConfigOutcome},
  state::edge_connections,
};

pub fn router() -> Router {
  Router::new().route("/edge", get(ws_handler))
}

async fn ws_handler(ws: WebSocketUpgrade) -> Response {
  ws.on_upgrade(|socket: WebSocket| async move {
    handle_socket(AxumWebsocket(socket)).await
  })
}

/// Drive one edge stream to completion: identification first,
/// then state snapshots and proxy-config replies until the stream
/// dies.
async fn handle_socket<W: Websocket>(mut socket: W) {
  let config = manager_config();

  let identify = match recv_identification(&mut socket).await {
    Ok(identify) => identify,
    Err(e) => {
      warn!("Edge connection failed identification | {e:#}");
      let _ = send_error(
        &mut socket,
        ErrorCode::InvalidArgument,
        format!("{e:#}"),
      )
      .await;
      let _ = socket.close().await;
      return;
    }
  };
  let cluster_id = identify.cluster_id;

  let registration = match edge_connections().register(
    &cluster_id,
    config.allow_duplicate_cluster_registration,
  ) {
    Ok(registration) => registration,
    Err(e) => {
      info!(
        "Rejecting duplicate edge for cluster {cluster_id} | {e:#}"
      );
      let _ = send_error(
        &mut socket,
        ErrorCode::AlreadyExists,
        format!("{e:#}"),
      )
      .await;
      let _ = socket.close().await;
      return;
    }
  };
  let connection = registration.connection;
  let mut receiver = registration.receiver;
  if let Some(replaced) = registration.replaced {
    replaced.teardown().await;
  }

  let ack = ManagerMessage::Ack(ConnectionAck { accepted: true });
  match ack.encode() {
    Ok(encoded) => {
      if let Err(e) = socket.send(encoded.into_bytes()).await {
        warn!(
          "Failed to ack edge for cluster {cluster_id} | {e:#}"
        );
        finish(&connection).await;
        return;
      }
    }
    Err(e) => {
      error!("Failed to encode connection ack | {e:#}");
      finish(&connection).await;
      return;
    }
  }

  info!("Edge connected for cluster {cluster_id}");

  let cancel = connection.cancel.child_token();
  let (mut ws_write, mut ws_read) = socket.split();
  ws_read.set_cancel(cancel.clone());
  receiver.set_cancel(cancel.clone());

  let forward_writes = async {
    loop {
      let Ok(message) = receiver.recv().await else {
        break;
      };
      if let Err(e) = ws_write.send(message.into_bytes()).await {
        warn!(
          "Failed to send to edge for cluster {cluster_id} | {e:#}"
        );
        break;
      }
    }
    let _ = ws_write.close().await;
    cancel.cancel();
  };

  let handle_reads = async {
    loop {
      match ws_read.recv().await {
        Ok(WebsocketMessage::Message(message)) => {
          handle_message(&connection, message).await
        }
        Ok(WebsocketMessage::Ping) => continue,
        Ok(WebsocketMessage::Close)
        | Ok(WebsocketMessage::Closed) => break,
        Err(e) => {
          warn!(
            "Edge stream error for cluster {cluster_id} | {e:#}"
          );
          break;
        }
      }
    }
    cancel.cancel();
  };

  tokio::join!(forward_writes, handle_reads);

  finish(&connection).await;
  info!("Edge disconnected for cluster {cluster_id}");
}

/// Unregister (if this connection still owns its cluster) and
/// fail whatever was pending on it.
async fn finish(connection: &Arc<EdgeConnection>) {
  edge_connections().unregister(connection);
  connection.teardown().await;
}

async fn recv_identification<W: Websocket>(
  socket: &mut W,
) -> anyhow::Result<ClusterIdentification> {
  let received = tokio::time::timeout(
    std::time::Duration::from_secs(30),
    socket.recv(),
  )
  .await
  .map_err(|_| {
    anyhow::anyhow!("Timed out waiting for identification")
  })?;
  let message = match received? {
    WebsocketMessage::Message(message) => message,
    _ => {
      return Err(anyhow::anyhow!(
        "Stream closed before identification"
      ));
    }
  };
  match EdgeMessage::decode(
    message,
    manager_config().max_message_size_bytes,
  )? {
    EdgeMessage::Identify(identify)
      if !identify.cluster_id.is_empty() =>
    {
      Ok(identify)
    }
    EdgeMessage::Identify(_) => {
      Err(anyhow::anyhow!("Identification with empty cluster id"))
    }
    _ => Err(anyhow::anyhow!(
      "First message must be ClusterIdentification"
    )),
  }
}

async fn send_error<W: Websocket>(
  socket: &mut W,
  error_code: ErrorCode,
  error_message: String,
) -> anyhow::Result<()> {
  let message = ManagerMessage::Error(WireError {
    error_code,
    error_message,
  })
  .encode()?;
  socket.send(message.into_bytes()).await
}

async fn handle_message(
  connection: &Arc<EdgeConnection>,
  message: EncodedWireMessage,
) {
  let message = match EdgeMessage::decode(
    message,
    manager_config().max_message_size_bytes,
  ) {
    Ok(message) => message,
    Err(e) => {
      warn!(
        "Failed to decode message from cluster {} | {e:#}",
        connection.cluster_id
      );
      return;
    }
  };
  match message {
    EdgeMessage::State(state) => {
      if let Err(e) = edge_connections()
        .update_cluster_state(&connection.cluster_id, *state)
      {
        warn!(
          "Failed to apply state for cluster {} | {e:#}",
          connection.cluster_id
        );
      }
    }
    EdgeMessage::ProxyConfigResponse(response) => {
      handle_proxy_config_response(connection, response).await
    }
    EdgeMessage::Identify(_) => {
      warn!(
        "Cluster {} sent identification twice",
        connection.cluster_id
      );
    }
  }
}

/// Hand a correlated response to whoever is waiting on it.
/// Unknown ids were already resolved (timeout) and are discarded.
pub(crate) async fn handle_proxy_config_response(
  connection: &Arc<EdgeConnection>,
  response: ProxyConfigResponse,
) {
  let Some(pending) =
    connection.pending.remove(&response.request_id).await
  else {
    warn!(
      "Discarding proxy config response with unknown request id {} from cluster {}",
      response.request_id, connection.cluster_id
    );
    return;
  };
  let outcome = match (response.proxy_config, response.error_message)
  {
    (Some(proxy_config), _) => {
      ProxyConfigOutcome::Config(Box::new(proxy_config))
    }
    (None, Some(error_message)) => {
      ProxyConfigOutcome::EdgeError(error_message)
    }
    (None, None) => ProxyConfigOutcome::EdgeError(
      "Edge response carried no proxy config".to_string(),
    ),
  };
  pending.resolve(outcome).await;
}

#[cfg(test)]
mod tests {
  use std::time::Duration;

  use edge_client::{
    DEFAULT_MAX_MESSAGE_SIZE_BYTES,
    transport::ClusterIdentification,
  };
  use navigator_client::entities::{
    cluster::ClusterState,
    service::{Service, ServiceInstance},
  };
  use transport::websocket::tungstenite::TungsteniteWebsocket;

  use super::*;

  async fn spawn_server() -> String {
    let listener =
      tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
      axum::serve(listener, crate::api::app()).await.unwrap();
    });
    format!("ws://{addr}/ws/edge")
  }

  async fn identify(
    socket: &mut TungsteniteWebsocket,
    cluster_id: &str,
  ) -> ManagerMessage {
    let identification =
      EdgeMessage::Identify(ClusterIdentification {
        cluster_id: cluster_id.to_string(),
      })
      .encode()
      .unwrap();
    socket.send(identification.into_bytes()).await.unwrap();
    loop {
      match socket.recv().await.unwrap() {
        WebsocketMessage::Message(message) => {
          return ManagerMessage::decode(
            message,
            DEFAULT_MAX_MESSAGE_SIZE_BYTES,
          )
          .unwrap();
        }
        WebsocketMessage::Ping => continue,
        _ => panic!("stream closed during identification"),
      }
    }
  }

  async fn wait_for<F: Fn() -> bool>(check: F) {
    for _ in 0..100 {
      if check() {
        return;
      }
      tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!("condition never became true");
  }

  #[tokio::test]
  async fn identification_state_and_duplicate_rejection() {
    let endpoint = spawn_server().await;

    let mut socket =
      TungsteniteWebsocket::connect(&endpoint).await.unwrap();
    let verdict = identify(&mut socket, "e2e-cluster").await;
    assert!(matches!(
      verdict,
      ManagerMessage::Ack(ConnectionAck { accepted: true })
    ));
    wait_for(|| {
      edge_connections().get("e2e-cluster").is_some()
    })
    .await;

    // Push a snapshot and observe it in the indexes.
    let state = ClusterState {
      services: vec![Service {
        name: "svc1".to_string(),
        namespace: "default".to_string(),
        instances: vec![ServiceInstance {
          ip: "10.0.0.1".to_string(),
          pod_name: "pod1".to_string(),
          namespace: "default".to_string(),
          envoy_present: true,
          ..Default::default()
        }],
        ..Default::default()
      }],
      ..Default::default()
    };
    let encoded =
      EdgeMessage::State(Box::new(state)).encode().unwrap();
    socket.send(encoded.into_bytes()).await.unwrap();
    wait_for(|| {
      edge_connections()
        .indexes()
        .instances
        .contains_key("e2e-cluster:default:pod1")
    })
    .await;

    // A second edge claiming the same cluster is turned away
    // before it can affect state.
    let mut duplicate =
      TungsteniteWebsocket::connect(&endpoint).await.unwrap();
    let verdict = identify(&mut duplicate, "e2e-cluster").await;
    match verdict {
      ManagerMessage::Error(error) => {
        assert_eq!(error.error_code, ErrorCode::AlreadyExists)
      }
      other => panic!("expected rejection, got {other:?}"),
    }
    let owners = edge_connections()
      .list()
      .into_iter()
      .filter(|connection| connection.cluster_id == "e2e-cluster")
      .count();
    assert_eq!(owners, 1);
    assert!(
      edge_connections()
        .indexes()
        .instances
        .contains_key("e2e-cluster:default:pod1")
    );

    // Closing the stream unregisters the cluster and clears
    // its state from the next published indexes.
    socket.close().await.unwrap();
    wait_for(|| {
      edge_connections().get("e2e-cluster").is_none()
    })
    .await;
    wait_for(|| {
      !edge_connections()
        .indexes()
        .instances
        .contains_key("e2e-cluster:default:pod1")
    })
    .await;
  }

  #[tokio::test]
  async fn malformed_first_message_is_rejected() {
    let endpoint = spawn_server().await;
    let mut socket =
      TungsteniteWebsocket::connect(&endpoint).await.unwrap();
    // State before identification is a protocol error.
    let encoded =
      EdgeMessage::State(Box::new(ClusterState::default()))
        .encode()
        .unwrap();
    socket.send(encoded.into_bytes()).await.unwrap();
    loop {
      match socket.recv().await {
        Ok(WebsocketMessage::Message(message)) => {
          let ManagerMessage::Error(error) =
            ManagerMessage::decode(
              message,
              DEFAULT_MAX_MESSAGE_SIZE_BYTES,
            )
            .unwrap()
          else {
            panic!("expected an error message");
          };
          assert_eq!(
            error.error_code,
            ErrorCode::InvalidArgument
          );
          break;
        }
        Ok(WebsocketMessage::Ping) => continue,
        Ok(_) | Err(_) => panic!("expected an error frame"),
      }
    }
  }
}
