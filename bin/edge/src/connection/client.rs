use anyhow::{Context, anyhow};
use edge_client::transport::{
  ClusterIdentification, EdgeMessage, ManagerMessage,
};
use transport::{
  fix_ws_address,
  websocket::{
    Websocket, WebsocketMessage,
    tungstenite::TungsteniteWebsocket,
  },
};

use crate::{
  backoff::Backoff, config::edge_config, state::manager_channel,
};

enum IdentifyError {
  /// The manager answered and said no.
  Rejected(String),
  /// The stream failed before a verdict.
  Transport(anyhow::Error),
}

/// Dial the manager forever: connect, identify, run the session,
/// back off, repeat. Fatal only after too many consecutive
/// identification rejections.
pub async fn handler()
-> anyhow::Result<tokio::task::JoinHandle<anyhow::Result<()>>> {
  let config = edge_config();
  if config.cluster_id.is_empty() {
    return Err(anyhow!(
      "Missing cluster id (EDGE_CLUSTER_ID / --cluster-id)"
    ));
  }

  let address = fix_ws_address(&config.manager_address);
  let endpoint = format!("{address}/ws/edge");

  info!("Initiating connection to {endpoint}");

  let channel = manager_channel();

  let handle = tokio::spawn(async move {
    let mut receiver = channel.receiver()?;
    let mut backoff = Backoff::from_config(config);
    let mut rejections: u32 = 0;
    let mut already_logged_connection_error = false;

    loop {
      let mut socket =
        match TungsteniteWebsocket::connect(&endpoint).await {
          Ok(socket) => socket,
          Err(e) => {
            if !already_logged_connection_error {
              warn!("{e:#}");
              already_logged_connection_error = true;
            }
            tokio::time::sleep(backoff.next_delay()).await;
            continue;
          }
        };
      already_logged_connection_error = false;

      match identify(&mut socket).await {
        Ok(()) => {}
        Err(IdentifyError::Rejected(message)) => {
          rejections += 1;
          warn!(
            "Manager rejected identification ({rejections} consecutive) | {message}"
          );
          let _ = socket.close().await;
          if rejections >= config.max_consecutive_rejections {
            return Err(anyhow!(
              "Manager rejected identification {rejections} times in a row | {message}"
            ));
          }
          tokio::time::sleep(backoff.next_delay()).await;
          continue;
        }
        Err(IdentifyError::Transport(e)) => {
          warn!("Identification failed | {e:#}");
          tokio::time::sleep(backoff.next_delay()).await;
          continue;
        }
      }

      rejections = 0;
      backoff.reset();
      info!(
        "Connected to manager as cluster {}",
        config.cluster_id
      );

      super::handle_socket(socket, &channel.sender, &mut receiver)
        .await;

      warn!("Connection to manager lost, reconnecting");
      tokio::time::sleep(backoff.next_delay()).await;
    }
  });

  Ok(handle)
}

/// Send the ClusterIdentification and wait for the manager's
/// verdict. Must complete before the stream splits into its
/// sender / receiver tasks.
async fn identify(
  socket: &mut TungsteniteWebsocket,
) -> Result<(), IdentifyError> {
  let config = edge_config();

  let identification =
    EdgeMessage::Identify(ClusterIdentification {
      cluster_id: config.cluster_id.clone(),
    })
    .encode()
    .map_err(IdentifyError::Transport)?;
  socket
    .send(identification.into_bytes())
    .await
    .map_err(IdentifyError::Transport)?;

  let verdict = async {
    loop {
      match socket.recv().await? {
        WebsocketMessage::Message(message) => {
          return ManagerMessage::decode(
            message,
            config.max_message_size_bytes,
          );
        }
        WebsocketMessage::Ping => continue,
        WebsocketMessage::Close
        | WebsocketMessage::Closed => {
          return Err(anyhow!(
            "Stream closed before identification verdict"
          ));
        }
      }
    }
  }
  .await
  .context("Failed to receive identification verdict")
  .map_err(IdentifyError::Transport)?;

  match verdict {
    ManagerMessage::Ack(ack) if ack.accepted => Ok(()),
    ManagerMessage::Ack(_) => Err(IdentifyError::Rejected(
      "Identification not accepted".to_string(),
    )),
    ManagerMessage::Error(error) => {
      Err(IdentifyError::Rejected(format!(
        "{} | {}",
        error.error_code, error.error_message
      )))
    }
    ManagerMessage::ProxyConfigRequest(_) => {
      Err(IdentifyError::Transport(anyhow!(
        "Manager sent a request before acking identification"
      )))
    }
  }
}
