use std::time::Duration;

use edge_client::transport::{
  EdgeMessage, EncodedWireMessage, ManagerMessage,
};
use transport::{
  channel::{BufferedReceiver, Sender},
  websocket::{
    Websocket, WebsocketMessage, WebsocketReceiver as _,
    WebsocketSender as _,
  },
};

use crate::{
  config::edge_config,
  state::{collector, store_latest_state},
};

pub mod client;

/// Drive one accepted session: forward queued outbound frames,
/// handle inbound requests, and push a fresh full snapshot each
/// interval. Returns when the stream dies.
async fn handle_socket<W: Websocket>(
  socket: W,
  sender: &Sender<EncodedWireMessage>,
  receiver: &mut BufferedReceiver<EncodedWireMessage>,
) {
  let config = edge_config();

  let (mut ws_write, mut ws_read) = socket.split();

  let forward_writes = async {
    loop {
      let message = match tokio::time::timeout(
        Duration::from_secs(5),
        receiver.recv(),
      )
      .await
      {
        Ok(Ok(message)) => message,
        Ok(Err(_)) => break,
        // Handle sending Ping
        Err(_) => {
          if let Err(e) = ws_write.ping().await {
            warn!("Failed to send ping | {e:?}");
            break;
          }
          continue;
        }
      };
      match ws_write.send(message.into_bytes()).await {
        // Clears the stored message from receiver buffer.
        Ok(_) => receiver.clear_buffer(),
        Err(e) => {
          warn!("Failed to send message | {e:?}");
          break;
        }
      }
    }
    let _ = ws_write.close().await;
  };

  let handle_reads = async {
    loop {
      match ws_read.recv().await {
        Ok(WebsocketMessage::Message(message)) => {
          handle_message(sender.clone(), message)
        }
        Ok(WebsocketMessage::Ping) => continue,
        Ok(WebsocketMessage::Close)
        | Ok(WebsocketMessage::Closed) => break,
        Err(e) => {
          warn!("{e:#}");
          break;
        }
      }
    }
  };

  let collect_loop = async {
    let mut interval = tokio::time::interval(
      Duration::from_secs(config.sync_interval),
    );
    interval.set_missed_tick_behavior(
      tokio::time::MissedTickBehavior::Delay,
    );
    loop {
      interval.tick().await;
      // A failed cycle is logged and retried next tick, never
      // fatal to the session.
      let state = match collector().collect().await {
        Ok(state) => state,
        Err(e) => {
          warn!("Cluster state collection failed | {e:#}");
          continue;
        }
      };
      store_latest_state(state.clone());
      let encoded =
        match EdgeMessage::State(Box::new(state)).encode() {
          Ok(encoded) => encoded,
          Err(e) => {
            error!("Failed to encode cluster state | {e:#}");
            continue;
          }
        };
      if sender.send(encoded).await.is_err() {
        break;
      }
    }
  };

  tokio::select! {
    _ = forward_writes => {},
    _ = handle_reads => {},
    _ = collect_loop => {},
  }
}

fn handle_message(
  sender: Sender<EncodedWireMessage>,
  message: EncodedWireMessage,
) {
  let message = match ManagerMessage::decode(
    message,
    edge_config().max_message_size_bytes,
  ) {
    Ok(message) => message,
    Err(e) => {
      warn!("Failed to parse manager message | {e:#}");
      return;
    }
  };
  match message {
    ManagerMessage::ProxyConfigRequest(request) => {
      crate::proxy::handle_request(sender, request)
    }
    ManagerMessage::Error(error) => {
      warn!(
        "Manager reported {} | {}",
        error.error_code, error.error_message
      );
    }
    // Ack only matters during identification.
    ManagerMessage::Ack(_) => {}
  }
}
