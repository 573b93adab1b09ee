use anyhow::{Context, anyhow};
use bytes::Bytes;
use edge_client::transport::EncodedWireMessage;
use futures_util::{
  SinkExt, Stream, StreamExt, TryStreamExt,
  stream::{SplitSink, SplitStream},
};
use tokio::net::TcpStream;
use tokio_tungstenite::{
  MaybeTlsStream, WebSocketStream, connect_async,
  tungstenite::{self},
};
use tokio_util::sync::CancellationToken;

use super::{
  Websocket, WebsocketMessage, WebsocketReceiver, WebsocketSender,
};

pub type InnerWebsocket = WebSocketStream<MaybeTlsStream<TcpStream>>;

pub struct TungsteniteWebsocket(pub InnerWebsocket);

impl TungsteniteWebsocket {
  /// Dial a manager ws(s) url.
  pub async fn connect(
    url: &str,
  ) -> anyhow::Result<TungsteniteWebsocket> {
    let (socket, _response) = connect_async(url)
      .await
      .with_context(|| format!("Failed to connect to {url}"))?;
    Ok(TungsteniteWebsocket(socket))
  }
}

impl Websocket for TungsteniteWebsocket {
  fn split(self) -> (impl WebsocketSender, impl WebsocketReceiver) {
    let (tx, rx) = self.0.split();
    (
      TungsteniteWebsocketSender(tx),
      TungsteniteWebsocketReceiver::new(rx),
    )
  }

  async fn send(&mut self, bytes: Bytes) -> anyhow::Result<()> {
    self
      .0
      .send(tungstenite::Message::Binary(bytes))
      .await
      .context("Failed to send message over websocket")
  }

  async fn close(&mut self) -> anyhow::Result<()> {
    self
      .0
      .close(None)
      .await
      .context("Failed to send websocket close frame")
  }

  async fn recv(&mut self) -> anyhow::Result<WebsocketMessage> {
    try_next(&mut self.0).await
  }
}

pub type InnerWebsocketSender = SplitSink<
  WebSocketStream<MaybeTlsStream<TcpStream>>,
  tungstenite::Message,
>;

pub struct TungsteniteWebsocketSender(pub InnerWebsocketSender);

impl WebsocketSender for TungsteniteWebsocketSender {
  async fn ping(&mut self) -> anyhow::Result<()> {
    self
      .0
      .send(tungstenite::Message::Ping(Bytes::new()))
      .await
      .context("Failed to send ping over websocket")
  }

  async fn send(&mut self, bytes: Bytes) -> anyhow::Result<()> {
    self
      .0
      .send(tungstenite::Message::Binary(bytes))
      .await
      .context("Failed to send message over websocket")
  }

  async fn close(&mut self) -> anyhow::Result<()> {
    self
      .0
      .send(tungstenite::Message::Close(None))
      .await
      .context("Failed to send websocket close frame")
  }
}

async fn try_next<S>(
  stream: &mut S,
) -> anyhow::Result<WebsocketMessage>
where
  S: Stream<Item = Result<tungstenite::Message, tungstenite::Error>>
    + Unpin,
{
  loop {
    match stream.try_next().await? {
      Some(tungstenite::Message::Binary(bytes)) => {
        return Ok(WebsocketMessage::Message(
          EncodedWireMessage::from_vec(bytes.into()),
        ));
      }
      Some(tungstenite::Message::Text(text)) => {
        let bytes: Bytes = text.into();
        return Ok(WebsocketMessage::Message(
          EncodedWireMessage::from_vec(bytes.into()),
        ));
      }
      Some(tungstenite::Message::Ping(_)) => {
        return Ok(WebsocketMessage::Ping);
      }
      Some(tungstenite::Message::Close(_)) => {
        return Ok(WebsocketMessage::Close);
      }
      None => return Ok(WebsocketMessage::Closed),
      // Ignored
      Some(tungstenite::Message::Pong(_))
      | Some(tungstenite::Message::Frame(_)) => continue,
    }
  }
}

pub type InnerWebsocketReceiver =
  SplitStream<WebSocketStream<MaybeTlsStream<TcpStream>>>;

pub struct TungsteniteWebsocketReceiver {
  receiver: InnerWebsocketReceiver,
  cancel: Option<CancellationToken>,
}

impl TungsteniteWebsocketReceiver {
  pub fn new(receiver: InnerWebsocketReceiver) -> Self {
    Self {
      receiver,
      cancel: None,
    }
  }
}

impl WebsocketReceiver for TungsteniteWebsocketReceiver {
  fn set_cancel(&mut self, cancel: CancellationToken) {
    self.cancel = Some(cancel);
  }

  async fn recv(&mut self) -> anyhow::Result<WebsocketMessage> {
    let fut = try_next(&mut self.receiver);
    if let Some(cancel) = &self.cancel {
      tokio::select! {
        res = fut => res,
        _ = cancel.cancelled() => Err(anyhow!("Cancelled before receive"))
      }
    } else {
      fut.await
    }
  }
}
