//! Framing for the edge <-> manager stream.
//!
//! Each websocket binary frame carries the serde_json body of one
//! message with a single trailing variant byte. The receiving hot
//! loop pops the byte, dispatches on it, and leaves body parsing to
//! the handler.

use anyhow::{Context, anyhow};
use bytes::Bytes;
use navigator_client::entities::{
  ErrorCode, cluster::ClusterState, proxy::ProxyConfig,
};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use uuid::Uuid;

/// An encoded frame as it travels the websocket.
#[derive(Debug, Clone)]
pub struct EncodedWireMessage(Vec<u8>);

impl EncodedWireMessage {
  pub fn from_vec(bytes: Vec<u8>) -> EncodedWireMessage {
    EncodedWireMessage(bytes)
  }

  pub fn into_bytes(self) -> Bytes {
    self.0.into()
  }

  pub fn len(&self) -> usize {
    self.0.len()
  }

  pub fn is_empty(&self) -> bool {
    self.0.is_empty()
  }

  fn encode<T: Serialize>(
    variant: u8,
    body: &T,
  ) -> anyhow::Result<EncodedWireMessage> {
    let mut bytes = serde_json::to_vec(body)
      .context("Failed to serialize wire message body")?;
    bytes.push(variant);
    Ok(EncodedWireMessage(bytes))
  }

  /// Split the frame into `(variant byte, body bytes)`,
  /// enforcing the configured size cap.
  fn split(
    self,
    max_size: usize,
  ) -> anyhow::Result<(u8, Vec<u8>)> {
    if self.0.len() > max_size {
      return Err(anyhow!(
        "Wire message of {} bytes exceeds maximum of {max_size}",
        self.0.len()
      ));
    }
    let mut bytes = self.0;
    let variant = bytes
      .pop()
      .context("Failed to decode wire message | frame is empty")?;
    Ok((variant, bytes))
  }
}

fn parse_body<T: DeserializeOwned>(
  bytes: &[u8],
) -> anyhow::Result<T> {
  serde_json::from_slice(bytes)
    .context("Failed to parse wire message body")
}

// ========================
//  EDGE -> MANAGER FRAMES
// ========================

/// First message on every stream, declaring cluster ownership.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusterIdentification {
  pub cluster_id: String,
}

/// Reply to a manager [ProxyConfigRequest], correlated by id.
/// Carries either the normalized config or an error message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProxyConfigResponse {
  pub request_id: Uuid,
  #[serde(default)]
  pub proxy_config: Option<ProxyConfig>,
  #[serde(default)]
  pub error_message: Option<String>,
}

#[derive(Debug, Clone)]
pub enum EdgeMessage {
  Identify(ClusterIdentification),
  State(Box<ClusterState>),
  ProxyConfigResponse(ProxyConfigResponse),
}

const EDGE_IDENTIFY: u8 = 0;
const EDGE_STATE: u8 = 1;
const EDGE_PROXY_CONFIG_RESPONSE: u8 = 2;

impl EdgeMessage {
  pub fn encode(&self) -> anyhow::Result<EncodedWireMessage> {
    match self {
      EdgeMessage::Identify(body) => {
        EncodedWireMessage::encode(EDGE_IDENTIFY, body)
      }
      EdgeMessage::State(body) => {
        EncodedWireMessage::encode(EDGE_STATE, body)
      }
      EdgeMessage::ProxyConfigResponse(body) => {
        EncodedWireMessage::encode(
          EDGE_PROXY_CONFIG_RESPONSE,
          body,
        )
      }
    }
  }

  pub fn decode(
    encoded: EncodedWireMessage,
    max_size: usize,
  ) -> anyhow::Result<EdgeMessage> {
    let (variant, bytes) = encoded.split(max_size)?;
    match variant {
      EDGE_IDENTIFY => {
        parse_body(&bytes).map(EdgeMessage::Identify)
      }
      EDGE_STATE => parse_body(&bytes)
        .map(Box::new)
        .map(EdgeMessage::State),
      EDGE_PROXY_CONFIG_RESPONSE => {
        parse_body(&bytes).map(EdgeMessage::ProxyConfigResponse)
      }
      other => Err(anyhow!(
        "Got unrecognized edge message variant byte: {other}"
      )),
    }
  }
}

// ========================
//  MANAGER -> EDGE FRAMES
// ========================

/// Manager verdict on a [ClusterIdentification].
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ConnectionAck {
  pub accepted: bool,
}

/// Rejection or runtime error pushed to the edge.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WireError {
  pub error_code: ErrorCode,
  pub error_message: String,
}

/// On-demand request for one pod's live Envoy configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProxyConfigRequest {
  pub request_id: Uuid,
  pub pod_namespace: String,
  pub pod_name: String,
}

#[derive(Debug, Clone)]
pub enum ManagerMessage {
  Ack(ConnectionAck),
  Error(WireError),
  ProxyConfigRequest(ProxyConfigRequest),
}

const MANAGER_ACK: u8 = 0;
const MANAGER_ERROR: u8 = 1;
const MANAGER_PROXY_CONFIG_REQUEST: u8 = 2;

impl ManagerMessage {
  pub fn encode(&self) -> anyhow::Result<EncodedWireMessage> {
    match self {
      ManagerMessage::Ack(body) => {
        EncodedWireMessage::encode(MANAGER_ACK, body)
      }
      ManagerMessage::Error(body) => {
        EncodedWireMessage::encode(MANAGER_ERROR, body)
      }
      ManagerMessage::ProxyConfigRequest(body) => {
        EncodedWireMessage::encode(
          MANAGER_PROXY_CONFIG_REQUEST,
          body,
        )
      }
    }
  }

  pub fn decode(
    encoded: EncodedWireMessage,
    max_size: usize,
  ) -> anyhow::Result<ManagerMessage> {
    let (variant, bytes) = encoded.split(max_size)?;
    match variant {
      MANAGER_ACK => parse_body(&bytes).map(ManagerMessage::Ack),
      MANAGER_ERROR => {
        parse_body(&bytes).map(ManagerMessage::Error)
      }
      MANAGER_PROXY_CONFIG_REQUEST => {
        parse_body(&bytes).map(ManagerMessage::ProxyConfigRequest)
      }
      other => Err(anyhow!(
        "Got unrecognized manager message variant byte: {other}"
      )),
    }
  }
}
