//! The proxy-config retrieval path: resolve the owning cluster,
//! issue a correlated request over its stream, and wait for the
//! reply under the configured deadline.

use std::time::Duration;

use edge_client::transport::{
  ManagerMessage, ProxyConfigRequest,
};
use navigator_client::entities::{
  parse_instance_id, proxy::ProxyConfig,
};
use uuid::Uuid;

use crate::{
  config::manager_config,
  connection::{PendingProxyRequest, ProxyConfigOutcome},
  error::ApiError,
  state::edge_connections,
};

pub async fn get_proxy_config(
  _service_id: &str,
  instance_id: &str,
) -> Result<ProxyConfig, ApiError> {
  let timeout =
    Duration::from_secs(manager_config().proxy_request_timeout);
  get_proxy_config_with_timeout(instance_id, timeout).await
}

pub async fn get_proxy_config_with_timeout(
  instance_id: &str,
  timeout: Duration,
) -> Result<ProxyConfig, ApiError> {
  let id = parse_instance_id(instance_id)
    .map_err(|e| ApiError::InvalidArgument(format!("{e:#}")))?;

  let connection = edge_connections()
    .get(&id.cluster_id)
    .ok_or_else(|| {
      ApiError::NotFound(format!(
        "No connected cluster '{}'",
        id.cluster_id
      ))
    })?;

  let request_id = Uuid::new_v4();
  let (pending, receiver) = PendingProxyRequest::new();
  connection
    .pending
    .insert(request_id, pending)
    .await;

  let request =
    ManagerMessage::ProxyConfigRequest(ProxyConfigRequest {
      request_id,
      pod_namespace: id.namespace.clone(),
      pod_name: id.pod_name.clone(),
    });
  let encoded = match request.encode() {
    Ok(encoded) => encoded,
    Err(e) => {
      connection.pending.remove(&request_id).await;
      return Err(ApiError::Internal(format!(
        "Failed to encode proxy config request | {e:#}"
      )));
    }
  };
  if let Err(e) = edge_connections()
    .send_to_cluster(&id.cluster_id, encoded)
    .await
  {
    connection.pending.remove(&request_id).await;
    return Err(ApiError::Unavailable(format!("{e:#}")));
  }

  match tokio::time::timeout(timeout, receiver).await {
    Ok(Ok(ProxyConfigOutcome::Config(proxy_config))) => {
      Ok(*proxy_config)
    }
    Ok(Ok(ProxyConfigOutcome::EdgeError(message))) => {
      Err(ApiError::Internal(format!(
        "Edge failed to fetch proxy config | {message}"
      )))
    }
    Ok(Ok(ProxyConfigOutcome::ConnectionLost)) | Ok(Err(_)) => {
      Err(ApiError::Unavailable(format!(
        "Connection to cluster '{}' lost",
        id.cluster_id
      )))
    }
    Err(_elapsed) => {
      // Remove the slot so a late reply is discarded as unknown.
      connection.pending.remove(&request_id).await;
      Err(ApiError::DeadlineExceeded(format!(
        "Cluster '{}' did not answer within {}s",
        id.cluster_id,
        timeout.as_secs()
      )))
    }
  }
}

#[cfg(test)]
mod tests {
  use edge_client::{
    DEFAULT_MAX_MESSAGE_SIZE_BYTES,
    transport::ProxyConfigResponse,
  };
  use navigator_client::entities::proxy::ProxyMode;

  use crate::connection::server::handle_proxy_config_response;

  use super::*;

  #[tokio::test]
  async fn malformed_instance_id_is_invalid_argument() {
    let result = get_proxy_config_with_timeout(
      "not-enough-fields",
      Duration::from_secs(1),
    )
    .await;
    assert!(matches!(
      result,
      Err(ApiError::InvalidArgument(_))
    ));
  }

  #[tokio::test]
  async fn unknown_cluster_is_not_found() {
    let result = get_proxy_config_with_timeout(
      "ghost-cluster:default:pod1",
      Duration::from_secs(1),
    )
    .await;
    assert!(matches!(result, Err(ApiError::NotFound(_))));
  }

  #[tokio::test]
  async fn round_trip_with_simulated_edge() {
    let registration = edge_connections()
      .register("proxy-test-cluster", false)
      .unwrap();
    let connection = registration.connection.clone();
    let mut receiver = registration.receiver;

    // Simulated edge: answer the next request on the stream.
    let edge = tokio::spawn(async move {
      let encoded = receiver.recv().await.unwrap();
      let ManagerMessage::ProxyConfigRequest(request) =
        ManagerMessage::decode(
          encoded,
          DEFAULT_MAX_MESSAGE_SIZE_BYTES,
        )
        .unwrap()
      else {
        panic!("expected a proxy config request");
      };
      assert_eq!(request.pod_namespace, "default");
      assert_eq!(request.pod_name, "pod1");
      handle_proxy_config_response(
        &connection,
        ProxyConfigResponse {
          request_id: request.request_id,
          proxy_config: Some(ProxyConfig {
            version: "1.22.1".to_string(),
            proxy_mode: ProxyMode::Sidecar,
            ..Default::default()
          }),
          error_message: None,
        },
      )
      .await;
    });

    let config = get_proxy_config_with_timeout(
      "proxy-test-cluster:default:pod1",
      Duration::from_secs(5),
    )
    .await
    .unwrap();
    assert_eq!(config.version, "1.22.1");
    assert_eq!(config.proxy_mode, ProxyMode::Sidecar);
    edge.await.unwrap();

    let connection =
      edge_connections().get("proxy-test-cluster").unwrap();
    assert!(connection.pending.is_empty().await);
    edge_connections().unregister(&connection);
  }

  #[tokio::test]
  async fn timeout_consumes_the_pending_entry() {
    let registration = edge_connections()
      .register("proxy-timeout-cluster", false)
      .unwrap();
    // Nobody drains the stream: the wait must time out.
    let result = get_proxy_config_with_timeout(
      "proxy-timeout-cluster:default:pod1",
      Duration::from_millis(50),
    )
    .await;
    assert!(matches!(
      result,
      Err(ApiError::DeadlineExceeded(_))
    ));
    assert!(registration.connection.pending.is_empty().await);
    edge_connections().unregister(&registration.connection);
  }
}
