//! Serving manager-initiated proxy-config requests: resolve the
//! pod's ip from the latest collected snapshot, pull the Envoy
//! admin output, normalize, and reply with the correlated id.

use anyhow::{Context, anyhow};
use edge_client::transport::{
  EdgeMessage, EncodedWireMessage, ProxyConfigRequest,
  ProxyConfigResponse,
};
use navigator_client::entities::proxy::ProxyConfig;
use transport::channel::Sender;

use crate::{config::edge_config, state::latest_state};

/// Each request is served on its own task so a slow admin fetch
/// never stalls the periodic state loop or other requests.
pub fn handle_request(
  sender: Sender<EncodedWireMessage>,
  request: ProxyConfigRequest,
) {
  tokio::spawn(async move {
    let result = fetch_proxy_config(
      &request.pod_namespace,
      &request.pod_name,
    )
    .await;

    let response = match result {
      Ok(proxy_config) => ProxyConfigResponse {
        request_id: request.request_id,
        proxy_config: Some(proxy_config),
        error_message: None,
      },
      Err(e) => {
        warn!(
          "Failed to fetch proxy config for {}/{} | {e:#}",
          request.pod_namespace, request.pod_name
        );
        ProxyConfigResponse {
          request_id: request.request_id,
          proxy_config: None,
          error_message: Some(format!("{e:#}")),
        }
      }
    };

    let encoded =
      match EdgeMessage::ProxyConfigResponse(response).encode() {
        Ok(encoded) => encoded,
        Err(e) => {
          error!("Failed to encode proxy config response | {e:#}");
          return;
        }
      };
    if let Err(e) = sender.send(encoded).await {
      error!("Failed to send proxy config response | {e:#}");
    }
  });
}

async fn fetch_proxy_config(
  pod_namespace: &str,
  pod_name: &str,
) -> anyhow::Result<ProxyConfig> {
  let state = latest_state()
    .load_full()
    .context("No cluster state collected yet")?;
  let instance = state
    .services
    .iter()
    .flat_map(|service| &service.instances)
    .find(|instance| {
      instance.namespace == pod_namespace
        && instance.pod_name == pod_name
    })
    .with_context(|| {
      format!(
        "No pod {pod_namespace}/{pod_name} in the collected cluster state"
      )
    })?;
  if !instance.envoy_present {
    return Err(anyhow!(
      "Pod {pod_namespace}/{pod_name} has no Envoy proxy"
    ));
  }

  let admin = EnvoyAdmin::new(
    &instance.ip,
    edge_config().envoy_admin_port,
  );
  let config_dump = admin.config_dump().await?;
  let clusters = admin.clusters().await?;
  envoy::normalize(&config_dump, &clusters)
}

/// Minimal client for one pod's Envoy admin endpoint.
struct EnvoyAdmin {
  base: String,
  client: reqwest::Client,
}

impl EnvoyAdmin {
  fn new(ip: &str, port: u16) -> EnvoyAdmin {
    EnvoyAdmin {
      base: format!("http://{ip}:{port}"),
      client: Default::default(),
    }
  }

  async fn config_dump(&self) -> anyhow::Result<String> {
    self.get("/config_dump?include_eds").await
  }

  async fn clusters(&self) -> anyhow::Result<String> {
    self.get("/clusters?format=json").await
  }

  async fn get(&self, path: &str) -> anyhow::Result<String> {
    let response = self
      .client
      .get(format!("{}{path}", self.base))
      .send()
      .await
      .with_context(|| {
        format!("Failed to reach Envoy admin at {}", self.base)
      })?;
    let status = response.status();
    if !status.is_success() {
      return Err(anyhow!(
        "Envoy admin at {} returned {status} for {path}",
        self.base
      ));
    }
    response
      .text()
      .await
      .context("Failed to read Envoy admin response body")
  }
}
