//! # Navigator Client
//!
//! Typed client for the Navigator manager's public read API,
//! along with the entity types shared across the workspace.

use anyhow::{Context, anyhow};
use serde::de::DeserializeOwned;

use crate::{
  api::{
    GetIstioResourcesResponse, GetProxyConfigResponse,
    GetServiceInstanceResponse, GetServiceResponse,
    ListClustersResponse, ListServicesQuery, ListServicesResponse,
  },
  entities::ApiErrorBody,
};

pub mod api;
pub mod entities;

#[derive(Clone)]
pub struct NavigatorClient {
  address: String,
  client: reqwest::Client,
}

impl NavigatorClient {
  pub fn new(address: impl Into<String>) -> NavigatorClient {
    NavigatorClient {
      address: address.into().trim_end_matches('/').to_string(),
      client: Default::default(),
    }
  }

  pub async fn list_services(
    &self,
    query: &ListServicesQuery,
  ) -> anyhow::Result<ListServicesResponse> {
    let mut params = Vec::new();
    if let Some(namespace) = &query.namespace {
      params.push(("namespace", namespace.as_str()));
    }
    if let Some(cluster_id) = &query.cluster_id {
      params.push(("cluster_id", cluster_id.as_str()));
    }
    self.get("/api/v1alpha1/services", &params).await
  }

  pub async fn get_service(
    &self,
    service_id: &str,
  ) -> anyhow::Result<GetServiceResponse> {
    self
      .get(&format!("/api/v1alpha1/services/{service_id}"), &[])
      .await
  }

  pub async fn get_service_instance(
    &self,
    service_id: &str,
    instance_id: &str,
  ) -> anyhow::Result<GetServiceInstanceResponse> {
    self
      .get(
        &format!(
          "/api/v1alpha1/services/{service_id}/instances/{instance_id}"
        ),
        &[],
      )
      .await
  }

  pub async fn get_proxy_config(
    &self,
    service_id: &str,
    instance_id: &str,
  ) -> anyhow::Result<GetProxyConfigResponse> {
    self
      .get(
        &format!(
          "/api/v1alpha1/services/{service_id}/instances/{instance_id}/proxy-config"
        ),
        &[],
      )
      .await
  }

  pub async fn get_istio_resources(
    &self,
    service_id: &str,
    instance_id: &str,
  ) -> anyhow::Result<GetIstioResourcesResponse> {
    self
      .get(
        &format!(
          "/api/v1alpha1/services/{service_id}/instances/{instance_id}/istio-resources"
        ),
        &[],
      )
      .await
  }

  pub async fn list_clusters(
    &self,
  ) -> anyhow::Result<ListClustersResponse> {
    self.get("/api/v1alpha1/clusters", &[]).await
  }

  pub async fn version(&self) -> anyhow::Result<String> {
    let res = self
      .client
      .get(format!("{}/version", self.address))
      .send()
      .await
      .context("Failed to reach manager")?;
    res.text().await.context("Failed to read version body")
  }

  async fn get<T: DeserializeOwned>(
    &self,
    path: &str,
    params: &[(&str, &str)],
  ) -> anyhow::Result<T> {
    let req = self
      .client
      .get(format!("{}{path}", self.address))
      .query(params);
    let res =
      req.send().await.context("Failed to reach manager")?;
    let status = res.status();
    if status.is_success() {
      res
        .json()
        .await
        .context("Failed to parse manager response body")
    } else {
      let body = res
        .text()
        .await
        .context("Failed to read manager error body")?;
      match serde_json::from_str::<ApiErrorBody>(&body) {
        Ok(error) => Err(anyhow!(
          "{} | {} | {}",
          status,
          error.code,
          error.message
        )),
        Err(_) => Err(anyhow!("{status} | {body}")),
      }
    }
  }
}
