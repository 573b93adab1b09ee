use axum::{
  Json, Router,
  extract::{Path, Query},
  http::StatusCode,
  routing::get,
};
use navigator_client::{
  api::{
    GetIstioResourcesResponse, GetProxyConfigResponse,
    GetServiceInstanceResponse, GetServiceResponse,
    ListClustersResponse, ListServicesQuery, ListServicesResponse,
  },
  entities::{
    cluster::{ClusterInfo, SyncStatus},
    service::ServiceInstanceDetail,
    unix_timestamp_ms,
  },
};

use crate::{
  config::manager_config, error::ApiError, istio, proxy,
  state::edge_connections,
};

pub fn router() -> Router {
  Router::new()
    .route("/health", get(|| async { StatusCode::OK }))
    .route("/services", get(list_services))
    .route("/services/{id}", get(get_service))
    .route(
      "/services/{service_id}/instances/{instance_id}",
      get(get_service_instance),
    )
    .route(
      "/services/{service_id}/instances/{instance_id}/proxy-config",
      get(get_proxy_config),
    )
    .route(
      "/services/{service_id}/instances/{instance_id}/istio-resources",
      get(get_istio_resources),
    )
    .route("/clusters", get(list_clusters))
}

async fn list_services(
  Query(query): Query<ListServicesQuery>,
) -> Json<ListServicesResponse> {
  let services = edge_connections().indexes().list_services(
    query.namespace.as_deref(),
    query.cluster_id.as_deref(),
  );
  Json(
    services
      .into_iter()
      .map(|service| (*service).clone())
      .collect(),
  )
}

async fn get_service(
  Path(id): Path<String>,
) -> Result<Json<GetServiceResponse>, ApiError> {
  edge_connections()
    .indexes()
    .services
    .get(&id)
    .map(|service| Json((**service).clone()))
    .ok_or_else(|| {
      ApiError::NotFound(format!("No service '{id}'"))
    })
}

async fn get_service_instance(
  Path((service_id, instance_id)): Path<(String, String)>,
) -> Result<Json<GetServiceInstanceResponse>, ApiError> {
  let indexes = edge_connections().indexes();
  if !indexes.services.contains_key(&service_id) {
    return Err(ApiError::NotFound(format!(
      "No service '{service_id}'"
    )));
  }
  let instance = indexes
    .instances_by_service
    .get(&service_id)
    .into_iter()
    .flatten()
    .find(|instance| instance.id() == instance_id)
    .ok_or_else(|| {
      ApiError::NotFound(format!(
        "No instance '{instance_id}' backing service '{service_id}'"
      ))
    })?;
  Ok(Json(ServiceInstanceDetail::from_instance(
    instance.as_ref(),
    service_id,
  )))
}

async fn get_proxy_config(
  Path((service_id, instance_id)): Path<(String, String)>,
) -> Result<Json<GetProxyConfigResponse>, ApiError> {
  proxy::get_proxy_config(&service_id, &instance_id)
    .await
    .map(Json)
}

async fn get_istio_resources(
  Path((service_id, instance_id)): Path<(String, String)>,
) -> Result<Json<GetIstioResourcesResponse>, ApiError> {
  istio::get_istio_resources(&service_id, &instance_id).map(Json)
}

async fn list_clusters() -> Json<ListClustersResponse> {
  let config = manager_config();
  let indexes = edge_connections().indexes();
  let now = unix_timestamp_ms();

  let mut clusters = edge_connections()
    .list()
    .into_iter()
    .map(|connection| {
      let last_update = connection.last_update();
      // A cluster which never pushed state ages from connect.
      let basis = if last_update == 0 {
        connection.connected_at
      } else {
        last_update
      };
      ClusterInfo {
        cluster_id: connection.cluster_id.clone(),
        connected_at: connection.connected_at,
        last_update,
        service_count: indexes
          .services_by_cluster
          .get(&connection.cluster_id)
          .map(Vec::len)
          .unwrap_or_default(),
        sync_status: SyncStatus::derive(
          now - basis,
          (config.sync_interval * 1000) as i64,
          config.sync_healthy_multiplier,
          config.sync_stale_multiplier,
        ),
      }
    })
    .collect::<Vec<_>>();
  clusters
    .sort_by(|a, b| a.cluster_id.cmp(&b.cluster_id));

  Json(clusters)
}
