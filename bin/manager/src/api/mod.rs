use axum::{Router, routing::get};
use tower_http::cors::CorsLayer;

pub mod read;

pub fn app() -> Router {
  Router::new()
    .route("/version", get(|| async { env!("CARGO_PKG_VERSION") }))
    .nest("/api/v1alpha1", read::router())
    .nest("/ws", crate::connection::server::router())
    .layer(CorsLayer::permissive())
}
