#[macro_use]
extern crate tracing;

mod api;
mod config;
mod connection;
mod error;
mod indexes;
mod istio;
mod proxy;
mod state;

async fn app() -> anyhow::Result<()> {
  let config = config::manager_config();
  logger::init(&config.logging)?;

  info!(
    "Navigator Manager version: v{}",
    env!("CARGO_PKG_VERSION")
  );
  info!("{config:?}");

  let addr = format!("{}:{}", config.bind_ip, config.port);
  let listen = addr.parse()?;

  info!("Navigator Manager listening on {addr}");

  axum_server::bind(listen)
    .serve(api::app().into_make_service())
    .await?;

  Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  dotenvy::dotenv().ok();

  let mut term_signal = tokio::signal::unix::signal(
    tokio::signal::unix::SignalKind::terminate(),
  )?;

  let app = tokio::spawn(app());

  tokio::select! {
    res = app => return res?,
    _ = term_signal.recv() => {
      info!("Navigator Manager shutting down");
    },
  }

  Ok(())
}
