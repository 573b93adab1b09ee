#[macro_use]
extern crate tracing;

mod backoff;
mod collect;
mod config;
mod connection;
mod proxy;
mod state;

async fn app() -> anyhow::Result<()> {
  let config = config::edge_config();
  logger::init(&config.logging)?;

  info!(
    "Navigator Edge version: v{}",
    env!("CARGO_PKG_VERSION")
  );
  info!("{config:?}");

  // Fail fast on a missing collector source.
  state::collector();

  let handle = connection::client::handler().await?;

  match handle.await {
    Ok(Ok(())) => Ok(()),
    Ok(Err(e)) => {
      error!("CONNECTION ERROR: {e:#}");
      Err(e)
    }
    Err(e) => {
      error!("SPAWN ERROR: {e:#}");
      Err(e.into())
    }
  }
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
      info!("Navigator Edge shutting down");
    },
  }

  Ok(())
}
