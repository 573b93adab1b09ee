use std::sync::OnceLock;

use clap::Parser;
use navigator_client::entities::config::edge::{
  CliArgs, EdgeConfig, Env,
};

pub fn edge_args() -> &'static CliArgs {
  static EDGE_ARGS: OnceLock<CliArgs> = OnceLock::new();
  EDGE_ARGS.get_or_init(CliArgs::parse)
}

pub fn edge_config() -> &'static EdgeConfig {
  static EDGE_CONFIG: OnceLock<EdgeConfig> = OnceLock::new();
  EDGE_CONFIG.get_or_init(|| {
    let env: Env =
      envy::from_env().expect("failed to parse edge environment");
    EdgeConfig::default().merge(env, edge_args())
  })
}
