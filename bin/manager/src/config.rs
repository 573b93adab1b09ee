use std::sync::OnceLock;

use clap::Parser;
use navigator_client::entities::config::manager::{
  CliArgs, Env, ManagerConfig,
};

pub fn manager_args() -> &'static CliArgs {
  static MANAGER_ARGS: OnceLock<CliArgs> = OnceLock::new();
  MANAGER_ARGS.get_or_init(CliArgs::parse)
}

pub fn manager_config() -> &'static ManagerConfig {
  static MANAGER_CONFIG: OnceLock<ManagerConfig> = OnceLock::new();
  MANAGER_CONFIG.get_or_init(|| {
    let env: Env = envy::from_env()
      .expect("failed to parse manager environment");
    ManagerConfig::default().merge(env, manager_args())
  })
}
