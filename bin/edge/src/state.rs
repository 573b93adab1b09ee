use std::sync::{Arc, OnceLock};

use arc_swap::ArcSwapOption;
use edge_client::transport::EncodedWireMessage;
use navigator_client::entities::cluster::ClusterState;
use transport::channel::BufferedChannel;

use crate::{collect::Collector, config::edge_config};

/// Outbound half of the manager stream. The buffered receiver
/// replays an unconfirmed frame after a reconnect.
pub type ManagerChannel = BufferedChannel<EncodedWireMessage>;

pub fn manager_channel() -> &'static ManagerChannel {
  static MANAGER_CHANNEL: OnceLock<ManagerChannel> =
    OnceLock::new();
  MANAGER_CHANNEL.get_or_init(Default::default)
}

/// The most recent collected snapshot. Proxy-config requests
/// resolve pod ips against this.
pub fn latest_state() -> &'static ArcSwapOption<ClusterState> {
  static LATEST_STATE: OnceLock<ArcSwapOption<ClusterState>> =
    OnceLock::new();
  LATEST_STATE.get_or_init(Default::default)
}

pub fn store_latest_state(state: ClusterState) {
  latest_state().store(Some(Arc::new(state)));
}

pub fn collector() -> &'static Collector {
  static COLLECTOR: OnceLock<Collector> = OnceLock::new();
  COLLECTOR.get_or_init(|| Collector::from_config(edge_config()))
}
