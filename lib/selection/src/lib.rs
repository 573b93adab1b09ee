//! The Istio policy selection engine.
//!
//! Given one workload instance and the full resource set of its
//! cluster, decide which resources actually apply to that workload
//! under Istio's visibility and selector rules. Every filter is a
//! pure function: results come back in input order, nothing is
//! deduplicated, and empty inputs produce empty outputs.

use std::collections::HashMap;

use navigator_client::entities::service::ProxyType;

mod filters;
mod matching;

pub use filters::*;

/// Everything the selection rules need to know about one
/// workload instance.
#[derive(Debug, Clone, Default)]
pub struct Workload {
  pub labels: HashMap<String, String>,
  pub namespace: String,
  /// Names of services this workload is a backend of.
  pub bound_services: Vec<String>,
  /// Names of gateways this workload is bound to.
  pub bound_gateways: Vec<String>,
  pub proxy_type: ProxyType,
  /// The mesh root namespace whose policies apply cluster-wide.
  pub root_namespace: String,
  /// Pilot flag scoping Gateway resources to their own namespace.
  pub pilot_scope_gateway_to_namespace: bool,
}
