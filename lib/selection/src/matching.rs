use std::collections::HashMap;

use navigator_client::entities::istio::PolicyTargetRef;

use crate::Workload;

/// A selector matches iff the workload's labels contain every
/// key/value pair of the selector. Empty selectors match all.
pub fn selector_matches(
  selector: &HashMap<String, String>,
  labels: &HashMap<String, String>,
) -> bool {
  selector
    .iter()
    .all(|(key, value)| labels.get(key) == Some(value))
}

/// Istio `exportTo` visibility.
///
/// - Empty list: visible to all namespaces.
/// - `"*"`: visible to all.
/// - `"."`: visible only inside the resource's own namespace.
/// - Anything else: an explicit namespace grant.
///
/// The list is disjunctive; any entry granting visibility wins.
pub fn exported_to(
  export_to: &[String],
  resource_namespace: &str,
  workload_namespace: &str,
) -> bool {
  if export_to.is_empty() {
    return true;
  }
  export_to.iter().any(|entry| match entry.as_str() {
    "*" => true,
    "." => resource_namespace == workload_namespace,
    namespace => namespace == workload_namespace,
  })
}

/// Whether a policy target reference resolves to a Service the
/// workload backs or a Gateway it is bound to. Unrecognized kinds
/// never match.
pub fn target_ref_resolves(
  target_ref: &PolicyTargetRef,
  workload: &Workload,
) -> bool {
  match target_ref.kind.as_str() {
    "Service" => workload
      .bound_services
      .iter()
      .any(|service| service == &target_ref.name),
    "Gateway" => workload
      .bound_gateways
      .iter()
      .any(|gateway| gateway == &target_ref.name),
    _ => false,
  }
}

/// Common scoping of PeerAuthentication / RequestAuthentication /
/// AuthorizationPolicy: resources in the mesh root namespace act
/// mesh-wide, resources in the workload's namespace act namespace
/// wide, anything else never applies. Within scope the selector
/// narrows by label match.
pub fn policy_scope_applies(
  resource_namespace: &str,
  selector: &HashMap<String, String>,
  workload: &Workload,
) -> bool {
  in_policy_scope(resource_namespace, workload)
    && selector_matches(selector, &workload.labels)
}

pub fn in_policy_scope(
  resource_namespace: &str,
  workload: &Workload,
) -> bool {
  resource_namespace == workload.root_namespace
    || resource_namespace == workload.namespace
}
