//! Per-kind filters. Each takes the cluster's resource list and
//! returns the subset applying to the workload, preserving input
//! order.

use navigator_client::entities::istio::{
  AuthorizationPolicy, DestinationRule, EnvoyFilter, Gateway,
  PeerAuthentication, RequestAuthentication, ServiceEntry, Sidecar,
  VirtualService, WasmPlugin,
};

use crate::{
  Workload,
  matching::{
    exported_to, in_policy_scope, policy_scope_applies,
    selector_matches, target_ref_resolves,
  },
};

pub fn virtual_services(
  resources: &[VirtualService],
  workload: &Workload,
) -> Vec<VirtualService> {
  resources
    .iter()
    .filter(|resource| {
      exported_to(
        &resource.export_to,
        &resource.namespace,
        &workload.namespace,
      )
    })
    .cloned()
    .collect()
}

pub fn destination_rules(
  resources: &[DestinationRule],
  workload: &Workload,
) -> Vec<DestinationRule> {
  resources
    .iter()
    .filter(|resource| {
      exported_to(
        &resource.export_to,
        &resource.namespace,
        &workload.namespace,
      )
    })
    .cloned()
    .collect()
}

pub fn service_entries(
  resources: &[ServiceEntry],
  workload: &Workload,
) -> Vec<ServiceEntry> {
  resources
    .iter()
    .filter(|resource| {
      exported_to(
        &resource.export_to,
        &resource.namespace,
        &workload.namespace,
      )
    })
    .cloned()
    .collect()
}

/// A Gateway applies when its selector matches the workload's
/// labels, subject to pilot's namespace scoping flag.
pub fn gateways(
  resources: &[Gateway],
  workload: &Workload,
) -> Vec<Gateway> {
  resources
    .iter()
    .filter(|resource| {
      let in_scope = !workload.pilot_scope_gateway_to_namespace
        || resource.namespace == workload.namespace;
      in_scope
        && selector_matches(&resource.selector, &workload.labels)
    })
    .cloned()
    .collect()
}

/// Sidecars never cross namespaces. An absent workloadSelector
/// covers every workload in the namespace.
pub fn sidecars(
  resources: &[Sidecar],
  workload: &Workload,
) -> Vec<Sidecar> {
  resources
    .iter()
    .filter(|resource| {
      resource.namespace == workload.namespace
        && selector_matches(
          &resource.workload_selector,
          &workload.labels,
        )
    })
    .cloned()
    .collect()
}

/// EnvoyFilters are scoped to their own namespace (or mesh-wide
/// from the root namespace). Non-empty targetRefs override the
/// selector: the filter then applies iff any ref resolves to a
/// bound service or gateway.
pub fn envoy_filters(
  resources: &[EnvoyFilter],
  workload: &Workload,
) -> Vec<EnvoyFilter> {
  resources
    .iter()
    .filter(|resource| {
      if !in_policy_scope(&resource.namespace, workload) {
        return false;
      }
      if !resource.target_refs.is_empty() {
        return resource
          .target_refs
          .iter()
          .any(|target| target_ref_resolves(target, workload));
      }
      selector_matches(&resource.workload_selector, &workload.labels)
    })
    .cloned()
    .collect()
}

/// Same scoping as [envoy_filters].
pub fn wasm_plugins(
  resources: &[WasmPlugin],
  workload: &Workload,
) -> Vec<WasmPlugin> {
  resources
    .iter()
    .filter(|resource| {
      if !in_policy_scope(&resource.namespace, workload) {
        return false;
      }
      if !resource.target_refs.is_empty() {
        return resource
          .target_refs
          .iter()
          .any(|target| target_ref_resolves(target, workload));
      }
      selector_matches(&resource.selector, &workload.labels)
    })
    .cloned()
    .collect()
}

pub fn peer_authentications(
  resources: &[PeerAuthentication],
  workload: &Workload,
) -> Vec<PeerAuthentication> {
  resources
    .iter()
    .filter(|resource| {
      policy_scope_applies(
        &resource.namespace,
        &resource.selector,
        workload,
      )
    })
    .cloned()
    .collect()
}

pub fn request_authentications(
  resources: &[RequestAuthentication],
  workload: &Workload,
) -> Vec<RequestAuthentication> {
  resources
    .iter()
    .filter(|resource| {
      policy_scope_applies(
        &resource.namespace,
        &resource.selector,
        workload,
      )
    })
    .cloned()
    .collect()
}

/// AuthorizationPolicies follow the root / same-namespace scoping,
/// with targetRefs taking precedence over the selector when
/// present. Null entries in the ref list are skipped.
pub fn authorization_policies(
  resources: &[AuthorizationPolicy],
  workload: &Workload,
) -> Vec<AuthorizationPolicy> {
  resources
    .iter()
    .filter(|resource| {
      if !in_policy_scope(&resource.namespace, workload) {
        return false;
      }
      if !resource.target_refs.is_empty() {
        return resource
          .target_refs
          .iter()
          .flatten()
          .any(|target| target_ref_resolves(target, workload));
      }
      selector_matches(&resource.selector, &workload.labels)
    })
    .cloned()
    .collect()
}

#[cfg(test)]
mod tests {
  use std::collections::HashMap;

  use navigator_client::entities::istio::PolicyTargetRef;

  use super::*;

  fn labels(
    pairs: &[(&str, &str)],
  ) -> HashMap<String, String> {
    pairs
      .iter()
      .map(|(k, v)| (k.to_string(), v.to_string()))
      .collect()
  }

  fn workload_in(namespace: &str) -> Workload {
    Workload {
      labels: labels(&[("app", "test"), ("version", "v1")]),
      namespace: namespace.to_string(),
      root_namespace: "istio-system".to_string(),
      ..Default::default()
    }
  }

  #[test]
  fn virtual_service_visibility() {
    let make = |namespace: &str, export_to: Vec<&str>| {
      VirtualService {
        name: "vs".to_string(),
        namespace: namespace.to_string(),
        export_to: export_to
          .into_iter()
          .map(str::to_string)
          .collect(),
        ..Default::default()
      }
    };
    let workload = workload_in("default");

    // Absent, "*", and explicit-own-namespace grants are
    // equivalent for the workload's namespace.
    for resource in [
      make("other", vec![]),
      make("other", vec!["*"]),
      make("other", vec!["default"]),
    ] {
      assert_eq!(
        virtual_services(&[resource], &workload).len(),
        1
      );
    }

    // "." restricts to the resource's own namespace.
    assert_eq!(
      virtual_services(&[make("default", vec!["."])], &workload)
        .len(),
      1
    );
    assert!(
      virtual_services(&[make("other", vec!["."])], &workload)
        .is_empty()
    );
    assert!(
      virtual_services(
        &[make("other", vec!["elsewhere"])],
        &workload
      )
      .is_empty()
    );
  }

  #[test]
  fn gateway_scoping_flag() {
    let gateway = Gateway {
      name: "gw".to_string(),
      namespace: "other".to_string(),
      selector: labels(&[("app", "test")]),
      ..Default::default()
    };

    let mut workload = workload_in("default");
    assert_eq!(
      gateways(&[gateway.clone()], &workload).len(),
      1
    );

    // Scoped to namespace: cross-namespace gateway drops out,
    // same-namespace gateway with matching selector stays.
    workload.pilot_scope_gateway_to_namespace = true;
    assert!(gateways(&[gateway.clone()], &workload).is_empty());

    let local = Gateway {
      namespace: "default".to_string(),
      ..gateway
    };
    assert_eq!(gateways(&[local.clone()], &workload).len(), 1);

    // Selector still applies under the namespace scope.
    let mismatched = Gateway {
      selector: labels(&[("app", "other")]),
      ..local
    };
    assert!(gateways(&[mismatched], &workload).is_empty());
  }

  #[test]
  fn sidecar_same_namespace_and_selector() {
    let sidecar = Sidecar {
      name: "sc".to_string(),
      namespace: "default".to_string(),
      workload_selector: labels(&[("app", "test")]),
      ..Default::default()
    };

    // Matching selector, same namespace.
    assert_eq!(
      sidecars(&[sidecar.clone()], &workload_in("default")).len(),
      1
    );
    // Other namespace never applies.
    assert!(
      sidecars(&[sidecar.clone()], &workload_in("other"))
        .is_empty()
    );
    // Empty selector covers the whole namespace.
    let unselective = Sidecar {
      workload_selector: HashMap::new(),
      ..sidecar
    };
    assert_eq!(
      sidecars(&[unselective], &workload_in("default")).len(),
      1
    );
  }

  #[test]
  fn peer_authentication_scoping() {
    let make = |namespace: &str,
                selector: HashMap<String, String>| {
      PeerAuthentication {
        name: "pa".to_string(),
        namespace: namespace.to_string(),
        selector,
        ..Default::default()
      }
    };
    let workload = workload_in("default");

    // Root namespace policies act mesh-wide.
    assert_eq!(
      peer_authentications(
        &[make("istio-system", HashMap::new())],
        &workload
      )
      .len(),
      1
    );
    // Mesh-wide with selector still needs the label match.
    assert_eq!(
      peer_authentications(
        &[make("istio-system", labels(&[("app", "test")]))],
        &workload
      )
      .len(),
      1
    );
    assert!(
      peer_authentications(
        &[make("istio-system", labels(&[("app", "other")]))],
        &workload
      )
      .is_empty()
    );
    // Same namespace applies, unrelated namespace never does.
    assert_eq!(
      peer_authentications(
        &[make("default", HashMap::new())],
        &workload
      )
      .len(),
      1
    );
    assert!(
      peer_authentications(
        &[make("other", HashMap::new())],
        &workload
      )
      .is_empty()
    );
  }

  #[test]
  fn authorization_policy_target_refs_override_selector() {
    let policy = AuthorizationPolicy {
      name: "authz".to_string(),
      namespace: "default".to_string(),
      // Selector would not match; refs take precedence.
      selector: labels(&[("app", "other")]),
      target_refs: vec![
        None,
        Some(PolicyTargetRef {
          kind: "Service".to_string(),
          name: "test-service".to_string(),
          ..Default::default()
        }),
      ],
      ..Default::default()
    };

    let mut workload = workload_in("default");
    workload.bound_services = vec!["test-service".to_string()];
    assert_eq!(
      authorization_policies(&[policy.clone()], &workload).len(),
      1
    );

    workload.bound_services = vec!["other".to_string()];
    workload.bound_gateways = Vec::new();
    assert!(
      authorization_policies(&[policy], &workload).is_empty()
    );
  }

  #[test]
  fn authorization_policy_selector_rule_without_refs() {
    let policy = AuthorizationPolicy {
      name: "authz".to_string(),
      namespace: "default".to_string(),
      selector: labels(&[("app", "test")]),
      ..Default::default()
    };
    assert_eq!(
      authorization_policies(
        &[policy.clone()],
        &workload_in("default")
      )
      .len(),
      1
    );
    assert!(
      authorization_policies(&[policy], &workload_in("other"))
        .is_empty()
    );
  }

  #[test]
  fn envoy_filter_selector_and_refs() {
    let mut workload = workload_in("default");
    workload.bound_gateways = vec!["ingress".to_string()];

    let selected = EnvoyFilter {
      name: "ef".to_string(),
      namespace: "default".to_string(),
      workload_selector: labels(&[("app", "test")]),
      ..Default::default()
    };
    assert_eq!(
      envoy_filters(&[selected.clone()], &workload).len(),
      1
    );

    // targetRefs extend to gateway membership even when the
    // selector does not match.
    let by_ref = EnvoyFilter {
      workload_selector: labels(&[("app", "other")]),
      target_refs: vec![PolicyTargetRef {
        kind: "Gateway".to_string(),
        name: "ingress".to_string(),
        ..Default::default()
      }],
      ..selected
    };
    assert_eq!(envoy_filters(&[by_ref], &workload).len(), 1);
  }

  #[test]
  fn wasm_plugin_refs_resolve_bound_services() {
    let mut workload = workload_in("default");
    workload.bound_services = vec!["test-service".to_string()];

    let plugin = WasmPlugin {
      name: "wp".to_string(),
      namespace: "default".to_string(),
      selector: labels(&[("app", "other")]),
      target_refs: vec![PolicyTargetRef {
        kind: "Service".to_string(),
        name: "test-service".to_string(),
        ..Default::default()
      }],
      ..Default::default()
    };
    assert_eq!(
      wasm_plugins(&[plugin.clone()], &workload).len(),
      1
    );

    workload.bound_services.clear();
    assert!(wasm_plugins(&[plugin], &workload).is_empty());
  }

  #[test]
  fn request_authentication_matches_peer_scoping() {
    let workload = workload_in("default");
    let mesh_wide = RequestAuthentication {
      name: "ra".to_string(),
      namespace: "istio-system".to_string(),
      ..Default::default()
    };
    let elsewhere = RequestAuthentication {
      namespace: "other".to_string(),
      ..mesh_wide.clone()
    };
    assert_eq!(
      request_authentications(&[mesh_wide], &workload).len(),
      1
    );
    assert!(
      request_authentications(&[elsewhere], &workload)
        .is_empty()
    );
  }

  #[test]
  fn filters_preserve_input_order() {
    let workload = workload_in("default");
    let resources = ["a", "b", "c"]
      .into_iter()
      .map(|name| VirtualService {
        name: name.to_string(),
        namespace: "default".to_string(),
        ..Default::default()
      })
      .collect::<Vec<_>>();
    let selected = virtual_services(&resources, &workload);
    let names = selected
      .iter()
      .map(|resource| resource.name.as_str())
      .collect::<Vec<_>>();
    assert_eq!(names, ["a", "b", "c"]);
  }

  #[test]
  fn empty_inputs_yield_empty_outputs() {
    let workload = workload_in("default");
    assert!(virtual_services(&[], &workload).is_empty());
    assert!(authorization_policies(&[], &workload).is_empty());
    assert!(sidecars(&[], &workload).is_empty());
  }
}
