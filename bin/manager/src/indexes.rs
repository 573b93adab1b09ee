use std::{
  collections::{BTreeMap, HashMap},
  sync::Arc,
};

use navigator_client::entities::{
  cluster::ClusterState,
  service::{AggregatedService, ServiceInstance},
};

/// The read-optimized view answering every aggregate query.
///
/// Immutable after construction: a rebuild produces a fresh value
/// which is published with one atomic pointer swap, so a reader
/// always observes one internally consistent bundle of all five
/// maps.
#[derive(Debug, Default)]
pub struct Indexes {
  /// service id => across-cluster aggregate
  pub services: HashMap<String, Arc<AggregatedService>>,
  /// namespace => services in it
  pub services_by_namespace:
    HashMap<String, Vec<Arc<AggregatedService>>>,
  /// cluster id => services it contributes to
  pub services_by_cluster:
    HashMap<String, Vec<Arc<AggregatedService>>>,
  /// instance id => instance
  pub instances: HashMap<String, Arc<ServiceInstance>>,
  /// service id => instances backing it
  pub instances_by_service:
    HashMap<String, Vec<Arc<ServiceInstance>>>,
}

impl Indexes {
  /// The narrowest slice matching the given filters.
  pub fn list_services(
    &self,
    namespace: Option<&str>,
    cluster_id: Option<&str>,
  ) -> Vec<Arc<AggregatedService>> {
    match (cluster_id, namespace) {
      (Some(cluster_id), Some(namespace)) => self
        .services_by_cluster
        .get(cluster_id)
        .into_iter()
        .flatten()
        .filter(|service| service.namespace == namespace)
        .cloned()
        .collect(),
      (Some(cluster_id), None) => self
        .services_by_cluster
        .get(cluster_id)
        .cloned()
        .unwrap_or_default(),
      (None, Some(namespace)) => self
        .services_by_namespace
        .get(namespace)
        .cloned()
        .unwrap_or_default(),
      (None, None) => self.services.values().cloned().collect(),
    }
  }
}

/// Construct fresh indexes from every connected cluster's state.
///
/// Cluster ids are iterated in sorted order so two rebuilds over
/// the same input produce identical aggregates.
pub fn build(
  states: &[(String, Arc<ClusterState>)],
) -> Indexes {
  let mut sorted = states.iter().collect::<Vec<_>>();
  sorted.sort_by(|a, b| a.0.cmp(&b.0));

  // service id => aggregate, ordered for determinism.
  let mut aggregates =
    BTreeMap::<String, AggregatedService>::new();
  let mut instances = HashMap::new();
  let mut instances_by_service =
    HashMap::<String, Vec<Arc<ServiceInstance>>>::new();

  for (cluster_id, state) in sorted {
    for service in &state.services {
      let id = service.id();
      let aggregate = aggregates
        .entry(id.clone())
        .or_insert_with(|| AggregatedService {
          id: id.clone(),
          name: service.name.clone(),
          namespace: service.namespace.clone(),
          ..Default::default()
        });

      let mut instance_ids = Vec::new();
      for instance in &service.instances {
        let mut instance = instance.clone();
        // The registry key is authoritative for ownership.
        instance.cluster_name = cluster_id.clone();
        let instance_id = instance.id();
        let instance = Arc::new(instance);

        instance_ids.push(instance_id.clone());
        aggregate.instances.push((*instance).clone());
        instances.insert(instance_id, instance.clone());
        instances_by_service
          .entry(id.clone())
          .or_default()
          .push(instance);
      }
      aggregate
        .cluster_map
        .insert(cluster_id.clone(), instance_ids);
      if let Some(cluster_ip) = &service.cluster_ip {
        aggregate
          .cluster_ips
          .insert(cluster_id.clone(), cluster_ip.clone());
      }
      if let Some(external_ip) = &service.external_ip {
        aggregate
          .external_ips
          .insert(cluster_id.clone(), external_ip.clone());
      }
    }
  }

  let mut services = HashMap::new();
  let mut services_by_namespace =
    HashMap::<String, Vec<Arc<AggregatedService>>>::new();
  let mut services_by_cluster =
    HashMap::<String, Vec<Arc<AggregatedService>>>::new();

  for (id, aggregate) in aggregates {
    let aggregate = Arc::new(aggregate);
    services_by_namespace
      .entry(aggregate.namespace.clone())
      .or_default()
      .push(aggregate.clone());
    for cluster_id in aggregate.cluster_map.keys() {
      services_by_cluster
        .entry(cluster_id.clone())
        .or_default()
        .push(aggregate.clone());
    }
    services.insert(id, aggregate);
  }

  Indexes {
    services,
    services_by_namespace,
    services_by_cluster,
    instances,
    instances_by_service,
  }
}

#[cfg(test)]
mod tests {
  use navigator_client::entities::service::Service;

  use super::*;

  fn instance(pod_name: &str, ip: &str) -> ServiceInstance {
    ServiceInstance {
      ip: ip.to_string(),
      pod_name: pod_name.to_string(),
      namespace: "default".to_string(),
      envoy_present: true,
      ..Default::default()
    }
  }

  fn state_with(
    name: &str,
    instances: Vec<ServiceInstance>,
  ) -> Arc<ClusterState> {
    Arc::new(ClusterState {
      services: vec![Service {
        name: name.to_string(),
        namespace: "default".to_string(),
        cluster_ip: Some("10.96.0.1".to_string()),
        instances,
        ..Default::default()
      }],
      ..Default::default()
    })
  }

  #[test]
  fn single_cluster_discovery() {
    let states = vec![(
      "cluster1".to_string(),
      state_with("svc1", vec![instance("pod1", "10.0.0.1")]),
    )];
    let indexes = build(&states);

    let listed = indexes.list_services(Some("default"), None);
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id, "default:svc1");

    let found = indexes
      .instances
      .get("cluster1:default:pod1")
      .expect("instance should be indexed");
    assert_eq!(found.ip, "10.0.0.1");
    assert_eq!(found.cluster_name, "cluster1");
  }

  #[test]
  fn two_cluster_aggregation() {
    let states = vec![
      (
        "cluster1".to_string(),
        state_with(
          "web-service",
          vec![instance("web-pod1", "10.0.0.1")],
        ),
      ),
      (
        "cluster2".to_string(),
        state_with(
          "web-service",
          vec![instance("web-pod2", "10.1.0.1")],
        ),
      ),
    ];
    let indexes = build(&states);

    let service = indexes
      .services
      .get("default:web-service")
      .expect("aggregated service");
    assert_eq!(service.instances.len(), 2);
    assert_eq!(service.cluster_map["cluster1"].len(), 1);
    assert_eq!(service.cluster_map["cluster2"].len(), 1);
    assert_eq!(service.cluster_ips.len(), 2);

    // Union of instance ids across both clusters.
    let mut ids = service
      .instances
      .iter()
      .map(ServiceInstance::id)
      .collect::<Vec<_>>();
    ids.sort();
    assert_eq!(
      ids,
      vec![
        "cluster1:default:web-pod1",
        "cluster2:default:web-pod2"
      ]
    );
  }

  #[test]
  fn removed_cluster_leaves_no_residue() {
    let cluster1 = (
      "cluster1".to_string(),
      state_with(
        "web-service",
        vec![instance("web-pod1", "10.0.0.1")],
      ),
    );
    let cluster2 = (
      "cluster2".to_string(),
      state_with(
        "web-service",
        vec![instance("web-pod2", "10.1.0.1")],
      ),
    );
    let both = build(&[cluster1, cluster2.clone()]);
    assert_eq!(
      both.services["default:web-service"].instances.len(),
      2
    );

    let remaining = build(&[cluster2]);
    let service = &remaining.services["default:web-service"];
    assert_eq!(service.instances.len(), 1);
    assert_eq!(service.instances[0].cluster_name, "cluster2");
    assert!(
      !remaining.services_by_cluster.contains_key("cluster1")
    );
    assert!(
      !remaining.instances.contains_key("cluster1:default:web-pod1")
    );
  }

  #[test]
  fn rebuild_is_idempotent() {
    let states = vec![
      (
        "cluster2".to_string(),
        state_with("svc", vec![instance("pod2", "10.1.0.1")]),
      ),
      (
        "cluster1".to_string(),
        state_with("svc", vec![instance("pod1", "10.0.0.1")]),
      ),
    ];
    let first = build(&states);
    let second = build(&states);

    assert_eq!(
      first.services["default:svc"],
      second.services["default:svc"]
    );
    // Sorted cluster iteration: instance order is stable.
    let order = first.services["default:svc"]
      .instances
      .iter()
      .map(|i| i.cluster_name.as_str())
      .collect::<Vec<_>>();
    assert_eq!(order, vec!["cluster1", "cluster2"]);
  }

  #[test]
  fn all_maps_publish_together() {
    let states = vec![(
      "cluster1".to_string(),
      state_with("svc1", vec![instance("pod1", "10.0.0.1")]),
    )];
    let indexes = build(&states);

    for services in indexes.services_by_namespace.values() {
      for service in services {
        assert!(indexes.services.contains_key(&service.id));
      }
    }
    for services in indexes.services_by_cluster.values() {
      for service in services {
        assert!(indexes.services.contains_key(&service.id));
      }
    }
    for instances in indexes.instances_by_service.values() {
      for instance in instances {
        assert!(indexes.instances.contains_key(&instance.id()));
      }
    }
  }

  #[test]
  fn narrowest_slice_selection() {
    let states = vec![
      (
        "cluster1".to_string(),
        Arc::new(ClusterState {
          services: vec![
            Service {
              name: "a".to_string(),
              namespace: "default".to_string(),
              ..Default::default()
            },
            Service {
              name: "b".to_string(),
              namespace: "other".to_string(),
              ..Default::default()
            },
          ],
          ..Default::default()
        }),
      ),
      (
        "cluster2".to_string(),
        state_with("c", Vec::new()),
      ),
    ];
    let indexes = build(&states);

    assert_eq!(indexes.list_services(None, None).len(), 3);
    assert_eq!(
      indexes.list_services(Some("default"), None).len(),
      2
    );
    assert_eq!(
      indexes.list_services(None, Some("cluster1")).len(),
      2
    );
    assert_eq!(
      indexes
        .list_services(Some("other"), Some("cluster1"))
        .len(),
      1
    );
    assert_eq!(
      indexes
        .list_services(Some("other"), Some("cluster2"))
        .len(),
      0
    );
    assert!(
      indexes.list_services(None, Some("missing")).is_empty()
    );
  }
}
