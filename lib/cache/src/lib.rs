use std::{collections::HashMap, hash::Hash};

use tokio::sync::RwLock;

/// Async map handing out clones of its values.
/// Used for the pending proxy-config request tables and the
/// edge's manager-channel map, where readers must never hold
/// the lock across await points.
#[derive(Debug)]
pub struct CloneCache<K: PartialEq + Eq + Hash, T: Clone>(
  RwLock<HashMap<K, T>>,
);

impl<K: PartialEq + Eq + Hash, T: Clone> Default
  for CloneCache<K, T>
{
  fn default() -> Self {
    Self(RwLock::new(HashMap::new()))
  }
}

impl<K: PartialEq + Eq + Hash + std::fmt::Debug + Clone, T: Clone>
  CloneCache<K, T>
{
  pub async fn get(&self, key: &K) -> Option<T> {
    self.0.read().await.get(key).cloned()
  }

  pub async fn get_keys(&self) -> Vec<K> {
    let cache = self.0.read().await;
    cache.keys().cloned().collect()
  }

  pub async fn get_values(&self) -> Vec<T> {
    let cache = self.0.read().await;
    cache.values().cloned().collect()
  }

  pub async fn get_entries(&self) -> Vec<(K, T)> {
    let cache = self.0.read().await;
    cache.iter().map(|(k, v)| (k.clone(), v.clone())).collect()
  }

  pub async fn insert<Key>(&self, key: Key, val: T) -> Option<T>
  where
    Key: Into<K>,
  {
    self.0.write().await.insert(key.into(), val)
  }

  pub async fn remove(&self, key: &K) -> Option<T> {
    self.0.write().await.remove(key)
  }

  /// Remove and return every entry. Used to fail all pending
  /// requests on connection teardown.
  pub async fn drain(&self) -> Vec<(K, T)> {
    let mut cache = self.0.write().await;
    cache.drain().collect()
  }

  pub async fn len(&self) -> usize {
    self.0.read().await.len()
  }

  pub async fn is_empty(&self) -> bool {
    self.0.read().await.is_empty()
  }
}

impl<
  K: PartialEq + Eq + Hash + std::fmt::Debug + Clone,
  T: Clone + Default,
> CloneCache<K, T>
{
  pub async fn get_or_insert_default(&self, key: &K) -> T {
    let mut lock = self.0.write().await;
    match lock.get(key).cloned() {
      Some(item) => item,
      None => {
        let item: T = Default::default();
        lock.insert(key.clone(), item.clone());
        item
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[tokio::test]
  async fn insert_get_remove() {
    let cache = CloneCache::<String, usize>::default();
    assert!(cache.is_empty().await);
    cache.insert("a".to_string(), 1).await;
    assert_eq!(cache.get(&"a".to_string()).await, Some(1));
    assert_eq!(cache.remove(&"a".to_string()).await, Some(1));
    assert_eq!(cache.get(&"a".to_string()).await, None);
  }

  #[tokio::test]
  async fn drain_empties_the_cache() {
    let cache = CloneCache::<String, usize>::default();
    cache.insert("a".to_string(), 1).await;
    cache.insert("b".to_string(), 2).await;
    let mut drained = cache.drain().await;
    drained.sort();
    assert_eq!(
      drained,
      vec![("a".to_string(), 1), ("b".to_string(), 2)]
    );
    assert!(cache.is_empty().await);
  }
}
