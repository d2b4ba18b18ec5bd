//! Process-wide namespace registry.
//!
//! Groups are registered once at startup and looked up by name on every
//! request the peer server handles, so the registry is a concurrent map
//! living for the whole process.

use super::{Group, LoaderFn, loader};
use crate::store::cache::CachePolicy;
use dashmap::DashMap;
use std::future::Future;
use std::sync::{Arc, LazyLock};

static GROUPS: LazyLock<DashMap<String, Arc<Group>>> = LazyLock::new(DashMap::new);

/// Creates and registers a byte-budgeted LRU group.
///
/// Registering a name again replaces the previous group.
pub fn new_group<F, Fut>(name: &str, max_bytes: usize, load: F) -> Arc<Group>
where
    F: Fn(String) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<Vec<u8>>> + Send + 'static,
{
    new_group_with_policy(name, CachePolicy::Lru { max_bytes }, loader(load))
}

/// Creates and registers a group with an explicit replacement policy.
pub fn new_group_with_policy(name: &str, policy: CachePolicy, loader: LoaderFn) -> Arc<Group> {
    let group = Arc::new(Group::new(name, policy, loader));
    GROUPS.insert(name.to_string(), group.clone());
    tracing::info!("registered cache group {}", name);
    group
}

/// Looks up a registered group by name.
pub fn get_group(name: &str) -> Option<Arc<Group>> {
    GROUPS.get(name).map(|entry| entry.value().clone())
}

/// Snapshot of every registered group, for observability endpoints.
pub fn list_groups() -> Vec<Arc<Group>> {
    GROUPS.iter().map(|entry| entry.value().clone()).collect()
}
