//! Keyed advisory locks coordinating concurrent postings

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::OwnedMutexGuard;
use tracing::warn;

/// One advisory mutex per key, allocated lazily.
///
/// The posting engine keys on account id, the financial-year guard on scope.
/// Handles are never removed; the map is bounded by the chart of accounts.
pub struct KeyedLocks<K> {
    handles: Mutex<HashMap<K, Arc<tokio::sync::Mutex<()>>>>,
}

impl<K> KeyedLocks<K>
where
    K: Eq + Hash + Ord + Clone + std::fmt::Debug,
{
    /// Create an empty lock map
    pub fn new() -> Self {
        Self {
            handles: Mutex::new(HashMap::new()),
        }
    }

    fn handle(&self, key: &K) -> Arc<tokio::sync::Mutex<()>> {
        let mut handles = self.handles.lock().expect("lock map poisoned");
        handles
            .entry(key.clone())
            .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(())))
            .clone()
    }

    /// Acquire a single key's lock, waiting as long as it takes
    pub async fn lock(&self, key: &K) -> OwnedMutexGuard<()> {
        self.handle(key).lock_owned().await
    }

    /// Acquire a single key's lock, or None if `timeout` elapses first
    pub async fn acquire(&self, key: &K, timeout: Duration) -> Option<OwnedMutexGuard<()>> {
        let handle = self.handle(key);
        match tokio::time::timeout(timeout, handle.lock_owned()).await {
            Ok(guard) => Some(guard),
            Err(_) => {
                warn!(?key, "advisory lock acquisition timed out");
                None
            }
        }
    }

    /// Acquire several keys in ascending order, deduplicated.
    ///
    /// The fixed global order prevents deadlock between postings that share
    /// accounts. On timeout the already-held guards are dropped and the
    /// offending key is returned; nothing stays locked.
    pub async fn acquire_ordered(
        &self,
        keys: &[K],
        timeout: Duration,
    ) -> Result<Vec<OwnedMutexGuard<()>>, K> {
        let mut ordered: Vec<K> = keys.to_vec();
        ordered.sort();
        ordered.dedup();

        let mut guards = Vec::with_capacity(ordered.len());
        for key in &ordered {
            match self.acquire(key, timeout).await {
                Some(guard) => guards.push(guard),
                None => return Err(key.clone()),
            }
        }
        Ok(guards)
    }
}

impl<K> Default for KeyedLocks<K>
where
    K: Eq + Hash + Ord + Clone + std::fmt::Debug,
{
    fn default() -> Self {
        Self::new()
    }
}
