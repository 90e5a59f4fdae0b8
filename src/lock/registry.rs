//! Registry mapping resource keys to their mutual-exclusion cells.

use std::collections::HashMap;
use std::fmt::Display;
use std::hash::Hash;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, RwLock};
use tracing::{debug, warn};

use super::Locked;
use crate::{KodamaError, Result};

/// Shared registry of lockable resources.
///
/// Each registered value lives behind its own mutex, so holders of different
/// keys never contend. Acquisition is not re-entrant: acquiring a key twice
/// from the same task without releasing the first handle never completes
/// (or fails with [`KodamaError::LockTimeout`] when a bound is configured).
pub struct LockRegistry<K, T> {
    entries: RwLock<HashMap<K, Arc<Mutex<T>>>>,
    acquire_timeout: Option<Duration>,
}

impl<K, T> LockRegistry<K, T>
where
    K: Eq + Hash + Clone + Display,
{
    /// Create a registry whose acquisitions wait indefinitely.
    pub fn new() -> Self {
        Self::with_timeout(None)
    }

    /// Create a registry with an optional acquisition bound.
    pub fn with_timeout(acquire_timeout: Option<Duration>) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            acquire_timeout,
        }
    }

    /// Register a resource under `key`.
    ///
    /// Returns false and leaves the existing value untouched if the key is
    /// already registered.
    pub async fn insert(&self, key: K, value: T) -> bool {
        let mut entries = self.entries.write().await;
        if entries.contains_key(&key) {
            return false;
        }
        debug!(key = %key, "Registered lockable resource");
        entries.insert(key, Arc::new(Mutex::new(value)));
        true
    }

    /// Unregister a resource.
    ///
    /// A holder that still has a handle keeps exclusive access until it drops
    /// it; new acquisitions fail with `NotFound`.
    pub async fn remove(&self, key: &K) -> bool {
        let removed = self.entries.write().await.remove(key).is_some();
        if removed {
            debug!(key = %key, "Unregistered lockable resource");
        }
        removed
    }

    /// Whether `key` is registered.
    pub async fn contains(&self, key: &K) -> bool {
        self.entries.read().await.contains_key(key)
    }

    /// Number of registered resources.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Whether the registry is empty.
    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    async fn cell(&self, key: &K) -> Result<Arc<Mutex<T>>> {
        self.entries
            .read()
            .await
            .get(key)
            .cloned()
            .ok_or_else(|| KodamaError::NotFound(format!("lockable resource {key}")))
    }

    /// Acquire exclusive access to `key`, waiting for the current holder.
    pub async fn acquire(&self, key: &K) -> Result<Locked<T>> {
        let cell = self.cell(key).await?;
        let guard = match self.acquire_timeout {
            None => cell.lock_owned().await,
            Some(limit) => match tokio::time::timeout(limit, cell.lock_owned()).await {
                Ok(guard) => guard,
                Err(_) => {
                    warn!(key = %key, waited_ms = limit.as_millis() as u64, "Lock acquisition timed out");
                    return Err(KodamaError::LockTimeout {
                        key: key.to_string(),
                        waited_ms: limit.as_millis() as u64,
                    });
                }
            },
        };
        Ok(Locked::new(key.to_string(), guard))
    }

    /// Acquire exclusive access only if nobody holds it right now.
    pub async fn try_acquire(&self, key: &K) -> Result<Option<Locked<T>>> {
        let cell = self.cell(key).await?;
        Ok(cell
            .try_lock_owned()
            .ok()
            .map(|guard| Locked::new(key.to_string(), guard)))
    }
}

impl<K, T> Default for LockRegistry<K, T>
where
    K: Eq + Hash + Clone + Display,
{
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_insert_and_acquire() {
        let registry: LockRegistry<u32, String> = LockRegistry::new();
        assert!(registry.insert(1, "alice".to_string()).await);
        assert!(!registry.insert(1, "bob".to_string()).await);
        assert_eq!(registry.len().await, 1);

        let locked = registry.acquire(&1).await.unwrap();
        assert_eq!(locked.as_str(), "alice");
        assert_eq!(locked.key(), "1");
    }

    #[tokio::test]
    async fn test_acquire_unknown_key() {
        let registry: LockRegistry<u32, ()> = LockRegistry::new();
        let result = registry.acquire(&9).await;
        assert!(matches!(result, Err(KodamaError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_try_acquire_while_held() {
        let registry: LockRegistry<u32, ()> = LockRegistry::new();
        registry.insert(1, ()).await;

        let held = registry.acquire(&1).await.unwrap();
        assert!(registry.try_acquire(&1).await.unwrap().is_none());

        held.release();
        assert!(registry.try_acquire(&1).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_timeout_surfaces_lock_timeout() {
        let registry: LockRegistry<u32, ()> =
            LockRegistry::with_timeout(Some(Duration::from_millis(20)));
        registry.insert(5, ()).await;

        let _held = registry.acquire(&5).await.unwrap();
        let result = registry.acquire(&5).await;
        assert!(matches!(
            result,
            Err(KodamaError::LockTimeout { waited_ms: 20, .. })
        ));
    }

    #[tokio::test]
    async fn test_waiter_proceeds_after_release() {
        let registry: Arc<LockRegistry<u32, u32>> = Arc::new(LockRegistry::new());
        registry.insert(1, 0).await;

        let mut first = registry.acquire(&1).await.unwrap();
        let waiter = {
            let registry = Arc::clone(&registry);
            tokio::spawn(async move {
                let mut locked = registry.acquire(&1).await.unwrap();
                *locked += 1;
                *locked
            })
        };

        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(!waiter.is_finished());

        *first = 10;
        drop(first);

        assert_eq!(waiter.await.unwrap(), 11);
    }

    #[tokio::test]
    async fn test_remove_keeps_existing_holder() {
        let registry: LockRegistry<u32, u32> = LockRegistry::new();
        registry.insert(1, 3).await;

        let locked = registry.acquire(&1).await.unwrap();
        assert!(registry.remove(&1).await);
        assert_eq!(*locked, 3);
        assert!(registry.acquire(&1).await.is_err());
        assert!(registry.is_empty().await);
    }
}
