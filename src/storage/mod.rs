use std::{collections::HashMap, time::Duration};

use async_trait::async_trait;
use tokio::sync::RwLock;

/// Failures of the persisted key-value layer. Never crosses the public
/// boundary of the device policy.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("storage backend error: {0}")]
    Backend(String),
    #[error("malformed stored value: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("storage call timed out after {0:?}")]
    Timeout(Duration),
}

pub type StorageResult<T> = Result<T, StorageError>;

/// Asynchronous string-keyed store. Each call can fail independently.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> StorageResult<Option<String>>;
    async fn set(&self, key: &str, value: &str) -> StorageResult<()>;
    async fn remove(&self, key: &str) -> StorageResult<()>;
}

/// Process-local store.
#[derive(Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub(crate) async fn len(&self) -> usize {
        self.entries.read().await.len()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> StorageResult<Option<String>> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        self.entries
            .write()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> StorageResult<()> {
        self.entries.write().await.remove(key);
        Ok(())
    }
}

/// Bounds every call of the inner store by `limit`.
pub struct TimeoutStore<S> {
    inner: S,
    limit: Duration,
}

impl<S: KeyValueStore> TimeoutStore<S> {
    pub fn new(inner: S, limit: Duration) -> Self {
        Self { inner, limit }
    }
}

#[async_trait]
impl<S: KeyValueStore> KeyValueStore for TimeoutStore<S> {
    async fn get(&self, key: &str) -> StorageResult<Option<String>> {
        tokio::time::timeout(self.limit, self.inner.get(key))
            .await
            .map_err(|_| StorageError::Timeout(self.limit))?
    }

    async fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        tokio::time::timeout(self.limit, self.inner.set(key, value))
            .await
            .map_err(|_| StorageError::Timeout(self.limit))?
    }

    async fn remove(&self, key: &str) -> StorageResult<()> {
        tokio::time::timeout(self.limit, self.inner.remove(key))
            .await
            .map_err(|_| StorageError::Timeout(self.limit))?
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::atomic::{AtomicBool, Ordering};

    use tokio::sync::Notify;

    use super::*;

    /// Every call fails.
    pub struct FailingStore;

    #[async_trait]
    impl KeyValueStore for FailingStore {
        async fn get(&self, _key: &str) -> StorageResult<Option<String>> {
            Err(StorageError::Backend("disk unavailable".into()))
        }

        async fn set(&self, _key: &str, _value: &str) -> StorageResult<()> {
            Err(StorageError::Backend("disk unavailable".into()))
        }

        async fn remove(&self, _key: &str) -> StorageResult<()> {
            Err(StorageError::Backend("disk unavailable".into()))
        }
    }

    /// Reads succeed, writes fail.
    pub struct ReadOnlyStore(pub MemoryStore);

    #[async_trait]
    impl KeyValueStore for ReadOnlyStore {
        async fn get(&self, key: &str) -> StorageResult<Option<String>> {
            self.0.get(key).await
        }

        async fn set(&self, _key: &str, _value: &str) -> StorageResult<()> {
            Err(StorageError::Backend("read-only".into()))
        }

        async fn remove(&self, _key: &str) -> StorageResult<()> {
            Err(StorageError::Backend("read-only".into()))
        }
    }

    /// Pauses the first `get` of `gate_key` until `release` is notified,
    /// signalling `reached` once the call is parked.
    pub struct GatedStore {
        pub inner: MemoryStore,
        gate_key: String,
        armed: AtomicBool,
        pub reached: Notify,
        pub release: Notify,
    }

    impl GatedStore {
        pub fn new(gate_key: &str) -> Self {
            Self {
                inner: MemoryStore::new(),
                gate_key: gate_key.to_string(),
                armed: AtomicBool::new(true),
                reached: Notify::new(),
                release: Notify::new(),
            }
        }
    }

    #[async_trait]
    impl KeyValueStore for GatedStore {
        async fn get(&self, key: &str) -> StorageResult<Option<String>> {
            if key == self.gate_key && self.armed.swap(false, Ordering::SeqCst) {
                self.reached.notify_one();
                self.release.notified().await;
            }
            self.inner.get(key).await
        }

        async fn set(&self, key: &str, value: &str) -> StorageResult<()> {
            self.inner.set(key, value).await
        }

        async fn remove(&self, key: &str) -> StorageResult<()> {
            self.inner.remove(key).await
        }
    }

    /// Never answers.
    pub struct StalledStore;

    #[async_trait]
    impl KeyValueStore for StalledStore {
        async fn get(&self, _key: &str) -> StorageResult<Option<String>> {
            std::future::pending().await
        }

        async fn set(&self, _key: &str, _value: &str) -> StorageResult<()> {
            std::future::pending().await
        }

        async fn remove(&self, _key: &str) -> StorageResult<()> {
            std::future::pending().await
        }
    }
}
