use std::path::Path;

use anyhow::{Context, Result};
use async_trait::async_trait;
use rocksdb::{Options, DB};

use crate::storage::{KeyValueStore, StorageError, StorageResult};

/// Device-local persistent store backed by RocksDB.
pub struct DBLayer {
    db: DB,
}

impl DBLayer {
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut opts = Options::default();
        opts.create_if_missing(true);
        let db = DB::open(&opts, path)
            .with_context(|| format!("Failed to open RocksDB at {}", path.display()))?;
        Ok(Self { db })
    }
}

fn backend(err: impl std::fmt::Display) -> StorageError {
    StorageError::Backend(err.to_string())
}

#[async_trait]
impl KeyValueStore for DBLayer {
    async fn get(&self, key: &str) -> StorageResult<Option<String>> {
        match self.db.get(key).map_err(backend)? {
            Some(bytes) => String::from_utf8(bytes).map(Some).map_err(backend),
            None => Ok(None),
        }
    }

    async fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        self.db.put(key, value.as_bytes()).map_err(backend)
    }

    async fn remove(&self, key: &str) -> StorageResult<()> {
        self.db.delete(key).map_err(backend)
    }
}
