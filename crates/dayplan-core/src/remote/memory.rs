use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use serde_json::Value;

use super::{RemoteStore, StorageError};

#[derive(Default)]
struct Inner {
    nodes: HashMap<String, Value>,
    failing_writes: HashSet<String>,
    failing_reads: HashSet<String>,
    writes: usize,
    reads: usize,
}

/// In-memory remote tree keyed by full path. Clones share the same tree.
///
/// Paths can be marked failing to simulate an unreachable database.
#[derive(Clone, Default)]
pub struct MemoryRemote {
    inner: Arc<RwLock<Inner>>,
}

impl MemoryRemote {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock_err() -> StorageError {
        StorageError::Unavailable("memory remote lock poisoned".to_string())
    }

    /// Seed a node directly
    pub fn insert(&self, path: &str, tree: Value) {
        if let Ok(mut inner) = self.inner.write() {
            inner.nodes.insert(path.to_string(), tree);
        }
    }

    pub fn get(&self, path: &str) -> Option<Value> {
        self.inner.read().ok()?.nodes.get(path).cloned()
    }

    pub fn fail_writes_to(&self, path: &str) {
        if let Ok(mut inner) = self.inner.write() {
            inner.failing_writes.insert(path.to_string());
        }
    }

    pub fn fail_reads_from(&self, path: &str) {
        if let Ok(mut inner) = self.inner.write() {
            inner.failing_reads.insert(path.to_string());
        }
    }

    pub fn heal(&self) {
        if let Ok(mut inner) = self.inner.write() {
            inner.failing_writes.clear();
            inner.failing_reads.clear();
        }
    }

    /// Number of read and write requests served so far
    pub fn request_counts(&self) -> (usize, usize) {
        self.inner
            .read()
            .map(|inner| (inner.reads, inner.writes))
            .unwrap_or_default()
    }
}

#[async_trait]
impl RemoteStore for MemoryRemote {
    async fn read_all(&self, path: &str) -> Result<Value, StorageError> {
        let mut inner = self.inner.write().map_err(|_| Self::lock_err())?;
        inner.reads += 1;
        if inner.failing_reads.contains(path) {
            return Err(StorageError::Unavailable(format!("read {}", path)));
        }
        Ok(inner.nodes.get(path).cloned().unwrap_or(Value::Null))
    }

    async fn write_all(&self, path: &str, tree: &Value) -> Result<(), StorageError> {
        let mut inner = self.inner.write().map_err(|_| Self::lock_err())?;
        inner.writes += 1;
        if inner.failing_writes.contains(path) {
            return Err(StorageError::Unavailable(format!("write {}", path)));
        }
        inner.nodes.insert(path.to_string(), tree.clone());
        Ok(())
    }

    async fn delete(&self, path: &str) -> Result<(), StorageError> {
        let mut inner = self.inner.write().map_err(|_| Self::lock_err())?;
        inner.writes += 1;
        if inner.failing_writes.contains(path) {
            return Err(StorageError::Unavailable(format!("delete {}", path)));
        }
        let prefix = format!("{}/", path);
        inner
            .nodes
            .retain(|key, _| key != path && !key.starts_with(&prefix));
        Ok(())
    }
}
