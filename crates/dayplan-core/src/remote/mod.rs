//! Remote store module for the hosted realtime database.
//!
//! The remote store is a hierarchical, path-addressed JSON tree. Each user
//! owns the partition `users/<identity>`, holding one subtree per
//! collection. Collections are always read and written whole: a push
//! replaces the entire subtree, there is no per-record patching.
//!
//! - `RemoteStore`: the read/write/delete surface the synchronizer uses
//! - `RealtimeDbClient`: REST adapter for the hosted database
//! - `MemoryRemote`: in-process tree for tests and local development

pub mod client;
pub mod codec;
pub mod error;
pub mod memory;

use async_trait::async_trait;
use serde_json::Value;

use crate::models::Collection;

pub use client::RealtimeDbClient;
pub use codec::{records_to_tree, tree_to_records};
pub use error::StorageError;
pub use memory::MemoryRemote;

/// Path of one collection inside a user's partition.
pub fn partition_path(identity: &str, collection: Collection) -> String {
    format!("users/{}/{}", identity, collection.key())
}

#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Read the whole subtree at `path`. Missing paths read as `Value::Null`.
    async fn read_all(&self, path: &str) -> Result<Value, StorageError>;

    /// Replace the whole subtree at `path`.
    async fn write_all(&self, path: &str, tree: &Value) -> Result<(), StorageError>;

    async fn delete(&self, path: &str) -> Result<(), StorageError>;
}
