//! Local caching module for offline-first record storage.
//!
//! This module provides the `LocalCache` for storing and retrieving a
//! user's tasks, timetable and notes on the local device. Every mutation
//! rewrites the full collection, and the dirty flag is stored next to the
//! collections.

pub mod manager;
pub mod schema;
pub mod store;

pub use manager::{age_display, CachedData, LocalCache, Snapshot};
pub use schema::DecodeError;
pub use store::{FileStore, KeyValueStore, MemoryStore};
