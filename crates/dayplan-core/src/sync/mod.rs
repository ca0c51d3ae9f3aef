//! Synchronization between the local cache and the remote store.
//!
//! The [`Workspace`] is the service object the UI holds: it owns the
//! in-memory collections of the attached identity, writes every mutation
//! through to the [`LocalCache`](crate::cache::LocalCache), and talks to the
//! remote store only on first load and when the user asks to sync.
//!
//! Conflict handling is last-write-wins: a push replaces each remote
//! collection wholesale, so two devices editing concurrently overwrite each
//! other.

pub mod state;
pub mod workspace;

pub use state::{AttachOutcome, SyncReport, SyncState};
pub use workspace::Workspace;
