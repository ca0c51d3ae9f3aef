//! dayplan core - offline-first tasks, timetable and notes.
//!
//! The [`sync::Workspace`] holds one user's records in memory, writes every
//! change through to a [`cache::LocalCache`], and pushes whole collections
//! to a [`remote::RemoteStore`] when the user syncs. Identity comes from
//! [`auth::AuthService`]; [`ai::Assistant`] provides the suggestion and
//! timetable features.

pub mod ai;
pub mod app;
pub mod auth;
pub mod cache;
pub mod config;
pub mod logging;
pub mod models;
pub mod remote;
pub mod sync;

pub use app::App;
pub use config::Config;
pub use sync::Workspace;
