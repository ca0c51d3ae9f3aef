//! Authentication module for managing user sessions and identity.
//!
//! This module provides:
//! - `AuthProvider`: sign-in, sign-up and token refresh against an identity service
//! - `IdentityClient`: REST implementation of `AuthProvider`
//! - `Session`: the persisted signed-in session
//! - `AuthService`: ties the two together and publishes identity changes
//!
//! Identity changes are published on a `tokio::sync::watch` channel so the
//! workspace can attach and detach user partitions as they happen.

pub mod client;
pub mod error;
pub mod service;
pub mod session;

use async_trait::async_trait;

pub use client::IdentityClient;
pub use error::AuthError;
pub use service::AuthService;
pub use session::{Session, SessionData};

#[async_trait]
pub trait AuthProvider: Send + Sync {
    async fn sign_in(&self, email: &str, password: &str) -> Result<SessionData, AuthError>;

    async fn sign_up(&self, email: &str, password: &str) -> Result<SessionData, AuthError>;

    /// Exchange the session's refresh token for a new ID token
    async fn refresh(&self, session: &SessionData) -> Result<SessionData, AuthError>;
}
