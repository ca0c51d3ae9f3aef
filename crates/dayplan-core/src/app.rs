//! Application wiring.
//!
//! [`App`] builds the clients from [`Config`], restores the saved session
//! and keeps the workspace attached to whoever is signed in.

use std::sync::Arc;

use anyhow::{bail, Context, Result};
use tracing::{debug, info, warn};

use crate::ai::HostedModelClient;
use crate::auth::{AuthService, IdentityClient, Session};
use crate::cache::LocalCache;
use crate::config::Config;
use crate::remote::{RealtimeDbClient, StorageError};
use crate::sync::{AttachOutcome, SyncReport, Workspace};

/// Subdirectory of the cache directory holding record collections
const RECORDS_DIR: &str = "records";

/// Model used when the config names an assistant endpoint but no model
const DEFAULT_ASSISTANT_MODEL: &str = "default";

pub struct App {
    pub config: Config,
    pub auth: AuthService,
    pub workspace: Workspace,
    db: RealtimeDbClient,
}

impl App {
    /// Build the application from configuration. No network access happens
    /// until [`App::start`].
    pub fn new(config: Config) -> Result<Self> {
        let cache_dir = config.cache_dir()?;
        debug!(?cache_dir, "Cache directory configured");

        let identity = IdentityClient::new(config.api_key()?)?;
        let auth = AuthService::new(Arc::new(identity), Session::new(cache_dir.clone()));

        let db = RealtimeDbClient::new(config.database_url()?)?;
        let cache = LocalCache::open(cache_dir.join(RECORDS_DIR))
            .context("Failed to open local cache")?;

        let mut workspace = Workspace::new(cache, Arc::new(db.clone()));
        if let Some(ref endpoint) = config.assistant_endpoint {
            let model = config
                .assistant_model
                .as_deref()
                .unwrap_or(DEFAULT_ASSISTANT_MODEL);
            let assistant = HostedModelClient::new(endpoint, model, config.api_key.clone())?;
            workspace = workspace.with_assistant(Arc::new(assistant));
        }

        Ok(Self {
            config,
            auth,
            workspace,
            db,
        })
    }

    /// Point the workspace at the database with the current ID token
    fn refresh_remote(&mut self) {
        let remote = match self.auth.id_token() {
            Some(token) => self.db.with_token(token.to_string()),
            None => self.db.clone(),
        };
        self.workspace.set_remote(Arc::new(remote));
    }

    async fn apply_identity(&mut self) -> Result<AttachOutcome, StorageError> {
        self.refresh_remote();
        let identity = self.auth.identity();
        self.workspace.on_identity_change(identity.as_deref()).await
    }

    /// Restore the saved session and attach its records
    pub async fn start(&mut self) -> Result<AttachOutcome> {
        let restored = self.auth.restore().await?;
        debug!(restored, "Session restore finished");
        Ok(self.apply_identity().await?)
    }

    pub async fn sign_in(&mut self, email: &str, password: &str) -> Result<AttachOutcome> {
        self.auth.sign_in(email, password).await?;
        self.remember_email(email);
        Ok(self.apply_identity().await?)
    }

    pub async fn sign_up(&mut self, email: &str, password: &str) -> Result<AttachOutcome> {
        self.auth.sign_up(email, password).await?;
        self.remember_email(email);
        Ok(self.apply_identity().await?)
    }

    pub async fn sign_out(&mut self) -> Result<()> {
        self.auth.sign_out()?;
        self.apply_identity().await?;
        Ok(())
    }

    /// Push local collections, renewing the session token first if needed.
    ///
    /// If the renewal ends the session, the workspace is detached and
    /// nothing is pushed.
    pub async fn sync(&mut self) -> Result<SyncReport> {
        self.auth.refresh_if_needed().await?;
        let identity = self.auth.identity();
        if identity.as_deref() != self.workspace.identity() {
            self.apply_identity().await?;
            bail!("Signed-in identity changed, sync aborted");
        }
        self.refresh_remote();
        let report = self.workspace.sync().await?;
        info!(records = report.total(), "Synced with database");
        Ok(report)
    }

    fn remember_email(&mut self, email: &str) {
        if self.config.last_email.as_deref() == Some(email) {
            return;
        }
        self.config.last_email = Some(email.to_string());
        if let Err(e) = self.config.save() {
            warn!(error = %e, "Failed to save config");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::{Duration, TimeZone, Utc};

    use crate::auth::{AuthError, AuthProvider, SessionData};
    use crate::cache::MemoryStore;
    use crate::models::{Priority, TaskDraft};
    use crate::remote::MemoryRemote;

    /// Identity service that has revoked every refresh token.
    struct RevokedProvider;

    #[async_trait]
    impl AuthProvider for RevokedProvider {
        async fn sign_in(&self, _email: &str, _password: &str) -> Result<SessionData, AuthError> {
            Err(AuthError::InvalidCredentials)
        }

        async fn sign_up(&self, _email: &str, _password: &str) -> Result<SessionData, AuthError> {
            Err(AuthError::InvalidCredentials)
        }

        async fn refresh(&self, _session: &SessionData) -> Result<SessionData, AuthError> {
            Err(AuthError::from_code("INVALID_REFRESH_TOKEN"))
        }
    }

    fn config(dir: &std::path::Path) -> Config {
        Config {
            database_url: Some("https://db.example.com".to_string()),
            api_key: Some("key".to_string()),
            cache_dir: Some(dir.to_path_buf()),
            ..Default::default()
        }
    }

    #[test]
    fn test_new_creates_records_dir() {
        let dir = tempfile::tempdir().unwrap();
        let app = App::new(config(dir.path())).unwrap();
        assert!(dir.path().join(RECORDS_DIR).is_dir());
        assert!(app.workspace.identity().is_none());
        assert!(app.auth.identity().is_none());
    }

    #[test]
    fn test_new_requires_database_url() {
        let dir = tempfile::tempdir().unwrap();
        let mut cfg = config(dir.path());
        cfg.database_url = None;
        assert!(App::new(cfg).is_err());
    }

    #[tokio::test]
    async fn test_start_without_session_stays_detached() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = App::new(config(dir.path())).unwrap();
        assert_eq!(app.start().await.unwrap(), AttachOutcome::Detached);
        assert!(app.workspace.tasks().is_empty());
    }

    #[tokio::test]
    async fn test_sync_after_revoked_refresh_detaches_without_pushing() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = Session::new(dir.path().to_path_buf());
        session.update(SessionData {
            user_id: "u1".to_string(),
            email: "u1@example.com".to_string(),
            id_token: "id".to_string(),
            refresh_token: "refresh".to_string(),
            created_at: Utc::now() - Duration::hours(2),
            expires_in_secs: 3600,
        });

        let remote = MemoryRemote::new();
        let mut workspace = Workspace::new(
            LocalCache::new(Arc::new(MemoryStore::new())),
            Arc::new(remote.clone()),
        );
        workspace.attach("u1").await.unwrap();
        workspace
            .add_task(TaskDraft {
                title: "Private".to_string(),
                description: "u1 only".to_string(),
                priority: Priority::High,
                deadline: Utc.with_ymd_and_hms(2026, 11, 1, 9, 0, 0).unwrap(),
            })
            .unwrap();

        let mut app = App {
            config: config(dir.path()),
            auth: AuthService::new(Arc::new(RevokedProvider), session),
            workspace,
            db: RealtimeDbClient::new("https://db.example.com").unwrap(),
        };

        assert!(app.sync().await.is_err());
        assert!(app.auth.identity().is_none());
        assert!(app.workspace.identity().is_none());
        assert!(app.workspace.tasks().is_empty());
        assert_eq!(remote.request_counts().1, 0);
    }
}
