use std::sync::Arc;

use anyhow::Result;
use tokio::sync::watch;
use tracing::{info, warn};

use super::{AuthError, AuthProvider, Session, SessionData};

/// Owns the signed-in session and publishes the current identity.
pub struct AuthService {
    provider: Arc<dyn AuthProvider>,
    session: Session,
    identity_tx: watch::Sender<Option<String>>,
}

impl AuthService {
    pub fn new(provider: Arc<dyn AuthProvider>, session: Session) -> Self {
        let initial = session.user_id().map(str::to_string);
        let (identity_tx, _) = watch::channel(initial);
        Self {
            provider,
            session,
            identity_tx,
        }
    }

    /// Identity-change notifications. The receiver starts at the current value.
    pub fn subscribe(&self) -> watch::Receiver<Option<String>> {
        self.identity_tx.subscribe()
    }

    pub fn identity(&self) -> Option<String> {
        self.session.user_id().map(str::to_string)
    }

    pub fn session(&self) -> Option<&SessionData> {
        self.session.data.as_ref()
    }

    /// Current ID token, if it has not expired
    pub fn id_token(&self) -> Option<&str> {
        self.session.id_token()
    }

    fn publish(&self) {
        let identity = self.identity();
        self.identity_tx.send_if_modified(|current| {
            if *current != identity {
                *current = identity;
                true
            } else {
                false
            }
        });
    }

    fn store(&mut self, data: SessionData) {
        self.session.update(data);
        if let Err(e) = self.session.save() {
            warn!(error = %e, "Failed to persist session");
        }
        self.publish();
    }

    /// Restore the persisted session, renewing its token when close to expiry.
    ///
    /// A refresh that fails for network reasons keeps the identity so cached
    /// data stays usable offline; a rejected refresh token signs out.
    pub async fn restore(&mut self) -> Result<bool> {
        if !self.session.load()? {
            return Ok(false);
        }
        if let Some(ref data) = self.session.data {
            info!(
                user = %data.user_id,
                minutes_left = data.minutes_until_expiry(),
                "Session restored"
            );
        }
        self.publish();
        self.refresh_if_needed().await?;
        Ok(self.session.data.is_some())
    }

    pub async fn refresh_if_needed(&mut self) -> Result<()> {
        let Some(current) = self.session.data.clone() else {
            return Ok(());
        };
        if !current.needs_refresh() {
            return Ok(());
        }
        match self.provider.refresh(&current).await {
            Ok(data) => {
                info!(user = %data.user_id, "Session token refreshed");
                self.store(data);
            }
            Err(e) if e.is_rejection() => {
                warn!(error = %e, "Refresh token rejected, signing out");
                self.sign_out()?;
            }
            Err(e) => {
                warn!(error = %e, "Token refresh failed, keeping cached identity");
            }
        }
        Ok(())
    }

    pub async fn sign_in(&mut self, email: &str, password: &str) -> Result<SessionData, AuthError> {
        let data = self.provider.sign_in(email, password).await?;
        info!(user = %data.user_id, "Signed in");
        self.store(data.clone());
        Ok(data)
    }

    pub async fn sign_up(&mut self, email: &str, password: &str) -> Result<SessionData, AuthError> {
        let data = self.provider.sign_up(email, password).await?;
        info!(user = %data.user_id, "Account created");
        self.store(data.clone());
        Ok(data)
    }

    pub fn sign_out(&mut self) -> Result<()> {
        self.session.clear()?;
        info!("Signed out");
        self.publish();
        Ok(())
    }
}
