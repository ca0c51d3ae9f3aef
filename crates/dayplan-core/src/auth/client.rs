//! REST client for the hosted identity service.
//!
//! Email/password accounts are handled by the `accounts:signInWithPassword`
//! and `accounts:signUp` endpoints; ID tokens are renewed through the
//! secure token endpoint using the long-lived refresh token.

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::debug;

use super::{AuthError, AuthProvider, SessionData};

const ACCOUNTS_BASE_URL: &str = "https://identitytoolkit.googleapis.com/v1";

const TOKEN_URL: &str = "https://securetoken.googleapis.com/v1/token";

const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Token lifetime assumed when the service omits `expiresIn`
const DEFAULT_EXPIRES_IN_SECS: i64 = 3600;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PasswordRequest<'a> {
    email: &'a str,
    password: &'a str,
    return_secure_token: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AccountResponse {
    local_id: String,
    #[serde(default)]
    email: String,
    id_token: String,
    refresh_token: String,
    expires_in: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    id_token: String,
    refresh_token: String,
    user_id: String,
    expires_in: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

fn parse_expires_in(value: Option<&str>) -> i64 {
    value
        .and_then(|s| s.parse().ok())
        .unwrap_or(DEFAULT_EXPIRES_IN_SECS)
}

#[derive(Clone)]
pub struct IdentityClient {
    client: Client,
    api_key: String,
}

impl IdentityClient {
    pub fn new(api_key: &str) -> Result<Self, AuthError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            client,
            api_key: api_key.to_string(),
        })
    }

    async fn read_json<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, AuthError> {
        let status = response.status();
        let body = response.text().await?;
        if status.is_success() {
            return serde_json::from_str(&body)
                .map_err(|e| AuthError::InvalidResponse(format!("Failed to parse auth response: {}", e)));
        }
        match serde_json::from_str::<ErrorEnvelope>(&body) {
            Ok(envelope) => Err(AuthError::from_code(&envelope.error.message)),
            Err(_) => Err(AuthError::InvalidResponse(format!("Status {}", status))),
        }
    }

    async fn password_request(&self, endpoint: &str, email: &str, password: &str) -> Result<SessionData, AuthError> {
        let url = format!("{}/accounts:{}", ACCOUNTS_BASE_URL, endpoint);
        let response = self
            .client
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(&PasswordRequest {
                email,
                password,
                return_secure_token: true,
            })
            .send()
            .await?;

        let account: AccountResponse = Self::read_json(response).await?;
        debug!(endpoint, user = %account.local_id, "Identity request succeeded");

        Ok(SessionData {
            user_id: account.local_id,
            email: if account.email.is_empty() { email.to_string() } else { account.email },
            id_token: account.id_token,
            refresh_token: account.refresh_token,
            created_at: Utc::now(),
            expires_in_secs: parse_expires_in(account.expires_in.as_deref()),
        })
    }
}

#[async_trait]
impl AuthProvider for IdentityClient {
    async fn sign_in(&self, email: &str, password: &str) -> Result<SessionData, AuthError> {
        self.password_request("signInWithPassword", email, password).await
    }

    async fn sign_up(&self, email: &str, password: &str) -> Result<SessionData, AuthError> {
        self.password_request("signUp", email, password).await
    }

    async fn refresh(&self, session: &SessionData) -> Result<SessionData, AuthError> {
        let response = self
            .client
            .post(TOKEN_URL)
            .query(&[("key", self.api_key.as_str())])
            .form(&[
                ("grant_type", "refresh_token"),
                ("refresh_token", session.refresh_token.as_str()),
            ])
            .send()
            .await?;

        let token: TokenResponse = Self::read_json(response).await?;
        if token.user_id != session.user_id {
            return Err(AuthError::InvalidResponse(
                "Refreshed token belongs to a different user".to_string(),
            ));
        }

        Ok(SessionData {
            user_id: token.user_id,
            email: session.email.clone(),
            id_token: token.id_token,
            refresh_token: token.refresh_token,
            created_at: Utc::now(),
            expires_in_secs: parse_expires_in(token.expires_in.as_deref()),
        })
    }
}
