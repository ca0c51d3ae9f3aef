use thiserror::Error;

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("An account already exists for this email")]
    EmailExists,

    #[error("Invalid email address")]
    InvalidEmail,

    #[error("Password is too weak: {0}")]
    WeakPassword(String),

    #[error("Account disabled")]
    UserDisabled,

    #[error("Too many attempts - please try again later")]
    TooManyAttempts,

    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl AuthError {
    /// Map an identity service error code (e.g. `EMAIL_EXISTS`,
    /// `WEAK_PASSWORD : Password should be at least 6 characters`).
    pub fn from_code(message: &str) -> Self {
        let (code, detail) = match message.split_once(" : ") {
            Some((code, detail)) => (code.trim(), detail.trim()),
            None => (message.trim(), ""),
        };
        match code {
            "EMAIL_NOT_FOUND" | "INVALID_PASSWORD" | "INVALID_LOGIN_CREDENTIALS"
            | "INVALID_REFRESH_TOKEN" | "TOKEN_EXPIRED" | "USER_NOT_FOUND" => {
                AuthError::InvalidCredentials
            }
            "EMAIL_EXISTS" => AuthError::EmailExists,
            "INVALID_EMAIL" | "MISSING_EMAIL" => AuthError::InvalidEmail,
            "WEAK_PASSWORD" | "MISSING_PASSWORD" => AuthError::WeakPassword(detail.to_string()),
            "USER_DISABLED" => AuthError::UserDisabled,
            "TOO_MANY_ATTEMPTS_TRY_LATER" => AuthError::TooManyAttempts,
            _ => AuthError::InvalidResponse(message.to_string()),
        }
    }

    /// True when the stored credentials can no longer be used
    pub fn is_rejection(&self) -> bool {
        matches!(self, AuthError::InvalidCredentials | AuthError::UserDisabled)
    }
}
