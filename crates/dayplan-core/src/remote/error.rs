use thiserror::Error;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Access denied: {0}")]
    AccessDenied(String),

    #[error("Unauthorized - token may be expired")]
    Unauthorized,

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Rate limited - please wait before retrying")]
    RateLimited,

    #[error("Server error: {0}")]
    ServerError(String),

    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Unavailable: {0}")]
    Unavailable(String),
}

/// Maximum length for error response bodies in error messages
const MAX_ERROR_BODY_LENGTH: usize = 500;

impl StorageError {
    /// Truncate a response body to avoid logging excessive data
    pub(crate) fn truncate_body(body: &str) -> String {
        if body.len() <= MAX_ERROR_BODY_LENGTH {
            body.to_string()
        } else {
            let mut end = MAX_ERROR_BODY_LENGTH;
            while !body.is_char_boundary(end) {
                end -= 1;
            }
            format!("{}... (truncated, {} total bytes)", &body[..end], body.len())
        }
    }

    pub fn from_status(status: reqwest::StatusCode, body: &str) -> Self {
        let truncated = Self::truncate_body(body);
        match status.as_u16() {
            401 => StorageError::Unauthorized,
            403 => StorageError::AccessDenied(truncated),
            404 => StorageError::NotFound(truncated),
            429 => StorageError::RateLimited,
            500..=599 => StorageError::ServerError(truncated),
            _ => StorageError::InvalidResponse(format!("Status {}: {}", status, truncated)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;

    #[test]
    fn test_from_status_mapping() {
        assert!(matches!(
            StorageError::from_status(StatusCode::UNAUTHORIZED, ""),
            StorageError::Unauthorized
        ));
        assert!(matches!(
            StorageError::from_status(StatusCode::FORBIDDEN, "Permission denied"),
            StorageError::AccessDenied(ref b) if b == "Permission denied"
        ));
        assert!(matches!(
            StorageError::from_status(StatusCode::TOO_MANY_REQUESTS, ""),
            StorageError::RateLimited
        ));
        assert!(matches!(
            StorageError::from_status(StatusCode::BAD_GATEWAY, "down"),
            StorageError::ServerError(_)
        ));
        assert!(matches!(
            StorageError::from_status(StatusCode::BAD_REQUEST, "bad"),
            StorageError::InvalidResponse(_)
        ));
    }

    #[test]
    fn test_truncate_body() {
        let long = "é".repeat(400);
        let truncated = StorageError::truncate_body(&long);
        assert!(truncated.contains("truncated, 800 total bytes"));
        assert_eq!(StorageError::truncate_body("short"), "short");
    }
}
