//! Error types for the backend client

/// Result type alias for backend operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur when talking to the backend
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON parsing failed
    #[error("JSON parsing failed: {0}")]
    Json(#[from] serde_json::Error),

    /// Invalid URL
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Credentials rejected (401/403)
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Row, object or user not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Unique constraint or existing object (409)
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Backend returned an error status
    #[error("Backend error (code {code}): {message}")]
    Api { code: u16, message: String },

    /// No session token configured for a call that needs a user
    #[error("Not authenticated")]
    NotAuthenticated,

    /// Configuration error (from choirconfig/anyhow)
    #[error("Configuration error: {0}")]
    Config(#[from] anyhow::Error),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a generic error from a string
    pub fn other(msg: impl Into<String>) -> Self {
        Self::Other(msg.into())
    }

    /// Maps an HTTP status code and message to an error
    pub fn from_status_code(code: u16, message: impl Into<String>) -> Self {
        match code {
            401 | 403 => Self::Unauthorized(message.into()),
            404 => Self::NotFound(message.into()),
            409 => Self::Conflict(message.into()),
            _ => Self::Api {
                code,
                message: message.into(),
            },
        }
    }

    /// Returns true for 401/403 and missing-session errors
    pub fn is_auth_error(&self) -> bool {
        matches!(self, Error::Unauthorized(_) | Error::NotAuthenticated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_status_code() {
        assert!(matches!(Error::from_status_code(401, "x"), Error::Unauthorized(_)));
        assert!(matches!(Error::from_status_code(403, "x"), Error::Unauthorized(_)));
        assert!(matches!(Error::from_status_code(404, "x"), Error::NotFound(_)));
        assert!(matches!(Error::from_status_code(409, "x"), Error::Conflict(_)));
        assert!(matches!(
            Error::from_status_code(500, "boom"),
            Error::Api { code: 500, .. }
        ));
    }

    #[test]
    fn test_is_auth_error() {
        assert!(Error::NotAuthenticated.is_auth_error());
        assert!(Error::Unauthorized("jwt expired".into()).is_auth_error());
        assert!(!Error::other("nope").is_auth_error());
    }
}
