//! Error taxonomy for the SDK.
//!
//! Infrastructure failures (configuration, authentication, cache) are
//! typed errors that halt the calling operation. API response problems
//! are not errors at all - they come back as data inside an
//! [`Envelope`](crate::api::Envelope) so resource callers can match on
//! `status`.

use thiserror::Error;

/// Maximum length for error response bodies in error messages
const MAX_ERROR_BODY_LENGTH: usize = 500;

/// Which auth endpoint call failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthStage {
    /// Full credential exchange (`POST /auth/token`)
    Create,
    /// Token renewal using the current token (`GET /auth/token`)
    Refresh,
}

impl std::fmt::Display for AuthStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Create => write!(f, "token create"),
            Self::Refresh => write!(f, "token refresh"),
        }
    }
}

#[derive(Error, Debug)]
pub enum Error {
    #[error("profile not found: {0}")]
    ProfileNotFound(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("{stage} failed{}: {detail}", .status.map(|s| format!(" with status {s}")).unwrap_or_default())]
    Authentication {
        stage: AuthStage,
        status: Option<u16>,
        detail: String,
    },

    #[error("token cache unavailable: {0}")]
    CacheUnavailable(#[from] redis::RedisError),

    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

impl Error {
    /// Truncate a response body to avoid logging excessive data
    pub(crate) fn truncate_body(body: &str) -> String {
        if body.len() <= MAX_ERROR_BODY_LENGTH {
            return body.to_string();
        }
        // Cut on a char boundary; error pages are not always ASCII
        let mut end = MAX_ERROR_BODY_LENGTH;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!(
            "{}... (truncated, {} total bytes)",
            &body[..end],
            body.len()
        )
    }

    pub(crate) fn auth(stage: AuthStage, status: reqwest::StatusCode, body: &str) -> Self {
        Self::Authentication {
            stage,
            status: Some(status.as_u16()),
            detail: Self::truncate_body(body),
        }
    }
}
