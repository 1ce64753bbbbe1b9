use std::path::PathBuf;

use thiserror::Error;

/// Longest response body, in characters, kept in a status error.
pub const STATUS_BODY_LIMIT: usize = 256;

#[derive(Debug, Error)]
pub enum BmaError {
    #[error("invalid endpoint {input:?}: {reason}")]
    InvalidEndpoint { input: String, reason: String },

    #[error("invalid url: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("http transport error: {0}")]
    Http(#[from] reqwest::Error),

    /// The node answered with a non-success status.
    #[error("node returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("cannot decode response from {url}: {reason}")]
    Decode { url: String, reason: String },

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config {path}: {reason}")]
    Config { path: PathBuf, reason: String },
}

impl BmaError {
    /// Build a status error, truncating the body.
    pub fn status(status: u16, body: &str) -> Self {
        let body = match body.char_indices().nth(STATUS_BODY_LIMIT) {
            Some((end, _)) => format!("{}...", &body[..end]),
            None => body.to_string(),
        };
        Self::Status { status, body }
    }
}

pub type BmaResult<T> = Result<T, BmaError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn long_bodies_are_truncated() {
        let body = "x".repeat(1000);
        match BmaError::status(500, &body) {
            BmaError::Status { status, body } => {
                assert_eq!(status, 500);
                assert_eq!(body.len(), STATUS_BODY_LIMIT + 3);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn short_bodies_are_kept() {
        let err = BmaError::status(400, "{\"ucode\": 1001}");
        assert_eq!(err.to_string(), "node returned 400: {\"ucode\": 1001}");
    }
}
