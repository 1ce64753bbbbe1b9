use std::path::PathBuf;

use thiserror::Error;
use ucoin_types::TypeError;

/// Errors from key derivation, signing, and secret storage.
#[derive(Debug, Error)]
pub enum KeyError {
    #[error("invalid scrypt parameters: {0}")]
    InvalidScryptParams(String),

    #[error("malformed key {input:?}: {reason}")]
    MalformedKey { input: String, reason: String },

    #[error("malformed signature {input:?}: {reason}")]
    MalformedSignature { input: String, reason: String },

    #[error("credentials derive {derived}, expected {expected}")]
    CredentialMismatch { expected: String, derived: String },

    #[error("secret store I/O failure at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("secret store serialization error: {0}")]
    Serialization(String),

    #[error("background task failed: {0}")]
    Task(String),
}

impl From<TypeError> for KeyError {
    fn from(err: TypeError) -> Self {
        match err {
            TypeError::MalformedKey { input, reason } => Self::MalformedKey { input, reason },
            other => Self::MalformedKey {
                input: String::new(),
                reason: other.to_string(),
            },
        }
    }
}

pub type KeyResult<T> = Result<T, KeyError>;
