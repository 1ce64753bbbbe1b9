use thiserror::Error;
use ucoin_crypto::KeyError;

/// Errors produced while building, parsing, or verifying documents.
#[derive(Debug, Error)]
pub enum DocumentError {
    /// Raw text that does not have the shape of the expected document.
    #[error("malformed document at line {line}: {reason} (got {input:?})")]
    MalformedDocument {
        line: usize,
        input: String,
        reason: String,
    },

    /// A field value the node protocol cannot carry.
    #[error("invalid content in field {field}: {reason} (got {input:?})")]
    InvalidFieldContent {
        field: &'static str,
        input: String,
        reason: String,
    },

    #[error(transparent)]
    Key(#[from] KeyError),
}

pub type DocumentResult<T> = Result<T, DocumentError>;
