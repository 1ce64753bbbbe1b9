use thiserror::Error;

/// Longest input excerpt carried inside an error message.
pub const EXCERPT_LEN: usize = 64;

/// Errors produced by type operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TypeError {
    #[error("malformed block stamp {input:?}: {reason}")]
    MalformedBlockStamp { input: String, reason: String },

    #[error("malformed public key {input:?}: {reason}")]
    MalformedKey { input: String, reason: String },

    #[error("invalid hex string: {0}")]
    InvalidHex(String),

    #[error("invalid byte length: expected {expected}, got {actual}")]
    InvalidLength { expected: usize, actual: usize },
}

/// Clip raw input for inclusion in an error message.
pub fn excerpt(input: &str) -> String {
    match input.char_indices().nth(EXCERPT_LEN) {
        Some((cut, _)) => format!("{}...", &input[..cut]),
        None => input.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_input_is_kept() {
        assert_eq!(excerpt("abc"), "abc");
    }

    #[test]
    fn long_input_is_truncated() {
        let long = "x".repeat(200);
        let clipped = excerpt(&long);
        assert_eq!(clipped.len(), EXCERPT_LEN + 3);
        assert!(clipped.ends_with("..."));
    }

    #[test]
    fn truncation_respects_char_boundaries() {
        let long = "é".repeat(100);
        let clipped = excerpt(&long);
        assert_eq!(clipped.chars().count(), EXCERPT_LEN + 3);
    }
}
