use thiserror::Error;

/// Errors raised while enumerating a merkle tree.
///
/// `E` is the fetcher's own error type, carried untouched so callers can
/// inspect the original status or cause.
#[derive(Debug, Error)]
pub enum MerkleError<E> {
    #[error("transport failure: {0}")]
    Transport(#[source] E),

    /// The leaf fetched at `position` does not match the root listing: the
    /// tree changed after it was opened.
    #[error("tree {tree} changed during enumeration: leaf {position} expected {expected}, got {actual}")]
    TreeConsistencyViolation {
        tree: String,
        position: usize,
        expected: String,
        actual: String,
    },

    #[error("tree {tree} has no leaves (depth {depth})")]
    EmptyTree { tree: String, depth: u32 },
}

pub type MerkleResult<T, E> = Result<T, MerkleError<E>>;
