//! Client-side enumeration of a uCoin node's merkle trees.
//!
//! Nodes expose tree-indexed state (peers, members, pending identities)
//! through two calls: a root listing with every leaf digest, and a per-leaf
//! fetch. [`MerkleLeafEnumerator`] turns those into an ordered sequence of
//! leaves, checking each against the listing so a tree that changes
//! mid-enumeration is reported rather than mixed.
//!
//! The network calls are abstracted behind [`RootFetcher`] and
//! [`LeafFetcher`]; `ucoin-bma` implements both over HTTP.

pub mod digest;
pub mod enumerator;
pub mod error;
pub mod fetcher;
pub mod types;

pub use digest::{LeafDigest, ReportedDigest, Sha1Digest, Sha256Digest};
pub use enumerator::MerkleLeafEnumerator;
pub use error::{MerkleError, MerkleResult};
pub use fetcher::{LeafFetcher, RootFetcher};
pub use types::{MerkleLeaf, MerkleLeafResponse, MerkleRoot};
