//! Foundation types for uCoin clients.
//!
//! Every other crate in the workspace depends on `ucoin-types`.
//!
//! # Key Types
//!
//! - [`BlockStamp`]: Block number plus block hash, the time anchor of signed documents
//! - [`BlockHash`]: 32-byte block digest rendered as uppercase hex
//! - [`PublicKey`]: Ed25519 public key rendered as base58

pub mod blockstamp;
pub mod error;
pub mod hash;
pub mod pubkey;

pub use blockstamp::BlockStamp;
pub use error::{excerpt, TypeError};
pub use hash::BlockHash;
pub use pubkey::PublicKey;
