//! Cryptographic primitives for uCoin clients.
//!
//! Provides scrypt-stretched Ed25519 key derivation, detached signing and
//! verification, the SHA digests nodes use to address content, and a
//! plaintext secret store for recovering keys.
//!
//! Primitives come from ed25519-dalek, scrypt and the RustCrypto digests.

pub mod error;
pub mod hasher;
pub mod keys;
pub mod store;

pub use error::{KeyError, KeyResult};
pub use hasher::{ContentHasher, HashAlgorithm};
pub use keys::{sign, verify, verify_bytes, KeyMaterial, ScryptParams, Signature};
pub use store::{load, save, save_async, Secret, SecretRecord};
