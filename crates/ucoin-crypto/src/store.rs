//! Plaintext secret store for recovering a keypair later.
//!
//! A record holds either the `(salt, password)` pair or the raw seed, next
//! to the base58 public key it must reproduce. Files are written by
//! write-temp-then-rename so a failed save never leaves a partial record.
//! File location and permissions are the caller's responsibility: the
//! content is enough to sign as the account.

use std::fmt;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use ucoin_types::PublicKey;

use crate::error::{KeyError, KeyResult};
use crate::keys::{KeyMaterial, ScryptParams};

/// The secret half of a [`SecretRecord`].
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Secret {
    /// The two-factor credentials the key is derived from.
    Credentials { salt: String, password: String },
    /// The 32-byte seed, hex-encoded.
    Seed { seed: String },
}

/// On-disk record: public key for display and integrity, plus the secret.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecretRecord {
    pub pubkey: PublicKey,
    #[serde(flatten)]
    pub secret: Secret,
}

impl SecretRecord {
    /// Record the credentials that produced `key`.
    pub fn from_credentials(salt: &str, password: &str, key: &KeyMaterial) -> Self {
        Self {
            pubkey: key.public_key(),
            secret: Secret::Credentials {
                salt: salt.to_string(),
                password: password.to_string(),
            },
        }
    }

    /// Record the raw seed of `key`.
    pub fn from_seed(key: &KeyMaterial) -> Self {
        Self {
            pubkey: key.public_key(),
            secret: Secret::Seed {
                seed: hex::encode(key.seed()),
            },
        }
    }

    /// Rebuild the keypair and check it against the recorded public key.
    pub fn to_key_material(&self, params: &ScryptParams) -> KeyResult<KeyMaterial> {
        let key = match &self.secret {
            Secret::Credentials { salt, password } => {
                KeyMaterial::from_credentials_with(salt, password, params)?
            }
            Secret::Seed { seed } => {
                let bytes = hex::decode(seed)
                    .map_err(|e| KeyError::Serialization(format!("seed is not hex: {e}")))?;
                let seed: [u8; 32] = bytes.try_into().map_err(|b: Vec<u8>| {
                    KeyError::Serialization(format!("seed must be 32 bytes, got {}", b.len()))
                })?;
                KeyMaterial::from_seed(seed)
            }
        };
        key.ensure_public_key(&self.pubkey)?;
        Ok(key)
    }
}

impl fmt::Debug for SecretRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.secret {
            Secret::Credentials { .. } => "credentials",
            Secret::Seed { .. } => "seed",
        };
        write!(f, "SecretRecord({}, {kind}, <redacted>)", self.pubkey)
    }
}

/// Write `record` to `path`, replacing any existing file atomically.
pub fn save(path: &Path, record: &SecretRecord) -> KeyResult<()> {
    let io_err = |source: std::io::Error| KeyError::Io {
        path: path.to_path_buf(),
        source,
    };
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let json = serde_json::to_vec_pretty(record)
        .map_err(|e| KeyError::Serialization(e.to_string()))?;

    let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(io_err)?;
    tmp.write_all(&json).map_err(io_err)?;
    tmp.write_all(b"\n").map_err(io_err)?;
    tmp.as_file().sync_all().map_err(io_err)?;
    debug!(tmp = %tmp.path().display(), "secret record staged");

    tmp.persist(path).map_err(|e| io_err(e.error))?;
    info!(pubkey = %record.pubkey, path = %path.display(), "secret record saved");
    Ok(())
}

/// [`save`] on the blocking thread pool, keeping the async scheduler free.
pub async fn save_async(path: PathBuf, record: SecretRecord) -> KeyResult<()> {
    tokio::task::spawn_blocking(move || save(&path, &record))
        .await
        .map_err(|e| KeyError::Task(e.to_string()))?
}

/// Read a record written by [`save`].
pub fn load(path: &Path) -> KeyResult<SecretRecord> {
    let data = std::fs::read(path).map_err(|source| KeyError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_slice(&data).map_err(|e| KeyError::Serialization(e.to_string()))
}
