use std::fmt;
use std::str::FromStr;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use tracing::debug;
use ucoin_types::{excerpt, PublicKey};

use crate::error::{KeyError, KeyResult};

/// Scrypt cost parameters used to stretch `(salt, password)` into a seed.
///
/// Nodes and wallets derive keys with `N = 4096, r = 16, p = 1`; changing
/// them produces a different (but equally valid) keypair.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScryptParams {
    /// CPU/memory cost. Must be a power of two greater than one.
    pub n: u32,
    /// Block size.
    pub r: u32,
    /// Parallelism.
    pub p: u32,
}

impl ScryptParams {
    pub const SEED_LEN: usize = 32;

    fn to_scrypt(self) -> KeyResult<scrypt::Params> {
        if self.n < 2 || !self.n.is_power_of_two() {
            return Err(KeyError::InvalidScryptParams(format!(
                "N must be a power of two greater than 1, got {}",
                self.n
            )));
        }
        let log_n = self.n.trailing_zeros() as u8;
        scrypt::Params::new(log_n, self.r, self.p, Self::SEED_LEN)
            .map_err(|e| KeyError::InvalidScryptParams(e.to_string()))
    }
}

impl Default for ScryptParams {
    fn default() -> Self {
        Self { n: 4096, r: 16, p: 1 }
    }
}

/// Ed25519 keypair derived from a two-factor secret or a raw seed.
///
/// The public key is a pure function of the seed, and the seed a pure
/// function of `(salt, password, params)`, so the same credentials always
/// recover the same keypair.
#[derive(Clone)]
pub struct KeyMaterial {
    signing: ed25519_dalek::SigningKey,
}

impl KeyMaterial {
    /// Derive a keypair from credentials with the default scrypt parameters.
    ///
    /// Expensive by design (memory-hard); keep it off hot paths and bound
    /// concurrent derivations.
    pub fn from_credentials(salt: &str, password: &str) -> KeyResult<Self> {
        Self::from_credentials_with(salt, password, &ScryptParams::default())
    }

    /// Derive a keypair from credentials with explicit scrypt parameters.
    pub fn from_credentials_with(
        salt: &str,
        password: &str,
        params: &ScryptParams,
    ) -> KeyResult<Self> {
        let scrypt_params = params.to_scrypt()?;
        debug!(n = params.n, r = params.r, p = params.p, "deriving key from credentials");
        let mut seed = [0u8; ScryptParams::SEED_LEN];
        scrypt::scrypt(password.as_bytes(), salt.as_bytes(), &scrypt_params, &mut seed)
            .map_err(|e| KeyError::InvalidScryptParams(e.to_string()))?;
        let key = Self::from_seed(seed);
        debug!(pubkey = %key.public_key(), "key derived");
        Ok(key)
    }

    /// Create from a raw 32-byte seed.
    pub fn from_seed(seed: [u8; 32]) -> Self {
        Self {
            signing: ed25519_dalek::SigningKey::from_bytes(&seed),
        }
    }

    /// Generate a random keypair.
    pub fn generate() -> Self {
        let mut csprng = rand::thread_rng();
        Self {
            signing: ed25519_dalek::SigningKey::generate(&mut csprng),
        }
    }

    /// The public key, base58 on display.
    pub fn public_key(&self) -> PublicKey {
        PublicKey::from_bytes(self.signing.verifying_key().to_bytes())
    }

    /// Raw secret seed bytes.
    pub fn seed(&self) -> &[u8; 32] {
        self.signing.as_bytes()
    }

    /// Sign a message. Ed25519 signing is deterministic.
    pub fn sign(&self, message: &[u8]) -> Signature {
        use ed25519_dalek::Signer;
        Signature(self.signing.sign(message).to_bytes())
    }

    /// Check that these keys belong to `expected`.
    ///
    /// Callers run this before persisting credentials so a typo in the salt
    /// or password is caught against an independently known public key.
    pub fn ensure_public_key(&self, expected: &PublicKey) -> KeyResult<()> {
        let derived = self.public_key();
        if derived != *expected {
            return Err(KeyError::CredentialMismatch {
                expected: expected.to_base58(),
                derived: derived.to_base58(),
            });
        }
        Ok(())
    }
}

impl fmt::Debug for KeyMaterial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "KeyMaterial({}, <redacted>)", self.public_key())
    }
}

/// Sign `message` with the keypair expanded from `seed`.
pub fn sign(seed: &[u8; 32], message: &[u8]) -> Signature {
    KeyMaterial::from_seed(*seed).sign(message)
}

/// Verify a signature against a public key.
///
/// Returns `Ok(false)` for a wrong signature, and for 32 key bytes that
/// are not a curve point: no signature can be valid for such a key. Length
/// errors only arise from raw bytes, see [`verify_bytes`].
pub fn verify(public_key: &PublicKey, message: &[u8], signature: &Signature) -> KeyResult<bool> {
    use ed25519_dalek::Verifier;
    let Ok(key) = ed25519_dalek::VerifyingKey::from_bytes(public_key.as_bytes()) else {
        debug!(pubkey = %public_key, "key is not a curve point");
        return Ok(false);
    };
    let sig = ed25519_dalek::Signature::from_bytes(&signature.0);
    Ok(key.verify(message, &sig).is_ok())
}

/// Verify with raw byte slices, checking their lengths first.
pub fn verify_bytes(public_key: &[u8], message: &[u8], signature: &[u8]) -> KeyResult<bool> {
    let key: [u8; 32] = public_key.try_into().map_err(|_| KeyError::MalformedKey {
        input: hex::encode(public_key),
        reason: format!("expected 32 bytes, got {}", public_key.len()),
    })?;
    let sig: [u8; 64] = signature.try_into().map_err(|_| KeyError::MalformedSignature {
        input: excerpt(&hex::encode(signature)),
        reason: format!("expected 64 bytes, got {}", signature.len()),
    })?;
    verify(&PublicKey::from_bytes(key), message, &Signature(sig))
}

/// Ed25519 detached signature, base64 (standard alphabet, padded) on display.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Signature([u8; 64]);

impl Signature {
    pub const LEN: usize = 64;

    /// Create from raw signature bytes.
    pub const fn from_bytes(bytes: [u8; 64]) -> Self {
        Self(bytes)
    }

    /// Raw signature bytes.
    pub fn as_bytes(&self) -> &[u8; 64] {
        &self.0
    }

    pub fn to_base64(&self) -> String {
        BASE64.encode(self.0)
    }

    /// Parse from base64, requiring exactly 64 decoded bytes.
    pub fn from_base64(s: &str) -> KeyResult<Self> {
        let malformed = |reason: String| KeyError::MalformedSignature {
            input: excerpt(s),
            reason,
        };
        let bytes = BASE64.decode(s).map_err(|e| malformed(e.to_string()))?;
        let arr: [u8; 64] = bytes
            .try_into()
            .map_err(|b: Vec<u8>| malformed(format!("expected 64 bytes, got {}", b.len())))?;
        Ok(Self(arr))
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Signature({}...)", &self.to_base64()[..12])
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_base64())
    }
}

impl FromStr for Signature {
    type Err = KeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_base64(s)
    }
}

impl TryFrom<String> for Signature {
    type Error = KeyError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::from_base64(&s)
    }
}

impl From<Signature> for String {
    fn from(sig: Signature) -> Self {
        sig.to_base64()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn light() -> ScryptParams {
        ScryptParams { n: 16, r: 1, p: 1 }
    }

    #[test]
    fn sign_and_verify() {
        let key = KeyMaterial::generate();
        let sig = key.sign(b"hello world");
        assert!(verify(&key.public_key(), b"hello world", &sig).unwrap());
    }

    #[test]
    fn verify_fails_on_wrong_message() {
        let key = KeyMaterial::generate();
        let sig = key.sign(b"correct message");
        assert!(!verify(&key.public_key(), b"wrong message", &sig).unwrap());
    }

    #[test]
    fn verify_fails_with_wrong_key() {
        let k1 = KeyMaterial::generate();
        let k2 = KeyMaterial::generate();
        let sig = k1.sign(b"message");
        assert!(!verify(&k2.public_key(), b"message", &sig).unwrap());
    }

    #[test]
    fn signing_is_deterministic() {
        let key = KeyMaterial::from_seed([3; 32]);
        assert_eq!(key.sign(b"doc"), key.sign(b"doc"));
        assert_eq!(sign(&[3; 32], b"doc"), key.sign(b"doc"));
    }

    #[test]
    fn derivation_is_deterministic() {
        let a = KeyMaterial::from_credentials_with("saltX", "pwdY", &light()).unwrap();
        let b = KeyMaterial::from_credentials_with("saltX", "pwdY", &light()).unwrap();
        assert_eq!(a.public_key(), b.public_key());
        assert_eq!(a.seed(), b.seed());
    }

    #[test]
    fn salt_and_password_are_not_interchangeable() {
        let a = KeyMaterial::from_credentials_with("one", "two", &light()).unwrap();
        let b = KeyMaterial::from_credentials_with("two", "one", &light()).unwrap();
        assert_ne!(a.public_key(), b.public_key());
    }

    #[test]
    fn empty_credentials_still_derive() {
        let a = KeyMaterial::from_credentials_with("", "", &light()).unwrap();
        let b = KeyMaterial::from_credentials_with("", "x", &light()).unwrap();
        assert_ne!(a.public_key(), b.public_key());
    }

    #[test]
    fn params_change_the_key() {
        let a = KeyMaterial::from_credentials_with("s", "p", &light()).unwrap();
        let b = KeyMaterial::from_credentials_with("s", "p", &ScryptParams { n: 32, r: 1, p: 1 })
            .unwrap();
        assert_ne!(a.public_key(), b.public_key());
    }

    #[test]
    fn default_params_derive() {
        let a = KeyMaterial::from_credentials("saltX", "pwdY").unwrap();
        let b = KeyMaterial::from_credentials("saltX", "pwdY").unwrap();
        assert_eq!(a.public_key(), b.public_key());
    }

    #[test]
    fn invalid_params_rejected() {
        let err = KeyMaterial::from_credentials_with("s", "p", &ScryptParams { n: 1000, r: 1, p: 1 })
            .unwrap_err();
        assert!(matches!(err, KeyError::InvalidScryptParams(_)));
    }

    #[test]
    fn ensure_public_key_detects_mismatch() {
        let key = KeyMaterial::from_seed([1; 32]);
        assert!(key.ensure_public_key(&key.public_key()).is_ok());
        let other = KeyMaterial::from_seed([2; 32]).public_key();
        assert!(matches!(
            key.ensure_public_key(&other),
            Err(KeyError::CredentialMismatch { .. })
        ));
    }

    #[test]
    fn key_off_the_curve_never_verifies() {
        let sig = KeyMaterial::from_seed([1; 32]).sign(b"m");
        let off_curve = PublicKey::from_bytes([2; 32]);
        assert!(!verify(&off_curve, b"m", &sig).unwrap());
        assert!(!verify_bytes(&[2; 32], b"m", sig.as_bytes()).unwrap());
    }

    #[test]
    fn verify_bytes_checks_lengths() {
        let key = KeyMaterial::generate();
        let sig = key.sign(b"m");
        assert!(verify_bytes(key.public_key().as_bytes(), b"m", sig.as_bytes()).unwrap());
        assert!(matches!(
            verify_bytes(&[0u8; 31], b"m", sig.as_bytes()),
            Err(KeyError::MalformedKey { .. })
        ));
        assert!(matches!(
            verify_bytes(key.public_key().as_bytes(), b"m", &[0u8; 10]),
            Err(KeyError::MalformedSignature { .. })
        ));
    }

    #[test]
    fn signature_base64_roundtrip() {
        let sig = KeyMaterial::generate().sign(b"test");
        let text = sig.to_base64();
        assert_eq!(text.len(), 88);
        assert_eq!(Signature::from_base64(&text).unwrap(), sig);
    }

    #[test]
    fn signature_wrong_length_rejected() {
        assert!(matches!(
            Signature::from_base64("AAAA"),
            Err(KeyError::MalformedSignature { .. })
        ));
        assert!(Signature::from_base64("not base64!").is_err());
    }

    #[test]
    fn debug_redacts_seed() {
        let key = KeyMaterial::from_seed([5; 32]);
        let debug = format!("{key:?}");
        assert!(debug.contains("redacted"));
        assert!(!debug.contains(&hex::encode([5u8; 32])));
    }
}
