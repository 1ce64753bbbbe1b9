use sha1::Sha1;
use sha2::{Digest, Sha256};

/// Digest algorithms used by nodes to address content.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HashAlgorithm {
    Sha1,
    Sha256,
}

/// Content hasher producing the uppercase hex digests nodes publish.
///
/// Block hashes are SHA-256; merkle leaves have historically been addressed
/// by SHA-1. Comparison through [`ContentHasher::verify`] ignores hex case.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ContentHasher {
    algorithm: HashAlgorithm,
}

impl ContentHasher {
    pub const SHA1: Self = Self {
        algorithm: HashAlgorithm::Sha1,
    };
    pub const SHA256: Self = Self {
        algorithm: HashAlgorithm::Sha256,
    };

    pub const fn new(algorithm: HashAlgorithm) -> Self {
        Self { algorithm }
    }

    /// Uppercase hex digest of `data`.
    pub fn hash(&self, data: &[u8]) -> String {
        match self.algorithm {
            HashAlgorithm::Sha1 => hex::encode_upper(Sha1::digest(data)),
            HashAlgorithm::Sha256 => hex::encode_upper(Sha256::digest(data)),
        }
    }

    /// Check `data` against an expected hex digest of either case.
    pub fn verify(&self, data: &[u8], expected: &str) -> bool {
        self.hash(data).eq_ignore_ascii_case(expected)
    }

    pub fn algorithm(&self) -> HashAlgorithm {
        self.algorithm
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sha256_of_empty() {
        assert_eq!(
            ContentHasher::SHA256.hash(b""),
            "E3B0C44298FC1C149AFBF4C8996FB92427AE41E4649B934CA495991B7852B855"
        );
    }

    #[test]
    fn sha1_known_vector() {
        assert_eq!(
            ContentHasher::SHA1.hash(b"abc"),
            "A9993E364706816ABA3E25717850C26C9CD0D89D"
        );
    }

    #[test]
    fn verify_ignores_case() {
        let digest = ContentHasher::SHA1.hash(b"abc").to_lowercase();
        assert!(ContentHasher::SHA1.verify(b"abc", &digest));
        assert!(!ContentHasher::SHA1.verify(b"abd", &digest));
    }

    #[test]
    fn algorithms_differ() {
        assert_ne!(ContentHasher::SHA1.hash(b"x"), ContentHasher::SHA256.hash(b"x"));
        assert_eq!(ContentHasher::new(HashAlgorithm::Sha1), ContentHasher::SHA1);
    }
}
