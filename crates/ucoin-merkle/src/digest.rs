use serde_json::Value;
use ucoin_crypto::ContentHasher;

use crate::types::MerkleLeaf;

/// How the enumerator derives the digest it checks against the root listing.
pub trait LeafDigest: Send + Sync {
    fn digest(&self, leaf: &MerkleLeaf) -> String;
}

/// Trust the digest the node reports alongside the leaf.
#[derive(Clone, Copy, Debug, Default)]
pub struct ReportedDigest;

impl LeafDigest for ReportedDigest {
    fn digest(&self, leaf: &MerkleLeaf) -> String {
        leaf.hash.clone()
    }
}

/// Recompute a SHA-1 digest from the leaf value.
#[derive(Clone, Copy, Debug, Default)]
pub struct Sha1Digest;

impl LeafDigest for Sha1Digest {
    fn digest(&self, leaf: &MerkleLeaf) -> String {
        ContentHasher::SHA1.hash(&value_bytes(&leaf.value))
    }
}

/// Recompute a SHA-256 digest from the leaf value.
#[derive(Clone, Copy, Debug, Default)]
pub struct Sha256Digest;

impl LeafDigest for Sha256Digest {
    fn digest(&self, leaf: &MerkleLeaf) -> String {
        ContentHasher::SHA256.hash(&value_bytes(&leaf.value))
    }
}

/// A string value is hashed as-is; anything else as compact JSON.
fn value_bytes(value: &Value) -> Vec<u8> {
    match value {
        Value::String(s) => s.as_bytes().to_vec(),
        other => other.to_string().into_bytes(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn leaf(value: Value) -> MerkleLeaf {
        MerkleLeaf {
            hash: "reported".into(),
            value,
        }
    }

    #[test]
    fn reported_digest_is_passthrough() {
        assert_eq!(ReportedDigest.digest(&leaf(json!(1))), "reported");
    }

    #[test]
    fn string_values_hash_raw() {
        assert_eq!(
            Sha1Digest.digest(&leaf(json!("abc"))),
            "A9993E364706816ABA3E25717850C26C9CD0D89D"
        );
    }

    #[test]
    fn structured_values_hash_compact_json() {
        let value = json!({"a": 1});
        assert_eq!(
            Sha256Digest.digest(&leaf(value)),
            ContentHasher::SHA256.hash(br#"{"a":1}"#)
        );
    }
}
