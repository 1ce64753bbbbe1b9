//! Signed ledger documents for uCoin clients.
//!
//! Every document has a canonical text form. Signers sign exactly those
//! bytes and nodes re-derive them to verify, so the formatting here is the
//! protocol: field order, `Name: value` spacing and the trailing newline all
//! matter.
//!
//! # Key Types
//!
//! - [`Identity`]: A public key claiming a unique identifier
//! - [`Certification`]: A member vouching for an identity
//! - [`Membership`]: A request to join or leave the web of trust
//! - [`Transaction`]: A multi-issuer money transfer
//! - [`Document`]: Any of the above, parsed by its `Type:` tag
//! - [`SignedDocument`]: Canonical text, signing, and verification

pub mod certification;
pub mod document;
pub mod error;
mod fields;
pub mod identity;
pub mod membership;
pub mod transaction;

pub use certification::Certification;
pub use document::{Document, DocumentKind, SignatureCheck, SignedDocument};
pub use error::{DocumentError, DocumentResult};
pub use fields::PROTOCOL_VERSION;
pub use identity::Identity;
pub use membership::{Membership, MembershipType};
pub use transaction::{Transaction, TxInput, TxOutput, Unlock, UnlockParam, MAX_COMMENT_LEN};

#[cfg(test)]
mod tests {
    use super::*;
    use ucoin_crypto::{KeyMaterial, ScryptParams};
    use ucoin_types::{BlockHash, BlockStamp, PublicKey};

    fn light() -> ScryptParams {
        ScryptParams { n: 16, r: 1, p: 1 }
    }

    #[test]
    fn identity_from_credentials_end_to_end() {
        let key = KeyMaterial::from_credentials_with("saltX", "pwdY", &light()).unwrap();
        let identity = Identity::new(
            "test_currency",
            key.public_key(),
            "Alice",
            BlockStamp::new(0, BlockHash::from_bytes([0; 32])),
        )
        .unwrap()
        .add_signature(&key);

        let raw = identity.signed_raw();
        let parsed = Document::parse(&raw).unwrap();
        assert_eq!(parsed.kind(), DocumentKind::Identity);
        assert_eq!(parsed.currency(), "test_currency");
        assert_eq!(parsed.signed_raw(), raw);

        let pairs: Vec<_> = parsed.verify_all().unwrap().iter().map(SignatureCheck::as_pair).collect();
        assert_eq!(pairs, vec![(0, true)]);
    }

    #[test]
    fn parse_dispatches_on_type() {
        let key = KeyMaterial::from_seed([20; 32]);
        let membership = Membership::new(
            "test_currency",
            key.public_key(),
            BlockStamp::empty(),
            MembershipType::In,
            "alice",
            BlockStamp::empty(),
        )
        .unwrap()
        .add_signature(&key);
        let doc = Document::parse(&membership.signed_raw()).unwrap();
        assert_eq!(doc, Document::Membership(membership));
    }

    #[test]
    fn parse_unknown_type_rejected() {
        let raw = "Version: 2\nType: Peer\nCurrency: test_currency\n";
        assert!(matches!(
            Document::parse(raw),
            Err(DocumentError::MalformedDocument { line: 2, .. })
        ));
    }

    #[test]
    fn enum_signing_matches_variant_signing() {
        let key = KeyMaterial::from_seed([21; 32]);
        let identity = Identity::new("test_currency", key.public_key(), "bob", BlockStamp::empty()).unwrap();
        let via_enum = Document::from(identity.clone()).add_signature(&key);
        let direct = identity.add_signature(&key);
        assert_eq!(via_enum.signatures(), direct.signatures());
        assert_eq!(via_enum.declared_signers(), vec![key.public_key()]);
    }

    #[test]
    fn off_curve_signer_reported_invalid() {
        let key = KeyMaterial::from_seed([24; 32]);
        let off_curve = PublicKey::from_bytes([2; 32]);
        let identity = Identity::new("test_currency", off_curve, "mallory", BlockStamp::empty())
            .unwrap()
            .add_signature(&key);
        let parsed = Document::parse(&identity.signed_raw()).unwrap();
        let pairs: Vec<_> = parsed.verify_all().unwrap().iter().map(SignatureCheck::as_pair).collect();
        assert_eq!(pairs, vec![(0, false)]);
        assert!(!parsed.verify_with(&[off_curve]).unwrap()[0].valid);
    }

    #[test]
    fn verify_with_supplied_keys() {
        let key = KeyMaterial::from_seed([22; 32]);
        let other = KeyMaterial::from_seed([23; 32]);
        let doc: Document = Identity::new("test_currency", key.public_key(), "carol", BlockStamp::empty())
            .unwrap()
            .add_signature(&key)
            .into();
        assert!(doc.verify_with(&[key.public_key()]).unwrap()[0].valid);
        assert!(!doc.verify_with(&[other.public_key()]).unwrap()[0].valid);
        assert!(!doc.verify_with(&[]).unwrap()[0].valid);
    }
}
