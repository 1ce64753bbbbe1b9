use ucoin_crypto::Signature;
use ucoin_types::{excerpt, BlockHash, BlockStamp, PublicKey};

use crate::document::{sealed::DocumentCodec, DocumentKind, SignedDocument};
use crate::error::{DocumentError, DocumentResult};
use crate::fields::{into_malformed, parse_decimal, FieldReader, PROTOCOL_VERSION};
use crate::identity::Identity;

/// A member vouching for someone else's identity.
///
/// The certified identity is embedded by value, including its
/// self-signature, so the node can check exactly which claim is certified.
///
/// ```text
/// Version: 2
/// Type: Certification
/// Currency: {currency}
/// Issuer: {issuer}
/// IdtyIssuer: {identity pubkey}
/// IdtyUniqueID: {identity uid}
/// IdtyTimestamp: {identity blockstamp}
/// IdtySignature: {identity signature}
/// CertTimestamp: {blockstamp}
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Certification {
    currency: String,
    issuer: PublicKey,
    idty_issuer: PublicKey,
    idty_uid: String,
    idty_timestamp: BlockStamp,
    idty_signature: Signature,
    timestamp: BlockStamp,
    signatures: Vec<Signature>,
}

impl Certification {
    /// Build an unsigned certification of `identity` by `issuer`.
    ///
    /// The identity must carry its self-signature and belong to the same
    /// currency.
    pub fn new(issuer: PublicKey, identity: &Identity, timestamp: BlockStamp) -> DocumentResult<Self> {
        let idty_signature = *identity.signature().ok_or_else(|| DocumentError::InvalidFieldContent {
            field: "IdtySignature",
            input: identity.uid().to_string(),
            reason: "certified identity is not signed".into(),
        })?;
        Ok(Self {
            currency: identity.currency().to_string(),
            issuer,
            idty_issuer: *identity.pubkey(),
            idty_uid: identity.uid().to_string(),
            idty_timestamp: *identity.timestamp(),
            idty_signature,
            timestamp,
            signatures: Vec::new(),
        })
    }

    pub fn issuer(&self) -> &PublicKey {
        &self.issuer
    }

    pub fn timestamp(&self) -> &BlockStamp {
        &self.timestamp
    }

    /// The certified identity, carrying its self-signature.
    pub fn identity(&self) -> DocumentResult<Identity> {
        let identity = Identity::new(
            self.currency.clone(),
            self.idty_issuer,
            self.idty_uid.clone(),
            self.idty_timestamp,
        )?;
        Ok(identity.with_signature(self.idty_signature))
    }

    /// Compact form used in blocks: `issuer:idty_pubkey:cert_block:signature`.
    pub fn inline(&self) -> Option<String> {
        self.signatures.first().map(|signature| {
            format!(
                "{}:{}:{}:{}",
                self.issuer, self.idty_issuer, self.timestamp.number, signature
            )
        })
    }

    /// Parse the compact form for a known identity.
    ///
    /// The inline form only carries the block number; `block_hash` supplies
    /// the rest of the certification timestamp.
    pub fn from_inline(identity: &Identity, block_hash: BlockHash, inline: &str) -> DocumentResult<Self> {
        let malformed = |reason: String| DocumentError::MalformedDocument {
            line: 1,
            input: excerpt(inline),
            reason,
        };
        let parts: Vec<&str> = inline.split(':').collect();
        let [issuer, idty_issuer, block, signature] = parts.as_slice() else {
            return Err(malformed(format!(
                "inline certification needs 4 ':'-separated fields, got {}",
                parts.len()
            )));
        };
        let issuer: PublicKey = issuer.parse().map_err(|e| malformed(format!("{e}")))?;
        let idty_issuer: PublicKey = idty_issuer.parse().map_err(|e| malformed(format!("{e}")))?;
        if idty_issuer != *identity.pubkey() {
            return Err(malformed(format!(
                "certifies {idty_issuer}, expected {}",
                identity.pubkey()
            )));
        }
        let block = parse_decimal(block).ok_or_else(|| malformed("block number is not a decimal".into()))?;
        let signature: Signature = signature.parse().map_err(|e| malformed(format!("{e}")))?;

        let mut cert = Self::new(issuer, identity, BlockStamp::new(block, block_hash))
            .map_err(into_malformed)?;
        cert.signatures.push(signature);
        Ok(cert)
    }
}

impl DocumentCodec for Certification {
    fn append_signature(&mut self, signature: Signature) {
        self.signatures.push(signature);
    }

    fn read_body(reader: &mut FieldReader<'_>) -> DocumentResult<Self> {
        reader.header(Self::KIND)?;
        let currency = reader.field("Currency")?;
        let issuer = reader.parsed_field("Issuer")?;
        let idty_issuer = reader.parsed_field("IdtyIssuer")?;
        let idty_uid = reader.field("IdtyUniqueID")?;
        let idty_timestamp = reader.parsed_field("IdtyTimestamp")?;
        let idty_signature = reader.parsed_field("IdtySignature")?;
        let timestamp = reader.parsed_field("CertTimestamp")?;

        let identity = Identity::new(currency, idty_issuer, idty_uid, idty_timestamp)
            .map_err(into_malformed)?
            .with_signature(idty_signature);
        Self::new(issuer, &identity, timestamp).map_err(into_malformed)
    }
}

impl SignedDocument for Certification {
    const KIND: DocumentKind = DocumentKind::Certification;

    fn version(&self) -> u32 {
        PROTOCOL_VERSION
    }

    fn currency(&self) -> &str {
        &self.currency
    }

    fn canonical(&self) -> String {
        format!(
            "Version: {}\nType: {}\nCurrency: {}\nIssuer: {}\nIdtyIssuer: {}\nIdtyUniqueID: {}\nIdtyTimestamp: {}\nIdtySignature: {}\nCertTimestamp: {}\n",
            PROTOCOL_VERSION,
            Self::KIND,
            self.currency,
            self.issuer,
            self.idty_issuer,
            self.idty_uid,
            self.idty_timestamp,
            self.idty_signature,
            self.timestamp
        )
    }

    fn signatures(&self) -> &[Signature] {
        &self.signatures
    }

    fn declared_signers(&self) -> Vec<PublicKey> {
        vec![self.issuer]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ucoin_crypto::KeyMaterial;

    fn stamp(number: u64) -> BlockStamp {
        BlockStamp::new(number, BlockHash::from_bytes([number as u8; 32]))
    }

    fn alice_key() -> KeyMaterial {
        KeyMaterial::from_seed([1; 32])
    }

    fn bob_key() -> KeyMaterial {
        KeyMaterial::from_seed([2; 32])
    }

    fn signed_alice() -> Identity {
        Identity::new("test_currency", alice_key().public_key(), "Alice", stamp(0))
            .unwrap()
            .add_signature(&alice_key())
    }

    fn bob_certifies_alice() -> Certification {
        Certification::new(bob_key().public_key(), &signed_alice(), stamp(12)).unwrap()
    }

    #[test]
    fn unsigned_identity_cannot_be_certified() {
        let unsigned = Identity::new("test_currency", alice_key().public_key(), "Alice", stamp(0)).unwrap();
        let err = Certification::new(bob_key().public_key(), &unsigned, stamp(12)).unwrap_err();
        assert!(matches!(err, DocumentError::InvalidFieldContent { field: "IdtySignature", .. }));
    }

    #[test]
    fn canonical_embeds_identity() {
        let cert = bob_certifies_alice();
        let canonical = cert.canonical();
        let alice = signed_alice();
        assert!(canonical.starts_with("Version: 2\nType: Certification\nCurrency: test_currency\n"));
        assert!(canonical.contains(&format!("IdtyIssuer: {}\n", alice.pubkey())));
        assert!(canonical.contains("IdtyUniqueID: Alice\n"));
        assert!(canonical.contains(&format!("IdtySignature: {}\n", alice.signature().unwrap())));
        assert!(canonical.ends_with(&format!("CertTimestamp: {}\n", stamp(12))));
        assert_eq!(canonical.lines().count(), 9);
    }

    #[test]
    fn signed_roundtrip_and_verify() {
        let cert = bob_certifies_alice().add_signature(&bob_key());
        let parsed = Certification::from_signed_raw(&cert.signed_raw()).unwrap();
        assert_eq!(parsed, cert);
        let checks = parsed.verify_all().unwrap();
        assert_eq!(checks.len(), 1);
        assert!(checks[0].valid);
        assert_eq!(checks[0].signer, Some(bob_key().public_key()));
    }

    #[test]
    fn embedded_identity_is_recoverable() {
        let cert = bob_certifies_alice();
        let identity = cert.identity().unwrap();
        assert_eq!(identity, signed_alice());
        assert!(identity.verify_all().unwrap()[0].valid);
    }

    #[test]
    fn extra_signatures_are_kept_in_order() {
        let carol = KeyMaterial::from_seed([3; 32]);
        let cert = bob_certifies_alice().add_signature(&bob_key()).add_signature(&carol);
        let parsed = Certification::from_signed_raw(&cert.signed_raw()).unwrap();
        assert_eq!(parsed.signatures(), cert.signatures());

        // Only the declared issuer is known; the second signature has no key.
        let declared: Vec<_> = parsed.verify_all().unwrap().iter().map(|c| c.valid).collect();
        assert_eq!(declared, vec![true, false]);

        let supplied = parsed
            .verify_with(&[bob_key().public_key(), carol.public_key()])
            .unwrap();
        assert!(supplied.iter().all(|c| c.valid));
    }

    #[test]
    fn inline_roundtrip() {
        let cert = bob_certifies_alice().add_signature(&bob_key());
        let inline = cert.inline().unwrap();
        let parsed = Certification::from_inline(&signed_alice(), stamp(12).hash, &inline).unwrap();
        assert_eq!(parsed, cert);
    }

    #[test]
    fn inline_for_other_identity_rejected() {
        let cert = bob_certifies_alice().add_signature(&bob_key());
        let other = Identity::new("test_currency", bob_key().public_key(), "Bob", stamp(0))
            .unwrap()
            .add_signature(&bob_key());
        assert!(matches!(
            Certification::from_inline(&other, stamp(12).hash, &cert.inline().unwrap()),
            Err(DocumentError::MalformedDocument { .. })
        ));
    }

    #[test]
    fn identity_document_is_not_a_certification() {
        let raw = signed_alice().signed_raw();
        assert!(matches!(
            Certification::from_signed_raw(&raw),
            Err(DocumentError::MalformedDocument { line: 2, .. })
        ));
    }
}
