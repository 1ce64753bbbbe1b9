use ucoin_crypto::Signature;
use ucoin_types::{excerpt, BlockStamp, PublicKey};

use crate::document::{sealed::DocumentCodec, DocumentKind, SignedDocument};
use crate::error::{DocumentError, DocumentResult};
use crate::fields::{into_malformed, validate_token, FieldReader, PROTOCOL_VERSION};

/// Self-certification: a public key claiming a unique identifier.
///
/// ```text
/// Version: 2
/// Type: Identity
/// Currency: {currency}
/// Issuer: {pubkey}
/// UniqueID: {uid}
/// Timestamp: {blockstamp}
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Identity {
    currency: String,
    pubkey: PublicKey,
    uid: String,
    timestamp: BlockStamp,
    signatures: Vec<Signature>,
}

impl Identity {
    /// Build an unsigned identity.
    ///
    /// `currency` and `uid` must be non-empty and free of line breaks and
    /// `:`; anything else would not survive the node's line-based parser.
    pub fn new(
        currency: impl Into<String>,
        pubkey: PublicKey,
        uid: impl Into<String>,
        timestamp: BlockStamp,
    ) -> DocumentResult<Self> {
        let currency = currency.into();
        let uid = uid.into();
        validate_token("Currency", &currency)?;
        validate_token("UniqueID", &uid)?;
        Ok(Self {
            currency,
            pubkey,
            uid,
            timestamp,
            signatures: Vec::new(),
        })
    }

    pub fn pubkey(&self) -> &PublicKey {
        &self.pubkey
    }

    pub fn uid(&self) -> &str {
        &self.uid
    }

    pub fn timestamp(&self) -> &BlockStamp {
        &self.timestamp
    }

    /// The self-signature, if the identity has been signed.
    pub fn signature(&self) -> Option<&Signature> {
        self.signatures.first()
    }

    /// Attach a self-signature obtained elsewhere, e.g. from a certification.
    pub(crate) fn with_signature(mut self, signature: Signature) -> Self {
        self.signatures.push(signature);
        self
    }

    /// Compact form used in blocks and lookups: `pubkey:signature:blockstamp:uid`.
    ///
    /// Returns `None` for an unsigned identity.
    pub fn inline(&self) -> Option<String> {
        self.signature().map(|signature| {
            format!("{}:{}:{}:{}", self.pubkey, signature, self.timestamp, self.uid)
        })
    }

    /// Parse the compact form produced by [`Identity::inline`].
    pub fn from_inline(currency: impl Into<String>, inline: &str) -> DocumentResult<Self> {
        let malformed = |reason: String| DocumentError::MalformedDocument {
            line: 1,
            input: excerpt(inline),
            reason,
        };
        let parts: Vec<&str> = inline.split(':').collect();
        let [pubkey, signature, timestamp, uid] = parts.as_slice() else {
            return Err(malformed(format!(
                "inline identity needs 4 ':'-separated fields, got {}",
                parts.len()
            )));
        };
        let pubkey: PublicKey = pubkey.parse().map_err(|e| malformed(format!("{e}")))?;
        let signature: Signature = signature.parse().map_err(|e| malformed(format!("{e}")))?;
        let timestamp: BlockStamp = timestamp.parse().map_err(|e| malformed(format!("{e}")))?;

        let mut identity = Self::new(currency, pubkey, *uid, timestamp).map_err(into_malformed)?;
        identity.signatures.push(signature);
        Ok(identity)
    }
}

impl DocumentCodec for Identity {
    fn append_signature(&mut self, signature: Signature) {
        self.signatures.push(signature);
    }

    fn read_body(reader: &mut FieldReader<'_>) -> DocumentResult<Self> {
        reader.header(Self::KIND)?;
        let currency = reader.field("Currency")?;
        let pubkey = reader.parsed_field("Issuer")?;
        let uid = reader.field("UniqueID")?;
        let timestamp = reader.parsed_field("Timestamp")?;
        Self::new(currency, pubkey, uid, timestamp).map_err(into_malformed)
    }
}

impl SignedDocument for Identity {
    const KIND: DocumentKind = DocumentKind::Identity;

    fn version(&self) -> u32 {
        PROTOCOL_VERSION
    }

    fn currency(&self) -> &str {
        &self.currency
    }

    fn canonical(&self) -> String {
        format!(
            "Version: {}\nType: {}\nCurrency: {}\nIssuer: {}\nUniqueID: {}\nTimestamp: {}\n",
            PROTOCOL_VERSION,
            Self::KIND,
            self.currency,
            self.pubkey,
            self.uid,
            self.timestamp
        )
    }

    fn signatures(&self) -> &[Signature] {
        &self.signatures
    }

    fn declared_signers(&self) -> Vec<PublicKey> {
        vec![self.pubkey]
    }
}
