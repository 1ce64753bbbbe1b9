use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;
use ucoin_crypto::{KeyMaterial, Signature};
use ucoin_types::{excerpt, PublicKey};

use crate::certification::Certification;
use crate::error::{DocumentError, DocumentResult};
use crate::fields::FieldReader;
use crate::identity::Identity;
use crate::membership::Membership;
use crate::transaction::Transaction;

/// Document type tag, as written on the `Type:` line.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DocumentKind {
    Identity,
    Certification,
    Membership,
    Transaction,
}

impl DocumentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Identity => "Identity",
            Self::Certification => "Certification",
            Self::Membership => "Membership",
            Self::Transaction => "Transaction",
        }
    }
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DocumentKind {
    type Err = DocumentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Identity" => Ok(Self::Identity),
            "Certification" => Ok(Self::Certification),
            "Membership" => Ok(Self::Membership),
            "Transaction" => Ok(Self::Transaction),
            other => Err(DocumentError::MalformedDocument {
                line: 2,
                input: excerpt(other),
                reason: "unknown document type".into(),
            }),
        }
    }
}

/// Outcome of checking one signature.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SignatureCheck {
    /// Position of the signature in the document, which is also the
    /// position of its signer.
    pub signer_index: usize,
    /// The key the signature was checked against, if one was available.
    pub signer: Option<PublicKey>,
    pub valid: bool,
}

impl SignatureCheck {
    pub fn as_pair(&self) -> (usize, bool) {
        (self.signer_index, self.valid)
    }
}

pub(crate) mod sealed {
    use ucoin_crypto::Signature;

    use crate::error::DocumentResult;
    use crate::fields::FieldReader;

    /// Crate-internal half of the document contract.
    pub trait DocumentCodec: Sized {
        /// Appending is the only mutation a signed document allows.
        fn append_signature(&mut self, signature: Signature);

        /// Parse the canonical body, leaving the reader at the first signature.
        fn read_body(reader: &mut FieldReader<'_>) -> DocumentResult<Self>;
    }
}

/// Behaviour shared by every ledger document.
///
/// A document has a canonical text form, the exact bytes every signer signs
/// and every node re-derives to verify. Signatures are not part of it: they
/// follow the canonical body, one per line, in signing order.
///
/// Signing appends; nothing removes a signature. To start over, build a new
/// document.
pub trait SignedDocument: sealed::DocumentCodec {
    const KIND: DocumentKind;

    /// Always [`PROTOCOL_VERSION`](crate::PROTOCOL_VERSION): only version 2
    /// documents are built or parsed, so the version is not stored.
    fn version(&self) -> u32;

    fn currency(&self) -> &str;

    /// The canonical text that is signed.
    fn canonical(&self) -> String;

    /// Signatures in the order they were appended.
    fn signatures(&self) -> &[Signature];

    /// Keys the document itself declares as signers, by position.
    fn declared_signers(&self) -> Vec<PublicKey>;

    /// Sign the canonical text and append the signature.
    fn add_signature(mut self, key: &KeyMaterial) -> Self {
        let signature = key.sign(self.canonical().as_bytes());
        self.append_signature(signature);
        debug!(
            kind = %Self::KIND,
            signer = %key.public_key(),
            count = self.signatures().len(),
            "signature appended"
        );
        self
    }

    /// Canonical body followed by one signature per line.
    fn signed_raw(&self) -> String {
        let mut raw = self.canonical();
        for signature in self.signatures() {
            raw.push_str(&signature.to_base64());
            raw.push('\n');
        }
        raw
    }

    /// Parse text produced by [`SignedDocument::signed_raw`].
    ///
    /// Signatures are decoded but not verified.
    fn from_signed_raw(text: &str) -> DocumentResult<Self> {
        let mut reader = FieldReader::new(text);
        let mut doc = Self::read_body(&mut reader)?;
        for signature in reader.signatures()? {
            doc.append_signature(signature);
        }
        Ok(doc)
    }

    /// Verify every signature against the signers the document declares.
    fn verify_all(&self) -> DocumentResult<Vec<SignatureCheck>> {
        self.verify_with(&self.declared_signers())
    }

    /// Verify signature `i` against `keys[i]`.
    ///
    /// A signature with no key at its position is reported invalid.
    fn verify_with(&self, keys: &[PublicKey]) -> DocumentResult<Vec<SignatureCheck>> {
        let canonical = self.canonical();
        self.signatures()
            .iter()
            .enumerate()
            .map(|(index, signature)| {
                let signer = keys.get(index).copied();
                let valid = match &signer {
                    Some(key) => ucoin_crypto::verify(key, canonical.as_bytes(), signature)?,
                    None => false,
                };
                Ok(SignatureCheck {
                    signer_index: index,
                    signer,
                    valid,
                })
            })
            .collect()
    }
}

/// Any ledger document, dispatched on its `Type:` tag.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Document {
    Identity(Identity),
    Certification(Certification),
    Membership(Membership),
    Transaction(Transaction),
}

macro_rules! dispatch {
    ($self:expr, $doc:ident => $body:expr) => {
        match $self {
            Document::Identity($doc) => $body,
            Document::Certification($doc) => $body,
            Document::Membership($doc) => $body,
            Document::Transaction($doc) => $body,
        }
    };
}

impl Document {
    /// Parse signed raw text of any kind.
    ///
    /// The kind is read from the `Type:` line; the body is then parsed by
    /// that variant, which re-checks the header.
    pub fn parse(text: &str) -> DocumentResult<Self> {
        let mut reader = FieldReader::new(text);
        reader.decimal_field("Version")?;
        let kind: DocumentKind = reader.field("Type")?.parse()?;
        match kind {
            DocumentKind::Identity => Identity::from_signed_raw(text).map(Self::Identity),
            DocumentKind::Certification => {
                Certification::from_signed_raw(text).map(Self::Certification)
            }
            DocumentKind::Membership => Membership::from_signed_raw(text).map(Self::Membership),
            DocumentKind::Transaction => Transaction::from_signed_raw(text).map(Self::Transaction),
        }
    }

    pub fn kind(&self) -> DocumentKind {
        match self {
            Self::Identity(_) => DocumentKind::Identity,
            Self::Certification(_) => DocumentKind::Certification,
            Self::Membership(_) => DocumentKind::Membership,
            Self::Transaction(_) => DocumentKind::Transaction,
        }
    }

    pub fn version(&self) -> u32 {
        dispatch!(self, d => d.version())
    }

    pub fn currency(&self) -> &str {
        dispatch!(self, d => d.currency())
    }

    pub fn canonical(&self) -> String {
        dispatch!(self, d => d.canonical())
    }

    pub fn signed_raw(&self) -> String {
        dispatch!(self, d => d.signed_raw())
    }

    pub fn signatures(&self) -> &[Signature] {
        dispatch!(self, d => d.signatures())
    }

    pub fn declared_signers(&self) -> Vec<PublicKey> {
        dispatch!(self, d => d.declared_signers())
    }

    pub fn add_signature(self, key: &KeyMaterial) -> Self {
        match self {
            Self::Identity(d) => Self::Identity(d.add_signature(key)),
            Self::Certification(d) => Self::Certification(d.add_signature(key)),
            Self::Membership(d) => Self::Membership(d.add_signature(key)),
            Self::Transaction(d) => Self::Transaction(d.add_signature(key)),
        }
    }

    pub fn verify_all(&self) -> DocumentResult<Vec<SignatureCheck>> {
        dispatch!(self, d => d.verify_all())
    }

    pub fn verify_with(&self, keys: &[PublicKey]) -> DocumentResult<Vec<SignatureCheck>> {
        dispatch!(self, d => d.verify_with(keys))
    }
}

impl From<Identity> for Document {
    fn from(doc: Identity) -> Self {
        Self::Identity(doc)
    }
}

impl From<Certification> for Document {
    fn from(doc: Certification) -> Self {
        Self::Certification(doc)
    }
}

impl From<Membership> for Document {
    fn from(doc: Membership) -> Self {
        Self::Membership(doc)
    }
}

impl From<Transaction> for Document {
    fn from(doc: Transaction) -> Self {
        Self::Transaction(doc)
    }
}
