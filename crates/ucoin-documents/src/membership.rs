use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use ucoin_crypto::Signature;
use ucoin_types::{excerpt, BlockStamp, PublicKey};

use crate::document::{sealed::DocumentCodec, DocumentKind, SignedDocument};
use crate::error::{DocumentError, DocumentResult};
use crate::fields::{into_malformed, validate_token, FieldReader, PROTOCOL_VERSION};

/// Direction of a membership request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MembershipType {
    /// Join, or renew, membership.
    In,
    /// Leave.
    Out,
}

impl MembershipType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::In => "IN",
            Self::Out => "OUT",
        }
    }
}

impl fmt::Display for MembershipType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MembershipType {
    type Err = DocumentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "IN" => Ok(Self::In),
            "OUT" => Ok(Self::Out),
            other => Err(DocumentError::InvalidFieldContent {
                field: "Membership",
                input: excerpt(other),
                reason: "expected IN or OUT".into(),
            }),
        }
    }
}

/// A member asking to join or leave the web of trust.
///
/// ```text
/// Version: 2
/// Type: Membership
/// Currency: {currency}
/// Issuer: {issuer}
/// Block: {blockstamp}
/// Membership: IN|OUT
/// UserID: {uid}
/// CertTS: {identity blockstamp}
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Membership {
    currency: String,
    issuer: PublicKey,
    block: BlockStamp,
    membership: MembershipType,
    uid: String,
    cert_ts: BlockStamp,
    signatures: Vec<Signature>,
}

impl Membership {
    /// Build an unsigned membership request.
    ///
    /// `cert_ts` is the timestamp of the issuer's identity document.
    pub fn new(
        currency: impl Into<String>,
        issuer: PublicKey,
        block: BlockStamp,
        membership: MembershipType,
        uid: impl Into<String>,
        cert_ts: BlockStamp,
    ) -> DocumentResult<Self> {
        let currency = currency.into();
        let uid = uid.into();
        validate_token("Currency", &currency)?;
        validate_token("UserID", &uid)?;
        Ok(Self {
            currency,
            issuer,
            block,
            membership,
            uid,
            cert_ts,
            signatures: Vec::new(),
        })
    }

    pub fn issuer(&self) -> &PublicKey {
        &self.issuer
    }

    pub fn block(&self) -> &BlockStamp {
        &self.block
    }

    pub fn membership(&self) -> MembershipType {
        self.membership
    }

    pub fn uid(&self) -> &str {
        &self.uid
    }

    pub fn cert_ts(&self) -> &BlockStamp {
        &self.cert_ts
    }
}

impl DocumentCodec for Membership {
    fn append_signature(&mut self, signature: Signature) {
        self.signatures.push(signature);
    }

    fn read_body(reader: &mut FieldReader<'_>) -> DocumentResult<Self> {
        reader.header(Self::KIND)?;
        let currency = reader.field("Currency")?;
        let issuer = reader.parsed_field("Issuer")?;
        let block = reader.parsed_field("Block")?;
        let membership = reader.parsed_field("Membership")?;
        let uid = reader.field("UserID")?;
        let cert_ts = reader.parsed_field("CertTS")?;
        Self::new(currency, issuer, block, membership, uid, cert_ts).map_err(into_malformed)
    }
}

impl SignedDocument for Membership {
    const KIND: DocumentKind = DocumentKind::Membership;

    fn version(&self) -> u32 {
        PROTOCOL_VERSION
    }

    fn currency(&self) -> &str {
        &self.currency
    }

    fn canonical(&self) -> String {
        format!(
            "Version: {}\nType: {}\nCurrency: {}\nIssuer: {}\nBlock: {}\nMembership: {}\nUserID: {}\nCertTS: {}\n",
            PROTOCOL_VERSION,
            Self::KIND,
            self.currency,
            self.issuer,
            self.block,
            self.membership,
            self.uid,
            self.cert_ts
        )
    }

    fn signatures(&self) -> &[Signature] {
        &self.signatures
    }

    fn declared_signers(&self) -> Vec<PublicKey> {
        vec![self.issuer]
    }
}
