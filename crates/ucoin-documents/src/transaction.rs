use std::fmt::{self, Write as _};
use std::str::FromStr;

use ucoin_crypto::Signature;
use ucoin_types::{excerpt, BlockHash, PublicKey};

use crate::document::{sealed::DocumentCodec, DocumentKind, SignedDocument};
use crate::error::{DocumentError, DocumentResult};
use crate::fields::{into_malformed, parse_decimal, validate_text, validate_token, FieldReader, PROTOCOL_VERSION};

/// Longest comment, in characters, a node accepts.
pub const MAX_COMMENT_LEN: usize = 255;

fn invalid(field: &'static str, input: &str, reason: impl Into<String>) -> DocumentError {
    DocumentError::InvalidFieldContent {
        field,
        input: excerpt(input),
        reason: reason.into(),
    }
}

/// A source of money consumed by a transaction.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum TxInput {
    /// Output `index` of a previous transaction: `T:{hash}:{index}`.
    Transaction { hash: BlockHash, index: u32 },
    /// Universal dividend of `pubkey` created at block `block`: `D:{pubkey}:{block}`.
    Dividend { pubkey: PublicKey, block: u64 },
}

impl fmt::Display for TxInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transaction { hash, index } => write!(f, "T:{hash}:{index}"),
            Self::Dividend { pubkey, block } => write!(f, "D:{pubkey}:{block}"),
        }
    }
}

impl FromStr for TxInput {
    type Err = DocumentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bad = |reason: String| invalid("Inputs", s, reason);
        let parts: Vec<&str> = s.split(':').collect();
        let [tag, identifier, position] = parts.as_slice() else {
            return Err(bad(format!("expected 3 ':'-separated fields, got {}", parts.len())));
        };
        let position = parse_decimal(position).ok_or_else(|| bad("position is not a decimal".into()))?;
        match *tag {
            "T" => Ok(Self::Transaction {
                hash: identifier.parse().map_err(|e| bad(format!("{e}")))?,
                index: u32::try_from(position).map_err(|_| bad("output index out of range".into()))?,
            }),
            "D" => Ok(Self::Dividend {
                pubkey: identifier.parse().map_err(|e| bad(format!("{e}")))?,
                block: position,
            }),
            other => Err(bad(format!("unknown input type {other:?}"))),
        }
    }
}

/// One proof offered to satisfy an output condition.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum UnlockParam {
    /// Signature of the issuer at this index: `SIG(n)`.
    Sig(usize),
    /// Preimage of a hash lock: `XHX(secret)`.
    Xhx(String),
}

impl fmt::Display for UnlockParam {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sig(issuer) => write!(f, "SIG({issuer})"),
            Self::Xhx(secret) => write!(f, "XHX({secret})"),
        }
    }
}

impl FromStr for UnlockParam {
    type Err = DocumentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some(inner) = s.strip_prefix("SIG(").and_then(|r| r.strip_suffix(')')) {
            let issuer = parse_decimal(inner).ok_or_else(|| invalid("Unlocks", s, "SIG index is not a decimal"))?;
            let issuer = usize::try_from(issuer).map_err(|_| invalid("Unlocks", s, "SIG index out of range"))?;
            return Ok(Self::Sig(issuer));
        }
        if let Some(inner) = s.strip_prefix("XHX(").and_then(|r| r.strip_suffix(')')) {
            let param = Self::Xhx(inner.to_string());
            param.validate()?;
            return Ok(param);
        }
        Err(invalid("Unlocks", s, "expected SIG(n) or XHX(secret)"))
    }
}

impl UnlockParam {
    /// An `XHX` secret is one word: it shares a line with the other params.
    fn validate(&self) -> DocumentResult<()> {
        if let Self::Xhx(secret) = self {
            if secret.is_empty() || secret.contains([' ', ':', '\n', '\r']) {
                return Err(invalid("Unlocks", secret, "XHX secret must be a non-empty word"));
            }
        }
        Ok(())
    }
}

/// Proofs unlocking one input: `{input index}:{param} {param}...`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Unlock {
    input: usize,
    params: Vec<UnlockParam>,
}

impl Unlock {
    /// Unlock `input` with `params`, of which there must be at least one.
    pub fn new(input: usize, params: Vec<UnlockParam>) -> DocumentResult<Self> {
        if params.is_empty() {
            return Err(invalid("Unlocks", &format!("{input}:"), "at least one unlock param is required"));
        }
        for param in &params {
            param.validate()?;
        }
        Ok(Self { input, params })
    }

    /// Unlock `input` with the signature of issuer `issuer`.
    pub fn sig(input: usize, issuer: usize) -> Self {
        Self {
            input,
            params: vec![UnlockParam::Sig(issuer)],
        }
    }

    pub fn input(&self) -> usize {
        self.input
    }

    pub fn params(&self) -> &[UnlockParam] {
        &self.params
    }
}

impl fmt::Display for Unlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:", self.input)?;
        for (i, param) in self.params.iter().enumerate() {
            if i > 0 {
                f.write_char(' ')?;
            }
            write!(f, "{param}")?;
        }
        Ok(())
    }
}

impl FromStr for Unlock {
    type Err = DocumentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (input, params) = s
            .split_once(':')
            .ok_or_else(|| invalid("Unlocks", s, "expected {input}:{params}"))?;
        let input = parse_decimal(input)
            .and_then(|n| usize::try_from(n).ok())
            .ok_or_else(|| invalid("Unlocks", s, "input index is not a decimal"))?;
        let params = params
            .split(' ')
            .map(str::parse)
            .collect::<DocumentResult<Vec<UnlockParam>>>()?;
        Self::new(input, params)
    }
}

/// Money sent to whoever can satisfy `condition`: `{amount}:{condition}`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct TxOutput {
    pub amount: u64,
    pub condition: String,
}

impl TxOutput {
    /// Build an output, rejecting conditions that would break the line format.
    pub fn new(amount: u64, condition: impl Into<String>) -> DocumentResult<Self> {
        let condition = condition.into();
        validate_text("Outputs", &condition, false)?;
        Ok(Self { amount, condition })
    }

    /// Output spendable by the holder of `pubkey`.
    pub fn for_pubkey(amount: u64, pubkey: &PublicKey) -> Self {
        Self {
            amount,
            condition: format!("SIG({pubkey})"),
        }
    }
}

impl fmt::Display for TxOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.amount, self.condition)
    }
}

impl FromStr for TxOutput {
    type Err = DocumentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (amount, condition) = s
            .split_once(':')
            .ok_or_else(|| invalid("Outputs", s, "expected {amount}:{condition}"))?;
        let amount = parse_decimal(amount).ok_or_else(|| invalid("Outputs", s, "amount is not a decimal"))?;
        Self::new(amount, condition)
    }
}

/// Transfer of money, signed by every issuer.
///
/// Signature `i` belongs to `issuers[i]`, so issuers sign in list order.
///
/// ```text
/// Version: 2
/// Type: Transaction
/// Currency: {currency}
/// Locktime: {locktime}
/// Issuers:
/// {pubkey}...
/// Inputs:
/// {T|D}:{identifier}:{index}...
/// Unlocks:
/// {input index}:SIG({issuer index})...
/// Outputs:
/// {amount}:{condition}...
/// Comment: {comment}
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Transaction {
    currency: String,
    locktime: u64,
    issuers: Vec<PublicKey>,
    inputs: Vec<TxInput>,
    unlocks: Vec<Unlock>,
    outputs: Vec<TxOutput>,
    comment: String,
    signatures: Vec<Signature>,
}

impl Transaction {
    /// Build an unsigned transaction with no locktime and an empty comment.
    pub fn new(
        currency: impl Into<String>,
        issuers: Vec<PublicKey>,
        inputs: Vec<TxInput>,
        unlocks: Vec<Unlock>,
        outputs: Vec<TxOutput>,
    ) -> DocumentResult<Self> {
        let currency = currency.into();
        validate_token("Currency", &currency)?;
        if issuers.is_empty() {
            return Err(invalid("Issuers", "", "at least one issuer is required"));
        }
        if inputs.is_empty() {
            return Err(invalid("Inputs", "", "at least one input is required"));
        }
        if outputs.is_empty() {
            return Err(invalid("Outputs", "", "at least one output is required"));
        }
        for output in &outputs {
            validate_text("Outputs", &output.condition, false)?;
        }
        for unlock in &unlocks {
            if unlock.input >= inputs.len() {
                return Err(invalid(
                    "Unlocks",
                    &unlock.to_string(),
                    format!("refers to input {} of {}", unlock.input, inputs.len()),
                ));
            }
            for param in &unlock.params {
                if let UnlockParam::Sig(issuer) = param {
                    if *issuer >= issuers.len() {
                        return Err(invalid(
                            "Unlocks",
                            &unlock.to_string(),
                            format!("refers to issuer {issuer} of {}", issuers.len()),
                        ));
                    }
                }
            }
        }
        Ok(Self {
            currency,
            locktime: 0,
            issuers,
            inputs,
            unlocks,
            outputs,
            comment: String::new(),
            signatures: Vec::new(),
        })
    }

    /// Set the locktime. Fails once signed: it is part of the signed text.
    pub fn with_locktime(mut self, locktime: u64) -> DocumentResult<Self> {
        self.ensure_unsigned("Locktime", &locktime.to_string())?;
        self.locktime = locktime;
        Ok(self)
    }

    /// Set the comment. Fails once signed: it is part of the signed text.
    pub fn with_comment(mut self, comment: impl Into<String>) -> DocumentResult<Self> {
        let comment = comment.into();
        self.ensure_unsigned("Comment", &comment)?;
        validate_text("Comment", &comment, true)?;
        let len = comment.chars().count();
        if len > MAX_COMMENT_LEN {
            return Err(invalid(
                "Comment",
                &comment,
                format!("{len} characters, at most {MAX_COMMENT_LEN} allowed"),
            ));
        }
        self.comment = comment;
        Ok(self)
    }

    pub fn locktime(&self) -> u64 {
        self.locktime
    }

    pub fn issuers(&self) -> &[PublicKey] {
        &self.issuers
    }

    pub fn inputs(&self) -> &[TxInput] {
        &self.inputs
    }

    pub fn unlocks(&self) -> &[Unlock] {
        &self.unlocks
    }

    pub fn outputs(&self) -> &[TxOutput] {
        &self.outputs
    }

    pub fn comment(&self) -> &str {
        &self.comment
    }

    fn ensure_unsigned(&self, field: &'static str, input: &str) -> DocumentResult<()> {
        if self.signatures.is_empty() {
            return Ok(());
        }
        Err(invalid(
            field,
            input,
            format!("transaction already carries {} signature(s)", self.signatures.len()),
        ))
    }

    /// Whether every issuer has signed.
    pub fn is_fully_signed(&self) -> bool {
        self.signatures.len() >= self.issuers.len()
    }
}

impl DocumentCodec for Transaction {
    fn append_signature(&mut self, signature: Signature) {
        self.signatures.push(signature);
    }

    fn read_body(reader: &mut FieldReader<'_>) -> DocumentResult<Self> {
        reader.header(Self::KIND)?;
        let currency = reader.field("Currency")?;
        let locktime = reader.decimal_field("Locktime")?;
        let issuers = reader.list("Issuers:", "Inputs:", |line| {
            line.parse::<PublicKey>()
                .map_err(|e| invalid("Issuers", line, e.to_string()))
        })?;
        let inputs = reader.list("Inputs:", "Unlocks:", str::parse)?;
        let unlocks = reader.list("Unlocks:", "Outputs:", str::parse)?;
        let outputs = reader.list("Outputs:", "Comment:", str::parse)?;
        let comment = reader.field("Comment")?;

        Self::new(currency, issuers, inputs, unlocks, outputs)
            .and_then(|tx| tx.with_comment(comment))
            .and_then(|tx| tx.with_locktime(locktime))
            .map_err(into_malformed)
    }
}

impl SignedDocument for Transaction {
    const KIND: DocumentKind = DocumentKind::Transaction;

    fn version(&self) -> u32 {
        PROTOCOL_VERSION
    }

    fn currency(&self) -> &str {
        &self.currency
    }

    fn canonical(&self) -> String {
        let mut out = format!(
            "Version: {}\nType: {}\nCurrency: {}\nLocktime: {}\n",
            PROTOCOL_VERSION,
            Self::KIND,
            self.currency,
            self.locktime
        );
        out.push_str("Issuers:\n");
        for issuer in &self.issuers {
            out.push_str(&format!("{issuer}\n"));
        }
        out.push_str("Inputs:\n");
        for input in &self.inputs {
            out.push_str(&format!("{input}\n"));
        }
        out.push_str("Unlocks:\n");
        for unlock in &self.unlocks {
            out.push_str(&format!("{unlock}\n"));
        }
        out.push_str("Outputs:\n");
        for output in &self.outputs {
            out.push_str(&format!("{output}\n"));
        }
        out.push_str(&format!("Comment: {}\n", self.comment));
        out
    }

    fn signatures(&self) -> &[Signature] {
        &self.signatures
    }

    fn declared_signers(&self) -> Vec<PublicKey> {
        self.issuers.clone()
    }
}
