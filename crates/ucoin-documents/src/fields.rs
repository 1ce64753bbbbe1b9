//! Field validation and the line reader shared by every document codec.
//!
//! Documents are line-oriented: one `Name: value` pair per line, no escaping.
//! A value that contains a line break would shift every following field, so
//! free-text fields are rejected at construction if they contain one.

use std::str::FromStr;

use ucoin_crypto::Signature;
use ucoin_types::excerpt;

use crate::document::DocumentKind;
use crate::error::{DocumentError, DocumentResult};

/// Protocol version emitted and accepted by this crate.
pub const PROTOCOL_VERSION: u32 = 2;

/// Characters that would break the line structure of a document.
const LINE_BREAKS: &[char] = &['\n', '\r'];

/// Validate a free-text field: no line breaks, optionally non-empty.
pub(crate) fn validate_text(field: &'static str, value: &str, allow_empty: bool) -> DocumentResult<()> {
    if !allow_empty && value.is_empty() {
        return Err(DocumentError::InvalidFieldContent {
            field,
            input: String::new(),
            reason: "must not be empty".into(),
        });
    }
    if let Some(ch) = value.chars().find(|c| LINE_BREAKS.contains(c)) {
        return Err(DocumentError::InvalidFieldContent {
            field,
            input: excerpt(value),
            reason: format!("contains line break {ch:?}"),
        });
    }
    Ok(())
}

/// Validate a field that is also embedded in `:`-separated inline forms.
pub(crate) fn validate_token(field: &'static str, value: &str) -> DocumentResult<()> {
    validate_text(field, value, false)?;
    if value.contains(':') {
        return Err(DocumentError::InvalidFieldContent {
            field,
            input: excerpt(value),
            reason: "contains ':'".into(),
        });
    }
    Ok(())
}

/// Parse a canonical decimal: digits only, no sign, no leading zeros.
pub(crate) fn parse_decimal(s: &str) -> Option<u64> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    if s.len() > 1 && s.starts_with('0') {
        return None;
    }
    s.parse().ok()
}

/// Sequential reader over the lines of a raw document.
///
/// Line numbers in errors are 1-based.
pub struct FieldReader<'a> {
    lines: Vec<&'a str>,
    pos: usize,
}

impl<'a> FieldReader<'a> {
    pub(crate) fn new(text: &'a str) -> Self {
        let mut lines: Vec<&str> = text.split('\n').collect();
        // A trailing newline yields one empty tail element.
        if lines.last() == Some(&"") {
            lines.pop();
        }
        Self { lines, pos: 0 }
    }

    /// Error located at the line about to be read.
    pub(crate) fn malformed(&self, input: &str, reason: impl Into<String>) -> DocumentError {
        DocumentError::MalformedDocument {
            line: self.pos + 1,
            input: excerpt(input),
            reason: reason.into(),
        }
    }

    /// Error located at the line just consumed.
    fn malformed_last(&self, input: &str, reason: impl Into<String>) -> DocumentError {
        DocumentError::MalformedDocument {
            line: self.pos,
            input: excerpt(input),
            reason: reason.into(),
        }
    }

    pub(crate) fn peek(&self) -> Option<&'a str> {
        self.lines.get(self.pos).copied()
    }

    pub(crate) fn next_line(&mut self, what: &str) -> DocumentResult<&'a str> {
        let line = self
            .peek()
            .ok_or_else(|| self.malformed("", format!("unexpected end of document, expected {what}")))?;
        self.pos += 1;
        Ok(line)
    }

    /// Consume a line that must equal `expected` exactly.
    pub(crate) fn expect_line(&mut self, expected: &str) -> DocumentResult<()> {
        let line = self.next_line(expected)?;
        if line != expected {
            return Err(self.malformed_last(line, format!("expected {expected:?}")));
        }
        Ok(())
    }

    /// Consume a `Name: value` line and return the value.
    pub(crate) fn field(&mut self, name: &str) -> DocumentResult<&'a str> {
        let line = self.next_line(name)?;
        match line.strip_prefix(name).and_then(|rest| rest.strip_prefix(": ")) {
            Some(value) => Ok(value),
            None => Err(self.malformed_last(line, format!("expected field {name:?}"))),
        }
    }

    /// Consume a field and parse its value with `FromStr`.
    pub(crate) fn parsed_field<T>(&mut self, name: &str) -> DocumentResult<T>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        let value = self.field(name)?;
        value
            .parse()
            .map_err(|e: T::Err| self.malformed_last(value, format!("field {name:?}: {e}")))
    }

    /// Consume a field holding a canonical decimal.
    pub(crate) fn decimal_field(&mut self, name: &str) -> DocumentResult<u64> {
        let value = self.field(name)?;
        parse_decimal(value)
            .ok_or_else(|| self.malformed_last(value, format!("field {name:?} is not a decimal number")))
    }

    /// Consume the `Version` and `Type` header, checking the document kind.
    pub(crate) fn header(&mut self, kind: DocumentKind) -> DocumentResult<u32> {
        let version = self.decimal_field("Version")?;
        if version != u64::from(PROTOCOL_VERSION) {
            return Err(self.malformed_last(
                &version.to_string(),
                format!("unsupported version, expected {PROTOCOL_VERSION}"),
            ));
        }
        let tag = self.field("Type")?;
        if tag != kind.as_str() {
            return Err(self.malformed_last(tag, format!("expected document type {kind}")));
        }
        Ok(PROTOCOL_VERSION)
    }

    /// Consume a `Header:` line followed by items up to (not including)
    /// the first line starting with `terminator`, parsing each item.
    pub(crate) fn list<T>(
        &mut self,
        header: &str,
        terminator: &str,
        parse: impl Fn(&str) -> DocumentResult<T>,
    ) -> DocumentResult<Vec<T>> {
        self.expect_line(header)?;
        let mut items = Vec::new();
        loop {
            let line = self.next_line(terminator)?;
            if line.starts_with(terminator) {
                // Leave the terminator for the caller.
                self.pos -= 1;
                return Ok(items);
            }
            let item = parse(line).map_err(|e| self.malformed_last(line, e.to_string()))?;
            items.push(item);
        }
    }

    /// Every remaining line is one base64 signature.
    pub(crate) fn signatures(mut self) -> DocumentResult<Vec<Signature>> {
        let mut signatures = Vec::new();
        while let Some(line) = self.peek() {
            let sig = Signature::from_base64(line)
                .map_err(|e| self.malformed(line, format!("invalid signature line: {e}")))?;
            signatures.push(sig);
            self.pos += 1;
        }
        Ok(signatures)
    }
}

/// Re-label a construction error raised while parsing raw text.
pub(crate) fn into_malformed(err: DocumentError) -> DocumentError {
    match err {
        DocumentError::InvalidFieldContent { field, input, reason } => {
            DocumentError::MalformedDocument {
                line: 0,
                input,
                reason: format!("field {field}: {reason}"),
            }
        }
        other => other,
    }
}
