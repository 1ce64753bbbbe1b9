use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{excerpt, TypeError};
use crate::hash::BlockHash;

/// A point in the ledger: block number plus block hash.
///
/// Signed documents embed a `BlockStamp` as their time anchor. The canonical
/// text form is `"{number}-{HASH}"`, which is also how it serializes.
///
/// Ordering: `number` first, then `hash`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct BlockStamp {
    /// Block number.
    pub number: u64,
    /// Block hash.
    pub hash: BlockHash,
}

impl BlockStamp {
    /// Create a stamp from already validated parts.
    pub const fn new(number: u64, hash: BlockHash) -> Self {
        Self { number, hash }
    }

    /// The stamp used before the first block: `0-E3B0...B855`.
    pub const fn empty() -> Self {
        Self {
            number: 0,
            hash: BlockHash::empty(),
        }
    }

    /// Returns `true` if this is the genesis sentinel.
    pub fn is_empty(&self) -> bool {
        self.number == 0 && self.hash.is_empty()
    }

    /// Build a stamp from the `number` and `hash` fields of a node's block
    /// response, applying the same hash validation as [`BlockStamp::parse`].
    pub fn from_node_response(number: u64, hash: &str) -> Result<Self, TypeError> {
        let hash = BlockHash::from_hex(hash).map_err(|e| TypeError::MalformedBlockStamp {
            input: excerpt(&format!("{number}-{hash}")),
            reason: e.to_string(),
        })?;
        Ok(Self { number, hash })
    }

    /// Parse the canonical `"{number}-{hash}"` form.
    pub fn parse(text: &str) -> Result<Self, TypeError> {
        let malformed = |reason: &str| TypeError::MalformedBlockStamp {
            input: excerpt(text),
            reason: reason.to_string(),
        };

        let (number, hash) = text
            .split_once('-')
            .ok_or_else(|| malformed("missing '-' separator"))?;

        if number.is_empty() || !number.bytes().all(|b| b.is_ascii_digit()) {
            return Err(malformed("block number is not a non-negative integer"));
        }
        if number.len() > 1 && number.starts_with('0') {
            return Err(malformed("block number has leading zeros"));
        }
        let number: u64 = number
            .parse()
            .map_err(|_| malformed("block number out of range"))?;

        let hash = BlockHash::from_hex(hash).map_err(|e| malformed(&e.to_string()))?;
        Ok(Self { number, hash })
    }
}

impl Default for BlockStamp {
    fn default() -> Self {
        Self::empty()
    }
}

impl fmt::Debug for BlockStamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BlockStamp({self})")
    }
}

impl fmt::Display for BlockStamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.number, self.hash)
    }
}

impl FromStr for BlockStamp {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for BlockStamp {
    type Error = TypeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<BlockStamp> for String {
    fn from(stamp: BlockStamp) -> Self {
        stamp.to_string()
    }
}
