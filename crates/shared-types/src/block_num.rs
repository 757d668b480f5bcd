//! # Block Numbers
//!
//! Ledger heights and the symbolic positions a delivery stream can start or
//! stop at. Heights are carried as `u64`, the width of the block number on
//! the wire, so every ledger height is representable without loss.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// A ledger block number.
///
/// Ordering is numeric.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct BlockNum(u64);

impl BlockNum {
    /// The largest block number a seek directive can name.
    pub const MAX: BlockNum = BlockNum(u64::MAX);

    /// Genesis block.
    pub const ZERO: BlockNum = BlockNum(0);

    /// Create a block number.
    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Raw value.
    #[must_use]
    pub const fn value(self) -> u64 {
        self.0
    }

    /// The following block number, saturating at [`BlockNum::MAX`].
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0.saturating_add(1))
    }
}

impl From<u64> for BlockNum {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl From<BlockNum> for u64 {
    fn from(value: BlockNum) -> Self {
        value.0
    }
}

impl fmt::Display for BlockNum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Failure to parse a block number or position.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Invalid block number: {0}")]
pub struct ParseBlockError(pub String);

impl FromStr for BlockNum {
    type Err = ParseBlockError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<u64>()
            .map(BlockNum)
            .map_err(|_| ParseBlockError(s.to_string()))
    }
}

/// A block position as supplied by the application.
///
/// `LastSeen` is a client-side sentinel: it is resolved against the last
/// block number the hub observed at the moment the request is built, and
/// never re-resolved afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BlockPosition {
    /// The most recent block on the ledger.
    Newest,
    /// The genesis block.
    Oldest,
    /// The last block number this client observed.
    LastSeen,
    /// A concrete block number.
    Number(BlockNum),
}

impl BlockPosition {
    /// Resolve `LastSeen` against the last observed block.
    ///
    /// With nothing observed yet the position falls back to `Newest`.
    #[must_use]
    pub fn resolve(self, last_seen: Option<BlockNum>) -> Self {
        match self {
            BlockPosition::LastSeen => match last_seen {
                Some(number) => BlockPosition::Number(number),
                None => BlockPosition::Newest,
            },
            other => other,
        }
    }

    /// Concrete number, if this position names one.
    #[must_use]
    pub fn number(self) -> Option<BlockNum> {
        match self {
            BlockPosition::Number(n) => Some(n),
            _ => None,
        }
    }
}

impl From<u64> for BlockPosition {
    fn from(value: u64) -> Self {
        BlockPosition::Number(BlockNum(value))
    }
}

impl From<BlockNum> for BlockPosition {
    fn from(value: BlockNum) -> Self {
        BlockPosition::Number(value)
    }
}

impl fmt::Display for BlockPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BlockPosition::Newest => write!(f, "newest"),
            BlockPosition::Oldest => write!(f, "oldest"),
            BlockPosition::LastSeen => write!(f, "last_seen"),
            BlockPosition::Number(n) => write!(f, "{n}"),
        }
    }
}

impl FromStr for BlockPosition {
    type Err = ParseBlockError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "newest" => Ok(BlockPosition::Newest),
            "oldest" => Ok(BlockPosition::Oldest),
            "last_seen" => Ok(BlockPosition::LastSeen),
            other => other.parse::<BlockNum>().map(BlockPosition::Number),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_ordering() {
        // "9" > "10" lexicographically; numbers must not compare that way
        assert!(BlockNum::new(9) < BlockNum::new(10));
        assert!(BlockNum::new(u64::MAX) > BlockNum::new(1 << 53));
    }

    #[test]
    fn test_next_saturates() {
        assert_eq!(BlockNum::new(4).next(), BlockNum::new(5));
        assert_eq!(BlockNum::MAX.next(), BlockNum::MAX);
    }

    #[test]
    fn test_parse_block_num() {
        assert_eq!("18446744073709551615".parse::<BlockNum>(), Ok(BlockNum::MAX));
        assert!("-1".parse::<BlockNum>().is_err());
        assert!("abc".parse::<BlockNum>().is_err());
    }

    #[test]
    fn test_parse_positions() {
        assert_eq!("NEWEST".parse::<BlockPosition>(), Ok(BlockPosition::Newest));
        assert_eq!("oldest".parse::<BlockPosition>(), Ok(BlockPosition::Oldest));
        assert_eq!("last_seen".parse::<BlockPosition>(), Ok(BlockPosition::LastSeen));
        assert_eq!("42".parse::<BlockPosition>(), Ok(BlockPosition::from(42)));
    }

    #[test]
    fn test_resolve_last_seen() {
        let seen = Some(BlockNum::new(77));
        assert_eq!(BlockPosition::LastSeen.resolve(seen), BlockPosition::from(77));
        assert_eq!(BlockPosition::LastSeen.resolve(None), BlockPosition::Newest);
        assert_eq!(BlockPosition::Oldest.resolve(seen), BlockPosition::Oldest);
    }
}
