//! # Orderer and Delivery Messages

use crate::block_num::BlockNum;
use crate::common::Status;
use crate::ledger::{Block, FilteredBlock, PrivateDataMap};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Which delivery service a stream is opened against.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlockType {
    /// Full blocks (`deliver`).
    Full,
    /// Filtered blocks (`deliverFiltered`).
    #[default]
    Filtered,
    /// Full blocks with private data (`deliverWithPrivateData`).
    Private,
}

impl BlockType {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            BlockType::Full => "full",
            BlockType::Filtered => "filtered",
            BlockType::Private => "private",
        }
    }
}

impl fmt::Display for BlockType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BlockType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "full" => Ok(BlockType::Full),
            "filtered" => Ok(BlockType::Filtered),
            "private" => Ok(BlockType::Private),
            other => Err(format!("Invalid blockType: {other}")),
        }
    }
}

/// Start or stop position of a delivery stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SeekPosition {
    Newest,
    Oldest,
    Specified(u64),
}

/// What the delivery service does when the requested stop is not yet
/// on the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SeekBehavior {
    /// Keep the stream open and wait for blocks.
    BlockUntilReady,
    /// Reply with a failure status instead of waiting.
    FailIfNotReady,
}

/// Seek directive carried as the data of a `DELIVER_SEEK_INFO` payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeekInfo {
    pub start: SeekPosition,
    pub stop: SeekPosition,
    pub behavior: SeekBehavior,
}

/// Orderer reply to a broadcast envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BroadcastResponse {
    pub status: Status,
    pub info: String,
}

impl BroadcastResponse {
    #[must_use]
    pub fn success() -> Self {
        Self {
            status: Status::Success,
            info: String::new(),
        }
    }
}

/// One message on a delivery stream, decoded once at the transport edge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeliverResponse {
    /// Terminal status of the stream.
    Status(Status),
    Block(Block),
    FilteredBlock(FilteredBlock),
    /// A full block together with its private data.
    BlockAndPrivateData {
        block: Block,
        private_data_map: PrivateDataMap,
    },
}

impl DeliverResponse {
    /// Block number carried by the message, if it carries a block.
    #[must_use]
    pub fn block_number(&self) -> Option<BlockNum> {
        match self {
            DeliverResponse::Status(_) => None,
            DeliverResponse::Block(block) => Some(block.number()),
            DeliverResponse::FilteredBlock(block) => Some(block.number()),
            DeliverResponse::BlockAndPrivateData { block, .. } => Some(block.number()),
        }
    }

    /// Variant name for logging.
    #[must_use]
    pub fn variant(&self) -> &'static str {
        match self {
            DeliverResponse::Status(_) => "status",
            DeliverResponse::Block(_) => "block",
            DeliverResponse::FilteredBlock(_) => "filtered_block",
            DeliverResponse::BlockAndPrivateData { .. } => "private_data",
        }
    }
}
