//! # Ledger Messages
//!
//! The three block forms a delivery stream can carry: full blocks,
//! filtered blocks and blocks accompanied by private data.

use crate::block_num::BlockNum;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Positions of the entries in [`BlockMetadata::metadata`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockMetadataIndex {
    Signatures = 0,
    LastConfig = 1,
    /// One validation-code byte per transaction, parallel to the block data.
    TransactionsFilter = 2,
    Orderer = 3,
    CommitHash = 4,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockHeader {
    pub number: u64,
    pub previous_hash: Vec<u8>,
    pub data_hash: Vec<u8>,
}

/// Block content: one encoded [`crate::Envelope`] per transaction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockData {
    pub data: Vec<Vec<u8>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockMetadata {
    pub metadata: Vec<Vec<u8>>,
}

/// A full block as delivered by the peer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub header: BlockHeader,
    pub data: BlockData,
    pub metadata: BlockMetadata,
}

impl Block {
    #[must_use]
    pub fn number(&self) -> BlockNum {
        BlockNum::new(self.header.number)
    }

    /// Validation-code bytes, empty when the metadata entry is absent.
    #[must_use]
    pub fn transactions_filter(&self) -> &[u8] {
        self.metadata
            .metadata
            .get(BlockMetadataIndex::TransactionsFilter as usize)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

/// Event emitted by chaincode during a transaction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChaincodeEvent {
    pub chaincode_id: String,
    pub tx_id: String,
    pub event_name: String,
    pub payload: Vec<u8>,
}

/// A reduced block: transaction ids, validation codes and event names only.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilteredBlock {
    pub channel_id: String,
    pub number: u64,
    pub filtered_transactions: Vec<FilteredTransaction>,
}

impl FilteredBlock {
    #[must_use]
    pub fn number(&self) -> BlockNum {
        BlockNum::new(self.number)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilteredTransaction {
    pub txid: String,
    pub header_type: i32,
    pub tx_validation_code: i32,
    pub transaction_actions: Option<FilteredTransactionActions>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilteredTransactionActions {
    pub chaincode_actions: Vec<FilteredChaincodeAction>,
}

/// Chaincode action of a filtered transaction.
///
/// The event's payload field is an empty placeholder on filtered blocks.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilteredChaincodeAction {
    pub chaincode_event: Option<ChaincodeEvent>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionPvtReadWriteSet {
    pub collection_name: String,
    pub rwset: Vec<u8>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NsPvtReadWriteSet {
    pub namespace: String,
    pub collection_pvt_rwset: Vec<CollectionPvtReadWriteSet>,
}

/// Private write set of one transaction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxPvtReadWriteSet {
    pub data_model: i32,
    pub ns_pvt_rwset: Vec<NsPvtReadWriteSet>,
}

/// Private data of a block keyed by transaction index within the block.
pub type PrivateDataMap = BTreeMap<u64, TxPvtReadWriteSet>;
