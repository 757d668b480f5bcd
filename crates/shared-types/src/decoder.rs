//! # Block Decoder
//!
//! Unpacks the layered encoding of a full block into the fields event
//! listeners care about: transaction ids, validation codes and chaincode
//! events.
//!
//! ```text
//! Block.data[i] ── Envelope ── Payload ─┬─ Header ── ChannelHeader (tx_id, type)
//!                                       └─ data ── Transaction ── actions[]
//!                                                  └─ ChaincodeActionPayload
//!                                                     └─ ProposalResponsePayload
//!                                                        └─ ChaincodeAction.events
//! ```
//!
//! Only `ENDORSER_TRANSACTION` payloads are unpacked past the channel header.

use crate::codec::{decode, WireError};
use crate::common::{ChannelHeader, Envelope, HeaderType, Payload, Timestamp};
use crate::ledger::{Block, ChaincodeEvent};
use crate::peer::{
    ChaincodeAction, ChaincodeActionPayload, ChaincodeId, Endorsement, ProposalResponsePayload,
    Response, Transaction,
};
use crate::validation::TxValidationCode;
use crate::BlockNum;

/// A full block with every transaction unpacked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedBlock {
    pub number: BlockNum,
    pub previous_hash: Vec<u8>,
    pub data_hash: Vec<u8>,
    pub transactions: Vec<DecodedTransaction>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedTransaction {
    /// Position within the block.
    pub index: usize,
    pub tx_id: String,
    pub channel_id: String,
    pub header_type: i32,
    pub timestamp: Option<Timestamp>,
    /// Code from the block's transactions filter; `NOT_VALIDATED` when absent.
    pub validation_code: i32,
    pub actions: Vec<DecodedAction>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedAction {
    pub chaincode_id: Option<ChaincodeId>,
    pub response: Response,
    pub chaincode_event: Option<ChaincodeEvent>,
    pub endorsements: Vec<Endorsement>,
}

impl DecodedBlock {
    /// Decode every transaction of `block`.
    pub fn decode(block: &Block) -> Result<Self, WireError> {
        let filter = block.transactions_filter();
        let transactions = block
            .data
            .data
            .iter()
            .enumerate()
            .map(|(index, raw)| {
                let code = filter
                    .get(index)
                    .map(|b| i32::from(*b))
                    .unwrap_or(TxValidationCode::NotValidated.code());
                DecodedTransaction::decode(index, raw, code)
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            number: block.number(),
            previous_hash: block.header.previous_hash.clone(),
            data_hash: block.header.data_hash.clone(),
            transactions,
        })
    }

    /// Every chaincode event in the block, in transaction order.
    pub fn chaincode_events(&self) -> impl Iterator<Item = (&DecodedTransaction, &ChaincodeEvent)> {
        self.transactions.iter().flat_map(|tx| {
            tx.actions
                .iter()
                .filter_map(move |action| action.chaincode_event.as_ref().map(|ev| (tx, ev)))
        })
    }
}

impl DecodedTransaction {
    fn decode(index: usize, raw: &[u8], validation_code: i32) -> Result<Self, WireError> {
        let envelope: Envelope = decode("Envelope", raw)?;
        let payload: Payload = decode("Payload", &envelope.payload)?;
        let channel_header: ChannelHeader =
            decode("ChannelHeader", &payload.header.channel_header)?;

        let actions = if channel_header.kind() == Some(HeaderType::EndorserTransaction) {
            let transaction: Transaction = decode("Transaction", &payload.data)?;
            transaction
                .actions
                .iter()
                .map(|action| decode_action(&action.payload))
                .collect::<Result<Vec<_>, _>>()?
        } else {
            Vec::new()
        };

        Ok(Self {
            index,
            tx_id: channel_header.tx_id,
            channel_id: channel_header.channel_id,
            header_type: channel_header.header_type,
            timestamp: channel_header.timestamp,
            validation_code,
            actions,
        })
    }

    #[must_use]
    pub fn is_endorser_transaction(&self) -> bool {
        self.header_type == HeaderType::EndorserTransaction.code()
    }
}

fn decode_action(raw: &[u8]) -> Result<DecodedAction, WireError> {
    let action_payload: ChaincodeActionPayload = decode("ChaincodeActionPayload", raw)?;
    let response_payload: ProposalResponsePayload = decode(
        "ProposalResponsePayload",
        &action_payload.action.proposal_response_payload,
    )?;
    let chaincode_action: ChaincodeAction =
        decode("ChaincodeAction", &response_payload.extension)?;
    let chaincode_event = if chaincode_action.events.is_empty() {
        None
    } else {
        Some(decode::<ChaincodeEvent>("ChaincodeEvent", &chaincode_action.events)?)
    };

    Ok(DecodedAction {
        chaincode_id: chaincode_action.chaincode_id,
        response: chaincode_action.response,
        chaincode_event,
        endorsements: action_payload.action.endorsements,
    })
}
