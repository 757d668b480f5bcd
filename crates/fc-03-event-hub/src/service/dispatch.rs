//! # Dispatch
//!
//! Turns one delivered block into the deliveries it owes listeners.
//!
//! ```text
//! DeliveredBlock
//!   ├── block pass       every in-range block listener
//!   ├── tx pass          tx listeners matching an id (or "all")
//!   ├── chaincode pass   one batched event per matching listener
//!   └── end-block pass   listeners whose window ends here, any kind
//! ```
//!
//! Passes run in that order; each is skipped when no listener of its kind
//! is registered. Auto-unregistration is applied at the end of each pass.

use super::registry::{ListenerRegistry, SharedSink};
use crate::domain::{
    BlockEvent, Delivery, ListenerFilter, ListenerHandle, ListenerKind, Termination, TerminationKind,
};
use shared_types::{
    BlockNum, ChaincodeEvent, DecodedBlock, DeliverResponse, FilteredBlock, HeaderType,
    PrivateDataMap, TxValidationCode,
};
use std::sync::Arc;
use tracing::{debug, error};

pub(crate) type Outgoing = Vec<(SharedSink, Delivery)>;

/// The decoded forms of one delivered block.
#[derive(Debug, Clone)]
pub(crate) struct DeliveredBlock {
    pub number: BlockNum,
    pub full: Option<Arc<DecodedBlock>>,
    pub filtered: Option<Arc<FilteredBlock>>,
    pub private_data: Option<Arc<PrivateDataMap>>,
}

impl DeliveredBlock {
    /// Decode a block-carrying response. `Ok(None)` for status messages.
    ///
    /// A full block that fails to decode yields the `DecodeError`
    /// termination the hub shuts down with.
    pub fn from_response(hub: &str, response: DeliverResponse) -> Result<Option<Self>, Termination> {
        let (block, private_data) = match response {
            DeliverResponse::Status(_) => return Ok(None),
            DeliverResponse::FilteredBlock(filtered) => {
                return Ok(Some(Self {
                    number: filtered.number(),
                    full: None,
                    filtered: Some(Arc::new(filtered)),
                    private_data: None,
                }));
            }
            DeliverResponse::Block(block) => (block, None),
            DeliverResponse::BlockAndPrivateData {
                block,
                private_data_map,
            } => (block, Some(Arc::new(private_data_map))),
        };

        let number = block.number();
        let decoded = DecodedBlock::decode(&block).map_err(|e| {
            error!(hub, block = %number, error = %e, "block decode failed");
            Termination::new(
                hub,
                TerminationKind::DecodeError,
                format!("Failed to decode block {number}: {e}"),
            )
        })?;
        Ok(Some(Self {
            number,
            full: Some(Arc::new(decoded)),
            filtered: None,
            private_data,
        }))
    }

    fn event(&self, hub: &str) -> BlockEvent {
        BlockEvent {
            hub: hub.to_string(),
            block_number: self.number,
            block: self.full.clone(),
            filtered_block: self.filtered.clone(),
            private_data: self.private_data.clone(),
            ..Default::default()
        }
    }

    /// `(tx id, validation code)` of every transaction in block order.
    fn transactions(&self) -> Vec<(&str, i32)> {
        if let Some(filtered) = &self.filtered {
            return filtered
                .filtered_transactions
                .iter()
                .map(|tx| (tx.txid.as_str(), tx.tx_validation_code))
                .collect();
        }
        self.full
            .iter()
            .flat_map(|block| block.transactions.iter())
            .map(|tx| (tx.tx_id.as_str(), tx.validation_code))
            .collect()
    }

    /// Chaincode events of endorser transactions. Filtered blocks carry an
    /// empty placeholder payload, which is cleared here.
    fn chaincode_events(&self) -> Vec<ChaincodeEvent> {
        if let Some(filtered) = &self.filtered {
            return filtered
                .filtered_transactions
                .iter()
                .filter(|tx| tx.header_type == HeaderType::EndorserTransaction.code())
                .filter_map(|tx| tx.transaction_actions.as_ref())
                .flat_map(|actions| actions.chaincode_actions.iter())
                .filter_map(|action| action.chaincode_event.as_ref())
                .map(|event| ChaincodeEvent {
                    payload: Vec::new(),
                    ..event.clone()
                })
                .collect();
        }
        self.full
            .iter()
            .flat_map(|block| block.chaincode_events())
            .filter(|(tx, _)| tx.is_endorser_transaction())
            .map(|(_, event)| event.clone())
            .collect()
    }
}

/// Run every pass for `block` against `registry`.
pub(crate) fn dispatch(hub: &str, registry: &mut ListenerRegistry, block: &DeliveredBlock) -> Outgoing {
    let mut out = Outgoing::new();
    block_pass(hub, registry, block, &mut out);
    tx_pass(hub, registry, block, &mut out);
    chaincode_pass(hub, registry, block, &mut out);
    end_block_pass(hub, registry, block.number, &mut out);
    debug!(hub, block = %block.number, deliveries = out.len(), "block dispatched");
    out
}

fn block_pass(hub: &str, registry: &mut ListenerRegistry, block: &DeliveredBlock, out: &mut Outgoing) {
    if !registry.has(ListenerKind::Block) {
        return;
    }
    let mut done = Vec::new();
    for (handle, reg) in registry.of_kind(ListenerKind::Block) {
        if !reg.listener.in_range(block.number) {
            continue;
        }
        out.push((reg.sink.clone(), Delivery::Event(block.event(hub))));
        if reg.listener.auto_unregister() {
            done.push(handle);
        }
    }
    registry.remove_all(&done);
}

fn tx_pass(hub: &str, registry: &mut ListenerRegistry, block: &DeliveredBlock, out: &mut Outgoing) {
    if !registry.has(ListenerKind::Tx) {
        return;
    }
    let mut done: Vec<ListenerHandle> = Vec::new();
    for (tx_id, code) in block.transactions() {
        for (handle, reg) in registry.of_kind(ListenerKind::Tx) {
            let ListenerFilter::Tx(matcher) = reg.listener.filter() else {
                continue;
            };
            if done.contains(&handle) || !matcher.matches(tx_id) || !reg.listener.in_range(block.number) {
                continue;
            }
            let mut event = block.event(hub);
            event.transaction_id = Some(tx_id.to_string());
            event.transaction_status = Some(TxValidationCode::label(code));
            out.push((reg.sink.clone(), Delivery::Event(event)));
            if reg.listener.auto_unregister() {
                done.push(handle);
            }
        }
    }
    registry.remove_all(&done);
}

fn chaincode_pass(hub: &str, registry: &mut ListenerRegistry, block: &DeliveredBlock, out: &mut Outgoing) {
    if !registry.has(ListenerKind::Chaincode) {
        return;
    }
    let events = block.chaincode_events();
    if events.is_empty() {
        return;
    }
    let mut done = Vec::new();
    for (handle, reg) in registry.of_kind(ListenerKind::Chaincode) {
        if !reg.listener.in_range(block.number) {
            continue;
        }
        let matched: Vec<ChaincodeEvent> = events
            .iter()
            .filter(|event| reg.listener.filter().matches_chaincode_event(event))
            .cloned()
            .collect();
        if matched.is_empty() {
            continue;
        }
        let mut event = block.event(hub);
        event.chaincode_events = matched;
        out.push((reg.sink.clone(), Delivery::Event(event)));
        if reg.listener.auto_unregister() {
            done.push(handle);
        }
    }
    registry.remove_all(&done);
}

fn end_block_pass(hub: &str, registry: &mut ListenerRegistry, number: BlockNum, out: &mut Outgoing) {
    let mut done = Vec::new();
    for (handle, reg) in registry.iter() {
        if reg.listener.is_end_block(number) {
            out.push((reg.sink.clone(), Delivery::Event(BlockEvent::end_block(hub, number))));
            done.push(handle);
        }
    }
    registry.remove_all(&done);
}
