//! Block and discovery fixtures for hub, decoder and discovery tests.

use crate::codec::encode;
use crate::discovery::{
    AliveMessage, ChaincodeQueryResult, ConfigResult, DiscoveryPeer, EndorsementDescriptor,
    Endpoints, FabricMspConfig, GossipContent, GossipEnvelope, GossipMessage, InstalledChaincode,
    Layout, Member, MspConfig, OrdererEndpoint, PeerMembershipResult, Peers, Properties,
    SerializedIdentity, StateInfo,
};
use crate::common::{ChannelHeader, Envelope, Header, HeaderType, Payload, SignatureHeader};
use crate::ledger::{
    Block, BlockData, BlockHeader, BlockMetadata, ChaincodeEvent, FilteredBlock,
    FilteredChaincodeAction, FilteredTransaction, FilteredTransactionActions,
};
use crate::peer::{
    ChaincodeAction, ChaincodeActionPayload, ChaincodeEndorsedAction, ChaincodeId,
    ProposalResponsePayload, Response, Transaction, TransactionAction,
};
use serde::Serialize;

fn enc<T: Serialize>(what: &'static str, value: &T) -> Vec<u8> {
    encode(what, value).unwrap_or_default()
}

/// Description of one transaction to place in a fixture block.
#[derive(Debug, Clone)]
pub struct TxFixture {
    pub tx_id: String,
    pub header_type: HeaderType,
    pub chaincode: String,
    /// One chaincode action per event.
    pub events: Vec<ChaincodeEvent>,
    pub code: u8,
}

impl TxFixture {
    pub fn endorser(tx_id: &str, chaincode: &str) -> Self {
        Self {
            tx_id: tx_id.to_string(),
            header_type: HeaderType::EndorserTransaction,
            chaincode: chaincode.to_string(),
            events: Vec::new(),
            code: 0,
        }
    }

    pub fn config(tx_id: &str) -> Self {
        Self {
            header_type: HeaderType::Config,
            ..Self::endorser(tx_id, "")
        }
    }

    #[must_use]
    pub fn with_event(mut self, name: &str, payload: &[u8]) -> Self {
        self.events.push(ChaincodeEvent {
            chaincode_id: self.chaincode.clone(),
            tx_id: self.tx_id.clone(),
            event_name: name.to_string(),
            payload: payload.to_vec(),
        });
        self
    }

    #[must_use]
    pub fn with_code(mut self, code: u8) -> Self {
        self.code = code;
        self
    }

    fn envelope(&self) -> Vec<u8> {
        let channel_header = ChannelHeader {
            header_type: self.header_type.code(),
            channel_id: "mychannel".to_string(),
            tx_id: self.tx_id.clone(),
            ..Default::default()
        };
        let data = if self.header_type == HeaderType::EndorserTransaction {
            let actions = self
                .events
                .iter()
                .map(|event| Some(event.clone()))
                .chain(self.events.is_empty().then_some(None))
                .map(|event| self.action(event))
                .collect();
            enc("Transaction", &Transaction { actions })
        } else {
            Vec::new()
        };
        let payload = Payload {
            header: Header {
                channel_header: enc("ChannelHeader", &channel_header),
                signature_header: enc("SignatureHeader", &SignatureHeader::default()),
            },
            data,
        };
        enc(
            "Envelope",
            &Envelope {
                payload: enc("Payload", &payload),
                signature: vec![0; 8],
            },
        )
    }

    fn action(&self, event: Option<ChaincodeEvent>) -> TransactionAction {
        let chaincode_action = ChaincodeAction {
            events: event.map(|e| enc("ChaincodeEvent", &e)).unwrap_or_default(),
            response: Response {
                status: 200,
                ..Default::default()
            },
            chaincode_id: Some(ChaincodeId::named(self.chaincode.clone())),
            ..Default::default()
        };
        let response_payload = ProposalResponsePayload {
            proposal_hash: vec![1; 32],
            extension: enc("ChaincodeAction", &chaincode_action),
        };
        let action_payload = ChaincodeActionPayload {
            chaincode_proposal_payload: Vec::new(),
            action: ChaincodeEndorsedAction {
                proposal_response_payload: enc("ProposalResponsePayload", &response_payload),
                endorsements: Vec::new(),
            },
        };
        TransactionAction {
            header: Vec::new(),
            payload: enc("ChaincodeActionPayload", &action_payload),
        }
    }
}

/// Full block holding `txs`, with a transactions filter built from their codes.
pub fn full_block(number: u64, txs: &[TxFixture]) -> Block {
    Block {
        header: BlockHeader {
            number,
            previous_hash: vec![0; 32],
            data_hash: vec![0; 32],
        },
        data: BlockData {
            data: txs.iter().map(TxFixture::envelope).collect(),
        },
        metadata: BlockMetadata {
            metadata: vec![Vec::new(), Vec::new(), txs.iter().map(|tx| tx.code).collect()],
        },
    }
}

/// Filtered block holding `txs`. Event payloads are left in place.
pub fn filtered_block(number: u64, txs: &[TxFixture]) -> FilteredBlock {
    FilteredBlock {
        channel_id: "mychannel".to_string(),
        number,
        filtered_transactions: txs
            .iter()
            .map(|tx| FilteredTransaction {
                txid: tx.tx_id.clone(),
                header_type: tx.header_type.code(),
                tx_validation_code: i32::from(tx.code),
                transaction_actions: Some(FilteredTransactionActions {
                    chaincode_actions: tx
                        .events
                        .iter()
                        .map(|event| FilteredChaincodeAction {
                            chaincode_event: Some(event.clone()),
                        })
                        .collect(),
                }),
            })
            .collect(),
    }
}

// =============================================================================
// Discovery
// =============================================================================

fn gossip(content: GossipContent) -> GossipEnvelope {
    GossipEnvelope {
        payload: enc(
            "GossipMessage",
            &GossipMessage {
                nonce: 0,
                channel: Vec::new(),
                content,
            },
        ),
        signature: Vec::new(),
    }
}

/// Channel member advertising `endpoint` (`host:port`) at `ledger_height`.
pub fn discovery_peer(mspid: &str, endpoint: &str, ledger_height: u64, chaincodes: &[&str]) -> DiscoveryPeer {
    DiscoveryPeer {
        state_info: Some(gossip(GossipContent::StateInfo(StateInfo {
            pki_id: endpoint.as_bytes().to_vec(),
            channel_mac: Vec::new(),
            properties: Some(Properties {
                ledger_height,
                left_channel: false,
                chaincodes: chaincodes
                    .iter()
                    .map(|name| InstalledChaincode {
                        name: (*name).to_string(),
                        version: "1.0".to_string(),
                    })
                    .collect(),
            }),
        }))),
        ..local_peer(mspid, endpoint)
    }
}

/// Peer as reported by a local-peers query: membership only, no state.
pub fn local_peer(mspid: &str, endpoint: &str) -> DiscoveryPeer {
    DiscoveryPeer {
        state_info: None,
        membership_info: Some(gossip(GossipContent::AliveMsg(AliveMessage {
            membership: Member {
                endpoint: endpoint.to_string(),
                pki_id: endpoint.as_bytes().to_vec(),
            },
            timestamp: 1,
        }))),
        identity: enc(
            "SerializedIdentity",
            &SerializedIdentity {
                mspid: mspid.to_string(),
                id_bytes: format!("-----BEGIN CERTIFICATE-----\n{endpoint}\n-----END CERTIFICATE-----\n").into_bytes(),
            },
        ),
    }
}

/// Membership result grouping `peers` under their MSP ids.
pub fn members(peers: &[(&str, DiscoveryPeer)]) -> PeerMembershipResult {
    let mut result = PeerMembershipResult::default();
    for (mspid, peer) in peers {
        result
            .peers_by_org
            .entry((*mspid).to_string())
            .or_default()
            .peers
            .push(peer.clone());
    }
    result
}

/// Config result with one TLS root per MSP and orderers as `(mspid, host, port)`.
pub fn config_result(msps: &[(&str, &str)], orderers: &[(&str, &str, u16)]) -> ConfigResult {
    let mut result = ConfigResult::default();
    for (mspid, tls_root) in msps {
        let config = FabricMspConfig {
            name: (*mspid).to_string(),
            root_certs: vec![b"ROOT".to_vec()],
            tls_root_certs: vec![tls_root.as_bytes().to_vec()],
            ..Default::default()
        };
        result.msps.insert(
            (*mspid).to_string(),
            MspConfig {
                msp_type: 0,
                config: enc("FabricMspConfig", &config),
            },
        );
    }
    for (mspid, host, port) in orderers {
        result
            .orderers
            .entry((*mspid).to_string())
            .or_insert_with(Endpoints::default)
            .endpoint
            .push(OrdererEndpoint {
                host: (*host).to_string(),
                port: *port,
            });
    }
    result
}

/// Single-descriptor plan result for `chaincode`.
pub fn endorsement_plan(
    chaincode: &str,
    groups: &[(&str, Vec<DiscoveryPeer>)],
    layouts: &[&[(&str, u32)]],
) -> ChaincodeQueryResult {
    ChaincodeQueryResult {
        content: vec![EndorsementDescriptor {
            chaincode: chaincode.to_string(),
            endorsers_by_groups: groups
                .iter()
                .map(|(name, peers)| ((*name).to_string(), Peers { peers: peers.clone() }))
                .collect(),
            layouts: layouts
                .iter()
                .map(|layout| Layout {
                    quantities_by_group: layout
                        .iter()
                        .map(|(group, count)| ((*group).to_string(), *count))
                        .collect(),
                })
                .collect(),
        }],
    }
}
