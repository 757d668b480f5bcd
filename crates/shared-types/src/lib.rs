//! # Shared Types
//!
//! Wire-level message shapes exchanged with peers and orderers.
//!
//! Every component of the client (endpoint wrappers, proposal builders, the
//! event hub and the discovery client) speaks in these types. Nested byte
//! fields mirror the layered encoding used on the wire: a field typed
//! `Vec<u8>` holds another message encoded with [`codec::encode`].
//!
//! ## Modules
//!
//! ```text
//! shared-types/
//! ├── block_num     # BlockNum + seek sentinels (NEWEST / OLDEST / LAST_SEEN)
//! ├── codec         # bincode wire codec + WireError
//! ├── common        # Envelope, Payload, headers, HeaderType, Status
//! ├── connection    # ConnectionInfo attached to every transport failure
//! ├── ledger        # Block, FilteredBlock, private data, chaincode events
//! ├── validation    # TxValidationCode <-> symbolic label
//! ├── peer          # proposals, proposal responses, transactions
//! ├── orderer       # seek info, broadcast + deliver responses
//! ├── discovery     # discovery protocol, gossip payloads, MSP config
//! ├── decoder       # full-block decoder used by the event hub
//! └── test_utils    # block and discovery fixtures (feature `test-utils`)
//! ```

#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod block_num;
pub mod codec;
pub mod common;
pub mod connection;
pub mod decoder;
pub mod discovery;
pub mod ledger;
pub mod orderer;
pub mod peer;
pub mod validation;

/// Block fixtures.
/// Requires feature: `test-utils`
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use block_num::{BlockNum, BlockPosition, ParseBlockError};
pub use codec::{decode, encode, WireError};
pub use common::{
    ChannelHeader, Envelope, Header, HeaderType, Payload, SignatureHeader, Status, Timestamp,
};
pub use connection::ConnectionInfo;
pub use decoder::{DecodedAction, DecodedBlock, DecodedTransaction};
pub use ledger::{
    Block, BlockData, BlockHeader, BlockMetadata, BlockMetadataIndex, ChaincodeEvent,
    FilteredBlock, FilteredChaincodeAction, FilteredTransaction, FilteredTransactionActions,
    PrivateDataMap, TxPvtReadWriteSet,
};
pub use orderer::{BlockType, BroadcastResponse, DeliverResponse, SeekBehavior, SeekInfo, SeekPosition};
pub use validation::TxValidationCode;

/// Client nonce length in bytes.
pub const NONCE_LENGTH: usize = 24;
