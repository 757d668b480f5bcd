//! # Transaction Validation Codes
//!
//! Numeric status the committing peer assigns to every transaction in a
//! block, and its symbolic label.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

macro_rules! validation_codes {
    ($($variant:ident = $code:literal => $label:literal),+ $(,)?) => {
        /// Validation outcome of a committed transaction.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum TxValidationCode {
            $($variant = $code),+
        }

        impl TxValidationCode {
            /// Every known code, in ascending numeric order.
            pub const ALL: &'static [TxValidationCode] = &[$(TxValidationCode::$variant),+];

            /// Look up a code by wire value.
            #[must_use]
            pub fn from_code(code: i32) -> Option<Self> {
                match code {
                    $($code => Some(TxValidationCode::$variant),)+
                    _ => None,
                }
            }

            /// Symbolic label, e.g. `MVCC_READ_CONFLICT`.
            #[must_use]
            pub fn as_str(self) -> &'static str {
                match self {
                    $(TxValidationCode::$variant => $label),+
                }
            }
        }

        impl FromStr for TxValidationCode {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($label => Ok(TxValidationCode::$variant),)+
                    other => Err(format!("Unknown validation code label: {other}")),
                }
            }
        }
    };
}

validation_codes! {
    Valid = 0 => "VALID",
    NilEnvelope = 1 => "NIL_ENVELOPE",
    BadPayload = 2 => "BAD_PAYLOAD",
    BadCommonHeader = 3 => "BAD_COMMON_HEADER",
    BadCreatorSignature = 4 => "BAD_CREATOR_SIGNATURE",
    InvalidEndorserTransaction = 5 => "INVALID_ENDORSER_TRANSACTION",
    InvalidConfigTransaction = 6 => "INVALID_CONFIG_TRANSACTION",
    UnsupportedTxPayload = 7 => "UNSUPPORTED_TX_PAYLOAD",
    BadProposalTxid = 8 => "BAD_PROPOSAL_TXID",
    DuplicateTxid = 9 => "DUPLICATE_TXID",
    EndorsementPolicyFailure = 10 => "ENDORSEMENT_POLICY_FAILURE",
    MvccReadConflict = 11 => "MVCC_READ_CONFLICT",
    PhantomReadConflict = 12 => "PHANTOM_READ_CONFLICT",
    UnknownTxType = 13 => "UNKNOWN_TX_TYPE",
    TargetChainNotFound = 14 => "TARGET_CHAIN_NOT_FOUND",
    MarshalTxError = 15 => "MARSHAL_TX_ERROR",
    NilTxaction = 16 => "NIL_TXACTION",
    ExpiredChaincode = 17 => "EXPIRED_CHAINCODE",
    ChaincodeVersionConflict = 18 => "CHAINCODE_VERSION_CONFLICT",
    BadHeaderExtension = 19 => "BAD_HEADER_EXTENSION",
    BadChannelHeader = 20 => "BAD_CHANNEL_HEADER",
    BadResponsePayload = 21 => "BAD_RESPONSE_PAYLOAD",
    BadRwset = 22 => "BAD_RWSET",
    IllegalWriteset = 23 => "ILLEGAL_WRITESET",
    InvalidWriteset = 24 => "INVALID_WRITESET",
    InvalidChaincode = 25 => "INVALID_CHAINCODE",
    NotValidated = 254 => "NOT_VALIDATED",
    InvalidOtherReason = 255 => "INVALID_OTHER_REASON",
}

impl TxValidationCode {
    /// Numeric wire value.
    #[must_use]
    pub fn code(self) -> i32 {
        self as i32
    }

    #[must_use]
    pub fn is_valid(self) -> bool {
        self == TxValidationCode::Valid
    }

    /// Label for a raw code; unknown codes render as `UNKNOWN_CODE_<n>`.
    #[must_use]
    pub fn label(code: i32) -> String {
        match Self::from_code(code) {
            Some(known) => known.as_str().to_string(),
            None => format!("UNKNOWN_CODE_{code}"),
        }
    }
}

impl fmt::Display for TxValidationCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
