//! Header construction shared by proposals, commits and seek requests.

use crate::domain::ActionError;
use chrono::Utc;
use shared_crypto::{IdentityContext, TransactionId};
use shared_types::{encode, ChannelHeader, Header, HeaderType, SignatureHeader, Timestamp};

/// Current wall-clock time.
pub fn now_timestamp() -> Timestamp {
    let now = Utc::now();
    Timestamp {
        seconds: now.timestamp(),
        nanos: i32::try_from(now.timestamp_subsec_nanos()).unwrap_or(0),
    }
}

/// Channel header stamped with the current time.
pub fn channel_header(
    header_type: HeaderType,
    channel_id: &str,
    tx_id: &str,
    extension: Vec<u8>,
    tls_cert_hash: Option<Vec<u8>>,
) -> ChannelHeader {
    ChannelHeader {
        header_type: header_type.code(),
        version: 1,
        timestamp: Some(now_timestamp()),
        channel_id: channel_id.to_string(),
        tx_id: tx_id.to_string(),
        epoch: 0,
        extension,
        tls_cert_hash: tls_cert_hash.unwrap_or_default(),
    }
}

/// Encode `channel_header` with a signature header for `identity`.
pub fn header(
    identity: &dyn IdentityContext,
    channel_header: &ChannelHeader,
    tx: &TransactionId,
) -> Result<Header, ActionError> {
    let signature_header = SignatureHeader {
        creator: identity.serialize_identity()?,
        nonce: tx.nonce.clone(),
    };
    Ok(Header {
        channel_header: encode("ChannelHeader", channel_header)?,
        signature_header: encode("SignatureHeader", &signature_header)?,
    })
}
