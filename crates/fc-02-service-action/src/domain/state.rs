//! # Sign State
//!
//! The build, sign, envelope lifecycle shared by every request type:
//!
//! ```text
//! new ──build()──> built(payload) ──sign(identity) | sign_with(bytes)──> signed
//!                      ^                                                   │
//!                      └─────────────── build() again resets ──────────────┘
//! ```

use super::errors::ActionError;
use shared_crypto::IdentityContext;
use shared_types::Envelope;

/// Payload bytes and signature of one request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActionState {
    payload: Option<Vec<u8>>,
    signature: Option<Vec<u8>>,
}

impl ActionState {
    /// Store freshly built payload bytes, discarding any prior signature.
    pub fn set_payload(&mut self, payload: Vec<u8>) {
        self.payload = Some(payload);
        self.signature = None;
    }

    #[must_use]
    pub fn is_built(&self) -> bool {
        self.payload.is_some()
    }

    #[must_use]
    pub fn is_signed(&self) -> bool {
        self.signature.is_some()
    }

    #[must_use]
    pub fn payload(&self) -> Option<&[u8]> {
        self.payload.as_deref()
    }

    #[must_use]
    pub fn signature(&self) -> Option<&[u8]> {
        self.signature.as_deref()
    }

    /// Drop payload and signature.
    pub fn reset(&mut self) {
        self.payload = None;
        self.signature = None;
    }
}

/// Build, sign, envelope capability.
///
/// Implementors expose their [`ActionState`]; signing and envelope
/// assembly are shared.
pub trait Signable {
    /// Label used in errors, e.g. `"Proposal"`.
    const ACTION: &'static str;

    fn state(&self) -> &ActionState;

    fn state_mut(&mut self) -> &mut ActionState;

    /// Built payload bytes, for external signing.
    fn payload_bytes(&self) -> Result<Vec<u8>, ActionError> {
        self.state()
            .payload()
            .map(<[u8]>::to_vec)
            .ok_or(ActionError::NotBuilt(Self::ACTION))
    }

    /// Sign the built payload with `identity`.
    fn sign(&mut self, identity: &dyn IdentityContext) -> Result<(), ActionError> {
        let payload = self.payload_bytes()?;
        let signature = identity.sign(&payload)?;
        self.state_mut().signature = Some(signature);
        Ok(())
    }

    /// Attach a signature computed outside the client.
    fn sign_with(&mut self, signature: Vec<u8>) -> Result<(), ActionError> {
        if signature.is_empty() {
            return Err(ActionError::MissingParameter("signature"));
        }
        if !self.state().is_built() {
            return Err(ActionError::NotBuilt(Self::ACTION));
        }
        self.state_mut().signature = Some(signature);
        Ok(())
    }

    /// Payload plus signature.
    fn signed_envelope(&self) -> Result<Envelope, ActionError> {
        let state = self.state();
        let payload = state.payload().ok_or(ActionError::NotBuilt(Self::ACTION))?;
        let signature = state.signature().ok_or(ActionError::NotSigned(Self::ACTION))?;
        Ok(Envelope {
            payload: payload.to_vec(),
            signature: signature.to_vec(),
        })
    }
}
