//! # Client Identity
//!
//! The signing identity every request is built with.
//!
//! ```text
//! IdentityContext (trait)
//! ├── serialize_identity()       -> SerializedIdentity{mspid, id_bytes} bytes
//! ├── sign(bytes)                -> signature over SHA-256(bytes)
//! ├── calculate_transaction_id() -> TransactionId{nonce, tx_id}
//! └── client_cert_hash()         -> SHA-256 of the client TLS certificate
//! ```
//!
//! Transaction ids are `hex(sha256(nonce || serialized_identity))` with a
//! fresh 24-byte random nonce.

use crate::ecdsa::{Secp256k1KeyPair, Secp256k1PublicKey};
use crate::hashing::{sha256, sha256_many};
use crate::CryptoError;
use rand::RngCore;
use shared_types::discovery::SerializedIdentity;
use shared_types::NONCE_LENGTH;

/// Nonce and the transaction id derived from it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionId {
    pub nonce: Vec<u8>,
    pub tx_id: String,
}

/// Signing identity used to build and sign requests.
pub trait IdentityContext: Send + Sync {
    /// MSP the identity belongs to.
    fn mspid(&self) -> &str;

    /// Encoded [`SerializedIdentity`] used as creator on every header.
    fn serialize_identity(&self) -> Result<Vec<u8>, CryptoError>;

    /// Sign `message`.
    fn sign(&self, message: &[u8]) -> Result<Vec<u8>, CryptoError>;

    /// SHA-256 of the client TLS certificate, when mutual TLS is configured.
    fn client_cert_hash(&self) -> Option<Vec<u8>>;

    /// Generate a nonce and derive the transaction id from it.
    fn calculate_transaction_id(&self) -> Result<TransactionId, CryptoError> {
        let creator = self.serialize_identity()?;
        Ok(transaction_id_from(generate_nonce(), &creator))
    }
}

/// Fresh random nonce.
pub fn generate_nonce() -> Vec<u8> {
    let mut nonce = vec![0u8; NONCE_LENGTH];
    rand::thread_rng().fill_bytes(&mut nonce);
    nonce
}

/// Derive the transaction id for `nonce` and `creator`.
pub fn transaction_id_from(nonce: Vec<u8>, creator: &[u8]) -> TransactionId {
    let tx_id = hex::encode(sha256_many(&[&nonce, creator]));
    TransactionId { nonce, tx_id }
}

/// An [`IdentityContext`] backed by a secp256k1 key.
pub struct EcdsaIdentity {
    mspid: String,
    keypair: Secp256k1KeyPair,
    tls_cert_hash: Option<Vec<u8>>,
}

impl EcdsaIdentity {
    /// Identity with a freshly generated key.
    pub fn generate(mspid: impl Into<String>) -> Result<Self, CryptoError> {
        Self::with_keypair(mspid.into(), Secp256k1KeyPair::generate())
    }

    /// Identity loaded from a secret scalar.
    pub fn from_secret(mspid: impl Into<String>, secret: [u8; 32]) -> Result<Self, CryptoError> {
        Self::with_keypair(mspid.into(), Secp256k1KeyPair::from_bytes(secret)?)
    }

    fn with_keypair(mspid: String, keypair: Secp256k1KeyPair) -> Result<Self, CryptoError> {
        if mspid.is_empty() {
            return Err(CryptoError::MissingMspId);
        }
        Ok(Self {
            mspid,
            keypair,
            tls_cert_hash: None,
        })
    }

    /// Attach the client TLS certificate; only its hash is kept.
    #[must_use]
    pub fn with_tls_cert(mut self, cert: &[u8]) -> Self {
        self.tls_cert_hash = Some(sha256(cert).to_vec());
        self
    }

    #[must_use]
    pub fn public_key(&self) -> Secp256k1PublicKey {
        self.keypair.public_key()
    }
}

impl IdentityContext for EcdsaIdentity {
    fn mspid(&self) -> &str {
        &self.mspid
    }

    fn serialize_identity(&self) -> Result<Vec<u8>, CryptoError> {
        let identity = SerializedIdentity {
            mspid: self.mspid.clone(),
            id_bytes: self.keypair.public_key().as_bytes().to_vec(),
        };
        shared_types::encode("SerializedIdentity", &identity)
            .map_err(|e| CryptoError::InvalidIdentity(e.to_string()))
    }

    fn sign(&self, message: &[u8]) -> Result<Vec<u8>, CryptoError> {
        Ok(self.keypair.sign(message))
    }

    fn client_cert_hash(&self) -> Option<Vec<u8>> {
        self.tls_cert_hash.clone()
    }
}

/// A serialized identity decoded for verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub mspid: String,
    public_key: Secp256k1PublicKey,
}

impl Identity {
    /// Decode an encoded [`SerializedIdentity`].
    pub fn deserialize(bytes: &[u8]) -> Result<Self, CryptoError> {
        let serialized: SerializedIdentity = shared_types::decode("SerializedIdentity", bytes)
            .map_err(|e| CryptoError::InvalidIdentity(e.to_string()))?;
        if serialized.mspid.is_empty() {
            return Err(CryptoError::MissingMspId);
        }
        Ok(Self {
            mspid: serialized.mspid,
            public_key: Secp256k1PublicKey::from_slice(&serialized.id_bytes)?,
        })
    }

    /// Key material parsed, so the identity can verify signatures.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        true
    }

    pub fn verify(&self, message: &[u8], signature: &[u8]) -> Result<(), CryptoError> {
        self.public_key.verify(message, signature)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transaction_id_derivation() {
        let identity = EcdsaIdentity::from_secret("Org1MSP", [7u8; 32]).unwrap();
        let creator = identity.serialize_identity().unwrap();
        let txid = identity.calculate_transaction_id().unwrap();

        assert_eq!(txid.nonce.len(), NONCE_LENGTH);
        assert_eq!(txid.tx_id.len(), 64);
        assert_eq!(txid.tx_id, hex::encode(sha256_many(&[&txid.nonce, &creator])));
    }

    #[test]
    fn test_transaction_ids_are_unique() {
        let identity = EcdsaIdentity::generate("Org1MSP").unwrap();
        let a = identity.calculate_transaction_id().unwrap();
        let b = identity.calculate_transaction_id().unwrap();
        assert_ne!(a.tx_id, b.tx_id);
    }

    #[test]
    fn test_serialize_then_verify() {
        let identity = EcdsaIdentity::generate("Org2MSP").unwrap();
        let signature = identity.sign(b"payload").unwrap();

        let decoded = Identity::deserialize(&identity.serialize_identity().unwrap()).unwrap();
        assert_eq!(decoded.mspid, "Org2MSP");
        assert!(decoded.is_valid());
        assert!(decoded.verify(b"payload", &signature).is_ok());
        assert!(decoded.verify(b"other", &signature).is_err());
    }

    #[test]
    fn test_missing_mspid() {
        assert!(matches!(
            EcdsaIdentity::generate(""),
            Err(CryptoError::MissingMspId)
        ));
    }

    #[test]
    fn test_tls_cert_hash() {
        let identity = EcdsaIdentity::generate("Org1MSP").unwrap();
        assert!(identity.client_cert_hash().is_none());
        let identity = identity.with_tls_cert(b"cert");
        assert_eq!(identity.client_cert_hash(), Some(sha256(b"cert").to_vec()));
    }
}
