//! # Domain
//!
//! Endpoint addressing, MSP trust material and transport errors.

pub mod endpoint;
pub mod errors;
pub mod msp;

pub use endpoint::{Endpoint, EndpointOptions, Protocol};
pub use errors::{ServiceError, TransportError};
pub use msp::MspInfo;
