//! # Adapters
//!
//! Port implementations. Production transports are supplied by the embedding
//! application through [`crate::ports::Connectors`]; this crate ships the
//! in-memory mocks only.

/// Mock transports.
/// Requires feature: `test-utils`
#[cfg(any(test, feature = "test-utils"))]
pub mod mock;
