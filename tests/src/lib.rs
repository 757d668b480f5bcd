//! # Fabric Client Test Suite
//!
//! Scenarios that span several crates, run against the in-memory
//! transports from `fc-01-endpoint`'s `test-utils` feature.
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! └── integration/
//!     ├── harness.rs          # Client wired to mock peers, orderers, deliver
//!     ├── event_flows.rs      # Hub ranges, stream replacement, shutdown
//!     └── discovery_flows.rs  # Cache refresh, layouts, commit retry, query
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p fc-tests
//! cargo test -p fc-tests integration::discovery_flows::
//! ```

pub mod integration;
