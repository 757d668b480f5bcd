//! # Service
//!
//! The hub, its event sources and the per-block dispatch passes.

pub(crate) mod dispatch;
pub mod eventer;
pub mod hub;
pub(crate) mod registry;

pub use eventer::Eventer;
pub use hub::{EventHub, SendRequest, StartRequest};
