//! # Domain
//!
//! Listener records, events, terminations, seek planning and errors.

pub mod config;
pub mod errors;
pub mod event;
pub mod listener;
pub mod seek;

pub use config::EventHubConfig;
pub use errors::EventHubError;
pub use event::{BlockEvent, Delivery, Termination, TerminationKind};
pub use listener::{
    EventListener, EventNameMatch, ListenerFilter, ListenerHandle, ListenerKind, ListenerOptions,
    TxMatch, ALL_TRANSACTIONS,
};
pub use seek::{plan_seek, SeekPlan};
