//! Cross-crate scenarios driven through `fc_client::Client`.

#[cfg(test)]
mod harness;

pub mod discovery_flows;
pub mod event_flows;
