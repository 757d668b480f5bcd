//! # Listener Sinks
//!
//! Where a registration's deliveries go: a callback or a channel.

use crate::domain::Delivery;
use tokio::sync::mpsc;

/// Receives the deliveries of one registration.
///
/// Invoked synchronously from the dispatch loop. A panicking sink is
/// isolated from the other listeners.
pub trait ListenerSink: Send {
    fn deliver(&mut self, delivery: Delivery);
}

impl<F> ListenerSink for F
where
    F: FnMut(Delivery) + Send,
{
    fn deliver(&mut self, delivery: Delivery) {
        self(delivery);
    }
}

/// Forwards deliveries into an unbounded channel.
pub struct ChannelSink(mpsc::UnboundedSender<Delivery>);

impl ChannelSink {
    /// Sink plus the receiver the application reads from.
    #[must_use]
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Delivery>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self(tx), rx)
    }
}

impl ListenerSink for ChannelSink {
    fn deliver(&mut self, delivery: Delivery) {
        // A dropped receiver only means nobody is listening any more.
        let _ = self.0.send(delivery);
    }
}
