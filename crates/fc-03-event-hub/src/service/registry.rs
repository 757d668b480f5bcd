//! # Listener Registry
//!
//! Registrations keyed by [`ListenerHandle`], plus the per-kind presence
//! flags that let dispatch skip passes nobody listens to.

use crate::domain::{EventListener, ListenerHandle, ListenerKind};
use crate::ports::ListenerSink;
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::sync::Arc;

pub(crate) type SharedSink = Arc<Mutex<Box<dyn ListenerSink>>>;

pub(crate) struct Registration {
    pub listener: EventListener,
    pub sink: SharedSink,
}

#[derive(Default)]
pub(crate) struct ListenerRegistry {
    next_id: u64,
    entries: BTreeMap<ListenerHandle, Registration>,
    has_block: bool,
    has_tx: bool,
    has_chaincode: bool,
}

impl ListenerRegistry {
    pub fn insert(&mut self, listener: EventListener, sink: Box<dyn ListenerSink>) -> ListenerHandle {
        self.next_id += 1;
        let handle = ListenerHandle(self.next_id);
        self.set_flag(listener.kind());
        self.entries.insert(
            handle,
            Registration {
                listener,
                sink: Arc::new(Mutex::new(sink)),
            },
        );
        handle
    }

    /// Remove one registration and rescan the presence flags.
    pub fn remove(&mut self, handle: ListenerHandle) -> Option<Registration> {
        let removed = self.entries.remove(&handle);
        if removed.is_some() {
            self.recompute_flags();
        }
        removed
    }

    pub fn remove_all(&mut self, handles: &[ListenerHandle]) {
        if handles.is_empty() {
            return;
        }
        for handle in handles {
            self.entries.remove(handle);
        }
        self.recompute_flags();
    }

    /// Take every registration, leaving the registry empty.
    pub fn drain(&mut self) -> Vec<Registration> {
        self.has_block = false;
        self.has_tx = false;
        self.has_chaincode = false;
        std::mem::take(&mut self.entries).into_values().collect()
    }

    #[must_use]
    pub fn has(&self, kind: ListenerKind) -> bool {
        match kind {
            ListenerKind::Block => self.has_block,
            ListenerKind::Tx => self.has_tx,
            ListenerKind::Chaincode => self.has_chaincode,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn contains(&self, handle: ListenerHandle) -> bool {
        self.entries.contains_key(&handle)
    }

    /// Registrations of `kind`, in registration order.
    pub fn of_kind(
        &self,
        kind: ListenerKind,
    ) -> impl Iterator<Item = (ListenerHandle, &Registration)> + '_ {
        self.entries
            .iter()
            .filter(move |(_, r)| r.listener.kind() == kind)
            .map(|(h, r)| (*h, r))
    }

    pub fn iter(&self) -> impl Iterator<Item = (ListenerHandle, &Registration)> + '_ {
        self.entries.iter().map(|(h, r)| (*h, r))
    }

    fn set_flag(&mut self, kind: ListenerKind) {
        match kind {
            ListenerKind::Block => self.has_block = true,
            ListenerKind::Tx => self.has_tx = true,
            ListenerKind::Chaincode => self.has_chaincode = true,
        }
    }

    fn recompute_flags(&mut self) {
        self.has_block = false;
        self.has_tx = false;
        self.has_chaincode = false;
        let kinds: Vec<_> = self.entries.values().map(|r| r.listener.kind()).collect();
        for kind in kinds {
            self.set_flag(kind);
        }
    }
}
