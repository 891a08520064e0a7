//! Connection registry — the set of live client sockets.
//!
//! Each connection is represented by the sending half of its outbound queue.
//! The socket task owns the receiving half; dropping the sender here (on
//! removal) closes the queue and lets that task shut down.

use std::collections::HashMap;
use std::collections::hash_map::Entry;

use frames::ServerMessage;
use tokio::sync::mpsc;
use uuid::Uuid;

/// Server-generated handle for one connection. Used for log correlation and
/// sender exclusion only; never exposed to clients.
pub type ConnectionId = Uuid;

pub type ClientSender = mpsc::Sender<ServerMessage>;

#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    clients: HashMap<ConnectionId, ClientSender>,
}

impl ConnectionRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a connection. Returns `false` (and keeps the existing entry) if
    /// the id is already registered.
    pub fn add(&mut self, id: ConnectionId, sender: ClientSender) -> bool {
        match self.clients.entry(id) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(sender);
                true
            }
        }
    }

    /// Remove a connection. Removing an absent id is a no-op returning `false`.
    pub fn remove(&mut self, id: &ConnectionId) -> bool {
        self.clients.remove(id).is_some()
    }

    #[must_use]
    pub fn contains(&self, id: &ConnectionId) -> bool {
        self.clients.contains_key(id)
    }

    /// Current connections, for fanout.
    pub fn all(&self) -> impl Iterator<Item = (&ConnectionId, &ClientSender)> {
        self.clients.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.clients.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }
}

#[cfg(test)]
#[path = "registry_test.rs"]
mod tests;
