//! Client registry
//!
//! Maps usernames to the sink used to reach that client. The registry is
//! owned by the `ChatServer` actor, so every operation runs inside the
//! actor's command loop and none of them can interleave.

use std::collections::HashMap;

use crate::client::ClientSink;

/// Username → outbound sink
///
/// At most one entry per username. Adding a username that is already
/// present replaces its sink.
#[derive(Debug, Default)]
pub struct Registry {
    clients: HashMap<String, ClientSink>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the sink for `username`
    ///
    /// Returns the sink that was replaced, if any.
    pub fn add(&mut self, username: String, sink: ClientSink) -> Option<ClientSink> {
        self.clients.insert(username, sink)
    }

    /// Remove `username`. Absent names are ignored.
    pub fn remove(&mut self, username: &str) -> Option<ClientSink> {
        self.clients.remove(username)
    }

    pub fn lookup(&self, username: &str) -> Option<&ClientSink> {
        self.clients.get(username)
    }

    /// Point-in-time copy of every entry
    ///
    /// The copy is detached from the registry: later `add`/`remove` calls
    /// do not affect it.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            entries: self
                .clients
                .iter()
                .map(|(name, sink)| (name.clone(), sink.clone()))
                .collect(),
        }
    }

    pub fn client_count(&self) -> usize {
        self.clients.len()
    }
}

/// Immutable view of the registry taken by [`Registry::snapshot`]
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    entries: Vec<(String, ClientSink)>,
}

impl Snapshot {
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ClientSink)> {
        self.entries.iter().map(|(name, sink)| (name.as_str(), sink))
    }

    pub fn usernames(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }
}
