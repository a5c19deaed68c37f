//! View tracking: our own interest set and the declared interest of every peer.

use shared_types::Hash;
use std::collections::HashMap;

use super::{PeerId, View};

/// Relay-parents added to and removed from a view by an update.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ViewChange {
    pub added: Vec<Hash>,
    pub removed: Vec<Hash>,
}

impl ViewChange {
    fn between(old: &View, new: &View) -> Self {
        Self {
            added: new.difference(old).copied().collect(),
            removed: old.difference(new).copied().collect(),
        }
    }
}

/// Own view plus the view each connected peer announced in its last
/// neighbor packet.
#[derive(Debug, Default)]
pub struct ViewTracker {
    own: View,
    peers: HashMap<PeerId, View>,
}

impl ViewTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn own_view(&self) -> &View {
        &self.own
    }

    /// Whether `relay_parent` is part of our own view.
    pub fn is_active(&self, relay_parent: &Hash) -> bool {
        self.own.contains(relay_parent)
    }

    /// Replace our own view.
    pub fn set_own_view(&mut self, view: View) -> ViewChange {
        let old = std::mem::replace(&mut self.own, view);
        ViewChange::between(&old, &self.own)
    }

    /// Register a peer with an empty view. A reconnect keeps nothing.
    pub fn peer_connected(&mut self, peer: PeerId) {
        self.peers.insert(peer, View::default());
    }

    /// Forget a peer. Returns the view it had, if it was known.
    pub fn peer_disconnected(&mut self, peer: &PeerId) -> Option<View> {
        self.peers.remove(peer)
    }

    /// Replace a peer's view from a neighbor packet.
    ///
    /// Packets from peers that are not connected change nothing.
    pub fn update_peer_view(&mut self, peer: PeerId, view: View) -> ViewChange {
        match self.peers.get_mut(&peer) {
            Some(current) => {
                let old = std::mem::replace(current, view);
                ViewChange::between(&old, current)
            }
            None => ViewChange::default(),
        }
    }

    pub fn peer_view(&self, peer: &PeerId) -> Option<&View> {
        self.peers.get(peer)
    }

    pub fn is_connected(&self, peer: &PeerId) -> bool {
        self.peers.contains_key(peer)
    }

    /// Peers whose declared view contains `relay_parent`, in stable order.
    pub fn interested_peers(&self, relay_parent: &Hash) -> Vec<PeerId> {
        let mut peers: Vec<PeerId> = self
            .peers
            .iter()
            .filter(|(_, view)| view.contains(relay_parent))
            .map(|(peer, _)| *peer)
            .collect();
        peers.sort();
        peers
    }

    pub fn peer_count(&self) -> usize {
        self.peers.len()
    }

    pub fn clear(&mut self) {
        self.own = View::default();
        self.peers.clear();
    }
}
