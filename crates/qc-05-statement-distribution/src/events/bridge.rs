//! Messages driving the subsystem event loop.

use crate::domain::{PeerId, View};
use shared_types::{Hash, SignedStatement};

/// Updates from the network bridge.
#[derive(Clone, Debug)]
pub enum NetworkBridgeEvent {
    PeerConnected(PeerId),
    PeerDisconnected(PeerId),
    /// A peer's view as decoded by the bridge from its neighbor packet.
    PeerViewChange(PeerId, View),
    /// Our own view, pushed by the view-computation collaborator.
    OurViewChange(View),
    /// Raw gossip payload from a peer.
    PeerMessage(PeerId, Vec<u8>),
}

/// Control signals.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Signal {
    /// Stop processing statements for a relay-parent.
    StopWork(Hash),
    /// Shut the subsystem down.
    Conclude,
}

/// Everything the subsystem accepts on its channel.
#[derive(Clone, Debug)]
pub enum DistributionMessage {
    NetworkBridgeUpdate(NetworkBridgeEvent),
    /// Distribute a statement produced by the local backing collaborator.
    Share(Hash, SignedStatement),
    Signal(Signal),
}
