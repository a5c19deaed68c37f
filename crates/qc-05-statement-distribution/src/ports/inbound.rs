//! Inbound ports (API) for Statement Distribution subsystem.

use crate::domain::{PeerId, View};
use crate::events::{DistributionResult, NeighborPacket};
use crate::service::DistributionStats;
use shared_types::{Hash, SignedStatement};

/// Primary API for statement distribution.
///
/// Per-message failures are returned for observability only; the caller
/// keeps going regardless.
pub trait StatementDistributionApi: Send + Sync {
    /// Replace our own view. Contexts for removed relay-parents are torn down.
    fn set_own_view(&self, view: View);

    fn peer_connected(&self, peer: PeerId);

    /// Forget the peer's view and all knowledge about it.
    fn peer_disconnected(&self, peer: PeerId);

    /// Apply a peer's neighbor packet and catch it up on added relay-parents.
    fn handle_neighbor_packet(&self, peer: PeerId, packet: NeighborPacket);

    /// Decode and dispatch a raw gossip payload.
    fn handle_peer_message(&self, peer: PeerId, payload: &[u8]) -> DistributionResult<()>;

    /// Process a statement received from `peer`.
    fn handle_statement(
        &self,
        peer: PeerId,
        relay_parent: Hash,
        statement: SignedStatement,
    ) -> DistributionResult<()>;

    /// Distribute a statement produced locally.
    fn share_statement(&self, relay_parent: Hash, statement: SignedStatement)
        -> DistributionResult<()>;

    /// Stop processing statements for `relay_parent`.
    fn stop_work(&self, relay_parent: Hash);

    /// Drop all state.
    fn conclude(&self);

    fn stats(&self) -> DistributionStats;
}
