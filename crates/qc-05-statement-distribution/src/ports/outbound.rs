//! Outbound ports (SPI) for Statement Distribution subsystem.
//!
//! Every call is a fire-and-forget enqueue; none of them may block.

use crate::domain::{PeerId, ReputationChange};
use shared_types::{CandidateReceipt, Hash, SignedStatement, ValidatorId};

/// Transport collaborator.
pub trait PeerNetwork: Send + Sync {
    /// Enqueue `payload` for every peer in `peers`.
    fn send(&self, peers: Vec<PeerId>, payload: Vec<u8>);
}

/// Backing collaborator that acts on accepted statements.
pub trait BackingGateway: Send + Sync {
    /// First accepted `Seconded` for a candidate.
    fn second_candidate(&self, relay_parent: Hash, candidate: CandidateReceipt);

    /// Every further statement accepted while the candidate is active.
    fn statement(&self, relay_parent: Hash, statement: SignedStatement);
}

/// Peer scoring collaborator. Decides on disconnects, this subsystem only reports.
pub trait ReputationReporter: Send + Sync {
    fn report(&self, peer: PeerId, change: ReputationChange);
}

/// Signature verification primitive.
pub trait StatementVerifier: Send + Sync {
    /// Whether `statement` carries a valid signature by `signer` over its
    /// signing payload under `relay_parent`.
    fn verify(&self, relay_parent: &Hash, statement: &SignedStatement, signer: &ValidatorId)
        -> bool;
}

/// Source of validator sets per relay-parent.
pub trait ValidatorSetProvider: Send + Sync {
    /// Validators at `relay_parent` in index order, if known.
    fn validators(&self, relay_parent: &Hash) -> Option<Vec<ValidatorId>>;
}
