//! # Relay-Parent Context
//!
//! Everything held for one active relay-parent: the statement table, the
//! candidate state machines, per-peer knowledge and the retained buffer.
//! Dropping the context releases all of it.

use shared_types::{CandidateHash, Hash, SignedStatement, ValidatorId, ValidatorIndex};
use std::collections::HashMap;

use super::{CandidateStates, KnowledgeLimits, PeerId, PeerKnowledge, StatementTable};

/// Lifecycle of a context.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ContextPhase {
    Active,
    /// A stop-work signal arrived; inbound statements are dropped silently.
    Stopped,
    /// Removed from the view. Any holder of a stale handle must drop.
    TornDown,
}

/// Bounds a context is created with.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ContextLimits {
    pub max_seconded: usize,
    pub max_known_candidates: usize,
    pub flood_multiplier: usize,
    pub max_retained: usize,
}

/// State for one relay-parent in our view.
#[derive(Debug)]
pub struct RelayParentContext {
    relay_parent: Hash,
    validators: Vec<ValidatorId>,
    limits: ContextLimits,
    phase: ContextPhase,
    pub table: StatementTable,
    pub candidates: CandidateStates,
    peers: HashMap<PeerId, PeerKnowledge>,
    retained: HashMap<CandidateHash, Vec<(PeerId, SignedStatement)>>,
    retained_len: usize,
}

impl RelayParentContext {
    pub fn new(relay_parent: Hash, validators: Vec<ValidatorId>, limits: ContextLimits) -> Self {
        Self {
            relay_parent,
            validators,
            limits,
            phase: ContextPhase::Active,
            table: StatementTable::new(limits.max_seconded),
            candidates: CandidateStates::new(),
            peers: HashMap::new(),
            retained: HashMap::new(),
            retained_len: 0,
        }
    }

    pub fn relay_parent(&self) -> &Hash {
        &self.relay_parent
    }

    pub fn phase(&self) -> ContextPhase {
        self.phase
    }

    pub fn validator(&self, index: ValidatorIndex) -> Option<&ValidatorId> {
        self.validators.get(index.0 as usize)
    }

    pub fn validator_count(&self) -> usize {
        self.validators.len()
    }

    /// Per-candidate flood bound: scales with the validator set size.
    pub fn flood_limit(&self) -> usize {
        self.limits.flood_multiplier.saturating_mul(self.validators.len())
    }

    pub fn knowledge_limits(&self) -> KnowledgeLimits {
        KnowledgeLimits {
            max_known_candidates: self.limits.max_known_candidates,
            flood_limit: self.flood_limit(),
        }
    }

    pub fn knowledge(&self, peer: &PeerId) -> Option<&PeerKnowledge> {
        self.peers.get(peer)
    }

    /// Knowledge of `peer`, created empty on first interaction.
    pub fn knowledge_mut(&mut self, peer: PeerId) -> &mut PeerKnowledge {
        let limits = self.knowledge_limits();
        self.peers
            .entry(peer)
            .or_insert_with(|| PeerKnowledge::new(limits))
    }

    /// The table alongside one peer's knowledge, borrowed together.
    pub fn table_and_knowledge(&mut self, peer: PeerId) -> (&StatementTable, &mut PeerKnowledge) {
        let limits = self.knowledge_limits();
        let knowledge = self
            .peers
            .entry(peer)
            .or_insert_with(|| PeerKnowledge::new(limits));
        (&self.table, knowledge)
    }

    pub fn peers(&self) -> impl Iterator<Item = (&PeerId, &PeerKnowledge)> {
        self.peers.iter()
    }

    /// Drop everything known about `peer` here.
    pub fn forget_peer(&mut self, peer: &PeerId) -> bool {
        self.peers.remove(peer).is_some()
    }

    /// Apply a stop-work signal. Held statements stay readable for catch-up.
    pub fn stop(&mut self) {
        if self.phase == ContextPhase::Active {
            self.phase = ContextPhase::Stopped;
        }
        self.candidates.stop();
        self.clear_retained();
    }

    /// Release every entry owned by this context.
    pub fn tear_down(&mut self) {
        self.phase = ContextPhase::TornDown;
        self.candidates.clear();
        self.table.clear();
        self.peers.clear();
        self.clear_retained();
    }

    /// Buffer a statement that lost the race with its `Seconded`.
    ///
    /// Returns `false` when the buffer is full and the statement was dropped.
    pub fn retain(&mut self, peer: PeerId, statement: SignedStatement) -> bool {
        if self.retained_len >= self.limits.max_retained {
            return false;
        }
        let entry = self.retained.entry(statement.candidate_hash()).or_default();
        if entry
            .iter()
            .any(|(_, held)| held.fingerprint() == statement.fingerprint())
        {
            return true;
        }
        entry.push((peer, statement));
        self.retained_len += 1;
        true
    }

    /// Take the statements retained for `candidate`, in arrival order.
    pub fn take_retained(&mut self, candidate: &CandidateHash) -> Vec<(PeerId, SignedStatement)> {
        let taken = self.retained.remove(candidate).unwrap_or_default();
        self.retained_len -= taken.len();
        taken
    }

    pub fn retained_len(&self) -> usize {
        self.retained_len
    }

    fn clear_retained(&mut self) {
        self.retained.clear();
        self.retained_len = 0;
    }
}
