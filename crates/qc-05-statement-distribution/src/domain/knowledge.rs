//! # Peer Knowledge
//!
//! What one peer is known to know about one relay-parent, from both
//! directions: statements we sent it and statements it sent us.
//!
//! ## Bounds
//!
//! - Known candidates: per validator, at most `max_known_candidates`
//!   distinct candidate hashes, counted over sent and received together.
//! - Flood: per candidate, at most `flood_limit` distinct statements
//!   received from the peer.
//! - Unanchored: `Valid`/`Invalid` for candidates we hold no `Seconded` for
//!   are not tracked one by one. They share a single per-peer budget of
//!   `flood_limit`.
//!
//! Knowledge is dropped wholesale when the relay-parent leaves the peer's
//! view or the peer disconnects.

use shared_types::{CandidateHash, StatementFingerprint, StatementKind, ValidatorIndex};
use std::collections::{HashMap, HashSet};

/// Bounds applied to every peer under one relay-parent.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct KnowledgeLimits {
    pub max_known_candidates: usize,
    pub flood_limit: usize,
}

/// Outcome of [`PeerKnowledge::check_can_receive`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Receipt {
    /// Information the peer has not exchanged with us before.
    New,
    /// The peer already knows this statement. Receiving it again is a no-op.
    AlreadyKnown,
}

/// Why a statement from a peer violates its knowledge bounds.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KnowledgeRejection {
    KnowledgeBoundExceeded {
        validator: ValidatorIndex,
    },
    FloodBoundExceeded {
        candidate: CandidateHash,
        count: usize,
        limit: usize,
    },
}

/// Knowledge of a single peer at a single relay-parent.
#[derive(Debug)]
pub struct PeerKnowledge {
    limits: KnowledgeLimits,
    known_candidates: HashMap<ValidatorIndex, Vec<CandidateHash>>,
    /// Candidates for which the peer knows at least one `Seconded`.
    candidates: HashSet<CandidateHash>,
    known_statements: HashSet<StatementFingerprint>,
    received_counts: HashMap<CandidateHash, usize>,
    unanchored_received: usize,
}

impl PeerKnowledge {
    pub fn new(limits: KnowledgeLimits) -> Self {
        Self {
            limits,
            known_candidates: HashMap::new(),
            candidates: HashSet::new(),
            known_statements: HashSet::new(),
            received_counts: HashMap::new(),
            unanchored_received: 0,
        }
    }

    pub fn limits(&self) -> KnowledgeLimits {
        self.limits
    }

    pub fn knows(&self, fingerprint: &StatementFingerprint) -> bool {
        self.known_statements.contains(fingerprint)
    }

    /// Whether the peer knows some `Seconded` for `candidate`.
    pub fn knows_candidate(&self, candidate: &CandidateHash) -> bool {
        self.candidates.contains(candidate)
    }

    fn validator_knows(&self, validator: &ValidatorIndex, candidate: &CandidateHash) -> bool {
        self.known_candidates
            .get(validator)
            .map_or(false, |known| known.contains(candidate))
    }

    fn validator_has_room(&self, validator: &ValidatorIndex) -> bool {
        self.known_candidates
            .get(validator)
            .map_or(0, Vec::len)
            < self.limits.max_known_candidates
    }

    /// Whether sending `fingerprint` would be new to the peer and within
    /// every bound.
    ///
    /// A dependent statement is only sendable once the peer knows its
    /// candidate; the caller sends the `Seconded` first.
    pub fn can_send(&self, fingerprint: &StatementFingerprint) -> bool {
        if self.knows(fingerprint) {
            return false;
        }
        match fingerprint.kind {
            StatementKind::Seconded => {
                self.validator_knows(&fingerprint.validator, &fingerprint.candidate_hash)
                    || self.validator_has_room(&fingerprint.validator)
            }
            StatementKind::Valid | StatementKind::Invalid => {
                self.knows_candidate(&fingerprint.candidate_hash)
            }
        }
    }

    /// Record that we sent `fingerprint` to the peer.
    pub fn note_sent(&mut self, fingerprint: StatementFingerprint) {
        self.note_known(fingerprint);
    }

    /// Check a statement arriving from the peer against its bounds without
    /// recording anything.
    pub fn check_can_receive(
        &self,
        fingerprint: &StatementFingerprint,
    ) -> Result<Receipt, KnowledgeRejection> {
        if self.knows(fingerprint) {
            return Ok(Receipt::AlreadyKnown);
        }

        if fingerprint.kind == StatementKind::Seconded
            && !self.validator_knows(&fingerprint.validator, &fingerprint.candidate_hash)
            && !self.validator_has_room(&fingerprint.validator)
        {
            return Err(KnowledgeRejection::KnowledgeBoundExceeded {
                validator: fingerprint.validator,
            });
        }

        let count = self.received_count(&fingerprint.candidate_hash);
        if count >= self.limits.flood_limit {
            return Err(KnowledgeRejection::FloodBoundExceeded {
                candidate: fingerprint.candidate_hash,
                count: count + 1,
                limit: self.limits.flood_limit,
            });
        }

        Ok(Receipt::New)
    }

    /// Record a statement received from the peer.
    ///
    /// Counts towards the flood bound even when the statement is later
    /// dropped for a missing dependency.
    pub fn note_received(&mut self, fingerprint: StatementFingerprint) {
        if self.knows(&fingerprint) {
            return;
        }
        *self
            .received_counts
            .entry(fingerprint.candidate_hash)
            .or_insert(0) += 1;
        self.note_known(fingerprint);
    }

    fn note_known(&mut self, fingerprint: StatementFingerprint) {
        if !self.known_statements.insert(fingerprint) {
            return;
        }
        if fingerprint.kind == StatementKind::Seconded {
            let known = self.known_candidates.entry(fingerprint.validator).or_default();
            if !known.contains(&fingerprint.candidate_hash) {
                known.push(fingerprint.candidate_hash);
            }
            self.candidates.insert(fingerprint.candidate_hash);
        }
    }

    /// Check a dependent statement whose candidate has no accepted
    /// `Seconded` yet. Nothing is recorded per statement.
    pub fn check_can_receive_unanchored(
        &self,
        fingerprint: &StatementFingerprint,
    ) -> Result<(), KnowledgeRejection> {
        if self.unanchored_received >= self.limits.flood_limit {
            return Err(KnowledgeRejection::FloodBoundExceeded {
                candidate: fingerprint.candidate_hash,
                count: self.unanchored_received + 1,
                limit: self.limits.flood_limit,
            });
        }
        Ok(())
    }

    pub fn note_received_unanchored(&mut self) {
        self.unanchored_received += 1;
    }

    pub fn unanchored_received(&self) -> usize {
        self.unanchored_received
    }

    pub fn received_count(&self, candidate: &CandidateHash) -> usize {
        self.received_counts.get(candidate).copied().unwrap_or(0)
    }

    pub fn known_candidates_for(&self, validator: &ValidatorIndex) -> &[CandidateHash] {
        self.known_candidates
            .get(validator)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn known_candidates(&self) -> impl Iterator<Item = (&ValidatorIndex, &[CandidateHash])> {
        self.known_candidates
            .iter()
            .map(|(v, c)| (v, c.as_slice()))
    }

    pub fn received_counts(&self) -> impl Iterator<Item = (&CandidateHash, usize)> {
        self.received_counts.iter().map(|(c, n)| (c, *n))
    }

    pub fn known_statement_count(&self) -> usize {
        self.known_statements.len()
    }
}
