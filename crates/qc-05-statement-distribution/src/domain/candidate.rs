//! Candidate receipt state machine.
//!
//! ```text
//! [Initial] ──Seconded accepted──→ [Active] ──stop work──→ [Stopped]
//! ```
//!
//! - `Initial`: only `Seconded` is admitted. Anything else is a dependency
//!   violation and is dropped without penalty.
//! - `Active`: every statement for the candidate is admitted.
//! - `Stopped`: everything is dropped silently until the relay-parent is
//!   torn down.
//!
//! A candidate without an entry is in `Initial`. Entries are created on the
//! first accepted `Seconded` and live as long as the owning relay-parent
//! context.

use shared_types::{CandidateHash, StatementKind};
use std::collections::HashMap;

/// Phase of a candidate within its relay-parent.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CandidatePhase {
    Initial,
    Active,
    Stopped,
}

/// What to do with a statement given the candidate's phase.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Admission {
    Admit,
    DependencyNotMet,
    Drop,
}

/// Phase of every candidate seen under one relay-parent.
#[derive(Debug, Default)]
pub struct CandidateStates {
    phases: HashMap<CandidateHash, CandidatePhase>,
    stopped: bool,
}

impl CandidateStates {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self, candidate: &CandidateHash) -> CandidatePhase {
        if self.stopped {
            return CandidatePhase::Stopped;
        }
        self.phases
            .get(candidate)
            .copied()
            .unwrap_or(CandidatePhase::Initial)
    }

    /// Decide whether a statement of `kind` about `candidate` may proceed.
    pub fn admit(&self, kind: StatementKind, candidate: &CandidateHash) -> Admission {
        match (self.phase(candidate), kind) {
            (CandidatePhase::Stopped, _) => Admission::Drop,
            (CandidatePhase::Initial, StatementKind::Seconded) => Admission::Admit,
            (CandidatePhase::Initial, _) => Admission::DependencyNotMet,
            (CandidatePhase::Active, _) => Admission::Admit,
        }
    }

    /// Record an accepted `Seconded`.
    ///
    /// Returns `true` on the `Initial → Active` transition, i.e. when the
    /// candidate itself is new to the backing collaborator.
    pub fn on_seconded_accepted(&mut self, candidate: CandidateHash) -> bool {
        if self.stopped {
            return false;
        }
        let phase = self
            .phases
            .entry(candidate)
            .or_insert(CandidatePhase::Initial);
        if *phase == CandidatePhase::Initial {
            *phase = CandidatePhase::Active;
            true
        } else {
            false
        }
    }

    /// Move every candidate, including ones not seen yet, to `Stopped`.
    pub fn stop(&mut self) {
        self.stopped = true;
        for phase in self.phases.values_mut() {
            *phase = CandidatePhase::Stopped;
        }
    }

    /// Release every entry. The states stay stopped.
    pub fn clear(&mut self) {
        self.stopped = true;
        self.phases.clear();
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped
    }

    /// Number of candidates that left `Initial`.
    pub fn len(&self) -> usize {
        self.phases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.phases.is_empty()
    }
}
