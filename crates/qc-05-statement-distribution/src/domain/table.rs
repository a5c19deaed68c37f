//! # Statement Table
//!
//! Authoritative record of the statements accepted under one relay-parent.
//!
//! ## Equivocation Bound
//!
//! A validator may have at most `max_seconded` distinct `Seconded`
//! statements accepted per relay-parent. Further ones are rejected and not
//! stored; the validator is flagged for a report the first time only.
//!
//! `Valid`/`Invalid` are accepted only for candidates with an accepted
//! `Seconded`, so the table holds a finite number of statements per
//! validator.

use shared_types::{
    CandidateHash, CandidateReceipt, SignedStatement, StatementFingerprint, StatementKind,
    ValidatorIndex,
};
use std::collections::{HashMap, HashSet};

/// Result of a successful [`StatementTable::try_accept`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Acceptance {
    /// First time this statement was seen.
    New,
    /// Already recorded; nothing changed.
    Duplicate,
}

/// Why the table refused a statement.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TableRejection {
    EquivocationBoundExceeded {
        validator: ValidatorIndex,
        /// The validator had already been flagged at this relay-parent.
        already_reported: bool,
    },
    DependencyNotMet {
        candidate: CandidateHash,
    },
}

/// Everything accepted about one candidate.
#[derive(Clone, Debug)]
pub struct CandidateEntry {
    receipt: CandidateReceipt,
    /// `Seconded` statements first, then dependents, each in acceptance order.
    statements: Vec<SignedStatement>,
    fingerprints: HashSet<StatementFingerprint>,
}

impl CandidateEntry {
    fn new(receipt: CandidateReceipt) -> Self {
        Self {
            receipt,
            statements: Vec::new(),
            fingerprints: HashSet::new(),
        }
    }

    pub fn receipt(&self) -> &CandidateReceipt {
        &self.receipt
    }

    /// Statements in dependency order.
    pub fn statements(&self) -> &[SignedStatement] {
        &self.statements
    }

    fn insert(&mut self, statement: SignedStatement) -> Acceptance {
        if !self.fingerprints.insert(statement.fingerprint()) {
            return Acceptance::Duplicate;
        }
        if statement.kind() == StatementKind::Seconded {
            let at = self
                .statements
                .iter()
                .position(|s| s.kind() != StatementKind::Seconded)
                .unwrap_or(self.statements.len());
            self.statements.insert(at, statement);
        } else {
            self.statements.push(statement);
        }
        Acceptance::New
    }
}

/// Statements accepted under one relay-parent.
#[derive(Debug)]
pub struct StatementTable {
    max_seconded: usize,
    candidates: HashMap<CandidateHash, CandidateEntry>,
    /// Candidate acceptance order, for deterministic catch-up.
    order: Vec<CandidateHash>,
    seconded_by: HashMap<ValidatorIndex, Vec<CandidateHash>>,
    equivocators: HashSet<ValidatorIndex>,
}

impl StatementTable {
    pub fn new(max_seconded: usize) -> Self {
        Self {
            max_seconded,
            candidates: HashMap::new(),
            order: Vec::new(),
            seconded_by: HashMap::new(),
            equivocators: HashSet::new(),
        }
    }

    /// Record `statement` if the bounds and dependencies allow it.
    pub fn try_accept(&mut self, statement: SignedStatement) -> Result<Acceptance, TableRejection> {
        let candidate = statement.candidate_hash();
        let validator = statement.validator_index;

        match &statement.statement {
            shared_types::Statement::Seconded(receipt) => {
                let seconded = self.seconded_by.entry(validator).or_default();
                if !seconded.contains(&candidate) {
                    if seconded.len() >= self.max_seconded {
                        let first = self.equivocators.insert(validator);
                        return Err(TableRejection::EquivocationBoundExceeded {
                            validator,
                            already_reported: !first,
                        });
                    }
                    seconded.push(candidate);
                }

                let entry = match self.candidates.get_mut(&candidate) {
                    Some(entry) => entry,
                    None => {
                        self.order.push(candidate);
                        self.candidates
                            .entry(candidate)
                            .or_insert_with(|| CandidateEntry::new(receipt.clone()))
                    }
                };
                Ok(entry.insert(statement))
            }
            shared_types::Statement::Valid(_) | shared_types::Statement::Invalid(_) => {
                match self.candidates.get_mut(&candidate) {
                    Some(entry) => Ok(entry.insert(statement)),
                    None => Err(TableRejection::DependencyNotMet { candidate }),
                }
            }
        }
    }

    pub fn contains(&self, fingerprint: &StatementFingerprint) -> bool {
        self.candidates
            .get(&fingerprint.candidate_hash)
            .map_or(false, |entry| entry.fingerprints.contains(fingerprint))
    }

    /// Look up a recorded statement by fingerprint.
    pub fn get(&self, fingerprint: &StatementFingerprint) -> Option<&SignedStatement> {
        self.candidates
            .get(&fingerprint.candidate_hash)?
            .statements
            .iter()
            .find(|s| s.fingerprint() == *fingerprint)
    }

    pub fn candidate(&self, candidate: &CandidateHash) -> Option<&CandidateEntry> {
        self.candidates.get(candidate)
    }

    /// Candidates in the order their first `Seconded` was accepted.
    pub fn candidates(&self) -> impl Iterator<Item = (&CandidateHash, &CandidateEntry)> {
        self.order
            .iter()
            .filter_map(move |hash| self.candidates.get(hash).map(|entry| (hash, entry)))
    }

    /// Number of distinct candidates `validator` has seconded here.
    pub fn seconded_count(&self, validator: &ValidatorIndex) -> usize {
        self.seconded_by.get(validator).map_or(0, Vec::len)
    }

    pub fn max_seconded(&self) -> usize {
        self.max_seconded
    }

    /// Validators flagged for exceeding the seconded bound.
    pub fn equivocators(&self) -> impl Iterator<Item = &ValidatorIndex> {
        self.equivocators.iter()
    }

    pub fn validators_with_seconded(&self) -> impl Iterator<Item = (&ValidatorIndex, usize)> {
        self.seconded_by.iter().map(|(v, c)| (v, c.len()))
    }

    /// Total statements recorded.
    pub fn len(&self) -> usize {
        self.candidates.values().map(|e| e.statements.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    pub fn clear(&mut self) {
        self.candidates.clear();
        self.order.clear();
        self.seconded_by.clear();
        self.equivocators.clear();
    }
}
