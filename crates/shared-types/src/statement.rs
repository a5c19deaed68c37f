//! # Backing Statements
//!
//! Signed statements validators gossip about parachain candidates under a
//! relay-parent.
//!
//! ## Variants
//!
//! - `Seconded(receipt)`: the validator proposes the candidate.
//! - `Valid(hash)`: the validator attests the candidate is valid.
//! - `Invalid(hash)`: the validator attests the candidate is invalid.
//!
//! `Valid`/`Invalid` depend on a `Seconded` for the same candidate hash.

use serde::{Deserialize, Serialize};
use serde_with::{serde_as, Bytes};
use sha2::{Digest, Sha256};
use std::fmt;

use crate::entities::{Hash, PublicKey, Signature};

/// Position of a validator in the validator set of a relay-parent.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ValidatorIndex(pub u32);

impl fmt::Display for ValidatorIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A validator's 32-byte session public key.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ValidatorId(pub PublicKey);

/// Hash of a [`CandidateReceipt`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CandidateHash(pub Hash);

impl fmt::Display for CandidateHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.0[..4] {
            write!(f, "{:02x}", byte)?;
        }
        write!(f, "…")
    }
}

/// Description of a parachain block candidate.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateReceipt {
    /// Parachain the candidate belongs to.
    pub para_id: u32,
    /// Collator that produced the candidate.
    pub collator: [u8; 32],
    /// Hash of the proof-of-validity block.
    pub pov_hash: Hash,
    /// Hash of the parachain head produced by the candidate.
    pub head_data_hash: Hash,
}

impl CandidateReceipt {
    /// SHA-256 over the receipt fields in declaration order.
    pub fn hash(&self) -> CandidateHash {
        let mut hasher = Sha256::new();
        hasher.update(self.para_id.to_le_bytes());
        hasher.update(self.collator);
        hasher.update(self.pov_hash);
        hasher.update(self.head_data_hash);
        CandidateHash(hasher.finalize().into())
    }
}

/// Kind of a statement, ordered by data dependency (`Seconded` first).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum StatementKind {
    Seconded,
    Valid,
    Invalid,
}

impl StatementKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StatementKind::Seconded => "seconded",
            StatementKind::Valid => "valid",
            StatementKind::Invalid => "invalid",
        }
    }
}

/// Unsigned statement payload.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Statement {
    Seconded(CandidateReceipt),
    Valid(CandidateHash),
    Invalid(CandidateHash),
}

impl Statement {
    pub fn kind(&self) -> StatementKind {
        match self {
            Statement::Seconded(_) => StatementKind::Seconded,
            Statement::Valid(_) => StatementKind::Valid,
            Statement::Invalid(_) => StatementKind::Invalid,
        }
    }

    /// Hash of the candidate the statement concerns.
    pub fn candidate_hash(&self) -> CandidateHash {
        match self {
            Statement::Seconded(receipt) => receipt.hash(),
            Statement::Valid(hash) | Statement::Invalid(hash) => *hash,
        }
    }
}

/// Compact identity of a signed statement: who said what about which candidate.
///
/// Two signed statements with equal fingerprints carry the same information,
/// so peer knowledge and deduplication are tracked by fingerprint.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StatementFingerprint {
    pub candidate_hash: CandidateHash,
    pub kind: StatementKind,
    pub validator: ValidatorIndex,
}

/// A statement signed by a validator.
#[serde_as]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedStatement {
    pub statement: Statement,
    pub validator_index: ValidatorIndex,
    #[serde_as(as = "Bytes")]
    pub signature: Signature,
}

impl SignedStatement {
    pub fn fingerprint(&self) -> StatementFingerprint {
        StatementFingerprint {
            candidate_hash: self.statement.candidate_hash(),
            kind: self.statement.kind(),
            validator: self.validator_index,
        }
    }

    pub fn candidate_hash(&self) -> CandidateHash {
        self.statement.candidate_hash()
    }

    pub fn kind(&self) -> StatementKind {
        self.statement.kind()
    }

    /// The receipt, if this is a `Seconded` statement.
    pub fn receipt(&self) -> Option<&CandidateReceipt> {
        match &self.statement {
            Statement::Seconded(receipt) => Some(receipt),
            _ => None,
        }
    }

    /// Bytes covered by the signature.
    ///
    /// Binds the statement kind, the candidate hash and the relay-parent so a
    /// signature cannot be replayed under another relay-parent.
    pub fn signing_payload(&self, relay_parent: &Hash) -> Vec<u8> {
        signing_payload(&self.statement, relay_parent)
    }
}

/// Bytes a validator signs for `statement` under `relay_parent`.
pub fn signing_payload(statement: &Statement, relay_parent: &Hash) -> Vec<u8> {
    let tag: u8 = match statement.kind() {
        StatementKind::Seconded => 1,
        StatementKind::Valid => 2,
        StatementKind::Invalid => 3,
    };
    let mut payload = Vec::with_capacity(1 + 32 + 32);
    payload.push(tag);
    payload.extend_from_slice(&statement.candidate_hash().0);
    payload.extend_from_slice(relay_parent);
    payload
}
