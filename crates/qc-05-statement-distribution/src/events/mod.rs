//! Events and error types for Statement Distribution subsystem.

use crate::domain::reputation::{
    ReputationChange, COST_APPARENT_FLOOD, COST_EQUIVOCATION, COST_KNOWLEDGE_BOUND,
    COST_MESSAGE_NOT_DECODABLE, COST_SIGNATURE_INVALID, COST_VALIDATOR_INDEX_INVALID,
};
use crate::domain::{KnowledgeRejection, PeerId, TableRejection};
use shared_types::{CandidateHash, Hash, ValidatorIndex};
use thiserror::Error;

pub mod bridge;
pub mod wire;

pub use bridge::*;
pub use wire::*;

/// Why a single inbound statement or message was not accepted.
///
/// None of these stop the subsystem.
#[derive(Debug, Error)]
pub enum DistributionError {
    #[error("Invalid statement signature from validator {0}")]
    SignatureInvalid(ValidatorIndex),

    #[error("Dependency not met for candidate {candidate} (retained: {retained})")]
    DependencyNotMet {
        candidate: CandidateHash,
        retained: bool,
    },

    #[error("Validator {validator} exceeded the seconded bound")]
    EquivocationBoundExceeded {
        validator: ValidatorIndex,
        already_reported: bool,
    },

    #[error("Known candidate bound exceeded for validator {validator}")]
    KnowledgeBoundExceeded { validator: ValidatorIndex },

    #[error("Flood bound exceeded for candidate {candidate}: {count} statements (max: {limit})")]
    FloodBoundExceeded {
        candidate: CandidateHash,
        count: usize,
        limit: usize,
    },

    #[error("Unknown relay-parent: {}", hex::encode(.0))]
    UnknownRelayParent(Hash),

    #[error("Validator index out of range: {0}")]
    ValidatorIndexInvalid(u32),

    #[error("Message not decodable: {0}")]
    MessageNotDecodable(#[from] WireError),

    #[error("Work stopped for relay-parent")]
    Stopped,

    #[error("Peer {0} is not connected")]
    PeerNotConnected(PeerId),
}

impl DistributionError {
    /// Reputation cost for the sender, if the error is the sender's fault.
    pub fn reputation_cost(&self) -> Option<ReputationChange> {
        match self {
            Self::SignatureInvalid(_) => Some(COST_SIGNATURE_INVALID),
            Self::ValidatorIndexInvalid(_) => Some(COST_VALIDATOR_INDEX_INVALID),
            Self::MessageNotDecodable(_) => Some(COST_MESSAGE_NOT_DECODABLE),
            Self::EquivocationBoundExceeded {
                already_reported: false,
                ..
            } => Some(COST_EQUIVOCATION),
            Self::KnowledgeBoundExceeded { .. } => Some(COST_KNOWLEDGE_BOUND),
            Self::FloodBoundExceeded { .. } => Some(COST_APPARENT_FLOOD),
            Self::EquivocationBoundExceeded { .. }
            | Self::DependencyNotMet { .. }
            | Self::UnknownRelayParent(_)
            | Self::Stopped
            | Self::PeerNotConnected(_) => None,
        }
    }

    /// Short stable label for metrics.
    pub fn label(&self) -> &'static str {
        match self {
            Self::SignatureInvalid(_) => "signature_invalid",
            Self::DependencyNotMet { .. } => "dependency_not_met",
            Self::EquivocationBoundExceeded { .. } => "equivocation_bound",
            Self::KnowledgeBoundExceeded { .. } => "knowledge_bound",
            Self::FloodBoundExceeded { .. } => "flood_bound",
            Self::UnknownRelayParent(_) => "unknown_relay_parent",
            Self::ValidatorIndexInvalid(_) => "validator_index_invalid",
            Self::MessageNotDecodable(_) => "not_decodable",
            Self::Stopped => "stopped",
            Self::PeerNotConnected(_) => "peer_not_connected",
        }
    }
}

impl From<KnowledgeRejection> for DistributionError {
    fn from(rejection: KnowledgeRejection) -> Self {
        match rejection {
            KnowledgeRejection::KnowledgeBoundExceeded { validator } => {
                Self::KnowledgeBoundExceeded { validator }
            }
            KnowledgeRejection::FloodBoundExceeded {
                candidate,
                count,
                limit,
            } => Self::FloodBoundExceeded {
                candidate,
                count,
                limit,
            },
        }
    }
}

impl From<TableRejection> for DistributionError {
    fn from(rejection: TableRejection) -> Self {
        match rejection {
            TableRejection::EquivocationBoundExceeded {
                validator,
                already_reported,
            } => Self::EquivocationBoundExceeded {
                validator,
                already_reported,
            },
            TableRejection::DependencyNotMet { candidate } => Self::DependencyNotMet {
                candidate,
                retained: false,
            },
        }
    }
}

pub type DistributionResult<T> = Result<T, DistributionError>;
