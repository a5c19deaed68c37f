//! Reputation changes reported to the peer-scoring collaborator.
//!
//! Negative values are costs, positive values are benefits. The scoring
//! collaborator decides on disconnects; this subsystem only reports.

/// A change to a peer's reputation with a human-readable reason.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ReputationChange {
    pub value: i32,
    pub reason: &'static str,
}

impl ReputationChange {
    pub const fn new(value: i32, reason: &'static str) -> Self {
        Self { value, reason }
    }

    pub fn is_cost(&self) -> bool {
        self.value < 0
    }
}

pub const COST_SIGNATURE_INVALID: ReputationChange =
    ReputationChange::new(-100, "Statement signature invalid");
pub const COST_VALIDATOR_INDEX_INVALID: ReputationChange =
    ReputationChange::new(-100, "Statement validator index invalid");
pub const COST_MESSAGE_NOT_DECODABLE: ReputationChange =
    ReputationChange::new(-100, "Statement gossip message not decodable");
pub const COST_EQUIVOCATION: ReputationChange =
    ReputationChange::new(-200, "Validator exceeded seconded statement bound");
pub const COST_KNOWLEDGE_BOUND: ReputationChange =
    ReputationChange::new(-300, "Too many candidates from one validator");
pub const COST_APPARENT_FLOOD: ReputationChange =
    ReputationChange::new(-500, "Peer appears to be flooding statements");
pub const BENEFIT_VALID_STATEMENT_FIRST: ReputationChange =
    ReputationChange::new(15, "Valid statement with new information");
