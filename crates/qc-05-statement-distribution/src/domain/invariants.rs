//! Bound invariants for a relay-parent context.
//!
//! The service checks these in debug builds after every mutation, and the
//! property tests check them after arbitrary input sequences.

use super::RelayParentContext;
use shared_types::{CandidateHash, ValidatorIndex};

/// A bound that no longer holds.
#[derive(Debug, PartialEq, Eq)]
pub enum InvariantViolation {
    SecondedBound {
        validator: ValidatorIndex,
        count: usize,
    },
    KnownCandidateBound {
        validator: ValidatorIndex,
        count: usize,
    },
    /// `candidate` is `None` for the unanchored budget.
    FloodBound {
        candidate: Option<CandidateHash>,
        count: usize,
    },
}

/// No validator has more accepted `Seconded` than the table allows.
pub fn invariant_seconded_bound(ctx: &RelayParentContext) -> Result<(), InvariantViolation> {
    let max = ctx.table.max_seconded();
    match ctx
        .table
        .validators_with_seconded()
        .find(|(_, count)| *count > max)
    {
        Some((validator, count)) => Err(InvariantViolation::SecondedBound {
            validator: *validator,
            count,
        }),
        None => Ok(()),
    }
}

/// No peer tracks more candidates per validator than its cap.
pub fn invariant_known_candidate_bound(ctx: &RelayParentContext) -> Result<(), InvariantViolation> {
    for (_, knowledge) in ctx.peers() {
        let max = knowledge.limits().max_known_candidates;
        if let Some((validator, known)) = knowledge
            .known_candidates()
            .find(|(_, known)| known.len() > max)
        {
            return Err(InvariantViolation::KnownCandidateBound {
                validator: *validator,
                count: known.len(),
            });
        }
    }
    Ok(())
}

/// No peer has had more statements counted, per candidate or unanchored,
/// than the flood bound.
pub fn invariant_flood_bound(ctx: &RelayParentContext) -> Result<(), InvariantViolation> {
    for (_, knowledge) in ctx.peers() {
        let max = knowledge.limits().flood_limit;
        if let Some((candidate, count)) = knowledge.received_counts().find(|(_, n)| *n > max) {
            return Err(InvariantViolation::FloodBound {
                candidate: Some(*candidate),
                count,
            });
        }
        if knowledge.unanchored_received() > max {
            return Err(InvariantViolation::FloodBound {
                candidate: None,
                count: knowledge.unanchored_received(),
            });
        }
    }
    Ok(())
}

/// Check all invariants for a context.
pub fn check_context_invariants(ctx: &RelayParentContext) -> Result<(), InvariantViolation> {
    invariant_seconded_bound(ctx)?;
    invariant_known_candidate_bound(ctx)?;
    invariant_flood_bound(ctx)?;
    Ok(())
}
