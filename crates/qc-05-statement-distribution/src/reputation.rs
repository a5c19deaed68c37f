//! Reputation signal emitter.
//!
//! Stateless pass-through from rejection and first-acceptance events to the
//! scoring collaborator.

use std::sync::Arc;
use tracing::{debug, warn};

use crate::domain::reputation::BENEFIT_VALID_STATEMENT_FIRST;
use crate::domain::{PeerId, ReputationChange};
use crate::events::DistributionError;
use crate::metrics;
use crate::ports::ReputationReporter;

pub struct ReputationEmitter<R: ReputationReporter> {
    reporter: Arc<R>,
}

impl<R: ReputationReporter> ReputationEmitter<R> {
    pub fn new(reporter: Arc<R>) -> Self {
        Self { reporter }
    }

    /// Report the cost of `error`, if any. Returns whether a report was made.
    pub fn on_rejected(&self, peer: PeerId, error: &DistributionError) -> bool {
        match error.reputation_cost() {
            Some(cost) => {
                warn!(peer = %peer, error = %error, cost = cost.value, "Penalizing peer");
                self.emit(peer, cost);
                true
            }
            None => false,
        }
    }

    /// Reward a peer for a statement that was new to us.
    pub fn on_first_accepted(&self, peer: PeerId) {
        self.emit(peer, BENEFIT_VALID_STATEMENT_FIRST);
    }

    fn emit(&self, peer: PeerId, change: ReputationChange) {
        debug!(peer = %peer, value = change.value, reason = change.reason, "Reputation change");
        metrics::record_reputation_report(change.is_cost());
        self.reporter.report(peer, change);
    }
}
