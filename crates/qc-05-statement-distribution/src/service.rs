//! # Statement Distribution Service
//!
//! Gossips signed backing statements to every interested peer while keeping
//! memory and bandwidth bounded against equivocating senders.
//!
//! ## Architecture
//!
//! This service implements the inbound port [`StatementDistributionApi`]
//! and depends on five outbound ports (implemented by adapters in the node):
//! - [`PeerNetwork`]: fire-and-forget sends
//! - [`BackingGateway`]: hand-off of accepted statements
//! - [`ReputationReporter`]: cost/benefit reports
//! - [`StatementVerifier`]: signature checks
//! - [`ValidatorSetProvider`]: validator sets per relay-parent
//!
//! ## Inbound Statement Pipeline
//!
//! 1. Relay-parent lookup (unknown: silent drop)
//! 2. Validator index check
//! 3. Peer knowledge bounds (known-candidate cap, flood counter)
//! 4. Signature verification
//! 5. Candidate state machine admission
//! 6. Statement table (seconded bound)
//! 7. Backing hand-off, reputation benefit, dissemination
//!
//! ## Thread Safety
//!
//! Each relay-parent context sits behind its own `Mutex`, so statements for
//! one relay-parent are serialized while different relay-parents proceed in
//! parallel. The context map and the view tracker are `RwLock`s that are
//! never held while waiting for a context lock.

use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, instrument, trace, warn};

use crate::config::{DependencyRacePolicy, DistributionConfig};
use crate::domain::{
    catch_up, check_context_invariants, disseminate, short_hash, Acceptance, Admission,
    ContextLimits, ContextPhase, Delivery, PeerId, Receipt, RelayParentContext, StatementTable,
    View, ViewTracker,
};
use crate::events::{
    DistributionError, DistributionResult, NeighborPacket, StatementMessage, WireMessage,
};
use crate::metrics;
use crate::ports::inbound::StatementDistributionApi;
use crate::ports::outbound::{
    BackingGateway, PeerNetwork, ReputationReporter, StatementVerifier, ValidatorSetProvider,
};
use crate::reputation::ReputationEmitter;
use shared_types::{Hash, SignedStatement, StatementKind};

/// In-process counters, independent of the `metrics` feature.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DistributionStats {
    pub statements_accepted: u64,
    pub duplicates: u64,
    pub statements_rejected: u64,
    pub statements_retained: u64,
    pub statements_sent: u64,
    pub active_relay_parents: usize,
}

type ContextHandle = Arc<Mutex<RelayParentContext>>;

/// Statement Distribution Service.
pub struct StatementDistributionService<N, B, R, V, S>
where
    N: PeerNetwork,
    B: BackingGateway,
    R: ReputationReporter,
    V: StatementVerifier,
    S: ValidatorSetProvider,
{
    config: DistributionConfig,
    limits: ContextLimits,
    views: RwLock<ViewTracker>,
    contexts: RwLock<HashMap<Hash, ContextHandle>>,
    network: Arc<N>,
    backing: Arc<B>,
    reputation: ReputationEmitter<R>,
    verifier: Arc<V>,
    validator_sets: Arc<S>,
    stats: RwLock<DistributionStats>,
}

impl<N, B, R, V, S> StatementDistributionService<N, B, R, V, S>
where
    N: PeerNetwork,
    B: BackingGateway,
    R: ReputationReporter,
    V: StatementVerifier,
    S: ValidatorSetProvider,
{
    pub fn new(
        config: DistributionConfig,
        network: Arc<N>,
        backing: Arc<B>,
        reputation: Arc<R>,
        verifier: Arc<V>,
        validator_sets: Arc<S>,
    ) -> Self {
        Self {
            limits: config.context_limits(),
            config,
            views: RwLock::new(ViewTracker::new()),
            contexts: RwLock::new(HashMap::new()),
            network,
            backing,
            reputation: ReputationEmitter::new(reputation),
            verifier,
            validator_sets,
            stats: RwLock::new(DistributionStats::default()),
        }
    }

    pub fn config(&self) -> &DistributionConfig {
        &self.config
    }

    /// Our current view.
    pub fn own_view(&self) -> View {
        self.views.read().own_view().clone()
    }

    /// Whether a context is live for `relay_parent`.
    pub fn has_context(&self, relay_parent: &Hash) -> bool {
        self.contexts.read().contains_key(relay_parent)
    }

    /// Run `f` against the live context for `relay_parent`, if any.
    pub fn inspect_context<T>(
        &self,
        relay_parent: &Hash,
        f: impl FnOnce(&RelayParentContext) -> T,
    ) -> Option<T> {
        let handle = self.existing_context(relay_parent)?;
        let ctx = handle.lock();
        Some(f(&ctx))
    }

    /// Accepted statements for `relay_parent`, candidate by candidate.
    pub fn statements(&self, relay_parent: &Hash) -> Vec<SignedStatement> {
        self.inspect_context(relay_parent, |ctx| collect_statements(&ctx.table))
            .unwrap_or_default()
    }

    fn existing_context(&self, relay_parent: &Hash) -> Option<ContextHandle> {
        self.contexts.read().get(relay_parent).cloned()
    }

    /// Look up or lazily create the context for `relay_parent`.
    fn context(&self, relay_parent: &Hash) -> DistributionResult<ContextHandle> {
        let existing = self.existing_context(relay_parent);
        if let Some(handle) = existing {
            return Ok(handle);
        }

        // Holding the view lock keeps a concurrent view change from
        // tearing down before the context is registered.
        let views = self.views.read();
        if !views.is_active(relay_parent) {
            return Err(DistributionError::UnknownRelayParent(*relay_parent));
        }
        let validators = self
            .validator_sets
            .validators(relay_parent)
            .ok_or(DistributionError::UnknownRelayParent(*relay_parent))?;

        let mut contexts = self.contexts.write();
        let handle = contexts
            .entry(*relay_parent)
            .or_insert_with(|| {
                info!(
                    relay_parent = %short_hash(relay_parent),
                    validators = validators.len(),
                    "Created relay-parent context"
                );
                Arc::new(Mutex::new(RelayParentContext::new(
                    *relay_parent,
                    validators,
                    self.limits,
                )))
            })
            .clone();
        metrics::set_active_relay_parents(contexts.len());
        drop(views);
        Ok(handle)
    }

    fn check_phase(ctx: &RelayParentContext) -> DistributionResult<()> {
        match ctx.phase() {
            ContextPhase::Active => Ok(()),
            ContextPhase::Stopped => Err(DistributionError::Stopped),
            ContextPhase::TornDown => Err(DistributionError::UnknownRelayParent(*ctx.relay_parent())),
        }
    }

    fn process_inbound(
        &self,
        peer: PeerId,
        relay_parent: Hash,
        statement: SignedStatement,
    ) -> DistributionResult<()> {
        let handle = self.context(&relay_parent)?;
        let mut ctx = handle.lock();
        Self::check_phase(&ctx)?;

        // The peer may have disconnected while this message was in flight.
        if !self.views.read().is_connected(&peer) {
            return Err(DistributionError::PeerNotConnected(peer));
        }

        let index = statement.validator_index;
        let signer = *ctx
            .validator(index)
            .ok_or(DistributionError::ValidatorIndexInvalid(index.0))?;

        // Dependents of candidates we hold no `Seconded` for are only
        // counted against the peer's unanchored budget.
        let fingerprint = statement.fingerprint();
        let anchored = fingerprint.kind == StatementKind::Seconded
            || ctx.table.candidate(&fingerprint.candidate_hash).is_some();

        if anchored {
            match ctx.knowledge_mut(peer).check_can_receive(&fingerprint)? {
                Receipt::AlreadyKnown => {
                    trace!(candidate = %fingerprint.candidate_hash, "Peer resent known statement");
                    return Ok(());
                }
                Receipt::New => {}
            }
        } else {
            ctx.knowledge_mut(peer)
                .check_can_receive_unanchored(&fingerprint)?;
        }

        if !self.verifier.verify(&relay_parent, &statement, &signer) {
            return Err(DistributionError::SignatureInvalid(index));
        }

        if anchored {
            ctx.knowledge_mut(peer).note_received(fingerprint);
        } else {
            ctx.knowledge_mut(peer).note_received_unanchored();
        }
        self.import(&mut ctx, Some(peer), statement)
    }

    /// Import a retained statement now that its candidate is active.
    ///
    /// Knowledge is recorded only if the sender is still connected.
    fn replay_retained(
        &self,
        ctx: &mut RelayParentContext,
        peer: PeerId,
        statement: SignedStatement,
    ) -> DistributionResult<()> {
        if self.views.read().is_connected(&peer) {
            let fingerprint = statement.fingerprint();
            if ctx.knowledge_mut(peer).check_can_receive(&fingerprint)? == Receipt::New {
                ctx.knowledge_mut(peer).note_received(fingerprint);
            }
        }
        self.import(ctx, Some(peer), statement)
    }

    fn process_local(&self, relay_parent: Hash, statement: SignedStatement) -> DistributionResult<()> {
        let handle = self.context(&relay_parent)?;
        let mut ctx = handle.lock();
        Self::check_phase(&ctx)?;

        let index = statement.validator_index;
        if ctx.validator(index).is_none() {
            return Err(DistributionError::ValidatorIndexInvalid(index.0));
        }
        self.import(&mut ctx, None, statement)
    }

    /// Run a verified statement through the state machine and the table.
    ///
    /// `origin` is `None` for locally produced statements.
    fn import(
        &self,
        ctx: &mut RelayParentContext,
        origin: Option<PeerId>,
        statement: SignedStatement,
    ) -> DistributionResult<()> {
        let fingerprint = statement.fingerprint();

        match ctx.candidates.admit(fingerprint.kind, &fingerprint.candidate_hash) {
            Admission::Admit => {}
            Admission::Drop => return Err(DistributionError::Stopped),
            Admission::DependencyNotMet => {
                let retained = match (self.config.dependency_race_policy, origin) {
                    (DependencyRacePolicy::Retain, Some(peer)) => ctx.retain(peer, statement),
                    _ => false,
                };
                if retained {
                    self.stats.write().statements_retained += 1;
                }
                return Err(DistributionError::DependencyNotMet {
                    candidate: fingerprint.candidate_hash,
                    retained,
                });
            }
        }

        match ctx.table.try_accept(statement.clone())? {
            Acceptance::Duplicate => {
                debug!(candidate = %fingerprint.candidate_hash, "Duplicate statement");
                self.stats.write().duplicates += 1;
                Ok(())
            }
            Acceptance::New => {
                self.on_accepted(ctx, origin, statement);
                Ok(())
            }
        }
    }

    fn on_accepted(
        &self,
        ctx: &mut RelayParentContext,
        origin: Option<PeerId>,
        statement: SignedStatement,
    ) {
        let relay_parent = *ctx.relay_parent();
        let fingerprint = statement.fingerprint();
        let activated = fingerprint.kind == StatementKind::Seconded
            && ctx.candidates.on_seconded_accepted(fingerprint.candidate_hash);

        debug!(
            relay_parent = %short_hash(&relay_parent),
            candidate = %fingerprint.candidate_hash,
            validator = %fingerprint.validator,
            kind = fingerprint.kind.as_str(),
            "Accepted statement"
        );
        self.stats.write().statements_accepted += 1;
        metrics::record_statement_accepted(fingerprint.kind.as_str());

        if let Some(peer) = origin {
            match statement.receipt() {
                Some(receipt) if activated => {
                    self.backing.second_candidate(relay_parent, receipt.clone())
                }
                _ => self.backing.statement(relay_parent, statement.clone()),
            }
            self.reputation.on_first_accepted(peer);
        }

        let interested = self.views.read().interested_peers(&relay_parent);
        let deliveries = disseminate(ctx, &interested, &fingerprint);
        self.send_deliveries(&relay_parent, deliveries);

        debug_assert_eq!(check_context_invariants(ctx), Ok(()));

        if activated {
            for (peer, held) in ctx.take_retained(&fingerprint.candidate_hash) {
                trace!(peer = %peer, validator = %held.validator_index, "Replaying retained statement");
                if let Err(error) = self.replay_retained(ctx, peer, held) {
                    self.on_error(Some(peer), &error);
                }
            }
        }
    }

    /// Encode and enqueue deliveries, batching peers that get the same
    /// statements.
    fn send_deliveries(&self, relay_parent: &Hash, deliveries: Vec<Delivery>) {
        let mut batches: Vec<(Vec<SignedStatement>, Vec<PeerId>)> = Vec::new();
        for delivery in deliveries {
            match batches
                .iter_mut()
                .find(|(statements, _)| *statements == delivery.statements)
            {
                Some((_, peers)) => peers.push(delivery.peer),
                None => batches.push((delivery.statements, vec![delivery.peer])),
            }
        }

        let mut sent = 0u64;
        for (statements, peers) in batches {
            for statement in statements {
                let message = WireMessage::Statement(StatementMessage {
                    relay_parent: *relay_parent,
                    statement,
                });
                match message.encode() {
                    Ok(payload) => {
                        sent += peers.len() as u64;
                        self.network.send(peers.clone(), payload);
                    }
                    Err(error) => warn!(error = %error, "Failed to encode statement"),
                }
            }
        }

        if sent > 0 {
            trace!(relay_parent = %short_hash(relay_parent), sent, "Sent statements");
            self.stats.write().statements_sent += sent;
            metrics::record_statements_sent(sent);
        }
    }

    fn on_error(&self, peer: Option<PeerId>, error: &DistributionError) {
        self.stats.write().statements_rejected += 1;
        metrics::record_statement_rejected(error.label());
        let reported = match peer {
            Some(peer) => self.reputation.on_rejected(peer, error),
            None => false,
        };
        if !reported {
            debug!(error = %error, "Dropped statement");
        }
    }

    fn tear_down(&self, relay_parents: &[Hash]) {
        let removed: Vec<(Hash, ContextHandle)> = {
            let mut contexts = self.contexts.write();
            let removed = relay_parents
                .iter()
                .filter_map(|rp| contexts.remove(rp).map(|handle| (*rp, handle)))
                .collect();
            metrics::set_active_relay_parents(contexts.len());
            removed
        };

        for (relay_parent, handle) in removed {
            handle.lock().tear_down();
            info!(relay_parent = %short_hash(&relay_parent), "Tore down relay-parent context");
        }
    }
}

fn collect_statements(table: &StatementTable) -> Vec<SignedStatement> {
    table
        .candidates()
        .flat_map(|(_, entry)| entry.statements().iter().cloned())
        .collect()
}

impl<N, B, R, V, S> StatementDistributionApi for StatementDistributionService<N, B, R, V, S>
where
    N: PeerNetwork,
    B: BackingGateway,
    R: ReputationReporter,
    V: StatementVerifier,
    S: ValidatorSetProvider,
{
    fn set_own_view(&self, view: View) {
        let change = self.views.write().set_own_view(view);
        debug!(
            added = change.added.len(),
            removed = change.removed.len(),
            "Own view changed"
        );
        self.tear_down(&change.removed);
    }

    fn peer_connected(&self, peer: PeerId) {
        debug!(peer = %peer, "Peer connected");
        self.views.write().peer_connected(peer);
    }

    fn peer_disconnected(&self, peer: PeerId) {
        debug!(peer = %peer, "Peer disconnected");
        self.views.write().peer_disconnected(&peer);
        let handles: Vec<ContextHandle> = self.contexts.read().values().cloned().collect();
        for handle in handles {
            handle.lock().forget_peer(&peer);
        }
    }

    #[instrument(skip_all, fields(peer = %peer))]
    fn handle_neighbor_packet(&self, peer: PeerId, packet: NeighborPacket) {
        let view: View = packet.relay_parents.into_iter().collect();
        let change = self.views.write().update_peer_view(peer, view);

        for relay_parent in &change.removed {
            if let Some(handle) = self.existing_context(relay_parent) {
                handle.lock().forget_peer(&peer);
            }
        }

        for relay_parent in &change.added {
            let Some(handle) = self.existing_context(relay_parent) else {
                continue;
            };
            let mut ctx = handle.lock();
            if ctx.phase() != ContextPhase::Active {
                continue;
            }
            if let Some(delivery) = catch_up(&mut ctx, peer) {
                debug!(
                    relay_parent = %short_hash(relay_parent),
                    statements = delivery.statements.len(),
                    "Catching up peer"
                );
                self.send_deliveries(relay_parent, vec![delivery]);
            }
        }
    }

    fn handle_peer_message(&self, peer: PeerId, payload: &[u8]) -> DistributionResult<()> {
        let message = match WireMessage::decode(payload) {
            Ok(message) => message,
            Err(error) => {
                let error = DistributionError::from(error);
                self.on_error(Some(peer), &error);
                return Err(error);
            }
        };

        match message {
            WireMessage::Neighbor(packet) => {
                self.handle_neighbor_packet(peer, packet);
                Ok(())
            }
            WireMessage::Statement(StatementMessage {
                relay_parent,
                statement,
            }) => self.handle_statement(peer, relay_parent, statement),
        }
    }

    #[instrument(skip_all, fields(
        peer = %peer,
        relay_parent = %short_hash(&relay_parent),
        validator = %statement.validator_index,
        kind = statement.kind().as_str(),
    ))]
    fn handle_statement(
        &self,
        peer: PeerId,
        relay_parent: Hash,
        statement: SignedStatement,
    ) -> DistributionResult<()> {
        let result = self.process_inbound(peer, relay_parent, statement);
        if let Err(error) = &result {
            self.on_error(Some(peer), error);
        }
        result
    }

    #[instrument(skip_all, fields(relay_parent = %short_hash(&relay_parent)))]
    fn share_statement(
        &self,
        relay_parent: Hash,
        statement: SignedStatement,
    ) -> DistributionResult<()> {
        let result = self.process_local(relay_parent, statement);
        if let Err(error) = &result {
            self.on_error(None, error);
        }
        result
    }

    fn stop_work(&self, relay_parent: Hash) {
        match self.context(&relay_parent) {
            Ok(handle) => {
                handle.lock().stop();
                info!(relay_parent = %short_hash(&relay_parent), "Stopped work for relay-parent");
            }
            Err(error) => debug!(error = %error, "Stop work for inactive relay-parent"),
        }
    }

    fn conclude(&self) {
        let all: Vec<Hash> = self.contexts.read().keys().copied().collect();
        self.tear_down(&all);
        self.views.write().clear();
        info!("Statement distribution concluded");
    }

    fn stats(&self) -> DistributionStats {
        let mut stats = self.stats.read().clone();
        stats.active_relay_parents = self.contexts.read().len();
        stats
    }
}
