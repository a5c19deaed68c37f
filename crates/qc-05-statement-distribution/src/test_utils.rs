//! Test doubles for the outbound ports and statement builders.
//!
//! Signatures here are a keyed SHA-256 stand-in: good enough to tell a
//! statement signed by the right validator for the right relay-parent from
//! anything else, not a real signature scheme.

use parking_lot::{Mutex, RwLock};
use sha2::{Digest, Sha256};
use shared_types::{
    CandidateHash, CandidateReceipt, Hash, Signature, SignedStatement, Statement, ValidatorId,
    ValidatorIndex,
};
use std::collections::HashMap;
use std::sync::Arc;

use crate::config::DistributionConfig;
use crate::domain::{PeerId, ReputationChange};
use crate::events::WireMessage;
use crate::ports::inbound::StatementDistributionApi;
use crate::ports::outbound::{
    BackingGateway, PeerNetwork, ReputationReporter, StatementVerifier, ValidatorSetProvider,
};
use crate::service::StatementDistributionService;

/// Install a test-writer subscriber honouring `RUST_LOG`. Safe to call repeatedly.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn peer(n: u8) -> PeerId {
    PeerId::new([n; 32])
}

pub fn validator_key(index: u32) -> ValidatorId {
    let mut hasher = Sha256::new();
    hasher.update(b"validator");
    hasher.update(index.to_le_bytes());
    ValidatorId(hasher.finalize().into())
}

pub fn validator_set(size: u32) -> Vec<ValidatorId> {
    (0..size).map(validator_key).collect()
}

pub fn fake_sign(key: &ValidatorId, payload: &[u8]) -> Signature {
    let first: [u8; 32] = Sha256::new()
        .chain_update(key.0)
        .chain_update(payload)
        .finalize()
        .into();
    let second: [u8; 32] = Sha256::digest(first).into();
    let mut signature = [0u8; 64];
    signature[..32].copy_from_slice(&first);
    signature[32..].copy_from_slice(&second);
    signature
}

pub fn receipt(para_id: u32) -> CandidateReceipt {
    CandidateReceipt {
        para_id,
        collator: [0xC0; 32],
        pov_hash: Sha256::digest(para_id.to_le_bytes()).into(),
        head_data_hash: [0u8; 32],
    }
}

/// Sign `statement` as validator `validator` under `relay_parent`.
pub fn sign_statement(relay_parent: &Hash, statement: Statement, validator: u32) -> SignedStatement {
    let signature = fake_sign(
        &validator_key(validator),
        &shared_types::signing_payload(&statement, relay_parent),
    );
    SignedStatement {
        statement,
        validator_index: ValidatorIndex(validator),
        signature,
    }
}

pub fn seconded(relay_parent: &Hash, validator: u32, para_id: u32) -> SignedStatement {
    sign_statement(relay_parent, Statement::Seconded(receipt(para_id)), validator)
}

pub fn valid(relay_parent: &Hash, validator: u32, candidate: CandidateHash) -> SignedStatement {
    sign_statement(relay_parent, Statement::Valid(candidate), validator)
}

pub fn invalid(relay_parent: &Hash, validator: u32, candidate: CandidateHash) -> SignedStatement {
    sign_statement(relay_parent, Statement::Invalid(candidate), validator)
}

/// Accepts signatures produced by [`fake_sign`].
#[derive(Default)]
pub struct KeyedVerifier;

impl StatementVerifier for KeyedVerifier {
    fn verify(&self, relay_parent: &Hash, statement: &SignedStatement, signer: &ValidatorId) -> bool {
        fake_sign(signer, &statement.signing_payload(relay_parent)) == statement.signature
    }
}

/// Records every send, decoded.
#[derive(Default)]
pub struct RecordingNetwork {
    sent: Mutex<Vec<(Vec<PeerId>, WireMessage)>>,
}

impl RecordingNetwork {
    pub fn sent(&self) -> Vec<(Vec<PeerId>, WireMessage)> {
        self.sent.lock().clone()
    }

    /// Statements sent to `peer`, in send order.
    pub fn statements_to(&self, peer: &PeerId) -> Vec<SignedStatement> {
        self.sent
            .lock()
            .iter()
            .filter(|(peers, _)| peers.contains(peer))
            .filter_map(|(_, message)| match message {
                WireMessage::Statement(msg) => Some(msg.statement.clone()),
                WireMessage::Neighbor(_) => None,
            })
            .collect()
    }

    pub fn clear(&self) {
        self.sent.lock().clear();
    }
}

impl PeerNetwork for RecordingNetwork {
    fn send(&self, peers: Vec<PeerId>, payload: Vec<u8>) {
        if let Ok(message) = WireMessage::decode(&payload) {
            self.sent.lock().push((peers, message));
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BackingCall {
    Candidate(Hash, CandidateReceipt),
    Statement(Hash, SignedStatement),
}

#[derive(Default)]
pub struct RecordingBacking {
    calls: Mutex<Vec<BackingCall>>,
}

impl RecordingBacking {
    pub fn calls(&self) -> Vec<BackingCall> {
        self.calls.lock().clone()
    }
}

impl BackingGateway for RecordingBacking {
    fn second_candidate(&self, relay_parent: Hash, candidate: CandidateReceipt) {
        self.calls
            .lock()
            .push(BackingCall::Candidate(relay_parent, candidate));
    }

    fn statement(&self, relay_parent: Hash, statement: SignedStatement) {
        self.calls
            .lock()
            .push(BackingCall::Statement(relay_parent, statement));
    }
}

#[derive(Default)]
pub struct RecordingReputation {
    reports: Mutex<Vec<(PeerId, ReputationChange)>>,
}

impl RecordingReputation {
    pub fn reports(&self) -> Vec<(PeerId, ReputationChange)> {
        self.reports.lock().clone()
    }

    pub fn reports_for(&self, peer: &PeerId) -> Vec<ReputationChange> {
        self.reports
            .lock()
            .iter()
            .filter(|(p, _)| p == peer)
            .map(|(_, change)| *change)
            .collect()
    }

    /// How many times `change` was reported, to any peer.
    pub fn count(&self, change: ReputationChange) -> usize {
        self.reports
            .lock()
            .iter()
            .filter(|(_, c)| *c == change)
            .count()
    }
}

impl ReputationReporter for RecordingReputation {
    fn report(&self, peer: PeerId, change: ReputationChange) {
        self.reports.lock().push((peer, change));
    }
}

/// Same validator set for every relay-parent unless overridden.
pub struct StaticValidatorSets {
    default: Vec<ValidatorId>,
    overrides: RwLock<HashMap<Hash, Option<Vec<ValidatorId>>>>,
}

impl StaticValidatorSets {
    pub fn new(default: Vec<ValidatorId>) -> Self {
        Self {
            default,
            overrides: RwLock::new(HashMap::new()),
        }
    }

    pub fn insert(&self, relay_parent: Hash, validators: Vec<ValidatorId>) {
        self.overrides.write().insert(relay_parent, Some(validators));
    }

    /// Make `relay_parent` have no known validator set.
    pub fn remove(&self, relay_parent: &Hash) {
        self.overrides.write().insert(*relay_parent, None);
    }
}

impl ValidatorSetProvider for StaticValidatorSets {
    fn validators(&self, relay_parent: &Hash) -> Option<Vec<ValidatorId>> {
        match self.overrides.read().get(relay_parent) {
            Some(set) => set.clone(),
            None => Some(self.default.clone()),
        }
    }
}

pub type TestService = StatementDistributionService<
    RecordingNetwork,
    RecordingBacking,
    RecordingReputation,
    KeyedVerifier,
    StaticValidatorSets,
>;

/// A service wired to recording doubles.
///
/// Every [`peer`] starts out connected with an empty view.
pub struct TestHarness {
    pub service: Arc<TestService>,
    pub network: Arc<RecordingNetwork>,
    pub backing: Arc<RecordingBacking>,
    pub reputation: Arc<RecordingReputation>,
    pub validator_sets: Arc<StaticValidatorSets>,
}

impl TestHarness {
    pub fn new(config: DistributionConfig, validators: u32) -> Self {
        let network = Arc::new(RecordingNetwork::default());
        let backing = Arc::new(RecordingBacking::default());
        let reputation = Arc::new(RecordingReputation::default());
        let validator_sets = Arc::new(StaticValidatorSets::new(validator_set(validators)));
        let service = Arc::new(StatementDistributionService::new(
            config,
            network.clone(),
            backing.clone(),
            reputation.clone(),
            Arc::new(KeyedVerifier),
            validator_sets.clone(),
        ));
        for n in 0..=u8::MAX {
            service.peer_connected(peer(n));
        }
        Self {
            service,
            network,
            backing,
            reputation,
            validator_sets,
        }
    }
}
