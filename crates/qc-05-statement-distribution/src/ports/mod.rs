//! Ports module for Statement Distribution subsystem

pub mod inbound;
pub mod outbound;

pub use inbound::StatementDistributionApi;
pub use outbound::{
    BackingGateway, PeerNetwork, ReputationReporter, StatementVerifier, ValidatorSetProvider,
};
