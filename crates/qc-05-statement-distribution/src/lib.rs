//! # Statement Distribution Subsystem (qc-05)
//!
//! Gossips signed backing statements (`Seconded`, `Valid`, `Invalid`) about
//! parachain candidates to every peer interested in the relay-parent, with
//! memory and bandwidth bounded against equivocating senders.
//!
//! ## Architecture Role
//!
//! ```text
//! [Network Bridge] ──PeerMessage/ViewChange──→ [Statement Distribution (5)]
//!                                                 │         │          │
//!                                 second/statement│   report│      send│
//!                                                 ↓         ↓          ↓
//!                                            [Backing] [Scoring]  [Peers]
//! ```
//!
//! ## Bounds
//!
//! - At most 2 `Seconded` per validator per relay-parent are accepted
//! - At most 4 known candidates per peer per validator are tracked
//! - At most `2 × validators` statements per candidate are taken from a peer
//!
//! Violations are dropped and reported as reputation costs; a dependent
//! statement racing ahead of its `Seconded` is dropped without cost.

pub mod config;
pub mod domain;
pub mod events;
pub mod metrics;
pub mod ports;
pub mod reputation;
pub mod service;
pub mod subsystem;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use config::{ConfigError, DependencyRacePolicy, DistributionConfig};
pub use domain::*;
pub use events::{DistributionError, DistributionResult};
pub use ports::inbound::StatementDistributionApi;
pub use service::{DistributionStats, StatementDistributionService};
pub use subsystem::StatementDistributionSubsystem;
