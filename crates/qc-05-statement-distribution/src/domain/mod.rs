//! # Domain Layer for Statement Distribution
//!
//! Pure protocol logic with no I/O dependencies. This is the innermost layer
//! of the hexagonal architecture.
//!
//! ## Contents
//!
//! - **entities**: `PeerId`, `View`
//! - **view**: own and per-peer interest sets
//! - **candidate**: per-candidate receipt state machine
//! - **table**: accepted statements and the seconded bound
//! - **knowledge**: per-peer knowledge and the flood bound
//! - **context**: per relay-parent ownership of all of the above
//! - **dissemination**: what to send to whom, in which order
//! - **reputation**: cost and benefit values
//! - **invariants**: bound checks
//!
//! ## Design Principles
//!
//! 1. **No I/O**: All functions are pure and synchronous
//! 2. **No Runtime Dependencies**: Only shared-types, serde and hex
//! 3. **Testable**: All logic can be unit tested without mocks

mod candidate;
mod context;
mod dissemination;
mod entities;
mod invariants;
mod knowledge;
pub mod reputation;
mod table;
mod view;

pub use candidate::*;
pub use context::*;
pub use dissemination::*;
pub use entities::*;
pub use invariants::*;
pub use knowledge::*;
pub use reputation::ReputationChange;
pub use table::*;
pub use view::*;
