//! # Shared Types Crate
//!
//! Primitives and the signed backing statements exchanged between the
//! statement distribution subsystem, its peers and the backing collaborator.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: All cross-subsystem types are defined here.
//! - **Exact Round-Trips**: Every type is `serde` serializable and survives
//!   any wire encoding unchanged.

pub mod entities;
pub mod statement;

pub use entities::*;
pub use statement::*;
