//! # Exploit Simulations
//!
//! Misbehaving validators and peers trying to grow our memory or bandwidth
//! without bound.

pub mod equivocation;
pub mod flooding;
