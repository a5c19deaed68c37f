//! # Primitives
//!
//! Fixed-size byte types shared by every subsystem.

/// A 32-byte hash (SHA-256).
pub type Hash = [u8; 32];

/// A 64-byte Ed25519 signature.
pub type Signature = [u8; 64];

/// A 32-byte Ed25519 public key.
pub type PublicKey = [u8; 32];
