//! # Core Domain Entities
//!
//! - [`PeerId`]: 32-byte peer identifier for P2P communication
//! - [`View`]: set of relay-parents a node wants statements for

use serde::{Deserialize, Serialize};
use shared_types::Hash;
use std::collections::HashSet;
use std::fmt;

/// Peer identifier for P2P network communication.
///
/// A 32-byte identifier derived from the peer's public key. Used for
/// routing sends and keying per-peer knowledge and reputation.
///
/// # Example
///
/// ```rust
/// use qc_05_statement_distribution::PeerId;
///
/// let peer = PeerId::new([0xAB; 32]);
/// let peer_from_bytes = PeerId::from_bytes(&[0xAB; 32]).unwrap();
/// assert_eq!(peer, peer_from_bytes);
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PeerId(pub [u8; 32]);

impl PeerId {
    /// Creates a new peer ID from a 32-byte array.
    pub fn new(id: [u8; 32]) -> Self {
        Self(id)
    }

    /// Creates a peer ID from a byte slice.
    ///
    /// Returns `None` if the slice is shorter than 32 bytes.
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        if bytes.len() >= 32 {
            let mut id = [0u8; 32];
            id.copy_from_slice(&bytes[..32]);
            Some(Self(id))
        } else {
            None
        }
    }
}

impl fmt::Debug for PeerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PeerId({})", hex::encode(&self.0[..6]))
    }
}

impl fmt::Display for PeerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(&self.0[..6]))
    }
}

/// Short hex rendering of a relay-parent hash for log fields.
pub fn short_hash(hash: &Hash) -> String {
    hex::encode(&hash[..6])
}

/// The set of relay-parents a node currently wants data for.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct View(HashSet<Hash>);

impl View {
    pub fn new<I: IntoIterator<Item = Hash>>(heads: I) -> Self {
        Self(heads.into_iter().collect())
    }

    pub fn contains(&self, relay_parent: &Hash) -> bool {
        self.0.contains(relay_parent)
    }

    /// Heads in `self` that are not in `other`.
    pub fn difference<'a>(&'a self, other: &'a View) -> impl Iterator<Item = &'a Hash> + 'a {
        self.0.difference(&other.0)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Hash> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<Hash> for View {
    fn from_iter<I: IntoIterator<Item = Hash>>(iter: I) -> Self {
        Self::new(iter)
    }
}
