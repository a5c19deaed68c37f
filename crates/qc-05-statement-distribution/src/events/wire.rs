//! Gossip wire messages for Statement Distribution.
//!
//! Payloads are `bincode` over the serde derives, prefixed with a single
//! protocol version byte.

use serde::{Deserialize, Serialize};
use shared_types::{Hash, SignedStatement};
use thiserror::Error;

/// Protocol version carried as the first byte of every payload.
pub const WIRE_VERSION: u8 = 1;

/// Announces the sender's current view.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NeighborPacket {
    pub relay_parents: Vec<Hash>,
}

/// A signed statement scoped to a relay-parent.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatementMessage {
    pub relay_parent: Hash,
    pub statement: SignedStatement,
}

/// Statement distribution gossip message.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum WireMessage {
    Neighbor(NeighborPacket),
    Statement(StatementMessage),
}

/// Codec failures.
#[derive(Debug, Error)]
pub enum WireError {
    #[error("Empty payload")]
    Empty,

    #[error("Unsupported wire version: {0}")]
    UnsupportedVersion(u8),

    #[error("Serialization error: {0}")]
    Codec(#[from] bincode::Error),
}

impl WireMessage {
    pub fn encode(&self) -> Result<Vec<u8>, WireError> {
        let body = bincode::serialize(self)?;
        let mut bytes = Vec::with_capacity(1 + body.len());
        bytes.push(WIRE_VERSION);
        bytes.extend_from_slice(&body);
        Ok(bytes)
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, WireError> {
        let (version, body) = bytes.split_first().ok_or(WireError::Empty)?;
        if *version != WIRE_VERSION {
            return Err(WireError::UnsupportedVersion(*version));
        }
        Ok(bincode::deserialize(body)?)
    }
}
