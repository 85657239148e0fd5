use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

pub mod constants;

use constants::GENESIS_POSITION;

#[derive(Debug, thiserror::Error)]
pub enum ChainError {
    #[error("payload could not be serialized: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("timestamp could not be formatted: {0}")]
    Timestamp(#[from] time::error::Format),
    #[error("candidate does not link to the chain tip")]
    LinkageMismatch,
    #[error("stored hash does not match recomputed digest")]
    HashMismatch,
    #[error("expected position {expected}, found {found}")]
    PositionMismatch { expected: u64, found: u64 },
}

/// One book-checkout event. Field order is the canonical serialization
/// order; verification re-serializes and must reproduce identical bytes.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CheckoutRecord {
    pub book_id: String,
    pub user: String,
    pub checkout_date: String,
    pub is_genesis: bool,
}

impl CheckoutRecord {
    /// The synthetic payload carried by the chain's first block.
    pub fn genesis() -> Self {
        Self {
            is_genesis: true,
            ..Self::default()
        }
    }

    pub fn canonical_bytes(&self) -> Result<Vec<u8>, ChainError> {
        Ok(serde_json::to_vec(self)?)
    }
}

/// A single link in the checkout ledger. Sealed at construction; no field
/// is written after the hash is computed.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct HashBlock {
    pub position: u64,
    pub payload: CheckoutRecord,
    pub timestamp: String,
    pub hash: String,
    pub previous_hash: String,
}

impl HashBlock {
    /// The chain's first block: position 0, empty previous hash.
    pub fn genesis() -> Result<Self, ChainError> {
        Self::sealed(GENESIS_POSITION, String::new(), CheckoutRecord::genesis())
    }

    /// Build the successor of `prev` carrying `payload`. Does not touch `prev`.
    pub fn next(prev: &HashBlock, payload: CheckoutRecord) -> Result<Self, ChainError> {
        Self::sealed(prev.position + 1, prev.hash.clone(), payload)
    }

    fn sealed(
        position: u64,
        previous_hash: String,
        payload: CheckoutRecord,
    ) -> Result<Self, ChainError> {
        let timestamp = OffsetDateTime::now_utc().format(&Rfc3339)?;
        let hash = digest(
            position,
            &timestamp,
            &payload.canonical_bytes()?,
            &previous_hash,
        );
        Ok(Self {
            position,
            payload,
            timestamp,
            hash,
            previous_hash,
        })
    }

    /// Recompute the digest from the stored fields and compare it to
    /// `claimed`. Computes into a local value; the stored hash is never
    /// reassigned.
    pub fn verify(&self, claimed: &str) -> Result<bool, ChainError> {
        let recomputed = digest(
            self.position,
            &self.timestamp,
            &self.payload.canonical_bytes()?,
            &self.previous_hash,
        );
        Ok(recomputed == claimed)
    }
}

/// SHA-256 over the order-sensitive concatenation of the block fields,
/// as lowercase hex. Position is encoded as fixed-width little-endian
/// bytes, never as text.
pub fn digest(position: u64, timestamp: &str, payload: &[u8], previous_hash: &str) -> String {
    let mut bytes =
        Vec::with_capacity(8 + timestamp.len() + payload.len() + previous_hash.len());
    bytes.extend_from_slice(&position.to_le_bytes());
    bytes.extend_from_slice(timestamp.as_bytes());
    bytes.extend_from_slice(payload);
    bytes.extend_from_slice(previous_hash.as_bytes());

    let mut hasher = Sha256::new();
    hasher.update(&bytes);
    hex::encode(hasher.finalize())
}

pub mod chain {
    use super::*;
    use tracing::warn;

    /// Append-only sequence of hash-linked blocks. Always holds at least
    /// the genesis block; blocks are owned privately and handed out
    /// read-only.
    #[derive(Debug)]
    pub struct Chain {
        blocks: Vec<HashBlock>,
    }

    impl Chain {
        pub fn new() -> Result<Self, ChainError> {
            Ok(Self {
                blocks: vec![HashBlock::genesis()?],
            })
        }

        /// Build a candidate from the current tip, validate it, commit it.
        /// On any validation failure the chain is left unchanged.
        pub fn append(&mut self, payload: CheckoutRecord) -> Result<&HashBlock, ChainError> {
            let candidate = HashBlock::next(self.tip(), payload)?;
            self.push(candidate)?;
            Ok(self.tip())
        }

        /// Validate an externally built candidate against the tip and
        /// commit it if all checks pass.
        pub fn push(&mut self, candidate: HashBlock) -> Result<(), ChainError> {
            if let Err(reason) = validate(self.tip(), &candidate) {
                warn!(position = candidate.position, %reason, "rejected candidate block");
                return Err(reason);
            }
            self.blocks.push(candidate);
            Ok(())
        }

        /// Full ordered view of the chain.
        pub fn blocks(&self) -> &[HashBlock] {
            &self.blocks
        }

        pub fn tip(&self) -> &HashBlock {
            self.blocks.last().expect("chain always holds genesis")
        }

        pub fn len(&self) -> usize {
            self.blocks.len()
        }

        pub fn is_empty(&self) -> bool {
            self.blocks.is_empty()
        }
    }

    /// The acceptance checks, in order; the first failure wins.
    pub fn validate(prev: &HashBlock, curr: &HashBlock) -> Result<(), ChainError> {
        if prev.hash != curr.previous_hash {
            return Err(ChainError::LinkageMismatch);
        }
        if !curr.verify(&curr.hash)? {
            return Err(ChainError::HashMismatch);
        }
        if prev.position + 1 != curr.position {
            return Err(ChainError::PositionMismatch {
                expected: prev.position + 1,
                found: curr.position,
            });
        }
        Ok(())
    }
}
