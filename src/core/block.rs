use crate::core::ChainBlock;
use crate::error::Result;
use crate::utils::serialization::payload;
use crate::utils::{current_timestamp, sha256_hex};
use serde::{Deserialize, Serialize};
use std::fmt;

/// `previous_hash` of every genesis block
pub const GENESIS_PREVIOUS_HASH: &str = "0";

/// Payload of the genesis block when the configuration does not name one
pub const DEFAULT_GENESIS_PAYLOAD: &str = "Genesis Block";

/// A hash-linked block without proof-of-work.
///
/// Fields are private and fixed at construction; the stored hash always
/// covers `(index, timestamp, payload, previous_hash)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    index: u64,
    timestamp: i64,
    #[serde(with = "payload")]
    payload: Vec<u8>,
    previous_hash: String,
    hash: String,
}

impl Block {
    /// Timestamp the block now and compute its hash
    pub fn seal(index: u64, payload: &[u8], previous_hash: &str) -> Result<Block> {
        let timestamp = current_timestamp()?;
        let hash = Self::digest_of(index, timestamp, payload, previous_hash);
        Ok(Block {
            index,
            timestamp,
            payload: payload.to_vec(),
            previous_hash: previous_hash.to_string(),
            hash,
        })
    }

    /// Reassemble a block from stored fields without resealing it.
    ///
    /// Nothing is checked here; a block built this way is only trustworthy
    /// once a chain holding it passes validation.
    pub fn from_parts(
        index: u64,
        timestamp: i64,
        payload: Vec<u8>,
        previous_hash: String,
        hash: String,
    ) -> Block {
        Block {
            index,
            timestamp,
            payload,
            previous_hash,
            hash,
        }
    }

    pub fn digest_of(index: u64, timestamp: i64, payload: &[u8], previous_hash: &str) -> String {
        let mut data = format!("{index}{timestamp}").into_bytes();
        data.extend_from_slice(payload);
        data.extend_from_slice(previous_hash.as_bytes());
        sha256_hex(&data)
    }

    pub fn get_timestamp(&self) -> i64 {
        self.timestamp
    }

    pub fn get_payload(&self) -> &[u8] {
        &self.payload
    }
}

impl ChainBlock for Block {
    fn genesis(payload: &[u8]) -> Result<Block> {
        Block::seal(0, payload, GENESIS_PREVIOUS_HASH)
    }

    fn get_index(&self) -> u64 {
        self.index
    }

    fn get_previous_hash(&self) -> &str {
        &self.previous_hash
    }

    fn get_hash(&self) -> &str {
        &self.hash
    }

    fn recompute_hash(&self) -> String {
        Self::digest_of(self.index, self.timestamp, &self.payload, &self.previous_hash)
    }
}

impl fmt::Display for Block {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Block #{}", self.index)?;
        writeln!(f, "├─ Timestamp: {}", self.timestamp)?;
        writeln!(f, "├─ Data: {}", String::from_utf8_lossy(&self.payload))?;
        writeln!(f, "├─ Previous Hash: {}", self.previous_hash)?;
        write!(f, "└─ Hash: {}", self.hash)
    }
}
