// A block admitted through proof-of-work: its hash is sha256(content || nonce)
// where content = block_number || payload || previous_hash.

use crate::core::block::GENESIS_PREVIOUS_HASH;
use crate::core::{ChainBlock, MiningControl, MiningOutcome, Proof, ProofOfWork};
use crate::error::Result;
use crate::utils::serialization::payload;
use crate::utils::{current_timestamp, sha256_hex};
use log::info;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MinedBlock {
    block_number: u64,
    timestamp: i64,
    #[serde(with = "payload")]
    payload: Vec<u8>,
    previous_hash: String,
    nonce: u64,
    hash: String,
    mining_time: f64, // seconds
}

impl MinedBlock {
    /// Mine `(block_number, payload, previous_hash)` with `engine` and seal the result
    pub fn seal_with_pow(
        block_number: u64,
        payload: &[u8],
        previous_hash: &str,
        engine: &ProofOfWork,
        control: &MiningControl,
    ) -> Result<MiningOutcome<MinedBlock>> {
        Self::seal_with_miner(block_number, payload, previous_hash, |content| {
            engine.search(content, control)
        })
    }

    /// Like `seal_with_pow`, but the search itself is supplied by the caller
    /// (a worker pool, a search with a progress observer, ...)
    pub fn seal_with_miner<F>(
        block_number: u64,
        payload: &[u8],
        previous_hash: &str,
        mine: F,
    ) -> Result<MiningOutcome<MinedBlock>>
    where
        F: FnOnce(&[u8]) -> MiningOutcome<Proof>,
    {
        let timestamp = current_timestamp()?;
        let content = Self::content_of(block_number, payload, previous_hash);

        info!("Starting proof-of-work for block #{block_number}");
        Ok(mine(&content).map(|proof| MinedBlock {
            block_number,
            timestamp,
            payload: payload.to_vec(),
            previous_hash: previous_hash.to_string(),
            nonce: proof.nonce,
            hash: proof.hash,
            mining_time: proof.elapsed.as_secs_f64(),
        }))
    }

    /// Reassemble a block from stored fields without mining or rehashing
    #[allow(clippy::too_many_arguments)]
    pub fn from_parts(
        block_number: u64,
        timestamp: i64,
        payload: Vec<u8>,
        previous_hash: String,
        nonce: u64,
        hash: String,
        mining_time: f64,
    ) -> MinedBlock {
        MinedBlock {
            block_number,
            timestamp,
            payload,
            previous_hash,
            nonce,
            hash,
            mining_time,
        }
    }

    /// The bytes the engine mines for this block, before the nonce is appended
    pub fn content_of(block_number: u64, payload: &[u8], previous_hash: &str) -> Vec<u8> {
        let mut content = block_number.to_string().into_bytes();
        content.extend_from_slice(payload);
        content.extend_from_slice(previous_hash.as_bytes());
        content
    }

    pub fn mining_content(&self) -> Vec<u8> {
        Self::content_of(self.block_number, &self.payload, &self.previous_hash)
    }

    /// Check the stored nonce and hash against `engine`'s current difficulty
    pub fn verify_proof(&self, engine: &ProofOfWork) -> bool {
        engine.verify(&self.mining_content(), self.nonce, &self.hash)
    }

    pub fn get_block_number(&self) -> u64 {
        self.block_number
    }

    pub fn get_timestamp(&self) -> i64 {
        self.timestamp
    }

    pub fn get_payload(&self) -> &[u8] {
        &self.payload
    }

    pub fn get_nonce(&self) -> u64 {
        self.nonce
    }

    pub fn get_mining_time(&self) -> f64 {
        self.mining_time
    }
}

impl ChainBlock for MinedBlock {
    // The genesis block is not mined: nonce 0, no mining time
    fn genesis(payload: &[u8]) -> Result<MinedBlock> {
        let content = Self::content_of(0, payload, GENESIS_PREVIOUS_HASH);
        Ok(MinedBlock {
            block_number: 0,
            timestamp: current_timestamp()?,
            payload: payload.to_vec(),
            previous_hash: GENESIS_PREVIOUS_HASH.to_string(),
            nonce: 0,
            hash: sha256_hex(&ProofOfWork::candidate(&content, 0)),
            mining_time: 0.0,
        })
    }

    fn get_index(&self) -> u64 {
        self.block_number
    }

    fn get_previous_hash(&self) -> &str {
        &self.previous_hash
    }

    fn get_hash(&self) -> &str {
        &self.hash
    }

    fn recompute_hash(&self) -> String {
        sha256_hex(&ProofOfWork::candidate(&self.mining_content(), self.nonce))
    }
}

impl fmt::Display for MinedBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Block #{}", self.block_number)?;
        writeln!(f, "├─ Data: {}", String::from_utf8_lossy(&self.payload))?;
        writeln!(f, "├─ Previous Hash: {}", self.previous_hash)?;
        writeln!(f, "├─ Nonce: {}", self.nonce)?;
        writeln!(f, "├─ Hash: {}", self.hash)?;
        write!(f, "└─ Mining Time: {:.3}s", self.mining_time)
    }
}
