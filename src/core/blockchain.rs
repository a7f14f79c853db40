// This is the ledger itself - an append-only sequence of sealed blocks
// Every block is bound to its predecessor's hash, and the first block is always genesis
// I serialize appends: read tail -> seal or mine -> push all happens under one lock
// Racing miners go through mine_candidate/submit instead, and I re-check the tail on submit

use crate::config::Config;
use crate::core::validation::{validate_blocks, validate_work};
use crate::core::{
    Block, MinedBlock, MiningControl, MiningOutcome, Proof, ProofOfWork, ValidationReport,
};
use crate::error::{BlockchainError, Result};
use crate::utils::{from_json, read_json_file, to_json, write_json_file};
use log::{info, warn};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// What the chain needs to know about a block to link and validate it
pub trait ChainBlock: Clone + Send + Sync + Serialize + DeserializeOwned {
    /// The fixed first block of a chain
    fn genesis(payload: &[u8]) -> Result<Self>;

    fn get_index(&self) -> u64;

    fn get_previous_hash(&self) -> &str;

    fn get_hash(&self) -> &str;

    /// Hash recomputed from the block's other fields, ignoring the stored one
    fn recompute_hash(&self) -> String;
}

// Cloning a Blockchain gives another handle onto the same chain
#[derive(Clone)]
pub struct Blockchain<B> {
    blocks: Arc<RwLock<Vec<B>>>,
    // Held for the whole read-tail -> seal -> push sequence
    append_lock: Arc<Mutex<()>>,
}

/// Summary printed at the end of a session
#[derive(Debug, Clone, PartialEq)]
pub struct ChainStats {
    pub total_blocks: usize,
    pub valid: bool,
    pub violations: usize,
}

impl fmt::Display for ChainStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Total Blocks: {}", self.total_blocks)?;
        let status = if self.valid { "✓ Valid" } else { "✗ Invalid" };
        write!(f, "Chain Status: {status}")?;
        if self.violations > 0 {
            write!(f, " ({} violations)", self.violations)?;
        }
        Ok(())
    }
}

impl<B: ChainBlock> Blockchain<B> {
    /// Create a chain holding only the genesis block named by `config`
    pub fn new(config: &Config) -> Result<Blockchain<B>> {
        Self::with_genesis_payload(config.genesis_payload.as_bytes())
    }

    pub fn with_genesis_payload(payload: &[u8]) -> Result<Blockchain<B>> {
        let genesis = B::genesis(payload)?;
        info!("✓ Genesis block created: {}", genesis.get_hash());
        Ok(Self::from_vec(vec![genesis]))
    }

    /// Adopt an existing block sequence as-is, e.g. one read back from an export.
    ///
    /// Only emptiness is rejected; run [`validate`](Self::validate) before
    /// trusting the result.
    pub fn from_blocks(blocks: Vec<B>) -> Result<Blockchain<B>> {
        if blocks.is_empty() {
            return Err(BlockchainError::EmptyChain);
        }
        Ok(Self::from_vec(blocks))
    }

    fn from_vec(blocks: Vec<B>) -> Blockchain<B> {
        Blockchain {
            blocks: Arc::new(RwLock::new(blocks)),
            append_lock: Arc::new(Mutex::new(())),
        }
    }

    // A panic while holding one of these locks cannot leave a half-pushed block behind
    fn read(&self) -> RwLockReadGuard<'_, Vec<B>> {
        self.blocks.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Vec<B>> {
        self.blocks.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_appends(&self) -> MutexGuard<'_, ()> {
        self.append_lock.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// The tail block
    pub fn latest(&self) -> B {
        let blocks = self.read();
        // Constructors never produce an empty chain
        blocks[blocks.len() - 1].clone()
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    // Always false, a chain keeps its genesis block
    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    pub fn get(&self, index: usize) -> Option<B> {
        self.read().get(index).cloned()
    }

    /// Consistent snapshot of every block, genesis first
    pub fn blocks(&self) -> Vec<B> {
        self.read().clone()
    }

    /// Walk the chain front to back and report every integrity violation
    pub fn validate(&self) -> ValidationReport {
        let report = validate_blocks(self.read().as_slice());
        if let Some(violation) = report.first() {
            warn!("Chain validation failed: {violation}");
        }
        report
    }

    pub fn stats(&self) -> ChainStats {
        let blocks = self.read();
        let report = validate_blocks(blocks.as_slice());
        ChainStats {
            total_blocks: blocks.len(),
            valid: report.is_valid(),
            violations: report.len(),
        }
    }

    // An imported chain may already end at u64::MAX
    fn next_index(tail: &B) -> Result<u64> {
        tail.get_index().checked_add(1).ok_or_else(|| {
            BlockchainError::InvalidBlock(format!(
                "block {} is the last index a chain can hold",
                tail.get_index()
            ))
        })
    }

    // I push `block` only if it still extends the tail and its hash is honest
    // This is the last gate for every append path, including submit
    fn commit(&self, block: B) -> Result<()> {
        let mut blocks = self.write();
        let tail = &blocks[blocks.len() - 1];

        if block.get_previous_hash() != tail.get_hash() {
            return Err(BlockchainError::StaleBlock {
                expected: tail.get_hash().to_string(),
                found: block.get_previous_hash().to_string(),
            });
        }
        let expected_index = Self::next_index(tail)?;
        if block.get_index() != expected_index {
            return Err(BlockchainError::InvalidBlock(format!(
                "expected index {expected_index}, got {}",
                block.get_index()
            )));
        }
        if block.recompute_hash() != block.get_hash() {
            return Err(BlockchainError::InvalidBlock(format!(
                "hash of block {} does not match its contents",
                block.get_index()
            )));
        }

        blocks.push(block);
        Ok(())
    }

    pub fn to_json(&self) -> Result<String> {
        to_json(self.read().as_slice())
    }

    pub fn from_json(text: &str) -> Result<Blockchain<B>> {
        Self::from_blocks(from_json(text)?)
    }

    pub fn export_to_file(&self, path: &Path) -> Result<()> {
        write_json_file(path, self.read().as_slice())?;
        info!("Exported {} blocks to {}", self.len(), path.display());
        Ok(())
    }

    pub fn import_from_file(path: &Path) -> Result<Blockchain<B>> {
        Self::from_blocks(read_json_file(path)?)
    }
}

impl Blockchain<Block> {
    /// Seal `payload` on top of the current tail and push it
    pub fn append(&self, payload: &[u8]) -> Result<Block> {
        let _guard = self.lock_appends();
        let latest = self.latest();
        let block = Block::seal(Self::next_index(&latest)?, payload, latest.get_hash())?;
        self.commit(block.clone())?;
        info!("✓ Block #{} added: {}", block.get_index(), block.get_hash());
        Ok(block)
    }
}

impl Blockchain<MinedBlock> {
    /// Mine `payload` against the current tail with `engine` and push the result.
    ///
    /// Other appends wait until this one has been committed or aborted.
    pub fn append_with_pow(
        &self,
        payload: &[u8],
        engine: &ProofOfWork,
        control: &MiningControl,
    ) -> Result<MiningOutcome<MinedBlock>> {
        self.append_with_miner(payload, |content| engine.search(content, control))
    }

    /// `append_with_pow` with a caller-supplied search
    pub fn append_with_miner<F>(&self, payload: &[u8], mine: F) -> Result<MiningOutcome<MinedBlock>>
    where
        F: FnOnce(&[u8]) -> MiningOutcome<Proof>,
    {
        let _guard = self.lock_appends();
        let latest = self.latest();
        let block_number = Self::next_index(&latest)?;
        let outcome = MinedBlock::seal_with_miner(block_number, payload, latest.get_hash(), mine)?;

        match &outcome {
            MiningOutcome::Found(block) => {
                self.commit(block.clone())?;
                info!(
                    "✓ Block #{} mined: {} (nonce: {})",
                    block.get_index(),
                    block.get_hash(),
                    block.get_nonce()
                );
            }
            MiningOutcome::Aborted(reason) => {
                warn!("Block #{block_number} not added: mining {reason}")
            }
        }
        Ok(outcome)
    }

    /// Mine a candidate on the current tail without reserving it.
    ///
    /// Several miners may race this way; only the first [`submit`](Self::submit)
    /// wins, the rest are rejected as stale.
    pub fn mine_candidate<F>(&self, payload: &[u8], mine: F) -> Result<MiningOutcome<MinedBlock>>
    where
        F: FnOnce(&[u8]) -> MiningOutcome<Proof>,
    {
        let latest = self.latest();
        let block_number = Self::next_index(&latest)?;
        MinedBlock::seal_with_miner(block_number, payload, latest.get_hash(), mine)
    }

    /// Commit a block mined elsewhere after checking its proof against `engine`
    /// and its linkage against the tail as it is now.
    pub fn submit(&self, block: MinedBlock, engine: &ProofOfWork) -> Result<MinedBlock> {
        let _guard = self.lock_appends();
        if !block.verify_proof(engine) {
            return Err(BlockchainError::InvalidBlock(format!(
                "block {} does not carry a valid proof at difficulty {}",
                block.get_index(),
                engine.difficulty()
            )));
        }
        self.commit(block.clone())?;
        info!("✓ Block #{} accepted: {}", block.get_index(), block.get_hash());
        Ok(block)
    }

    /// Report mined blocks that do not satisfy `engine`'s current difficulty
    pub fn validate_proofs(&self, engine: &ProofOfWork) -> ValidationReport {
        validate_work(self.read().as_slice(), engine)
    }

    /// Sum of the recorded mining durations, in seconds
    pub fn total_mining_time(&self) -> f64 {
        self.read().iter().map(MinedBlock::get_mining_time).sum()
    }
}

impl<B: ChainBlock + fmt::Display> fmt::Display for Blockchain<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rule = "=".repeat(60);
        writeln!(f, "{rule}")?;
        writeln!(f, "BLOCKCHAIN")?;
        writeln!(f, "{rule}")?;
        for block in self.read().iter() {
            writeln!(f, "{block}")?;
            writeln!(f)?;
        }
        write!(f, "{rule}")
    }
}
