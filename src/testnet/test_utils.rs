//! Test utilities for ledger testing

use crate::core::{Block, Blockchain, ChainBlock, MinedBlock, MiningControl, ProofOfWork};

/// Linked chain holding genesis plus one block per payload
pub fn chain_of(payloads: &[&str]) -> Blockchain<Block> {
    let chain = Blockchain::with_genesis_payload(b"Genesis Block").unwrap();
    for payload in payloads {
        chain.append(payload.as_bytes()).unwrap();
    }
    chain
}

/// Mined chain at `difficulty`; keep it low, tests mine every block for real
pub fn mined_chain_of(payloads: &[&str], difficulty: u32) -> Blockchain<MinedBlock> {
    let chain = Blockchain::with_genesis_payload(b"Genesis Block").unwrap();
    let engine = ProofOfWork::new(difficulty).unwrap();
    for payload in payloads {
        chain
            .append_with_pow(payload.as_bytes(), &engine, &MiningControl::never())
            .unwrap()
            .found()
            .expect("unbounded search always finds a proof");
    }
    chain
}

/// Copy of `chain` with block `index` replaced by `f(block)`, nothing resealed
pub fn replace_block<B, F>(chain: &Blockchain<B>, index: usize, f: F) -> Blockchain<B>
where
    B: ChainBlock,
    F: FnOnce(&B) -> B,
{
    let mut blocks = chain.blocks();
    let replaced = f(&blocks[index]);
    blocks[index] = replaced;
    Blockchain::from_blocks(blocks).unwrap()
}

pub fn with_payload(block: &Block, payload: &[u8]) -> Block {
    Block::from_parts(
        block.get_index(),
        block.get_timestamp(),
        payload.to_vec(),
        block.get_previous_hash().to_string(),
        block.get_hash().to_string(),
    )
}

pub fn with_hash(block: &Block, hash: &str) -> Block {
    Block::from_parts(
        block.get_index(),
        block.get_timestamp(),
        block.get_payload().to_vec(),
        block.get_previous_hash().to_string(),
        hash.to_string(),
    )
}

pub fn with_previous_hash(block: &Block, previous_hash: &str) -> Block {
    Block::from_parts(
        block.get_index(),
        block.get_timestamp(),
        block.get_payload().to_vec(),
        previous_hash.to_string(),
        block.get_hash().to_string(),
    )
}
