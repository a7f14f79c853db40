//! Core ledger functionality
//!
//! This module contains the fundamental ledger components: the two block
//! shapes, the proof-of-work engine and its mining control, the chain and
//! whole-chain validation.

pub mod block;
pub mod blockchain;
pub mod mined_block;
pub mod mining;
pub mod proof_of_work;
pub mod validation;

pub use block::{Block, DEFAULT_GENESIS_PAYLOAD, GENESIS_PREVIOUS_HASH};
pub use blockchain::{Blockchain, ChainBlock, ChainStats};
pub use mined_block::MinedBlock;
pub use mining::{AbortReason, MiningControl, MiningOutcome, MiningProgress};
pub use proof_of_work::{DifficultyInfo, Proof, ProofOfWork, MAX_DIFFICULTY, MIN_DIFFICULTY};
pub use validation::{ValidationReport, Violation};
