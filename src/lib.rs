//! # Proof Ledger - Tamper-Evident Chain with Proof-of-Work Admission
//!
//! An append-only ledger of opaque records. Every block is bound to its
//! predecessor's hash, and the proof-of-work variant only admits a block once
//! a nonce has been found that gives its hash the configured number of
//! leading zero hex digits.
//!
//! ## What Is Here
//! - **Linked chain**: `Block` seals `(index, timestamp, payload, previous_hash)`
//! - **Mined chain**: `MinedBlock` seals `(block_number, payload, previous_hash, nonce)`
//! - **Proof-of-Work engine**: smallest-nonce search, cancellable, optionally
//!   spread over a worker pool, with difficulty-sensitive verification
//! - **Validation**: whole-chain walk reporting every tampered block and
//!   broken link by index
//!
//! ## How the Code Is Organized
//! - `core/`: blocks, the engine, mining control, the chain and validation
//! - `config/`: explicit configuration (defaults, TOML file, environment)
//! - `utils/`: SHA-256 digests, timestamps and JSON export helpers
//! - `cli/`: command-line parsing and the interactive sessions
//!
//! ## Where to Start
//! 1. `core/blockchain.rs` for append and validation
//! 2. `core/proof_of_work.rs` for the search and verification
//! 3. `main.rs` for the commands the binary offers

pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod utils;

#[cfg(test)]
pub mod testnet;

// Re-export commonly used types for convenience
pub use cli::{Command, Opt};
pub use config::Config;
pub use core::{
    AbortReason, Block, Blockchain, ChainBlock, ChainStats, DifficultyInfo, MinedBlock,
    MiningControl, MiningOutcome, MiningProgress, Proof, ProofOfWork, ValidationReport, Violation,
};
pub use error::{BlockchainError, Result};
pub use utils::{current_timestamp, sha256_digest, sha256_hex};
