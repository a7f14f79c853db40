//! Whole-chain validation
//!
//! Validation is a read-only projection over a block sequence: it never
//! repairs or marks anything, it only reports what it found. Every violation
//! is collected, in ascending index order, so a caller can see the first
//! failure as well as everything downstream of it.

use crate::core::block::GENESIS_PREVIOUS_HASH;
use crate::core::{ChainBlock, MinedBlock, ProofOfWork};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Violation {
    /// Block 0 is not shaped like a genesis block
    InvalidGenesis { reason: String },
    /// Block at position `index` stores a different index
    IndexGap { index: u64, stored: u64 },
    /// Stored hash differs from the hash recomputed from the block's fields
    TamperedBlock { index: u64 },
    /// Stored previous hash differs from the predecessor's stored hash
    BrokenLinkage { index: u64 },
    /// Hash no longer satisfies the engine's current difficulty
    InsufficientWork { index: u64 },
}

impl Violation {
    pub fn index(&self) -> u64 {
        match self {
            Violation::InvalidGenesis { .. } => 0,
            Violation::IndexGap { index, .. }
            | Violation::TamperedBlock { index }
            | Violation::BrokenLinkage { index }
            | Violation::InsufficientWork { index } => *index,
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Violation::InvalidGenesis { reason } => write!(f, "invalid genesis block: {reason}"),
            Violation::IndexGap { index, stored } => {
                write!(f, "index gap at index {index} (block claims {stored})")
            }
            Violation::TamperedBlock { index } => write!(f, "tampered block at index {index}"),
            Violation::BrokenLinkage { index } => write!(f, "broken linkage at index {index}"),
            Violation::InsufficientWork { index } => {
                write!(f, "insufficient work at index {index}")
            }
        }
    }
}

/// Verdict of a validation pass; empty means valid
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    violations: Vec<Violation>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.violations.is_empty()
    }

    /// The violation the short-circuiting walk would have stopped at
    pub fn first(&self) -> Option<&Violation> {
        self.violations.first()
    }

    pub fn violations(&self) -> &[Violation] {
        &self.violations
    }

    pub fn len(&self) -> usize {
        self.violations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.violations.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Violation> {
        self.violations.iter()
    }
}

impl<'a> IntoIterator for &'a ValidationReport {
    type Item = &'a Violation;
    type IntoIter = std::slice::Iter<'a, Violation>;

    fn into_iter(self) -> Self::IntoIter {
        self.violations.iter()
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.violations.is_empty() {
            return write!(f, "valid");
        }
        for (i, violation) in self.violations.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "✗ {violation}")?;
        }
        Ok(())
    }
}

/// Check genesis shape, index continuity, hash integrity and linkage
pub fn validate_blocks<B: ChainBlock>(blocks: &[B]) -> ValidationReport {
    let mut violations = Vec::new();

    let Some(genesis) = blocks.first() else {
        violations.push(Violation::InvalidGenesis {
            reason: "chain is empty".to_string(),
        });
        return ValidationReport { violations };
    };

    if genesis.get_index() != 0 {
        violations.push(Violation::InvalidGenesis {
            reason: format!("index is {}", genesis.get_index()),
        });
    }
    if genesis.get_previous_hash() != GENESIS_PREVIOUS_HASH {
        violations.push(Violation::InvalidGenesis {
            reason: format!("previous hash is {}", genesis.get_previous_hash()),
        });
    }
    if genesis.recompute_hash() != genesis.get_hash() {
        violations.push(Violation::TamperedBlock { index: 0 });
    }

    // Violations are labelled by position; a stored index is itself untrusted
    for (position, pair) in blocks.windows(2).enumerate() {
        let (previous, current) = (&pair[0], &pair[1]);
        let index = position as u64 + 1;

        if current.get_index() != index {
            violations.push(Violation::IndexGap {
                index,
                stored: current.get_index(),
            });
        }
        if current.recompute_hash() != current.get_hash() {
            violations.push(Violation::TamperedBlock { index });
        }
        if current.get_previous_hash() != previous.get_hash() {
            violations.push(Violation::BrokenLinkage { index });
        }
    }

    ValidationReport { violations }
}

/// Report mined blocks whose hash does not meet `engine`'s current target.
/// The genesis block is never mined and is skipped.
pub fn validate_work(blocks: &[MinedBlock], engine: &ProofOfWork) -> ValidationReport {
    let violations = blocks
        .iter()
        .enumerate()
        .skip(1)
        .filter(|(_, block)| !block.verify_proof(engine))
        .map(|(position, _)| Violation::InsufficientWork {
            index: position as u64,
        })
        .collect();
    ValidationReport { violations }
}
