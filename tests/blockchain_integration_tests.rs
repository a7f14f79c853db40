//! Ledger integration tests
//!
//! Exercises the public API end to end: building linked and mined chains,
//! tampering with stored blocks, racing miners and exporting to disk.

use proof_ledger::core::Violation;
use proof_ledger::{
    AbortReason, Block, Blockchain, ChainBlock, MinedBlock, MiningControl, MiningOutcome,
    ProofOfWork,
};
use rand::distributions::Alphanumeric;
use rand::Rng;
use std::sync::Barrier;
use std::thread;
use std::time::Duration;
use tempfile::tempdir;

fn linked_chain(payloads: &[&str]) -> Blockchain<Block> {
    let chain = Blockchain::with_genesis_payload(b"Genesis Block").unwrap();
    for payload in payloads {
        chain.append(payload.as_bytes()).unwrap();
    }
    chain
}

fn random_payload(rng: &mut impl Rng) -> Vec<u8> {
    let len = rng.gen_range(0..64);
    rng.sample_iter(&Alphanumeric).take(len).collect()
}

#[test]
fn test_append_a_b_c_is_valid() {
    let chain = linked_chain(&["A", "B", "C"]);
    let blocks = chain.blocks();

    assert!(chain.validate().is_valid());
    assert_eq!(blocks[2].get_previous_hash(), blocks[1].get_hash());
    assert_eq!(blocks[3].get_index(), 3);
    assert_eq!(blocks[0].get_previous_hash(), "0");
}

#[test]
fn test_random_append_sequences_stay_valid() {
    let mut rng = rand::thread_rng();
    for _ in 0..10 {
        let chain = Blockchain::with_genesis_payload(b"Genesis Block").unwrap();
        let count = rng.gen_range(1..20);
        for _ in 0..count {
            chain.append(&random_payload(&mut rng)).unwrap();
        }
        assert_eq!(chain.len(), count + 1);
        assert!(chain.validate().is_valid());
    }
}

#[test]
fn test_overwritten_payload_is_reported_at_its_index_only() {
    let chain = linked_chain(&["A", "B"]);
    let mut blocks = chain.blocks();
    let original = blocks[1].clone();
    blocks[1] = Block::from_parts(
        original.get_index(),
        original.get_timestamp(),
        b"A, but richer".to_vec(),
        original.get_previous_hash().to_string(),
        original.get_hash().to_string(),
    );

    let report = Blockchain::from_blocks(blocks).unwrap().validate();
    assert!(!report.is_valid());
    assert_eq!(report.violations(), &[Violation::TamperedBlock { index: 1 }]);
}

#[test]
fn test_mutated_hash_or_link_is_reported_first_at_that_index() {
    let mut rng = rand::thread_rng();
    let chain = linked_chain(&["one", "two", "three", "four", "five"]);

    for _ in 0..10 {
        let mut blocks = chain.blocks();
        let target = rng.gen_range(1..blocks.len());
        let original = blocks[target].clone();
        let (previous_hash, hash) = if rng.gen_bool(0.5) {
            (original.get_previous_hash().to_string(), "f".repeat(64))
        } else {
            ("e".repeat(64), original.get_hash().to_string())
        };
        blocks[target] = Block::from_parts(
            original.get_index(),
            original.get_timestamp(),
            original.get_payload().to_vec(),
            previous_hash,
            hash,
        );

        let report = Blockchain::from_blocks(blocks).unwrap().validate();
        let first = report.first().map(Violation::index);
        assert_eq!(first, Some(target as u64));
    }
}

#[test]
fn test_mine_hello_at_difficulty_two() {
    let engine = ProofOfWork::new(2).unwrap();
    let proof = engine
        .search(b"hello", &MiningControl::never())
        .found()
        .unwrap();

    assert!(proof.hash.starts_with("00"));
    assert!(engine.verify(b"hello", proof.nonce, &proof.hash));
    assert!(!engine.verify(b"hello", proof.nonce + 1, &proof.hash));

    // No smaller nonce qualifies
    for nonce in 0..proof.nonce {
        let digest = proof_ledger::sha256_hex(&ProofOfWork::candidate(b"hello", nonce));
        assert!(!engine.meets_target(&digest));
    }

    let again = engine
        .search(b"hello", &MiningControl::never())
        .found()
        .unwrap();
    assert_eq!((again.nonce, again.hash), (proof.nonce, proof.hash));
}

#[test]
fn test_mined_chain_end_to_end() {
    let engine = ProofOfWork::new(2).unwrap();
    let chain: Blockchain<MinedBlock> = Blockchain::with_genesis_payload(b"Genesis Block").unwrap();

    for payload in ["Alice pays Bob 10", "Bob pays Carol 5"] {
        let outcome = chain
            .append_with_pow(payload.as_bytes(), &engine, &MiningControl::never())
            .unwrap();
        let block = outcome.found().unwrap();
        assert!(block.get_hash().starts_with("00"));
    }

    assert_eq!(chain.len(), 3);
    assert!(chain.validate().is_valid());
    assert!(chain.validate_proofs(&engine).is_valid());

    // Raising the difficulty invalidates blocks mined under the old target
    let harder = ProofOfWork::new(6).unwrap();
    assert!(!chain.validate_proofs(&harder).is_valid());
}

#[test]
fn test_timeout_leaves_chain_untouched() {
    let engine = ProofOfWork::new(10).unwrap();
    let chain: Blockchain<MinedBlock> = Blockchain::with_genesis_payload(b"Genesis Block").unwrap();
    let control = MiningControl::with_timeout(Duration::from_millis(20));

    let outcome = chain
        .append_with_pow(b"never finishes", &engine, &control)
        .unwrap();
    assert!(matches!(
        outcome,
        MiningOutcome::Aborted(AbortReason::TimedOut)
    ));
    assert_eq!(chain.len(), 1);
}

#[test]
fn test_racing_miners_commit_exactly_one_block() {
    let engine = ProofOfWork::new(1).unwrap();
    let chain: Blockchain<MinedBlock> = Blockchain::with_genesis_payload(b"Genesis Block").unwrap();
    let miners = 4;
    let barrier = Barrier::new(miners);

    let accepted = thread::scope(|scope| {
        let handles: Vec<_> = (0..miners)
            .map(|miner| {
                let (chain, engine, barrier) = (&chain, &engine, &barrier);
                scope.spawn(move || {
                    let payload = format!("miner {miner}");
                    let block = chain
                        .mine_candidate(payload.as_bytes(), |content| {
                            engine.search(content, &MiningControl::never())
                        })
                        .unwrap()
                        .found()
                        .unwrap();
                    barrier.wait();
                    chain.submit(block, engine).is_ok()
                })
            })
            .collect();
        handles
            .into_iter()
            .map(|handle| handle.join().unwrap())
            .filter(|accepted| *accepted)
            .count()
    });

    assert_eq!(accepted, 1);
    assert_eq!(chain.len(), 2);
    assert!(chain.validate().is_valid());
}

#[test]
fn test_export_and_import_round_trip() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("ledger.json");

    let chain = linked_chain(&["A", "B"]);
    chain.export_to_file(&path).unwrap();

    let restored: Blockchain<Block> = Blockchain::import_from_file(&path).unwrap();
    assert_eq!(restored.blocks(), chain.blocks());
    assert!(restored.validate().is_valid());

    let exported: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(exported[1]["payload"], "A");
    assert_eq!(exported[1]["previous_hash"], exported[0]["hash"]);
}
