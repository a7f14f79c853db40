use crate::core::mining::{
    AbortReason, MiningControl, MiningOutcome, MiningProgress, DEFAULT_PROGRESS_INTERVAL,
};
use crate::error::{BlockchainError, Result};
use crate::utils::{has_leading_zeros, sha256_digest, sha256_hex, HEX_DIGEST_LEN};
use data_encoding::HEXLOWER;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread;
use std::time::{Duration, Instant};

pub const MIN_DIFFICULTY: u32 = 1;
// A hex SHA-256 digest has 64 characters, more leading zeros can never match
pub const MAX_DIFFICULTY: u32 = HEX_DIGEST_LEN as u32;

// The deadline is checked once every this many attempts
const DEADLINE_CHECK_INTERVAL: u64 = 1024;

/// Tunable proof-of-work puzzle: find the smallest nonce such that
/// `sha256(content || decimal(nonce))` starts with `difficulty` zero hex digits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProofOfWork {
    difficulty: u32,
    target_prefix: String,
    progress_interval: u64,
}

/// A solved puzzle
#[derive(Debug, Clone, PartialEq)]
pub struct Proof {
    pub hash: String,
    pub nonce: u64,
    pub elapsed: Duration,
}

/// Reporting view of the engine's current target
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DifficultyInfo {
    pub difficulty: u32,
    pub target_prefix: String,
    pub expected_attempts: u128,
}

enum ScanResult {
    Found { nonce: u64, digest: Vec<u8> },
    // Another worker already holds a smaller nonce
    Superseded,
    Aborted(AbortReason),
}

impl ProofOfWork {
    pub fn new(difficulty: u32) -> Result<ProofOfWork> {
        Self::check_difficulty(difficulty)?;
        Ok(ProofOfWork {
            difficulty,
            target_prefix: Self::prefix_for(difficulty),
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
        })
    }

    /// Set how many attempts pass between two progress reports (0 is treated as 1)
    pub fn with_progress_interval(mut self, progress_interval: u64) -> ProofOfWork {
        self.progress_interval = progress_interval.max(1);
        self
    }

    /// Replace the difficulty for all later searches and verifications.
    ///
    /// Invalid values are rejected and leave the engine untouched.
    pub fn configure(&mut self, difficulty: u32) -> Result<()> {
        Self::check_difficulty(difficulty)?;
        self.difficulty = difficulty;
        self.target_prefix = Self::prefix_for(difficulty);
        info!("Difficulty adjusted to: {difficulty}");
        Ok(())
    }

    pub fn difficulty(&self) -> u32 {
        self.difficulty
    }

    pub fn target_prefix(&self) -> &str {
        &self.target_prefix
    }

    pub fn progress_interval(&self) -> u64 {
        self.progress_interval
    }

    pub fn info(&self) -> DifficultyInfo {
        DifficultyInfo {
            difficulty: self.difficulty,
            target_prefix: self.target_prefix.clone(),
            expected_attempts: Self::expected_attempts(self.difficulty),
        }
    }

    /// 16^difficulty, saturating once it no longer fits in a u128
    pub fn expected_attempts(difficulty: u32) -> u128 {
        16u128.checked_pow(difficulty).unwrap_or(u128::MAX)
    }

    pub fn search(&self, content: &[u8], control: &MiningControl) -> MiningOutcome<Proof> {
        self.search_with_progress(content, control, &mut |_| {})
    }

    /// Search nonces 0, 1, 2, ... and return the first one that meets the target.
    ///
    /// `observer` is called every `progress_interval` attempts. The search stops
    /// early when `control` is cancelled or its deadline passes.
    pub fn search_with_progress(
        &self,
        content: &[u8],
        control: &MiningControl,
        observer: &mut dyn FnMut(&MiningProgress),
    ) -> MiningOutcome<Proof> {
        info!(
            "Mining (difficulty: {}, target: {}...)",
            self.difficulty, self.target_prefix
        );
        let started = Instant::now();
        let result = self.scan(content, 0, 1, control, None, observer, started);
        self.finish(result, started)
    }

    /// Same result as [`search`](Self::search), spread over `workers` threads.
    ///
    /// Worker `w` tries nonces `w, w + workers, w + 2 * workers, ...`. A worker
    /// stops once its next nonce is larger than the best nonce found so far,
    /// so the smallest satisfying nonce still wins.
    pub fn search_parallel(
        &self,
        content: &[u8],
        workers: usize,
        control: &MiningControl,
    ) -> MiningOutcome<Proof> {
        if workers <= 1 {
            return self.search(content, control);
        }

        info!(
            "Mining with {workers} workers (difficulty: {}, target: {}...)",
            self.difficulty, self.target_prefix
        );
        let started = Instant::now();
        let best = AtomicU64::new(u64::MAX);
        let step = workers as u64;

        let results: Vec<ScanResult> = thread::scope(|scope| {
            let handles: Vec<_> = (0..step)
                .map(|first| {
                    let best = &best;
                    scope.spawn(move || {
                        self.scan(content, first, step, control, Some(best), &mut |_| {}, started)
                    })
                })
                .collect();
            handles
                .into_iter()
                .map(|handle| {
                    handle
                        .join()
                        .unwrap_or(ScanResult::Aborted(AbortReason::Cancelled))
                })
                .collect()
        });

        let mut winner: Option<(u64, Vec<u8>)> = None;
        for result in results {
            match result {
                // Without every stripe reaching the best nonce, minimality is not guaranteed
                ScanResult::Aborted(reason) => {
                    return self.finish(ScanResult::Aborted(reason), started)
                }
                ScanResult::Superseded => {}
                ScanResult::Found { nonce, digest } => {
                    if winner.as_ref().map_or(true, |(best, _)| nonce < *best) {
                        winner = Some((nonce, digest));
                    }
                }
            }
        }

        let result = match winner {
            Some((nonce, digest)) => ScanResult::Found { nonce, digest },
            None => ScanResult::Aborted(AbortReason::Exhausted),
        };
        self.finish(result, started)
    }

    /// Independently recompute the digest for `nonce` and check it against both
    /// the claimed digest and the difficulty currently configured.
    pub fn verify(&self, content: &[u8], nonce: u64, claimed_hash: &str) -> bool {
        let calculated = sha256_hex(&Self::candidate(content, nonce));
        calculated == claimed_hash && has_leading_zeros(claimed_hash, self.difficulty as usize)
    }

    /// True when `hash` satisfies the current target, regardless of how it was produced
    pub fn meets_target(&self, hash: &str) -> bool {
        has_leading_zeros(hash, self.difficulty as usize)
    }

    /// `content || decimal(nonce)`, the bytes hashed for one attempt
    pub fn candidate(content: &[u8], nonce: u64) -> Vec<u8> {
        let mut data = content.to_vec();
        data.extend_from_slice(nonce.to_string().as_bytes());
        data
    }

    #[allow(clippy::too_many_arguments)]
    fn scan(
        &self,
        content: &[u8],
        first: u64,
        step: u64,
        control: &MiningControl,
        best: Option<&AtomicU64>,
        observer: &mut dyn FnMut(&MiningProgress),
        started: Instant,
    ) -> ScanResult {
        let mut buffer = content.to_vec();
        let mut nonce = first;
        let mut attempts: u64 = 0;

        loop {
            if let Some(best) = best {
                if nonce > best.load(Ordering::Acquire) {
                    return ScanResult::Superseded;
                }
            }
            if control.is_cancelled() {
                return ScanResult::Aborted(AbortReason::Cancelled);
            }
            if attempts % DEADLINE_CHECK_INTERVAL == 0 && control.deadline_passed() {
                return ScanResult::Aborted(AbortReason::TimedOut);
            }

            buffer.truncate(content.len());
            buffer.extend_from_slice(nonce.to_string().as_bytes());
            let digest = sha256_digest(&buffer);
            attempts += 1;

            if Self::digest_meets(&digest, self.difficulty) {
                if let Some(best) = best {
                    best.fetch_min(nonce, Ordering::AcqRel);
                }
                return ScanResult::Found { nonce, digest };
            }

            if attempts % self.progress_interval == 0 {
                let progress = MiningProgress {
                    attempts,
                    elapsed: started.elapsed(),
                    last_hash: HEXLOWER.encode(digest.as_slice()),
                };
                debug!("{progress}");
                observer(&progress);
            }

            nonce = match nonce.checked_add(step) {
                Some(next) => next,
                None => return ScanResult::Aborted(AbortReason::Exhausted),
            };
        }
    }

    fn finish(&self, result: ScanResult, started: Instant) -> MiningOutcome<Proof> {
        let elapsed = started.elapsed();
        match result {
            ScanResult::Found { nonce, digest } => {
                let hash = HEXLOWER.encode(digest.as_slice());
                info!(
                    "Block mined: {hash} (nonce: {nonce}, time: {:.3}s)",
                    elapsed.as_secs_f64()
                );
                MiningOutcome::Found(Proof {
                    hash,
                    nonce,
                    elapsed,
                })
            }
            ScanResult::Superseded => MiningOutcome::Aborted(AbortReason::Exhausted),
            ScanResult::Aborted(reason) => {
                warn!(
                    "Mining {reason} after {:.3}s (difficulty: {})",
                    elapsed.as_secs_f64(),
                    self.difficulty
                );
                MiningOutcome::Aborted(reason)
            }
        }
    }

    // Leading zero hex digits are leading zero nibbles of the raw digest
    fn digest_meets(digest: &[u8], difficulty: u32) -> bool {
        let full_bytes = (difficulty / 2) as usize;
        if digest.len() < full_bytes || digest[..full_bytes].iter().any(|&b| b != 0) {
            return false;
        }
        if difficulty % 2 == 1 {
            return digest.get(full_bytes).map_or(false, |&b| b < 0x10);
        }
        true
    }

    fn check_difficulty(difficulty: u32) -> Result<()> {
        if difficulty < MIN_DIFFICULTY {
            return Err(BlockchainError::Config(format!(
                "difficulty must be at least {MIN_DIFFICULTY}, got {difficulty}"
            )));
        }
        if difficulty > MAX_DIFFICULTY {
            return Err(BlockchainError::Config(format!(
                "difficulty must be at most {MAX_DIFFICULTY}, got {difficulty}"
            )));
        }
        Ok(())
    }

    fn prefix_for(difficulty: u32) -> String {
        "0".repeat(difficulty as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine(difficulty: u32) -> ProofOfWork {
        ProofOfWork::new(difficulty).expect("valid difficulty")
    }

    fn mine(pow: &ProofOfWork, content: &[u8]) -> Proof {
        pow.search(content, &MiningControl::never())
            .found()
            .expect("search without a deadline always finds a proof")
    }

    #[test]
    fn test_proof_of_work_creation() {
        let pow = engine(3);
        assert_eq!(pow.difficulty(), 3);
        assert_eq!(pow.target_prefix(), "000");
        assert_eq!(pow.progress_interval(), DEFAULT_PROGRESS_INTERVAL);
    }

    #[test]
    fn test_rejects_out_of_range_difficulty() {
        assert!(matches!(ProofOfWork::new(0), Err(BlockchainError::Config(_))));
        assert!(matches!(ProofOfWork::new(65), Err(BlockchainError::Config(_))));
        assert!(ProofOfWork::new(64).is_ok());
    }

    #[test]
    fn test_configure_rejection_keeps_state() {
        let mut pow = engine(2);
        assert!(pow.configure(0).is_err());
        assert_eq!(pow.difficulty(), 2);
        assert_eq!(pow.target_prefix(), "00");

        pow.configure(4).unwrap();
        assert_eq!(pow.difficulty(), 4);
        assert_eq!(pow.target_prefix(), "0000");
    }

    #[test]
    fn test_mine_hello_at_difficulty_two() {
        let pow = engine(2);
        let proof = mine(&pow, b"hello");

        assert!(proof.hash.starts_with("00"));
        assert_eq!(proof.hash, sha256_hex(format!("hello{}", proof.nonce).as_bytes()));
        assert!(pow.verify(b"hello", proof.nonce, &proof.hash));
        assert!(!pow.verify(b"hello", proof.nonce + 1, &proof.hash));
    }

    #[test]
    fn test_search_is_deterministic_and_minimal() {
        let pow = engine(2);
        let first = mine(&pow, b"Sample Transaction Block");
        let second = mine(&pow, b"Sample Transaction Block");

        assert_eq!(first.nonce, second.nonce);
        assert_eq!(first.hash, second.hash);

        // No smaller nonce may satisfy the target
        for nonce in 0..first.nonce {
            let hash = sha256_hex(&ProofOfWork::candidate(b"Sample Transaction Block", nonce));
            assert!(!hash.starts_with("00"), "nonce {nonce} also satisfies the target");
        }
    }

    #[test]
    fn test_verify_rejects_wrong_hash() {
        let pow = engine(2);
        let proof = mine(&pow, b"Test Data");
        assert!(!pow.verify(b"Test Data", proof.nonce, "0000invalid"));
        assert!(!pow.verify(b"Other Data", proof.nonce, &proof.hash));
    }

    #[test]
    fn test_raising_difficulty_invalidates_weaker_proof() {
        let mut pow = engine(1);
        let content = b"retarget me";
        // Find a proof that meets difficulty 1 but not difficulty 2
        let mut nonce = 0;
        let hash = loop {
            let hash = sha256_hex(&ProofOfWork::candidate(content, nonce));
            if hash.starts_with('0') && !hash.starts_with("00") {
                break hash;
            }
            nonce += 1;
        };

        assert!(pow.verify(content, nonce, &hash));
        pow.configure(2).unwrap();
        assert!(!pow.verify(content, nonce, &hash));
    }

    #[test]
    fn test_verify_rejects_unsatisfying_digest_even_if_correct() {
        let pow = engine(4);
        let (nonce, hash) = (0u64..)
            .map(|nonce| (nonce, sha256_hex(&ProofOfWork::candidate(b"x", nonce))))
            .find(|(_, hash)| !hash.starts_with("0000"))
            .unwrap();

        assert_eq!(hash, sha256_hex(&ProofOfWork::candidate(b"x", nonce)));
        assert!(!pow.verify(b"x", nonce, &hash));
    }

    #[test]
    fn test_digest_meets_matches_hex_prefix() {
        for nonce in 0..2000u64 {
            let digest = sha256_digest(&ProofOfWork::candidate(b"nibbles", nonce));
            let hex = HEXLOWER.encode(&digest);
            for difficulty in 1..=3 {
                assert_eq!(
                    ProofOfWork::digest_meets(&digest, difficulty),
                    has_leading_zeros(&hex, difficulty as usize)
                );
            }
        }
    }

    #[test]
    fn test_expected_attempts_scale_by_sixteen() {
        for difficulty in 1..8 {
            let easier = engine(difficulty).info().expected_attempts;
            let harder = engine(difficulty + 1).info().expected_attempts;
            assert_eq!(harder, easier * 16);
        }
        assert_eq!(engine(4).info().expected_attempts, 65_536);
        assert_eq!(ProofOfWork::expected_attempts(64), u128::MAX);
    }

    #[test]
    fn test_info_reports_target() {
        let info = engine(3).info();
        assert_eq!(info.difficulty, 3);
        assert_eq!(info.target_prefix, "000");
        assert_eq!(info.expected_attempts, 4096);
    }

    #[test]
    fn test_pre_cancelled_search_aborts() {
        let control = MiningControl::never();
        control.cancel();
        let outcome = engine(2).search(b"never mined", &control);
        assert_eq!(outcome, MiningOutcome::Aborted(AbortReason::Cancelled));
    }

    #[test]
    fn test_expired_deadline_times_out() {
        let control = MiningControl::with_timeout(Duration::ZERO);
        let outcome = engine(8).search(b"too slow", &control);
        assert_eq!(outcome, MiningOutcome::Aborted(AbortReason::TimedOut));
    }

    #[test]
    fn test_cancel_from_another_thread() {
        let pow = engine(20);
        let control = MiningControl::never();
        let remote = control.clone();

        let canceller = thread::spawn(move || {
            thread::sleep(Duration::from_millis(50));
            remote.cancel();
        });
        let outcome = pow.search(b"unreachable target", &control);
        canceller.join().unwrap();

        assert_eq!(outcome, MiningOutcome::Aborted(AbortReason::Cancelled));
    }

    #[test]
    fn test_progress_observer_cadence() {
        let pow = engine(20).with_progress_interval(10);
        let control = MiningControl::never();
        let stopper = control.clone();
        let mut reports = Vec::new();

        let outcome = pow.search_with_progress(b"observed", &control, &mut |progress| {
            reports.push(progress.attempts);
            if reports.len() == 3 {
                stopper.cancel();
            }
        });

        assert_eq!(outcome, MiningOutcome::Aborted(AbortReason::Cancelled));
        assert_eq!(reports, vec![10, 20, 30]);
    }

    #[test]
    fn test_parallel_search_matches_sequential() {
        let pow = engine(3);
        let sequential = mine(&pow, b"parallel block");
        for workers in [2, 3, 4] {
            let parallel = pow
                .search_parallel(b"parallel block", workers, &MiningControl::never())
                .found()
                .expect("parallel search finds a proof");
            assert_eq!(parallel.nonce, sequential.nonce);
            assert_eq!(parallel.hash, sequential.hash);
        }
    }

    #[test]
    fn test_parallel_search_honours_cancellation() {
        let pow = engine(20);
        let control = MiningControl::never();
        control.cancel();
        let outcome = pow.search_parallel(b"stop", 4, &control);
        assert_eq!(outcome, MiningOutcome::Aborted(AbortReason::Cancelled));
    }
}
