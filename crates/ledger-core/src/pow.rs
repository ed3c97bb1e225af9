use crate::constants::{CANCEL_POLL_INTERVAL, PARALLEL_CHUNK_PER_THREAD, POW_TARGET_DIFFICULTY};
use crate::hasher::sha256;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, info};

/// The puzzle: find `proof` such that `sha256("{last_proof}{proof}")` starts
/// with `difficulty` zero hex digits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProofOfWork {
    difficulty: usize,
}

impl Default for ProofOfWork {
    fn default() -> Self {
        Self::new(POW_TARGET_DIFFICULTY)
    }
}

impl fmt::Display for ProofOfWork {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Difficulty (leading zero hex digits) = {}", self.difficulty)
    }
}

impl ProofOfWork {
    pub fn new(difficulty: usize) -> Self {
        Self { difficulty }
    }

    pub fn difficulty(&self) -> usize {
        self.difficulty
    }

    /// One hash, no allocation beyond the guess string.
    pub fn verify(&self, last_proof: u64, proof: u64) -> bool {
        let guess = format!("{last_proof}{proof}");
        let hash = sha256(guess.as_bytes());
        count_leading_zero_bits(&hash) as usize >= self.difficulty * 4
    }

    /// Sequential search from zero. Returns the smallest valid proof, or
    /// `None` once `cancel` is observed set.
    pub fn solve(&self, last_proof: u64, cancel: &AtomicBool) -> Option<u64> {
        let mut proof = 0u64;
        loop {
            if proof % CANCEL_POLL_INTERVAL == 0 && cancel.load(Ordering::Relaxed) {
                debug!(last_proof, tried = proof, "proof search cancelled");
                return None;
            }
            if self.verify(last_proof, proof) {
                info!(last_proof, proof, "found proof");
                return Some(proof);
            }
            proof = proof.wrapping_add(1);
        }
    }

    /// Same answer as [`solve`](Self::solve), searched across the rayon pool.
    ///
    /// Candidates are handed out in bounded rounds of a few thousand per
    /// thread. `find_first` inside a round, plus rounds in ascending order,
    /// keeps the result the smallest valid proof.
    pub fn solve_parallel(&self, last_proof: u64, cancel: &AtomicBool) -> Option<u64> {
        let chunk = PARALLEL_CHUNK_PER_THREAD.saturating_mul(rayon::current_num_threads() as u64);
        self.solve_in_rounds(last_proof, cancel, chunk)
    }

    fn solve_in_rounds(&self, last_proof: u64, cancel: &AtomicBool, chunk: u64) -> Option<u64> {
        let chunk = chunk.max(1);
        let mut start = 0u64;
        loop {
            let end = start.saturating_add(chunk);
            let found = (start..end)
                .into_par_iter()
                .find_first(|proof| cancel.load(Ordering::Relaxed) || self.verify(last_proof, *proof));

            if cancel.load(Ordering::Relaxed) {
                debug!(last_proof, tried = start, "parallel proof search cancelled");
                return None;
            }
            if let Some(proof) = found {
                info!(last_proof, proof, "found proof");
                return Some(proof);
            }
            if end == u64::MAX {
                return None;
            }
            start = end;
        }
    }
}

pub fn count_leading_zero_bits(hash: &[u8; 32]) -> u32 {
    let mut total = 0u32;
    for b in hash {
        if *b == 0 {
            total += 8;
        } else {
            total += b.leading_zeros();
            break;
        }
    }
    total
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn leading_zero_bits_examples() {
        let mut h = [0u8; 32];
        assert_eq!(count_leading_zero_bits(&h), 256);
        h[0] = 0x0F; // 00001111
        assert_eq!(count_leading_zero_bits(&h), 4);
        h = [0u8; 32];
        h[1] = 0x80; // 00000000 10000000
        assert_eq!(count_leading_zero_bits(&h), 8);
        h[1] = 0x40; // 01000000
        assert_eq!(count_leading_zero_bits(&h), 9);
    }

    #[test]
    fn verify_matches_hex_prefix() {
        let pow = ProofOfWork::new(2);
        for proof in 0..2_000u64 {
            let hex = hex::encode(sha256(format!("7{proof}").as_bytes()));
            assert_eq!(pow.verify(7, proof), hex.starts_with("00"), "proof {proof}");
        }
    }

    #[test]
    fn small_proofs_fail_for_genesis() {
        let pow = ProofOfWork::default();
        for proof in [0, 1, 2] {
            assert!(!pow.verify(100, proof));
        }
    }

    #[test]
    fn solve_returns_first_valid_proof() {
        let pow = ProofOfWork::default();
        let cancel = AtomicBool::new(false);
        let proof = pow.solve(100, &cancel).unwrap();
        assert!(pow.verify(100, proof));
        assert!((0..proof).all(|p| !pow.verify(100, p)));
        let hex = hex::encode(sha256(format!("100{proof}").as_bytes()));
        assert!(hex.starts_with("0000"));
    }

    #[test]
    fn solve_then_verify_for_many_inputs() {
        let pow = ProofOfWork::new(2);
        let cancel = AtomicBool::new(false);
        for last in [0u64, 1, 99, 12_345, u64::MAX] {
            let proof = pow.solve(last, &cancel).unwrap();
            assert!(pow.verify(last, proof));
        }
    }

    #[test]
    fn parallel_agrees_with_sequential() {
        let pow = ProofOfWork::new(3);
        let cancel = AtomicBool::new(false);
        for last in [100u64, 35_293, 7] {
            assert_eq!(pow.solve(last, &cancel), pow.solve_parallel(last, &cancel));
        }
    }

    #[test]
    fn rounds_carry_over_to_the_next_range() {
        let pow = ProofOfWork::new(3);
        let cancel = AtomicBool::new(false);
        let expected = pow.solve(100, &cancel).unwrap();
        assert!(expected > 7);
        for chunk in [1, 7, 1_000, 1 << 20] {
            assert_eq!(pow.solve_in_rounds(100, &cancel, chunk), Some(expected), "chunk {chunk}");
        }
    }

    #[test]
    fn cancelled_search_returns_none() {
        let pow = ProofOfWork::new(64);
        let cancel = AtomicBool::new(true);
        assert_eq!(pow.solve(100, &cancel), None);
        assert_eq!(pow.solve_parallel(100, &cancel), None);
    }

    #[test]
    fn zero_difficulty_accepts_anything() {
        let pow = ProofOfWork::new(0);
        assert!(pow.verify(100, 0));
        assert_eq!(pow.solve(100, &AtomicBool::new(false)), Some(0));
    }
}
