pub const HASH_SIZE: usize = 32;
pub const HASH_HEX_SIZE: usize = HASH_SIZE * 2;
pub const GENESIS_PROOF: u64 = 100;
pub const GENESIS_PREVIOUS_HASH: &str = "1";
pub const POW_TARGET_DIFFICULTY: usize = 4;
pub const MINING_REWARD: u64 = 1;
pub const REWARD_SENDER: &str = "0";
pub const PEER_TIMEOUT_MS: u64 = 5_000;
pub const MAX_CONCURRENT_FETCHES: usize = 8;
pub const MAX_MINING_ATTEMPTS: u32 = 5;
/// How many candidate proofs the sequential solver tries between cancellation checks.
pub const CANCEL_POLL_INTERVAL: u64 = 4_096;
/// Candidate proofs per rayon thread in one round of the parallel solver.
pub const PARALLEL_CHUNK_PER_THREAD: u64 = 16_384;
