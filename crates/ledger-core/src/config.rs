use crate::constants::{
    MAX_CONCURRENT_FETCHES, MAX_MINING_ATTEMPTS, MINING_REWARD, PEER_TIMEOUT_MS,
    POW_TARGET_DIFFICULTY,
};
use std::time::Duration;

/// Tunables for a node. Binaries build this from their command line.
#[derive(Debug, Clone)]
pub struct NodeConfig {
    /// Leading zero hex digits a proof hash must have.
    pub difficulty: usize,
    pub mining_reward: u64,
    /// Upper bound on one peer's chain fetch during resolution.
    pub peer_timeout: Duration,
    pub max_concurrent_fetches: usize,
    /// How often mining restarts after losing a race for the tip.
    pub max_mining_attempts: u32,
    /// Search proofs on the rayon pool instead of a single thread.
    pub parallel_mining: bool,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            difficulty: POW_TARGET_DIFFICULTY,
            mining_reward: MINING_REWARD,
            peer_timeout: Duration::from_millis(PEER_TIMEOUT_MS),
            max_concurrent_fetches: MAX_CONCURRENT_FETCHES,
            max_mining_attempts: MAX_MINING_ATTEMPTS,
            parallel_mining: false,
        }
    }
}
