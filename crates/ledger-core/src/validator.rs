use crate::constants::{GENESIS_PREVIOUS_HASH, GENESIS_PROOF};
use crate::error::ChainError;
use crate::hasher::digest;
use crate::pow::ProofOfWork;
use crate::Block;
use tracing::debug;

/// Check that `chain` opens with the genesis block, then walk it from its
/// second block, checking each block against its predecessor: sequential
/// index, link hash and puzzle solution. Stops at the first violation.
/// Read-only.
pub fn validate_chain(chain: &[Block], pow: &ProofOfWork) -> Result<(), ChainError> {
    let first = chain.first().ok_or(ChainError::Empty)?;
    if !is_genesis(first) {
        return Err(ChainError::BadGenesis { index: first.index });
    }

    for pair in chain.windows(2) {
        let (prior, current) = (&pair[0], &pair[1]);

        if current.index != prior.index.wrapping_add(1) {
            return Err(ChainError::IndexGap {
                index: current.index,
                previous: prior.index,
            });
        }
        if current.previous_hash != digest(prior) {
            return Err(ChainError::BrokenLink {
                index: current.index,
            });
        }
        if !pow.verify(prior.proof, current.proof) {
            return Err(ChainError::InvalidProof {
                index: current.index,
            });
        }
    }
    Ok(())
}

fn is_genesis(block: &Block) -> bool {
    block.index == 1
        && block.proof == GENESIS_PROOF
        && block.previous_hash == GENESIS_PREVIOUS_HASH
}

pub fn is_valid(chain: &[Block], pow: &ProofOfWork) -> bool {
    match validate_chain(chain, pow) {
        Ok(()) => true,
        Err(e) => {
            debug!(error = %e, "chain rejected");
            false
        }
    }
}
