//! Longest-valid-chain conflict resolution.
//!
//! Peers are polled concurrently through a [`ChainFetcher`], each fetch bounded
//! by a timeout. Failed, slow or invalid peers are skipped; the longest chain
//! that is strictly longer than ours and passes validation wins.
use crate::config::NodeConfig;
use crate::error::{ChainError, FetchError};
use crate::peers::PeerAddress;
use crate::pow::ProofOfWork;
use crate::validator::validate_chain;
use crate::{Block, RemoteChain};
use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Capability to read a peer's chain. Transport lives behind this trait.
#[async_trait]
pub trait ChainFetcher: Send + Sync {
    async fn fetch_chain(&self, peer: &PeerAddress) -> Result<RemoteChain, FetchError>;
}

#[derive(Debug, Clone)]
pub struct Resolver {
    pow: ProofOfWork,
    peer_timeout: Duration,
    max_concurrent_fetches: usize,
}

impl Resolver {
    pub fn new(pow: ProofOfWork, peer_timeout: Duration, max_concurrent_fetches: usize) -> Self {
        Self {
            pow,
            peer_timeout,
            max_concurrent_fetches: max_concurrent_fetches.max(1),
        }
    }

    pub fn from_config(config: &NodeConfig) -> Self {
        Self::new(
            ProofOfWork::new(config.difficulty),
            config.peer_timeout,
            config.max_concurrent_fetches,
        )
    }

    pub fn pow(&self) -> &ProofOfWork {
        &self.pow
    }

    /// Poll `peers` and return the chain to adopt, if any peer has a valid
    /// chain strictly longer than `local_len`.
    pub async fn resolve<'a, F, I>(
        &self,
        local_len: usize,
        peers: I,
        fetcher: &F,
    ) -> Option<Vec<Block>>
    where
        F: ChainFetcher + ?Sized,
        I: IntoIterator<Item = &'a PeerAddress>,
    {
        let timeout = self.peer_timeout;
        let peers: Vec<&'a PeerAddress> = peers.into_iter().collect();
        let mut responses = stream::iter(peers)
            .map(|peer| async move {
                let outcome = match tokio::time::timeout(timeout, fetcher.fetch_chain(peer)).await {
                    Ok(outcome) => outcome,
                    Err(_) => Err(FetchError::Timeout {
                        peer: peer.to_string(),
                    }),
                };
                (peer, outcome)
            })
            .buffer_unordered(self.max_concurrent_fetches)
            .boxed();

        let mut best_length = local_len;
        let mut best_chain = None;

        while let Some((peer, outcome)) = responses.next().await {
            let remote = match outcome {
                Ok(remote) => remote,
                Err(e) => {
                    warn!(%peer, error = %e, "skipping unreachable peer");
                    continue;
                }
            };
            if remote.length <= best_length {
                debug!(%peer, length = remote.length, best_length, "peer chain not longer");
                continue;
            }
            if let Err(e) = self.check(&remote) {
                warn!(%peer, error = %e, "discarding invalid peer chain");
                continue;
            }
            info!(%peer, length = remote.length, "found longer valid chain");
            best_length = remote.length;
            best_chain = Some(remote.chain);
        }

        best_chain
    }

    fn check(&self, remote: &RemoteChain) -> Result<(), ChainError> {
        if remote.length != remote.chain.len() {
            return Err(ChainError::LengthMismatch {
                reported: remote.length,
                actual: remote.chain.len(),
            });
        }
        validate_chain(&remote.chain, &self.pow)
    }
}
