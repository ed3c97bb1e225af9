use crate::config::NodeConfig;
use crate::consensus::{ChainFetcher, Resolver};
use crate::constants::REWARD_SENDER;
use crate::error::LedgerError;
use crate::ledger::Ledger;
use crate::peers::PeerAddress;
use crate::pow::ProofOfWork;
use crate::{Block, RemoteChain, Transaction};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{watch, RwLock};
use tracing::{info, warn};

/// Outcome of a consensus round.
#[derive(Debug, Clone)]
pub struct Resolution {
    pub replaced: bool,
    pub chain: Vec<Block>,
}

/// Shared handle to a node's ledger.
///
/// Reads and transaction submission take the lock briefly. Mining solves the
/// puzzle on a blocking thread without holding the lock and only takes the
/// write lock to re-check the tip and seal. Every chain replacement bumps a
/// generation counter which aborts in-flight proof searches.
pub struct LedgerService {
    ledger: RwLock<Ledger>,
    fetcher: Arc<dyn ChainFetcher>,
    resolver: Resolver,
    config: NodeConfig,
    node_id: String,
    generation: watch::Sender<u64>,
}

/// Sets the flag when dropped so an abandoned request stops its search.
struct CancelOnDrop(Arc<AtomicBool>);

impl Drop for CancelOnDrop {
    fn drop(&mut self) {
        self.0.store(true, Ordering::Relaxed);
    }
}

impl LedgerService {
    pub fn new(config: NodeConfig, node_id: impl Into<String>, fetcher: Arc<dyn ChainFetcher>) -> Self {
        let (generation, _) = watch::channel(0);
        Self {
            ledger: RwLock::new(Ledger::new()),
            fetcher,
            resolver: Resolver::from_config(&config),
            config,
            node_id: node_id.into(),
            generation,
        }
    }

    pub fn node_id(&self) -> &str {
        &self.node_id
    }

    pub fn config(&self) -> &NodeConfig {
        &self.config
    }

    pub fn pow(&self) -> &ProofOfWork {
        self.resolver.pow()
    }

    pub async fn submit_transaction(&self, sender: String, recipient: String, amount: u64) -> u64 {
        self.ledger.write().await.queue_transaction(sender, recipient, amount)
    }

    pub async fn chain_snapshot(&self) -> RemoteChain {
        RemoteChain::new(self.ledger.read().await.chain().to_vec())
    }

    pub async fn pending(&self) -> Vec<Transaction> {
        self.ledger.read().await.pending().to_vec()
    }

    pub async fn peers(&self) -> Vec<PeerAddress> {
        self.ledger.read().await.peers().iter().cloned().collect()
    }

    /// Register every address in `raws`. Nothing is registered if any address
    /// is invalid. Returns the number of known peers afterwards.
    pub async fn register_peers<S: AsRef<str>>(&self, raws: &[S]) -> Result<usize, LedgerError> {
        if raws.is_empty() {
            return Err(LedgerError::NoPeers);
        }
        let parsed = raws
            .iter()
            .map(|raw| PeerAddress::parse(raw.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;

        let mut ledger = self.ledger.write().await;
        for peer in parsed {
            ledger.add_peer(peer);
        }
        Ok(ledger.peers().len())
    }

    /// Produce the next block: solve the puzzle against the current tip, then
    /// seal the pending pool plus the mining reward.
    ///
    /// If another miner seals first, the search restarts against the new tip.
    /// If a peer's chain replaces ours mid-search, mining is abandoned with
    /// [`LedgerError::MiningCancelled`].
    pub async fn mine(&self) -> Result<Block, LedgerError> {
        let mut generation = self.generation.subscribe();
        let attempts = self.config.max_mining_attempts.max(1);

        for attempt in 1..=attempts {
            let tip = {
                let ledger = self.ledger.read().await;
                generation.mark_unchanged();
                ledger.last_block()?.clone()
            };
            let tip_hash = tip.hash();

            let proof = self.solve(tip.proof, &mut generation).await?;

            let mut ledger = self.ledger.write().await;
            let current = ledger.last_block()?;
            if current.index != tip.index || current.hash() != tip_hash {
                warn!(attempt, expected = tip.index, found = current.index, "tip moved while mining");
                continue;
            }
            ledger.queue_transaction(REWARD_SENDER, self.node_id.as_str(), self.config.mining_reward);
            let block = ledger.seal_block(proof, Some(tip_hash))?;
            info!(index = block.index, proof, attempt, "mined block");
            return Ok(block);
        }
        Err(LedgerError::StaleTip(attempts))
    }

    async fn solve(&self, last_proof: u64, generation: &mut watch::Receiver<u64>) -> Result<u64, LedgerError> {
        let cancel = Arc::new(AtomicBool::new(false));
        let _guard = CancelOnDrop(cancel.clone());

        let pow = *self.pow();
        let parallel = self.config.parallel_mining;
        let flag = cancel.clone();
        let mut worker = tokio::task::spawn_blocking(move || {
            if parallel {
                pow.solve_parallel(last_proof, &flag)
            } else {
                pow.solve(last_proof, &flag)
            }
        });

        let joined = tokio::select! {
            joined = &mut worker => joined,
            Ok(()) = generation.changed() => {
                info!(last_proof, "chain replaced, abandoning proof search");
                cancel.store(true, Ordering::Relaxed);
                let _ = worker.await;
                return Err(LedgerError::MiningCancelled);
            }
        };

        match joined {
            Ok(Some(proof)) => Ok(proof),
            Ok(None) => Err(LedgerError::MiningCancelled),
            Err(e) => Err(LedgerError::Worker(e.to_string())),
        }
    }

    /// Run a consensus round against the registered peers. The fetch happens
    /// without holding the ledger lock; the swap re-checks the length under
    /// the write lock.
    pub async fn resolve(&self) -> Resolution {
        let (local_len, peers) = {
            let ledger = self.ledger.read().await;
            (ledger.len(), ledger.peers().iter().cloned().collect::<Vec<_>>())
        };

        let candidate = self
            .resolver
            .resolve(local_len, &peers, &*self.fetcher)
            .await;

        let mut ledger = self.ledger.write().await;
        if let Some(chain) = candidate {
            if chain.len() > ledger.len() {
                self.install(&mut ledger, chain);
                return Resolution {
                    replaced: true,
                    chain: ledger.chain().to_vec(),
                };
            }
            info!(local = ledger.len(), "local chain caught up during resolution, keeping it");
        }
        Resolution {
            replaced: false,
            chain: ledger.chain().to_vec(),
        }
    }

    fn install(&self, ledger: &mut Ledger, chain: Vec<Block>) {
        ledger.replace_chain(chain);
        self.generation.send_modify(|g| *g += 1);
    }
}
