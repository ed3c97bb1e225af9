use crate::constants::{GENESIS_PREVIOUS_HASH, GENESIS_PROOF};
use crate::error::{LedgerError, PeerError};
use crate::hasher::digest;
use crate::peers::PeerAddress;
use crate::{Block, Transaction};
use std::collections::BTreeSet;
use std::mem;
use tracing::{debug, info};

/// The local chain, the staging pool of unmined transactions and the set of
/// registered peers.
///
/// `Ledger` does no locking of its own; share it through
/// [`LedgerService`](crate::LedgerService).
#[derive(Debug, Clone)]
pub struct Ledger {
    chain: Vec<Block>,
    pending: Vec<Transaction>,
    peers: BTreeSet<PeerAddress>,
}

impl Default for Ledger {
    fn default() -> Self {
        Self::new()
    }
}

impl Ledger {
    /// A ledger holding only the genesis block.
    pub fn new() -> Self {
        let mut ledger = Self {
            chain: Vec::new(),
            pending: Vec::new(),
            peers: BTreeSet::new(),
        };
        ledger.push_block(GENESIS_PROOF, GENESIS_PREVIOUS_HASH.to_string());
        ledger
    }

    /// Seal the pending pool into a new block and append it. With no
    /// `previous_hash`, the digest of the current last block is used.
    ///
    /// No proof validation happens here; callers must hand in a solved proof.
    pub fn seal_block(
        &mut self,
        proof: u64,
        previous_hash: Option<String>,
    ) -> Result<Block, LedgerError> {
        let previous_hash = match previous_hash {
            Some(hash) => hash,
            None => digest(self.last_block()?),
        };
        let block = self.push_block(proof, previous_hash);
        info!(index = block.index, txs = block.transactions.len(), "sealed block");
        Ok(block)
    }

    fn push_block(&mut self, proof: u64, previous_hash: String) -> Block {
        let index = self.chain.len() as u64 + 1;
        let transactions = mem::take(&mut self.pending);
        let block = Block::new(index, transactions, proof, previous_hash);
        self.chain.push(block.clone());
        block
    }

    /// Stage a transaction. Returns the index of the block that will hold it.
    pub fn queue_transaction(
        &mut self,
        sender: impl Into<String>,
        recipient: impl Into<String>,
        amount: u64,
    ) -> u64 {
        self.pending.push(Transaction::new(sender, recipient, amount));
        let next = self.next_index();
        debug!(next, pending = self.pending.len(), "queued transaction");
        next
    }

    pub fn last_block(&self) -> Result<&Block, LedgerError> {
        self.chain.last().ok_or(LedgerError::EmptyChain)
    }

    pub fn next_index(&self) -> u64 {
        self.chain.last().map_or(1, |block| block.index + 1)
    }

    pub fn chain(&self) -> &[Block] {
        &self.chain
    }

    pub fn len(&self) -> usize {
        self.chain.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chain.is_empty()
    }

    pub fn pending(&self) -> &[Transaction] {
        &self.pending
    }

    pub fn peers(&self) -> &BTreeSet<PeerAddress> {
        &self.peers
    }

    /// Normalise and add a peer. Returns `false` if it was already known.
    pub fn register_peer(&mut self, raw: &str) -> Result<bool, PeerError> {
        Ok(self.add_peer(PeerAddress::parse(raw)?))
    }

    pub fn add_peer(&mut self, peer: PeerAddress) -> bool {
        let added = self.peers.insert(peer.clone());
        if added {
            info!(%peer, "registered peer");
        }
        added
    }

    /// Swap in a chain wholesale. Validation is the caller's job.
    pub fn replace_chain(&mut self, chain: Vec<Block>) {
        info!(old = self.chain.len(), new = chain.len(), "replacing chain");
        self.chain = chain;
    }
}
