//! Ledger engine: blocks, the proof-of-work puzzle, chain validation and
//! longest-valid-chain consensus between peers.
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

pub mod config;
pub mod consensus;
pub mod constants;
pub mod error;
pub mod hasher;
pub mod ledger;
pub mod peers;
pub mod pow;
pub mod service;
pub mod validator;

pub use config::NodeConfig;
pub use consensus::{ChainFetcher, Resolver};
pub use error::{ChainError, FetchError, LedgerError, PeerError};
pub use ledger::Ledger;
pub use peers::PeerAddress;
pub use pow::ProofOfWork;
pub use service::LedgerService;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub sender: String,
    pub recipient: String,
    pub amount: u64,
}

impl Transaction {
    pub fn new(sender: impl Into<String>, recipient: impl Into<String>, amount: u64) -> Self {
        Self {
            sender: sender.into(),
            recipient: recipient.into(),
            amount,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub index: u64,
    /// Unix time in seconds, with sub-second precision.
    pub timestamp: f64,
    pub transactions: Vec<Transaction>,
    pub proof: u64,
    pub previous_hash: String,
}

impl Block {
    pub fn new(
        index: u64,
        transactions: Vec<Transaction>,
        proof: u64,
        previous_hash: String,
    ) -> Self {
        Self {
            index,
            timestamp: unix_now(),
            transactions,
            proof,
            previous_hash,
        }
    }

    /// Hex digest of the block's canonical encoding.
    pub fn hash(&self) -> String {
        hasher::digest(self)
    }
}

/// A chain as exchanged between nodes.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RemoteChain {
    pub chain: Vec<Block>,
    pub length: usize,
}

impl RemoteChain {
    pub fn new(chain: Vec<Block>) -> Self {
        let length = chain.len();
        Self { chain, length }
    }
}

pub(crate) fn unix_now() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_block() -> Block {
        Block {
            index: 2,
            timestamp: 1_506_057_125.900785,
            transactions: vec![
                Transaction::new("a", "b", 5),
                Transaction::new("b", "c", 3),
            ],
            proof: 35_293,
            previous_hash: "1".to_string(),
        }
    }

    #[test]
    fn block_new_example() {
        let block = Block::new(3, vec![], 42, "abc".to_string());
        assert_eq!(block.index, 3);
        assert_eq!(block.proof, 42);
        assert_eq!(block.previous_hash, "abc");
        assert!(block.transactions.is_empty());
        assert!(block.timestamp > 1_600_000_000.0);
    }

    #[test]
    fn transaction_serialization_example() {
        let tx = Transaction::new("Alice", "Bob", 10);
        let json = serde_json::to_string(&tx).unwrap();
        assert_eq!(json, r#"{"sender":"Alice","recipient":"Bob","amount":10}"#);
        let back: Transaction = serde_json::from_str(&json).unwrap();
        assert_eq!(tx, back);
    }

    #[test]
    fn block_wire_fields() {
        let value = serde_json::to_value(sample_block()).unwrap();
        let obj = value.as_object().unwrap();
        let mut keys: Vec<&str> = obj.keys().map(String::as_str).collect();
        keys.sort_unstable();
        assert_eq!(
            keys,
            ["index", "previous_hash", "proof", "timestamp", "transactions"]
        );
    }

    #[test]
    fn block_json_keeps_digest() {
        let block = sample_block();
        let json = serde_json::to_string(&block).unwrap();
        let back: Block = serde_json::from_str(&json).unwrap();
        assert_eq!(block.hash(), back.hash());
    }

    #[test]
    fn remote_chain_length_matches() {
        let remote = RemoteChain::new(vec![sample_block(), sample_block()]);
        assert_eq!(remote.length, 2);
        let json = serde_json::to_value(&remote).unwrap();
        assert_eq!(json["length"], 2);
        assert_eq!(json["chain"].as_array().unwrap().len(), 2);
    }
}
