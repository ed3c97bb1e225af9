//! Canonical encoding and SHA-256 digest of blocks.
//!
//! The encoding is a JSON object with keys in lexicographic order at every
//! level, built straight from the typed fields so that two blocks with the
//! same content always produce the same bytes.
use crate::{Block, Transaction};
use serde_json::{Map, Number, Value};
use sha2::{Digest, Sha256};

fn transaction_value(tx: &Transaction) -> Value {
    let mut map = Map::new();
    map.insert("amount".into(), Value::from(tx.amount));
    map.insert("recipient".into(), Value::from(tx.recipient.as_str()));
    map.insert("sender".into(), Value::from(tx.sender.as_str()));
    Value::Object(map)
}

fn block_value(block: &Block) -> Value {
    let timestamp = Number::from_f64(block.timestamp)
        .map(Value::Number)
        .unwrap_or(Value::Null);
    let transactions = block.transactions.iter().map(transaction_value).collect();

    let mut map = Map::new();
    map.insert("index".into(), Value::from(block.index));
    map.insert("previous_hash".into(), Value::from(block.previous_hash.as_str()));
    map.insert("proof".into(), Value::from(block.proof));
    map.insert("timestamp".into(), timestamp);
    map.insert("transactions".into(), Value::Array(transactions));
    Value::Object(map)
}

pub fn canonical_bytes(block: &Block) -> Vec<u8> {
    block_value(block).to_string().into_bytes()
}

pub fn sha256(bytes: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    let digest = hasher.finalize();
    let mut out = [0u8; 32];
    out.copy_from_slice(&digest[..]);
    out
}

/// Lowercase hex SHA-256 of the block's canonical bytes.
pub fn digest(block: &Block) -> String {
    hex::encode(sha256(&canonical_bytes(block)))
}
