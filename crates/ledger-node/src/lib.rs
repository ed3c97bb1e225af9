//! HTTP control surface for a ledger node and the HTTP transport used to
//! read peers' chains.
pub mod api;
pub mod client;

pub use api::{router, AppState};
pub use client::HttpChainFetcher;

use ledger_core::{LedgerService, NodeConfig};
use std::sync::Arc;

/// Build a node with an HTTP peer fetcher bounded by the configured timeout.
pub fn build_service(config: NodeConfig, node_id: String) -> reqwest::Result<Arc<LedgerService>> {
    let fetcher = HttpChainFetcher::new(config.peer_timeout)?;
    Ok(Arc::new(LedgerService::new(config, node_id, Arc::new(fetcher))))
}

/// Random node identifier: a v4 UUID without hyphens.
pub fn node_identifier() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}
