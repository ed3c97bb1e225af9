use async_trait::async_trait;
use ledger_core::{ChainFetcher, FetchError, PeerAddress, RemoteChain};
use reqwest::Client;
use std::time::Duration;
use tracing::debug;

/// Fetches peer chains over HTTP from `GET {peer}/chain`.
#[derive(Clone)]
pub struct HttpChainFetcher {
    client: Client,
}

impl HttpChainFetcher {
    pub fn new(timeout: Duration) -> reqwest::Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl ChainFetcher for HttpChainFetcher {
    async fn fetch_chain(&self, peer: &PeerAddress) -> Result<RemoteChain, FetchError> {
        let url = format!("{}/chain", peer.base_url());
        debug!(%url, "fetching peer chain");

        let response = self.client.get(&url).send().await.map_err(|e| {
            if e.is_timeout() {
                FetchError::Timeout {
                    peer: peer.to_string(),
                }
            } else {
                FetchError::Unreachable {
                    peer: peer.to_string(),
                    reason: e.to_string(),
                }
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                peer: peer.to_string(),
                status: status.as_u16(),
            });
        }

        response
            .json::<RemoteChain>()
            .await
            .map_err(|e| FetchError::Malformed {
                peer: peer.to_string(),
                reason: e.to_string(),
            })
    }
}
