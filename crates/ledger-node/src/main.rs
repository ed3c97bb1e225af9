use anyhow::Context;
use clap::Parser;
use ledger_core::constants::{
    MAX_CONCURRENT_FETCHES, MAX_MINING_ATTEMPTS, MINING_REWARD, PEER_TIMEOUT_MS,
    POW_TARGET_DIFFICULTY,
};
use ledger_core::NodeConfig;
use ledger_node::{build_service, node_identifier, router, AppState};
use std::{net::SocketAddr, time::Duration};
use tracing::{info, Level};

#[derive(Parser, Debug)]
#[command(name = "ledger-node", about = "Proof-of-work ledger node")]
struct Args {
    /// Address to listen on, e.g. 127.0.0.1:5000
    #[arg(long, env = "LEDGER_LISTEN", default_value = "127.0.0.1:5000")]
    listen: String,

    /// Leading zero hex digits required of a proof hash
    #[arg(long, env = "LEDGER_DIFFICULTY", default_value_t = POW_TARGET_DIFFICULTY)]
    difficulty: usize,

    /// Peer to register at startup (repeatable, or comma separated in the env var)
    #[arg(long = "peer", env = "LEDGER_PEERS", value_delimiter = ',')]
    peers: Vec<String>,

    /// Per-peer time limit when fetching chains, in milliseconds
    #[arg(long, env = "LEDGER_PEER_TIMEOUT_MS", default_value_t = PEER_TIMEOUT_MS)]
    peer_timeout_ms: u64,

    /// How many peers are polled at once during resolution
    #[arg(long, env = "LEDGER_MAX_CONCURRENT_FETCHES", default_value_t = MAX_CONCURRENT_FETCHES)]
    max_concurrent_fetches: usize,

    /// Amount paid to this node for each mined block
    #[arg(long, env = "LEDGER_MINING_REWARD", default_value_t = MINING_REWARD)]
    mining_reward: u64,

    /// Search proofs on all cores
    #[arg(long, env = "LEDGER_PARALLEL_MINING")]
    parallel_mining: bool,
}

impl Args {
    fn config(&self) -> NodeConfig {
        NodeConfig {
            difficulty: self.difficulty,
            mining_reward: self.mining_reward,
            peer_timeout: Duration::from_millis(self.peer_timeout_ms),
            max_concurrent_fetches: self.max_concurrent_fetches,
            max_mining_attempts: MAX_MINING_ATTEMPTS,
            parallel_mining: self.parallel_mining,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(Level::DEBUG)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let config = args.config();
    let node_id = node_identifier();
    info!(%node_id, difficulty = config.difficulty, "starting ledger-node");

    let ledger = build_service(config, node_id).context("building HTTP client")?;
    if !args.peers.is_empty() {
        let total = ledger
            .register_peers(&args.peers)
            .await
            .context("registering startup peers")?;
        info!(total, "registered startup peers");
    }

    let app = router(AppState { ledger });

    let addr: SocketAddr = args.listen.parse()?;
    info!("ledger-node listening on http://{addr}");
    axum::serve(tokio::net::TcpListener::bind(addr).await?, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("shutting down");
        })
        .await?;
    Ok(())
}
