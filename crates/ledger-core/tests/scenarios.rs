use async_trait::async_trait;
use ledger_core::validator::is_valid;
use ledger_core::{
    Block, ChainFetcher, FetchError, Ledger, LedgerService, NodeConfig, PeerAddress, ProofOfWork,
    RemoteChain, Resolver,
};
use std::collections::HashMap;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Duration;

const DIFFICULTY: usize = 2;

/// Serves canned chains keyed by peer; unknown peers are unreachable.
#[derive(Default, Clone)]
struct CannedPeers {
    chains: HashMap<PeerAddress, RemoteChain>,
}

#[async_trait]
impl ChainFetcher for CannedPeers {
    async fn fetch_chain(&self, peer: &PeerAddress) -> Result<RemoteChain, FetchError> {
        self.chains
            .get(peer)
            .cloned()
            .ok_or_else(|| FetchError::Unreachable {
                peer: peer.to_string(),
                reason: "no route to host".to_string(),
            })
    }
}

fn mine_chain(blocks: usize) -> Vec<Block> {
    let pow = ProofOfWork::new(DIFFICULTY);
    let cancel = AtomicBool::new(false);
    let mut ledger = Ledger::new();
    while ledger.len() < blocks {
        ledger.queue_transaction("miner", "alice", 1);
        let last = ledger.last_block().expect("genesis").proof;
        let proof = pow.solve(last, &cancel).expect("not cancelled");
        ledger.seal_block(proof, None).expect("seal");
    }
    ledger.chain().to_vec()
}

fn config() -> NodeConfig {
    NodeConfig {
        difficulty: DIFFICULTY,
        peer_timeout: Duration::from_millis(250),
        ..NodeConfig::default()
    }
}

#[test]
fn scenario_a_fresh_ledger() {
    let ledger = Ledger::new();
    assert_eq!(ledger.len(), 1);
    let genesis = &ledger.chain()[0];
    assert_eq!(genesis.previous_hash, "1");
    assert_eq!(genesis.proof, 100);
}

#[tokio::test]
async fn scenario_b_mining_drains_pool() -> anyhow::Result<()> {
    let svc = LedgerService::new(config(), "me", Arc::new(CannedPeers::default()));
    svc.submit_transaction("a".into(), "b".into(), 5).await;
    svc.submit_transaction("b".into(), "c".into(), 3).await;

    let block = svc.mine().await?;
    assert_eq!(block.transactions.len(), 3);
    assert_eq!(block.transactions[0].sender, "a");
    assert_eq!(block.transactions[1].sender, "b");
    assert_eq!(block.transactions[2].sender, "0");
    assert_eq!(block.transactions[2].recipient, "me");
    assert!(svc.pending().await.is_empty());
    Ok(())
}

#[test]
fn scenario_c_first_proof_for_genesis() {
    let pow = ProofOfWork::default();
    assert!(!pow.verify(100, 0));
    assert!(!pow.verify(100, 1));
    assert!(!pow.verify(100, 2));
    let proof = pow.solve(100, &AtomicBool::new(false)).expect("solvable");
    assert!(pow.verify(100, proof));
    assert!((0..proof).all(|p| !pow.verify(100, p)));
}

#[tokio::test]
async fn scenario_d_valid_shorter_beats_invalid_longer() -> anyhow::Result<()> {
    let x = PeerAddress::parse("http://10.0.0.1:5000")?;
    let y = PeerAddress::parse("http://10.0.0.2:5000")?;
    let mut forged = mine_chain(7);
    forged[3].transactions[0].amount = 1_000_000;

    let mut peers = CannedPeers::default();
    peers.chains.insert(x.clone(), RemoteChain::new(mine_chain(5)));
    peers.chains.insert(y.clone(), RemoteChain::new(forged));

    let resolver = Resolver::from_config(&config());
    let adopted = resolver.resolve(1, [&x, &y], &peers).await;
    assert_eq!(adopted.map(|c| c.len()), Some(5));

    assert!(resolver.resolve(5, [&x, &y], &peers).await.is_none());
    assert!(resolver.resolve(6, [&x, &y], &peers).await.is_none());

    let svc = LedgerService::new(config(), "me", Arc::new(peers));
    svc.register_peers(&["http://10.0.0.1:5000", "10.0.0.2:5000"]).await?;
    let resolution = svc.resolve().await;
    assert!(resolution.replaced);
    assert_eq!(resolution.chain.len(), 5);
    assert!(is_valid(&resolution.chain, svc.pow()));
    assert_eq!(svc.chain_snapshot().await.length, 5);

    // The adopted chain is extended normally afterwards.
    let block = svc.mine().await?;
    assert_eq!(block.index, 6);
    assert!(is_valid(&svc.chain_snapshot().await.chain, svc.pow()));
    Ok(())
}

#[tokio::test]
async fn scenario_e_no_usable_peers() -> anyhow::Result<()> {
    let svc = LedgerService::new(config(), "me", Arc::new(CannedPeers::default()));
    let before = svc.chain_snapshot().await;

    let resolution = svc.resolve().await;
    assert!(!resolution.replaced);
    assert_eq!(resolution.chain, before.chain);

    svc.register_peers(&["10.9.9.9:1", "10.9.9.8:1"]).await?;
    let resolution = svc.resolve().await;
    assert!(!resolution.replaced);
    assert_eq!(svc.chain_snapshot().await.chain, before.chain);
    Ok(())
}

#[tokio::test]
async fn longer_local_chain_is_authoritative() -> anyhow::Result<()> {
    let peer = PeerAddress::parse("10.0.0.3:5000")?;
    let mut peers = CannedPeers::default();
    peers.chains.insert(peer, RemoteChain::new(mine_chain(2)));

    let svc = LedgerService::new(config(), "me", Arc::new(peers));
    svc.register_peers(&["10.0.0.3:5000"]).await?;
    svc.mine().await?;
    svc.mine().await?;

    let resolution = svc.resolve().await;
    assert!(!resolution.replaced);
    assert_eq!(resolution.chain.len(), 3);
    Ok(())
}
