use thiserror::Error;

/// Errors surfaced by ledger operations.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// The chain has no blocks. Construction always seals genesis, so this is
    /// an invariant violation.
    #[error("chain is empty")]
    EmptyChain,

    #[error("missing field `{0}`")]
    MissingField(&'static str),

    #[error(transparent)]
    Peer(#[from] PeerError),

    #[error("no peer addresses supplied")]
    NoPeers,

    #[error("mining was cancelled")]
    MiningCancelled,

    #[error("chain tip kept moving; gave up after {0} attempts")]
    StaleTip(u32),

    #[error("proof-of-work worker failed: {0}")]
    Worker(String),
}

/// Reasons a chain fails validation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ChainError {
    #[error("chain has no blocks")]
    Empty,

    #[error("first block (index {index}) is not a genesis block")]
    BadGenesis { index: u64 },

    #[error("block {index} does not link to the digest of its predecessor")]
    BrokenLink { index: u64 },

    #[error("block {index} carries a proof that does not solve the puzzle")]
    InvalidProof { index: u64 },

    #[error("block {index} follows block {previous} out of sequence")]
    IndexGap { index: u64, previous: u64 },

    #[error("reported length {reported} does not match {actual} blocks")]
    LengthMismatch { reported: usize, actual: usize },
}

/// Failures while fetching a peer's chain. All of them mean "skip this peer".
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("peer {peer} unreachable: {reason}")]
    Unreachable { peer: String, reason: String },

    #[error("peer {peer} answered with status {status}")]
    Status { peer: String, status: u16 },

    #[error("peer {peer} timed out")]
    Timeout { peer: String },

    #[error("peer {peer} sent a malformed chain: {reason}")]
    Malformed { peer: String, reason: String },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PeerError {
    #[error("invalid peer address `{0}`")]
    Invalid(String),
}
