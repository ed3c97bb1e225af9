use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use ledger_core::{Block, LedgerError, LedgerService, RemoteChain, Transaction};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

#[derive(Clone)]
pub struct AppState {
    pub ledger: Arc<LedgerService>,
}

#[derive(Serialize)]
struct Health {
    status: &'static str,
}

/// Incoming transaction. Fields are optional so that an absent field is
/// reported as a validation error rather than a body parse failure.
///
/// `amount` must be a non-negative whole number; fractional or negative
/// amounts fail body parsing and the request is rejected with 422.
#[derive(Debug, Deserialize)]
pub struct TransactionRequest {
    sender: Option<String>,
    recipient: Option<String>,
    amount: Option<u64>,
}

impl TransactionRequest {
    fn into_parts(self) -> Result<(String, String, u64), LedgerError> {
        let sender = self.sender.ok_or(LedgerError::MissingField("sender"))?;
        let recipient = self.recipient.ok_or(LedgerError::MissingField("recipient"))?;
        let amount = self.amount.ok_or(LedgerError::MissingField("amount"))?;
        Ok((sender, recipient, amount))
    }
}

#[derive(Serialize)]
struct Message {
    message: String,
}

#[derive(Serialize)]
struct MineResponse {
    message: &'static str,
    index: u64,
    transactions: Vec<Transaction>,
    proof: u64,
    previous_hash: String,
}

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    nodes: Vec<String>,
}

#[derive(Serialize)]
struct RegisterResponse {
    message: &'static str,
    total_nodes: Vec<String>,
}

#[derive(Serialize)]
struct ResolveResponse {
    message: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    new_chain: Option<Vec<Block>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    chain: Option<Vec<Block>>,
}

/// Maps ledger errors onto HTTP responses with a JSON `{error}` body.
pub struct ApiError(LedgerError);

impl From<LedgerError> for ApiError {
    fn from(value: LedgerError) -> Self {
        Self(value)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            LedgerError::MissingField(_) | LedgerError::Peer(_) | LedgerError::NoPeers => {
                StatusCode::BAD_REQUEST
            }
            LedgerError::MiningCancelled | LedgerError::StaleTip(_) => StatusCode::CONFLICT,
            LedgerError::EmptyChain | LedgerError::Worker(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            warn!(error = %self.0, "request failed");
        }
        let body = serde_json::json!({ "error": self.0.to_string() });
        (status, Json(body)).into_response()
    }
}

async fn health() -> Json<Health> {
    Json(Health { status: "ok" })
}

async fn mine(State(state): State<AppState>) -> Result<Json<MineResponse>, ApiError> {
    let block = state.ledger.mine().await?;
    Ok(Json(MineResponse {
        message: "New Block Forged",
        index: block.index,
        transactions: block.transactions,
        proof: block.proof,
        previous_hash: block.previous_hash,
    }))
}

async fn new_transaction(
    State(state): State<AppState>,
    Json(req): Json<TransactionRequest>,
) -> Result<(StatusCode, Json<Message>), ApiError> {
    let (sender, recipient, amount) = req.into_parts()?;
    let index = state
        .ledger
        .submit_transaction(sender, recipient, amount)
        .await;
    Ok((
        StatusCode::CREATED,
        Json(Message {
            message: format!("Transaction will be added to Block {index}"),
        }),
    ))
}

async fn full_chain(State(state): State<AppState>) -> Json<RemoteChain> {
    Json(state.ledger.chain_snapshot().await)
}

async fn register_nodes(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<RegisterResponse>), ApiError> {
    state.ledger.register_peers(&req.nodes).await?;
    let total_nodes = state
        .ledger
        .peers()
        .await
        .into_iter()
        .map(String::from)
        .collect();
    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            message: "New nodes have been added",
            total_nodes,
        }),
    ))
}

async fn resolve(State(state): State<AppState>) -> Json<ResolveResponse> {
    let resolution = state.ledger.resolve().await;
    info!(replaced = resolution.replaced, length = resolution.chain.len(), "consensus round");
    let response = if resolution.replaced {
        ResolveResponse {
            message: "Our chain was replaced",
            new_chain: Some(resolution.chain),
            chain: None,
        }
    } else {
        ResolveResponse {
            message: "Our chain is authoritative",
            new_chain: None,
            chain: Some(resolution.chain),
        }
    };
    Json(response)
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/mine", get(mine))
        .route("/transactions/new", post(new_transaction))
        .route("/chain", get(full_chain))
        .route("/nodes/register", post(register_nodes))
        .route("/nodes/resolve", get(resolve))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
