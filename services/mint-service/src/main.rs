mod alerts;

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::{get, post},
};
use em_api_types::{
    AlertsResponse, MintResponse, SessionConnectResponse, SessionStateResponse,
};
use em_chain_client::{MintContract, WalletProvider};
use em_chain_jsonrpc::{EpicNftContract, JsonRpcTransport, JsonRpcWallet};
use em_mint_core::{MintClient, MintConfig, MintError, WalletBinding};
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::{info, warn};

use crate::alerts::AlertQueue;

#[derive(Debug, Serialize)]
struct HealthResponse {
    service: &'static str,
    status: &'static str,
}

#[derive(Debug, Serialize)]
struct VersionResponse {
    service: &'static str,
    version: &'static str,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

type ApiResult<T> = Result<Json<T>, (StatusCode, Json<ErrorResponse>)>;

#[derive(Clone)]
struct AppState {
    client: Arc<MintClient>,
    alerts: Arc<AlertQueue>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = MintConfig::from_env()?;
    let alerts = Arc::new(AlertQueue::default());

    let binding = match config.wallet_url.as_deref() {
        Some(url) => {
            info!("using wallet at {}", url);
            Some(wallet_binding(url, &config))
        }
        None => {
            warn!("EM_WALLET_URL is not set; running without a wallet");
            None
        }
    };

    let client = Arc::new(MintClient::new(&config, binding, alerts.clone()));
    client.discover_session().await;

    let app = router(AppState { client, alerts });

    info!("mint-service listening on {}", config.bind_addr);
    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

fn wallet_binding(url: &str, config: &MintConfig) -> WalletBinding {
    let transport = Arc::new(JsonRpcTransport::new(url));
    let wallet: Arc<dyn WalletProvider> = Arc::new(JsonRpcWallet::new(transport.clone()));
    let contract: Arc<dyn MintContract> = Arc::new(EpicNftContract::new(
        transport,
        config.contract_address.clone(),
        config.poll_interval,
    ));
    WalletBinding { wallet, contract }
}

fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/version", get(version))
        .route("/session", get(session_state))
        .route("/session/connect", post(session_connect))
        .route("/mint", post(mint))
        .route("/alerts", get(drain_alerts))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!("failed to listen for shutdown signal: {}", err);
    }
    info!("shutting down");
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        service: "mint-service",
        status: "ok",
    })
}

async fn version() -> Json<VersionResponse> {
    Json(VersionResponse {
        service: "mint-service",
        version: env!("CARGO_PKG_VERSION"),
    })
}

async fn session_state(State(state): State<AppState>) -> Json<SessionStateResponse> {
    Json(state.client.snapshot().into())
}

async fn session_connect(State(state): State<AppState>) -> ApiResult<SessionConnectResponse> {
    let account = state.client.request_session().await.map_err(mint_error)?;
    Ok(Json(SessionConnectResponse { account: account.0 }))
}

async fn mint(State(state): State<AppState>) -> ApiResult<MintResponse> {
    // Run detached so a dropped HTTP request does not abandon the mint.
    let client = state.client.clone();
    let receipt = tokio::spawn(async move { client.mint().await })
        .await
        .map_err(internal_error)?
        .map_err(mint_error)?;

    Ok(Json(MintResponse {
        tx_url: state.client.orchestrator().tx_url(&receipt.tx_hash),
        tx_hash: receipt.tx_hash,
    }))
}

async fn drain_alerts(State(state): State<AppState>) -> Json<AlertsResponse> {
    Json(AlertsResponse {
        alerts: state.alerts.drain(),
    })
}

fn mint_error(err: MintError) -> (StatusCode, Json<ErrorResponse>) {
    let status = match &err {
        MintError::WalletUnavailable => StatusCode::SERVICE_UNAVAILABLE,
        MintError::WalletRejected => StatusCode::FORBIDDEN,
        MintError::NotConnected | MintError::NetworkMismatch { .. } => StatusCode::BAD_REQUEST,
        MintError::MintInFlight => StatusCode::CONFLICT,
        MintError::Provider(_) => StatusCode::BAD_GATEWAY,
        MintError::ConfirmationTimeout => StatusCode::GATEWAY_TIMEOUT,
    };
    (
        status,
        Json(ErrorResponse {
            error: err.to_string(),
        }),
    )
}

fn internal_error(err: impl std::fmt::Display) -> (StatusCode, Json<ErrorResponse>) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse {
            error: err.to_string(),
        }),
    )
}
