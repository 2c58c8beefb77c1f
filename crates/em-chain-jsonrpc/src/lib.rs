pub mod abi;
mod contract;

use async_trait::async_trait;
use em_api_types::{ChainId, WalletAddress};
use em_chain_client::{ChainError, ChainResult, USER_REJECTED_CODE, WalletProvider};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::debug;

pub use contract::EpicNftContract;

/// JSON-RPC 2.0 client for an Ethereum wallet endpoint.
pub struct JsonRpcTransport {
    endpoint: String,
    http: reqwest::Client,
    next_id: AtomicU64,
}

#[derive(Debug, Serialize)]
struct RpcRequest<'a> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    params: Value,
}

#[derive(Debug, Deserialize)]
struct RpcResponse {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<RpcErrorObject>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorObject {
    code: i64,
    message: String,
}

impl JsonRpcTransport {
    pub fn new(endpoint: impl Into<String>) -> Self {
        let endpoint: String = endpoint.into();
        Self {
            endpoint: endpoint.trim_end_matches('/').to_string(),
            http: reqwest::Client::new(),
            next_id: AtomicU64::new(1),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub async fn request<T: DeserializeOwned>(&self, method: &str, params: Value) -> ChainResult<T> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let body = RpcRequest {
            jsonrpc: "2.0",
            id,
            method,
            params,
        };
        debug!(method, id, "json-rpc request");

        let response = self
            .http
            .post(&self.endpoint)
            .json(&body)
            .send()
            .await
            .map_err(|err| ChainError::provider(format!("{method} transport: {err}")))?;

        let status = response.status();
        let text = response.text().await.unwrap_or_default();

        let parsed = match serde_json::from_str::<RpcResponse>(&text) {
            Ok(parsed) => parsed,
            Err(_) if !status.is_success() => {
                return Err(ChainError::provider(format!("{method} HTTP {status}: {text}")));
            }
            Err(err) => {
                return Err(ChainError::provider(format!("{method} parse: {err}")));
            }
        };

        if let Some(error) = parsed.error {
            if error.code == USER_REJECTED_CODE {
                return Err(ChainError::Rejected);
            }
            return Err(ChainError::provider(format!(
                "{method} rpc error {}: {}",
                error.code, error.message
            )));
        }

        if !status.is_success() {
            return Err(ChainError::provider(format!("{method} HTTP {status}: {text}")));
        }

        serde_json::from_value(parsed.result.unwrap_or(Value::Null))
            .map_err(|err| ChainError::provider(format!("{method} result: {err}")))
    }
}

/// Wallet capability reached over JSON-RPC.
pub struct JsonRpcWallet {
    transport: Arc<JsonRpcTransport>,
}

impl JsonRpcWallet {
    pub fn new(transport: Arc<JsonRpcTransport>) -> Self {
        Self { transport }
    }
}

#[async_trait]
impl WalletProvider for JsonRpcWallet {
    async fn chain_id(&self) -> ChainResult<ChainId> {
        let raw: String = self.transport.request("eth_chainId", json!([])).await?;
        Ok(ChainId(raw))
    }

    async fn accounts(&self) -> ChainResult<Vec<WalletAddress>> {
        let raw: Vec<String> = self.transport.request("eth_accounts", json!([])).await?;
        Ok(raw.into_iter().map(WalletAddress).collect())
    }

    async fn request_accounts(&self) -> ChainResult<Vec<WalletAddress>> {
        let raw: Vec<String> = self
            .transport
            .request("eth_requestAccounts", json!([]))
            .await?;
        Ok(raw.into_iter().map(WalletAddress).collect())
    }
}
