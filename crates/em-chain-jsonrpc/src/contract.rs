use async_trait::async_trait;
use em_api_types::{MintCompleted, TxReceipt, WalletAddress};
use em_chain_client::{
    ChainError, ChainResult, MintContract, MintEventStream, PendingTransaction,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tracing::{debug, warn};

use crate::JsonRpcTransport;
use crate::abi::{
    decode_minted_log, decode_total_minted, mint_calldata, minted_topic, parse_quantity,
    total_minted_calldata,
};

/// The deployed NFT contract, driven through the wallet's JSON-RPC endpoint.
///
/// Receipts and event filters are polled every `poll_interval`. A filter the
/// node has dropped is installed again on the next failed poll.
pub struct EpicNftContract {
    transport: Arc<JsonRpcTransport>,
    address: String,
    poll_interval: Duration,
}

impl EpicNftContract {
    pub fn new(transport: Arc<JsonRpcTransport>, address: impl Into<String>, poll_interval: Duration) -> Self {
        Self {
            transport,
            address: address.into(),
            poll_interval,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ReceiptResponse {
    #[serde(rename = "blockNumber", default)]
    block_number: Option<String>,
    #[serde(default)]
    status: Option<String>,
}

#[derive(Debug, Deserialize)]
struct LogEntry {
    #[serde(default)]
    topics: Vec<String>,
    #[serde(default)]
    data: String,
    #[serde(default)]
    removed: bool,
}

#[async_trait]
impl MintContract for EpicNftContract {
    fn address(&self) -> &str {
        &self.address
    }

    async fn total_minted(&self) -> ChainResult<u64> {
        let raw: String = self
            .transport
            .request(
                "eth_call",
                json!([
                    { "to": self.address, "data": total_minted_calldata() },
                    "latest"
                ]),
            )
            .await?;
        decode_total_minted(&raw)
    }

    async fn make_epic_nft(&self, from: &WalletAddress) -> ChainResult<Box<dyn PendingTransaction>> {
        let tx_hash: String = self
            .transport
            .request(
                "eth_sendTransaction",
                json!([{ "from": from.0, "to": self.address, "data": mint_calldata() }]),
            )
            .await?;

        Ok(Box::new(JsonRpcPendingTx {
            transport: self.transport.clone(),
            tx_hash,
            poll_interval: self.poll_interval,
        }))
    }

    async fn subscribe_minted(&self) -> ChainResult<MintEventStream> {
        let filter_id = install_minted_filter(&self.transport, &self.address).await?;

        let (sender, receiver) = mpsc::unbounded_channel();
        tokio::spawn(poll_minted_filter(
            self.transport.clone(),
            self.address.clone(),
            filter_id,
            self.poll_interval,
            sender,
        ));
        Ok(receiver)
    }
}

async fn install_minted_filter(transport: &JsonRpcTransport, address: &str) -> ChainResult<String> {
    let filter_id: String = transport
        .request(
            "eth_newFilter",
            json!([{ "address": address, "topics": [minted_topic()] }]),
        )
        .await?;
    debug!(%filter_id, "installed NewEpicNFTMinted filter");
    Ok(filter_id)
}

async fn poll_minted_filter(
    transport: Arc<JsonRpcTransport>,
    address: String,
    mut filter_id: String,
    poll_interval: Duration,
    sender: mpsc::UnboundedSender<MintCompleted>,
) {
    let mut ticker = tokio::time::interval(poll_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    'poll: loop {
        ticker.tick().await;
        if sender.is_closed() {
            break;
        }

        let logs: Vec<LogEntry> = match transport
            .request("eth_getFilterChanges", json!([filter_id]))
            .await
        {
            Ok(logs) => logs,
            Err(err) => {
                // Nodes expire idle filters; any failed poll gets a fresh one.
                warn!("failed to poll NewEpicNFTMinted filter {}: {}", filter_id, err);
                match install_minted_filter(&transport, &address).await {
                    Ok(fresh) => filter_id = fresh,
                    Err(err) => warn!("failed to reinstall NewEpicNFTMinted filter: {}", err),
                }
                continue;
            }
        };

        for log in logs.into_iter().filter(|log| !log.removed) {
            match decode_minted_log(&log.topics, &log.data) {
                Ok(event) => {
                    if sender.send(event).is_err() {
                        break 'poll;
                    }
                }
                Err(err) => warn!("skipping undecodable NewEpicNFTMinted log: {}", err),
            }
        }
    }

    if let Err(err) = transport
        .request::<bool>("eth_uninstallFilter", json!([filter_id]))
        .await
    {
        debug!("failed to uninstall filter {}: {}", filter_id, err);
    }
}

struct JsonRpcPendingTx {
    transport: Arc<JsonRpcTransport>,
    tx_hash: String,
    poll_interval: Duration,
}

#[async_trait]
impl PendingTransaction for JsonRpcPendingTx {
    fn tx_hash(&self) -> &str {
        &self.tx_hash
    }

    async fn wait(&self) -> ChainResult<TxReceipt> {
        loop {
            let receipt: Option<ReceiptResponse> = self
                .transport
                .request("eth_getTransactionReceipt", json!([self.tx_hash]))
                .await?;

            if let Some(receipt) = receipt {
                if receipt.status.as_deref() == Some("0x0") {
                    return Err(ChainError::provider(format!(
                        "transaction {} reverted",
                        self.tx_hash
                    )));
                }

                let block_number = receipt
                    .block_number
                    .as_deref()
                    .map(parse_quantity)
                    .transpose()?;

                return Ok(TxReceipt {
                    tx_hash: self.tx_hash.clone(),
                    block_number,
                });
            }

            tokio::time::sleep(self.poll_interval).await;
        }
    }
}
