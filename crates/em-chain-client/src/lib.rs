use async_trait::async_trait;
use em_api_types::{ChainId, MintCompleted, TxReceipt, WalletAddress};
use thiserror::Error;
use tokio::sync::mpsc;

/// EIP-1193 error code for a request the user declined.
pub const USER_REJECTED_CODE: i64 = 4001;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ChainError {
    #[error("user rejected the request")]
    Rejected,
    #[error("provider error: {0}")]
    Provider(String),
}

impl ChainError {
    pub fn provider(message: impl Into<String>) -> Self {
        Self::Provider(message.into())
    }
}

pub type ChainResult<T> = Result<T, ChainError>;

/// Stream of decoded mint-completed events. Dropping it ends the subscription.
pub type MintEventStream = mpsc::UnboundedReceiver<MintCompleted>;

/// The user's wallet, reached through the standard request/response protocol.
#[async_trait]
pub trait WalletProvider: Send + Sync {
    /// `eth_chainId`
    async fn chain_id(&self) -> ChainResult<ChainId>;
    /// `eth_accounts`; never prompts.
    async fn accounts(&self) -> ChainResult<Vec<WalletAddress>>;
    /// `eth_requestAccounts`; opens the wallet's approval UI.
    async fn request_accounts(&self) -> ChainResult<Vec<WalletAddress>>;
}

/// A submitted transaction that has not been confirmed yet.
#[async_trait]
pub trait PendingTransaction: Send + Sync {
    fn tx_hash(&self) -> &str;
    async fn wait(&self) -> ChainResult<TxReceipt>;
}

/// The deployed NFT contract with its fixed interface.
#[async_trait]
pub trait MintContract: Send + Sync {
    fn address(&self) -> &str;
    /// `getTotalNFTsMintedSoFar()`
    async fn total_minted(&self) -> ChainResult<u64>;
    /// `makeAnEpicNFT()`, authorized by `from`.
    async fn make_epic_nft(&self, from: &WalletAddress) -> ChainResult<Box<dyn PendingTransaction>>;
    /// Subscribes to `NewEpicNFTMinted(address,uint256)`.
    async fn subscribe_minted(&self) -> ChainResult<MintEventStream>;
}
