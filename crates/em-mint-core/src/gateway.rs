use em_api_types::{MintCompleted, TokenId, WalletAddress};
use em_chain_client::{MintContract, PendingTransaction};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::error::MintError;
use crate::state::SessionState;

pub type MintListener = Arc<dyn Fn(&MintCompleted) + Send + Sync>;

/// Wraps the NFT contract: the mint-count getter, the mint call, and the
/// `NewEpicNFTMinted` subscription that keeps the shared counter in sync.
pub struct ContractGateway {
    contract: Arc<dyn MintContract>,
    state: Arc<SessionState>,
    opensea_base: String,
    listeners: RwLock<Vec<MintListener>>,
    armed: AtomicBool,
}

impl ContractGateway {
    pub fn new(contract: Arc<dyn MintContract>, state: Arc<SessionState>, opensea_base: impl Into<String>) -> Self {
        Self {
            contract,
            state,
            opensea_base: opensea_base.into().trim_end_matches('/').to_owned(),
            listeners: RwLock::new(Vec::new()),
            armed: AtomicBool::new(false),
        }
    }

    pub fn contract_address(&self) -> &str {
        self.contract.address()
    }

    pub async fn read_mint_count(&self) -> Result<u64, MintError> {
        Ok(self.contract.total_minted().await?)
    }

    pub async fn submit_mint(&self, account: &WalletAddress) -> Result<Box<dyn PendingTransaction>, MintError> {
        Ok(self.contract.make_epic_nft(account).await?)
    }

    /// Marketplace page for a minted token.
    pub fn asset_url(&self, token_id: TokenId) -> String {
        format!("{}/{}/{}", self.opensea_base, self.contract.address(), token_id)
    }

    /// Registers a handler that runs after each event has been applied to
    /// the session state.
    pub fn on_mint_completed<F>(&self, handler: F)
    where
        F: Fn(&MintCompleted) + Send + Sync + 'static,
    {
        self.listeners
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Arc::new(handler));
    }

    /// True while a subscription is being set up or its event stream is open.
    pub fn is_armed(&self) -> bool {
        self.armed.load(Ordering::Acquire)
    }

    /// Reads the initial mint count and subscribes to mint events, unless a
    /// subscription is already live (`Ok(None)`). The slot is released when
    /// subscribing fails or when the event stream ends, so the next session
    /// can arm again.
    pub async fn arm_mint_events(self: &Arc<Self>) -> Result<Option<JoinHandle<()>>, MintError> {
        if self
            .armed
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Ok(None);
        }

        match self.read_mint_count().await {
            Ok(count) => self.state.set_mint_count(count),
            Err(err) => warn!("failed to read mint count: {}", err),
        }

        match self.subscribe_mint_events().await {
            Ok(task) => Ok(Some(task)),
            Err(err) => {
                self.armed.store(false, Ordering::Release);
                Err(err)
            }
        }
    }

    /// Forwards contract events into [`Self::handle_mint_completed`] until the
    /// provider closes the stream.
    async fn subscribe_mint_events(self: &Arc<Self>) -> Result<JoinHandle<()>, MintError> {
        let mut events = self.contract.subscribe_minted().await?;
        let gateway = Arc::clone(self);

        Ok(tokio::spawn(async move {
            while let Some(event) = events.recv().await {
                gateway.handle_mint_completed(event).await;
            }
            warn!("NewEpicNFTMinted stream closed; waiting for the next session to subscribe again");
            gateway.armed.store(false, Ordering::Release);
        }))
    }

    /// The only writer of the mint count after initialization. The count is
    /// re-read from the contract so mints from other sessions are included.
    pub async fn handle_mint_completed(&self, event: MintCompleted) {
        info!(from = %event.from, token_id = %event.token_id, "NewEpicNFTMinted");

        match self.read_mint_count().await {
            Ok(count) => {
                info!(count, "minted so far");
                self.state.set_mint_count(count);
            }
            Err(err) => warn!("failed to re-read mint count: {}", err),
        }

        self.state.set_minted_asset_url(self.asset_url(event.token_id));

        // Cloned so a listener may register further listeners.
        let listeners = self
            .listeners
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        for listener in &listeners {
            listener(&event);
        }
    }
}
