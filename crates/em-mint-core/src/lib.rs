//! Wallet session and NFT minting lifecycle.
//!
//! [`MintClient`] wires the four pieces together around one shared
//! [`SessionState`]:
//! - [`NetworkGuard`] warns when the wallet is on the wrong chain,
//! - [`SessionManager`] finds or requests an account,
//! - [`ContractGateway`] reads the mint count, submits mints and keeps the
//!   counter in sync from contract events,
//! - [`MintOrchestrator`] runs a single mint from submission to confirmation.

pub mod config;
pub mod error;
pub mod gateway;
pub mod network;
pub mod notify;
pub mod orchestrator;
pub mod session;
pub mod state;

#[cfg(test)]
mod test_support;

use em_api_types::{MintCompleted, SessionSnapshot, TxReceipt, WalletAddress};
use em_chain_client::{MintContract, WalletProvider};
use std::sync::Arc;
use tokio::sync::watch;

pub use config::MintConfig;
pub use error::MintError;
pub use gateway::ContractGateway;
pub use network::NetworkGuard;
pub use notify::{TracingNotifier, UserNotifier};
pub use orchestrator::MintOrchestrator;
pub use session::SessionManager;
pub use state::SessionState;

/// The wallet capability and the contract reached through it.
#[derive(Clone)]
pub struct WalletBinding {
    pub wallet: Arc<dyn WalletProvider>,
    pub contract: Arc<dyn MintContract>,
}

pub struct MintClient {
    state: Arc<SessionState>,
    gateway: Option<Arc<ContractGateway>>,
    sessions: SessionManager,
    orchestrator: MintOrchestrator,
}

impl MintClient {
    /// `binding` is `None` when no wallet is present in the environment.
    pub fn new(config: &MintConfig, binding: Option<WalletBinding>, notifier: Arc<dyn UserNotifier>) -> Self {
        let state = Arc::new(SessionState::new(binding.is_some(), config.max_supply));

        let connected = binding.map(|binding| session::Connected {
            wallet: binding.wallet,
            gateway: Arc::new(ContractGateway::new(
                binding.contract,
                state.clone(),
                config.opensea_base.clone(),
            )),
        });
        let gateway = connected.as_ref().map(|connected| connected.gateway.clone());

        let orchestrator = MintOrchestrator::new(
            gateway.clone(),
            state.clone(),
            config.explorer_tx_base.clone(),
            config.confirm_timeout,
        );
        let sessions = SessionManager::new(
            connected,
            NetworkGuard::new(config.required_chain_id.clone()),
            notifier,
            state.clone(),
        );

        Self {
            state,
            gateway,
            sessions,
            orchestrator,
        }
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.state.snapshot()
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.state.subscribe()
    }

    pub fn sessions(&self) -> &SessionManager {
        &self.sessions
    }

    pub fn orchestrator(&self) -> &MintOrchestrator {
        &self.orchestrator
    }

    pub async fn discover_session(&self) -> Option<WalletAddress> {
        self.sessions.discover_session().await
    }

    pub async fn request_session(&self) -> Result<WalletAddress, MintError> {
        self.sessions.request_session().await
    }

    pub async fn mint(&self) -> Result<TxReceipt, MintError> {
        self.orchestrator.mint().await
    }

    /// Returns `false` when there is no wallet, so no events can arrive.
    pub fn on_mint_completed<F>(&self, handler: F) -> bool
    where
        F: Fn(&MintCompleted) + Send + Sync + 'static,
    {
        match &self.gateway {
            Some(gateway) => {
                gateway.on_mint_completed(handler);
                true
            }
            None => false,
        }
    }
}
