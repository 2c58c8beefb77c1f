use em_api_types::{MintStatus, TxReceipt, WalletAddress};
use std::sync::Arc;
use std::time::Duration;
use tracing::{Instrument, info, info_span, warn};
use uuid::Uuid;

use crate::error::MintError;
use crate::gateway::ContractGateway;
use crate::state::SessionState;

/// Drives `Idle -> AwaitingWalletApproval -> AwaitingConfirmation -> Idle`.
///
/// The orchestrator never touches the mint count or asset location; those
/// arrive through the gateway's event subscription.
pub struct MintOrchestrator {
    gateway: Option<Arc<ContractGateway>>,
    state: Arc<SessionState>,
    explorer_tx_base: String,
    confirm_timeout: Option<Duration>,
}

/// Puts the status back to `Idle` however the attempt ends, including when
/// the mint future is dropped mid-flight.
struct InFlight<'a> {
    state: &'a SessionState,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.state.set_mint_status(MintStatus::Idle);
    }
}

impl MintOrchestrator {
    pub(crate) fn new(
        gateway: Option<Arc<ContractGateway>>,
        state: Arc<SessionState>,
        explorer_tx_base: impl Into<String>,
        confirm_timeout: Option<Duration>,
    ) -> Self {
        Self {
            gateway,
            state,
            explorer_tx_base: explorer_tx_base.into().trim_end_matches('/').to_owned(),
            confirm_timeout,
        }
    }

    pub fn tx_url(&self, tx_hash: &str) -> String {
        format!("{}/{}", self.explorer_tx_base, tx_hash)
    }

    /// Submits one mint and waits for it to be mined. Rejected with
    /// [`MintError::MintInFlight`] unless the status is `Idle`.
    pub async fn mint(&self) -> Result<TxReceipt, MintError> {
        let Some(gateway) = &self.gateway else {
            warn!("cannot mint: no wallet provider available");
            return Err(MintError::WalletUnavailable);
        };
        let Some(account) = self.state.account() else {
            warn!("cannot mint: no wallet account connected");
            return Err(MintError::NotConnected);
        };

        if !self.state.begin_mint() {
            info!("mint ignored: another mint is in flight");
            return Err(MintError::MintInFlight);
        }
        let _in_flight = InFlight {
            state: self.state.as_ref(),
        };

        let attempt = Uuid::new_v4();
        let span = info_span!("mint", %attempt, %account);
        let result = self.run(gateway, &account).instrument(span).await;
        if let Err(err) = &result {
            warn!(%attempt, "mint failed: {}", err);
        }
        result
    }

    async fn run(&self, gateway: &ContractGateway, account: &WalletAddress) -> Result<TxReceipt, MintError> {
        info!("{}", MintStatus::AwaitingWalletApproval.label());
        let pending = gateway.submit_mint(account).await?;

        self.state.set_mint_status(MintStatus::AwaitingConfirmation);
        info!(tx_hash = pending.tx_hash(), "{}", MintStatus::AwaitingConfirmation.label());

        let receipt = match self.confirm_timeout {
            Some(limit) => tokio::time::timeout(limit, pending.wait())
                .await
                .map_err(|_| MintError::ConfirmationTimeout)??,
            None => pending.wait().await?,
        };

        let tx_url = self.tx_url(&receipt.tx_hash);
        info!(block = ?receipt.block_number, "mined, see transaction: {}", tx_url);
        self.state.set_last_tx_url(tx_url);
        Ok(receipt)
    }
}
