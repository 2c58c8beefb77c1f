use em_api_types::ChainId;
use em_chain_client::WalletProvider;
use tracing::{info, warn};

use crate::error::MintError;
use crate::notify::UserNotifier;

/// Checks the wallet's active chain against the one the contract lives on.
///
/// A mismatch raises an alert but never blocks the session.
pub struct NetworkGuard {
    required: ChainId,
}

impl NetworkGuard {
    pub fn new(required: impl Into<String>) -> Self {
        Self {
            required: ChainId(required.into()),
        }
    }

    pub fn required(&self) -> &ChainId {
        &self.required
    }

    /// Case-sensitive comparison of the reported identifier.
    pub fn check(&self, reported: &ChainId) -> Result<(), MintError> {
        if reported.0 == self.required.0 {
            return Ok(());
        }
        Err(MintError::NetworkMismatch {
            expected: self.required.clone(),
            actual: reported.clone(),
        })
    }

    pub async fn verify(&self, wallet: &dyn WalletProvider, notifier: &dyn UserNotifier) {
        let reported = match wallet.chain_id().await {
            Ok(chain) => chain,
            Err(err) => {
                warn!("failed to read chain id from wallet: {}", err);
                return;
            }
        };
        info!(chain = %reported, "connected to chain");

        if let Err(err) = self.check(&reported) {
            warn!("{}", err);
            notifier.alert(&format!(
                "You are not connected to the required network (expected {}, wallet is on {}).",
                self.required, reported
            ));
        }
    }
}
