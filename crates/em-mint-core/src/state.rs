//! Session state shared by the core's components.
//!
//! Held in a `watch` channel so the presentation layer can either poll the
//! latest [`SessionSnapshot`] or subscribe to changes.

use em_api_types::{MintStatus, SessionSnapshot, WalletAddress};
use tokio::sync::watch;

pub struct SessionState {
    tx: watch::Sender<SessionSnapshot>,
}

impl SessionState {
    pub fn new(wallet_available: bool, max_supply: u64) -> Self {
        let (tx, _rx) = watch::channel(SessionSnapshot {
            wallet_available,
            max_supply,
            ..SessionSnapshot::default()
        });
        Self { tx }
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.tx.subscribe()
    }

    pub fn account(&self) -> Option<WalletAddress> {
        self.tx.borrow().account.clone()
    }

    pub fn mint_status(&self) -> MintStatus {
        self.tx.borrow().mint_status
    }

    pub(crate) fn set_account(&self, account: WalletAddress) {
        self.tx.send_modify(|s| s.account = Some(account));
    }

    pub(crate) fn set_mint_count(&self, count: u64) {
        self.tx.send_if_modified(|s| {
            let changed = s.mint_count != count;
            s.mint_count = count;
            changed
        });
    }

    pub(crate) fn set_minted_asset_url(&self, url: String) {
        self.tx.send_modify(|s| s.minted_asset_url = Some(url));
    }

    pub(crate) fn set_last_tx_url(&self, url: String) {
        self.tx.send_modify(|s| s.last_tx_url = Some(url));
    }

    /// Moves `Idle -> AwaitingWalletApproval`. Returns `false` when a mint is
    /// already in flight.
    pub(crate) fn begin_mint(&self) -> bool {
        self.tx.send_if_modified(|s| {
            if !s.mint_status.is_idle() {
                return false;
            }
            s.mint_status = MintStatus::AwaitingWalletApproval;
            true
        })
    }

    pub(crate) fn set_mint_status(&self, status: MintStatus) {
        self.tx.send_if_modified(|s| {
            let changed = s.mint_status != status;
            s.mint_status = status;
            changed
        });
    }
}
