use em_api_types::WalletAddress;
use em_chain_client::WalletProvider;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::error::MintError;
use crate::gateway::ContractGateway;
use crate::network::NetworkGuard;
use crate::notify::UserNotifier;
use crate::state::SessionState;

pub const INSTALL_WALLET_PROMPT: &str = "No wallet found. Install an Ethereum wallet such as MetaMask to continue.";

/// Wallet plus the contract it talks to; both are absent together.
pub(crate) struct Connected {
    pub(crate) wallet: Arc<dyn WalletProvider>,
    pub(crate) gateway: Arc<ContractGateway>,
}

/// Finds or requests an authorized account and arms the mint-event
/// subscription, keeping at most one live at a time.
pub struct SessionManager {
    connected: Option<Connected>,
    guard: NetworkGuard,
    notifier: Arc<dyn UserNotifier>,
    state: Arc<SessionState>,
}

impl SessionManager {
    pub(crate) fn new(
        connected: Option<Connected>,
        guard: NetworkGuard,
        notifier: Arc<dyn UserNotifier>,
        state: Arc<SessionState>,
    ) -> Self {
        Self {
            connected,
            guard,
            notifier,
            state,
        }
    }

    pub fn is_subscribed(&self) -> bool {
        self.connected
            .as_ref()
            .is_some_and(|connected| connected.gateway.is_armed())
    }

    /// Picks up an account the wallet already authorized, without prompting.
    pub async fn discover_session(&self) -> Option<WalletAddress> {
        let Some(connected) = &self.connected else {
            warn!("no wallet provider available; make sure a wallet is installed");
            return None;
        };

        self.guard
            .verify(connected.wallet.as_ref(), self.notifier.as_ref())
            .await;

        let accounts = match connected.wallet.accounts().await {
            Ok(accounts) => accounts,
            Err(err) => {
                warn!("failed to list authorized accounts: {}", err);
                return None;
            }
        };

        for (index, account) in accounts.iter().enumerate() {
            debug!(index, %account, "authorized account");
        }

        let Some(account) = accounts.into_iter().next() else {
            info!("no authorized account found");
            return None;
        };

        info!(%account, "found an authorized account");
        self.establish(connected, account.clone()).await;
        Some(account)
    }

    /// Prompts the wallet for access. Only call from a direct user action.
    pub async fn request_session(&self) -> Result<WalletAddress, MintError> {
        let Some(connected) = &self.connected else {
            self.notifier.alert(INSTALL_WALLET_PROMPT);
            return Err(MintError::WalletUnavailable);
        };

        let accounts = connected.wallet.request_accounts().await.map_err(|err| {
            warn!("wallet connection failed: {}", err);
            MintError::from(err)
        })?;

        let Some(account) = accounts.into_iter().next() else {
            warn!("wallet granted access without returning an account");
            return Err(MintError::Provider("wallet returned no accounts".to_owned()));
        };

        info!(%account, "connected");
        self.establish(connected, account.clone()).await;
        Ok(account)
    }

    async fn establish(&self, connected: &Connected, account: WalletAddress) {
        self.state.set_account(account);
        self.arm_subscription(&connected.gateway).await;
    }

    /// Arms the mint-event subscription unless one is already live. A failed
    /// or closed subscription is armed again by the next session.
    async fn arm_subscription(&self, gateway: &Arc<ContractGateway>) {
        match gateway.arm_mint_events().await {
            Ok(Some(_task)) => info!("mint event subscription armed"),
            Ok(None) => debug!("mint event subscription already armed"),
            Err(err) => warn!("failed to subscribe to mint events: {}", err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{MockContract, MockWallet, RecordingNotifier};
    use em_api_types::{MintCompleted, TokenId};
    use std::sync::atomic::Ordering;
    use std::time::Duration;

    struct Harness {
        wallet: Arc<MockWallet>,
        contract: Arc<MockContract>,
        notifier: Arc<RecordingNotifier>,
        state: Arc<SessionState>,
        sessions: SessionManager,
    }

    fn harness(wallet: MockWallet) -> Harness {
        let wallet = Arc::new(wallet);
        let contract = Arc::new(MockContract::with_total(3));
        let notifier = Arc::new(RecordingNotifier::default());
        let state = Arc::new(SessionState::new(true, 10));
        let gateway = Arc::new(ContractGateway::new(
            contract.clone(),
            state.clone(),
            "https://testnets.opensea.io/assets/goerli",
        ));
        let sessions = SessionManager::new(
            Some(Connected {
                wallet: wallet.clone(),
                gateway,
            }),
            NetworkGuard::new("0x5"),
            notifier.clone(),
            state.clone(),
        );
        Harness {
            wallet,
            contract,
            notifier,
            state,
            sessions,
        }
    }

    fn unavailable() -> (SessionManager, Arc<RecordingNotifier>, Arc<SessionState>) {
        let notifier = Arc::new(RecordingNotifier::default());
        let state = Arc::new(SessionState::new(false, 10));
        let sessions = SessionManager::new(None, NetworkGuard::new("0x5"), notifier.clone(), state.clone());
        (sessions, notifier, state)
    }

    #[tokio::test]
    async fn discovery_selects_first_account_and_arms_once() {
        let h = harness(MockWallet::new("0x5", &["0xfirst", "0xsecond"]));

        for _ in 0..5 {
            let account = h.sessions.discover_session().await;
            assert_eq!(account, Some(WalletAddress("0xfirst".to_owned())));
        }

        assert_eq!(h.state.account(), Some(WalletAddress("0xfirst".to_owned())));
        assert_eq!(h.state.snapshot().mint_count, 3);
        assert_eq!(h.contract.subscriptions(), 1);
        assert!(h.sessions.is_subscribed());
        assert!(h.notifier.alerts().is_empty());
    }

    #[tokio::test]
    async fn discovery_without_accounts_leaves_session_unset() {
        let h = harness(MockWallet::new("0x5", &[]));

        assert_eq!(h.sessions.discover_session().await, None);
        assert_eq!(h.state.account(), None);
        assert_eq!(h.contract.subscriptions(), 0);
        assert!(!h.sessions.is_subscribed());
    }

    #[tokio::test]
    async fn wrong_network_alerts_but_discovery_proceeds() {
        let h = harness(MockWallet::new("0x1", &["0xabc"]));

        assert!(h.sessions.discover_session().await.is_some());
        assert_eq!(h.notifier.alerts().len(), 1);
        assert!(h.notifier.alerts()[0].contains("0x1"));
        assert_eq!(h.contract.subscriptions(), 1);
    }

    #[tokio::test]
    async fn unreadable_chain_id_does_not_block_discovery() {
        let wallet = MockWallet::new("0x5", &["0xabc"]);
        wallet.fail_chain_id();
        let h = harness(wallet);

        assert!(h.sessions.discover_session().await.is_some());
        assert!(h.notifier.alerts().is_empty());
    }

    #[tokio::test]
    async fn discovery_without_wallet_is_logged_only() {
        let (sessions, notifier, state) = unavailable();

        assert_eq!(sessions.discover_session().await, None);
        assert!(notifier.alerts().is_empty());
        assert_eq!(state.account(), None);
    }

    #[tokio::test]
    async fn request_sets_account_and_arms_one_subscription() -> anyhow::Result<()> {
        let h = harness(MockWallet::new("0x5", &[]));
        h.wallet.grant_on_request(&["0xABC"]);

        let account = h.sessions.request_session().await?;
        assert_eq!(account, WalletAddress("0xABC".to_owned()));
        assert_eq!(h.state.account(), Some(account));
        assert_eq!(h.contract.subscriptions(), 1);

        h.sessions.request_session().await?;
        h.sessions.discover_session().await;
        assert_eq!(h.contract.subscriptions(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn rejected_request_leaves_no_partial_state() {
        let h = harness(MockWallet::new("0x5", &[]));
        h.wallet.reject_requests();

        assert_eq!(h.sessions.request_session().await, Err(MintError::WalletRejected));
        assert_eq!(h.state.account(), None);
        assert_eq!(h.contract.subscriptions(), 0);
        assert_eq!(h.wallet.request_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn request_without_wallet_prompts_install() {
        let (sessions, notifier, _state) = unavailable();

        assert_eq!(sessions.request_session().await, Err(MintError::WalletUnavailable));
        assert_eq!(notifier.alerts(), vec![INSTALL_WALLET_PROMPT.to_owned()]);
    }

    #[tokio::test]
    async fn concurrent_discovery_and_request_arm_one_subscription() -> anyhow::Result<()> {
        let h = harness(MockWallet::new("0x5", &["0xabc"]));
        h.contract.slow_down(Duration::from_millis(20));

        let (discovered, requested) = tokio::join!(
            h.sessions.discover_session(),
            h.sessions.request_session()
        );
        assert_eq!(discovered, Some(WalletAddress("0xabc".to_owned())));
        assert_eq!(requested?, WalletAddress("0xabc".to_owned()));
        assert_eq!(h.contract.subscriptions(), 1);
        assert!(h.sessions.is_subscribed());
        Ok(())
    }

    #[tokio::test]
    async fn failed_subscription_is_armed_by_the_next_session() {
        let h = harness(MockWallet::new("0x5", &["0xabc"]));
        h.contract.fail_next_subscriptions(1);

        assert!(h.sessions.discover_session().await.is_some());
        assert_eq!(h.contract.subscriptions(), 0);
        assert!(!h.sessions.is_subscribed());

        h.sessions.discover_session().await;
        h.sessions.discover_session().await;
        assert_eq!(h.contract.subscriptions(), 1);
        assert!(h.sessions.is_subscribed());
    }

    #[tokio::test]
    async fn closed_stream_is_armed_again_by_the_next_session() -> anyhow::Result<()> {
        let h = harness(MockWallet::new("0x5", &["0xabc"]));
        h.sessions.discover_session().await;
        assert_eq!(h.contract.subscriptions(), 1);

        h.contract.close_streams();
        tokio::time::timeout(Duration::from_secs(5), async {
            while h.sessions.is_subscribed() {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await?;

        h.sessions.discover_session().await;
        h.sessions.discover_session().await;
        assert_eq!(h.contract.subscriptions(), 2);

        h.contract.set_total(4);
        h.contract.emit(MintCompleted {
            from: WalletAddress("0xabc".to_owned()),
            token_id: TokenId(4),
        });
        let mut rx = h.state.subscribe();
        tokio::time::timeout(Duration::from_secs(5), async {
            while h.state.snapshot().minted_asset_url.is_none() {
                if rx.changed().await.is_err() {
                    break;
                }
            }
        })
        .await?;
        assert_eq!(h.state.snapshot().mint_count, 4);
        Ok(())
    }
}
