use async_trait::async_trait;
use em_api_types::{ChainId, MintCompleted, TxReceipt, WalletAddress};
use em_chain_client::{
    ChainError, ChainResult, MintContract, MintEventStream, PendingTransaction, WalletProvider,
};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{Notify, mpsc};

use crate::notify::UserNotifier;

pub(crate) const CONTRACT: &str = "0x270c530033053Ce342B4e5fD803357a925B940f9";

pub(crate) struct MockWallet {
    chain: Mutex<ChainResult<ChainId>>,
    authorized: Mutex<ChainResult<Vec<WalletAddress>>>,
    requested: Mutex<ChainResult<Vec<WalletAddress>>>,
    pub(crate) request_calls: AtomicUsize,
}

impl MockWallet {
    pub(crate) fn new(chain: &str, authorized: &[&str]) -> Self {
        Self {
            chain: Mutex::new(Ok(ChainId(chain.to_owned()))),
            authorized: Mutex::new(Ok(addresses(authorized))),
            requested: Mutex::new(Ok(addresses(authorized))),
            request_calls: AtomicUsize::new(0),
        }
    }

    pub(crate) fn grant_on_request(&self, accounts: &[&str]) {
        *self.requested.lock().unwrap() = Ok(addresses(accounts));
    }

    pub(crate) fn reject_requests(&self) {
        *self.requested.lock().unwrap() = Err(ChainError::Rejected);
    }

    pub(crate) fn fail_chain_id(&self) {
        *self.chain.lock().unwrap() = Err(ChainError::provider("chain id unavailable"));
    }
}

fn addresses(raw: &[&str]) -> Vec<WalletAddress> {
    raw.iter().map(|a| WalletAddress((*a).to_owned())).collect()
}

#[async_trait]
impl WalletProvider for MockWallet {
    async fn chain_id(&self) -> ChainResult<ChainId> {
        self.chain.lock().unwrap().clone()
    }

    async fn accounts(&self) -> ChainResult<Vec<WalletAddress>> {
        self.authorized.lock().unwrap().clone()
    }

    async fn request_accounts(&self) -> ChainResult<Vec<WalletAddress>> {
        self.request_calls.fetch_add(1, Ordering::SeqCst);
        self.requested.lock().unwrap().clone()
    }
}

#[derive(Clone)]
pub(crate) enum MintBehavior {
    Confirm,
    RejectSubmit,
    FailSubmit,
    FailConfirm,
    /// Confirmation waits until the gate is notified.
    Gated(Arc<Notify>),
    /// Confirmation never completes.
    Hang,
}

pub(crate) struct MockContract {
    total: AtomicU64,
    fail_reads: AtomicBool,
    total_reads: AtomicUsize,
    behavior: Mutex<MintBehavior>,
    pub(crate) submissions: Mutex<Vec<WalletAddress>>,
    pub(crate) subscribe_calls: AtomicUsize,
    subscribe_failures: AtomicUsize,
    latency: Mutex<Option<Duration>>,
    senders: Mutex<Vec<mpsc::UnboundedSender<MintCompleted>>>,
}

impl MockContract {
    pub(crate) fn with_total(total: u64) -> Self {
        Self {
            total: AtomicU64::new(total),
            fail_reads: AtomicBool::new(false),
            total_reads: AtomicUsize::new(0),
            behavior: Mutex::new(MintBehavior::Confirm),
            submissions: Mutex::new(Vec::new()),
            subscribe_calls: AtomicUsize::new(0),
            subscribe_failures: AtomicUsize::new(0),
            latency: Mutex::new(None),
            senders: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn set_total(&self, total: u64) {
        self.total.store(total, Ordering::SeqCst);
    }

    pub(crate) fn fail_total_reads(&self) {
        self.fail_reads.store(true, Ordering::SeqCst);
    }

    pub(crate) fn total_reads(&self) -> usize {
        self.total_reads.load(Ordering::SeqCst)
    }

    pub(crate) fn set_behavior(&self, behavior: MintBehavior) {
        *self.behavior.lock().unwrap() = behavior;
    }

    /// Count reads and subscriptions take `latency` before answering.
    pub(crate) fn slow_down(&self, latency: Duration) {
        *self.latency.lock().unwrap() = Some(latency);
    }

    pub(crate) fn fail_next_subscriptions(&self, count: usize) {
        self.subscribe_failures.store(count, Ordering::SeqCst);
    }

    /// Successful subscriptions only.
    pub(crate) fn subscriptions(&self) -> usize {
        self.subscribe_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn emit(&self, event: MintCompleted) {
        for sender in self.senders.lock().unwrap().iter() {
            let _ = sender.send(event.clone());
        }
    }

    pub(crate) fn close_streams(&self) {
        self.senders.lock().unwrap().clear();
    }

    async fn lag(&self) {
        let latency = *self.latency.lock().unwrap();
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }
    }
}

#[async_trait]
impl MintContract for MockContract {
    fn address(&self) -> &str {
        CONTRACT
    }

    async fn total_minted(&self) -> ChainResult<u64> {
        self.lag().await;
        self.total_reads.fetch_add(1, Ordering::SeqCst);
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(ChainError::provider("eth_call failed"));
        }
        Ok(self.total.load(Ordering::SeqCst))
    }

    async fn make_epic_nft(&self, from: &WalletAddress) -> ChainResult<Box<dyn PendingTransaction>> {
        let behavior = self.behavior.lock().unwrap().clone();
        match behavior {
            MintBehavior::RejectSubmit => Err(ChainError::Rejected),
            MintBehavior::FailSubmit => Err(ChainError::provider("insufficient funds for gas")),
            behavior => {
                self.submissions.lock().unwrap().push(from.clone());
                Ok(Box::new(MockPendingTx {
                    tx_hash: "0xfeed".to_owned(),
                    behavior,
                }))
            }
        }
    }

    async fn subscribe_minted(&self) -> ChainResult<MintEventStream> {
        self.lag().await;
        let failing = self
            .subscribe_failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| left.checked_sub(1))
            .is_ok();
        if failing {
            return Err(ChainError::provider("eth_newFilter failed"));
        }
        self.subscribe_calls.fetch_add(1, Ordering::SeqCst);
        let (tx, rx) = mpsc::unbounded_channel();
        self.senders.lock().unwrap().push(tx);
        Ok(rx)
    }
}

struct MockPendingTx {
    tx_hash: String,
    behavior: MintBehavior,
}

#[async_trait]
impl PendingTransaction for MockPendingTx {
    fn tx_hash(&self) -> &str {
        &self.tx_hash
    }

    async fn wait(&self) -> ChainResult<TxReceipt> {
        match &self.behavior {
            MintBehavior::FailConfirm => return Err(ChainError::provider("transaction reverted")),
            MintBehavior::Gated(gate) => gate.notified().await,
            MintBehavior::Hang => std::future::pending::<()>().await,
            _ => {}
        }
        Ok(TxReceipt {
            tx_hash: self.tx_hash.clone(),
            block_number: Some(1),
        })
    }
}

#[derive(Default)]
pub(crate) struct RecordingNotifier {
    alerts: Mutex<Vec<String>>,
}

impl RecordingNotifier {
    pub(crate) fn alerts(&self) -> Vec<String> {
        self.alerts.lock().unwrap().clone()
    }
}

impl UserNotifier for RecordingNotifier {
    fn alert(&self, message: &str) {
        self.alerts.lock().unwrap().push(message.to_owned());
    }
}
