use em_api_types::ChainId;
use em_chain_client::ChainError;
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum MintError {
    #[error("no wallet provider available")]
    WalletUnavailable,
    #[error("wallet rejected the request")]
    WalletRejected,
    #[error("provider error: {0}")]
    Provider(String),
    #[error("wallet is on chain {actual}, expected {expected}")]
    NetworkMismatch { expected: ChainId, actual: ChainId },
    #[error("no wallet account connected")]
    NotConnected,
    #[error("a mint is already in flight")]
    MintInFlight,
    #[error("timed out waiting for transaction confirmation")]
    ConfirmationTimeout,
}

impl From<ChainError> for MintError {
    fn from(err: ChainError) -> Self {
        match err {
            ChainError::Rejected => Self::WalletRejected,
            ChainError::Provider(message) => Self::Provider(message),
        }
    }
}
