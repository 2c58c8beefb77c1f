use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct WalletAddress(pub String);

impl fmt::Display for WalletAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Chain identifier exactly as the wallet reports it (e.g. `"0x5"`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChainId(pub String);

impl fmt::Display for ChainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Chain-assigned identifier of a minted token.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
pub struct TokenId(pub u64);

impl fmt::Display for TokenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MintStatus {
    #[default]
    Idle,
    AwaitingWalletApproval,
    AwaitingConfirmation,
}

impl MintStatus {
    /// Progress text shown to the user while a mint is in flight.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Idle => "",
            Self::AwaitingWalletApproval => "Going to pop wallet now to pay gas...",
            Self::AwaitingConfirmation => "Mining...please wait.",
        }
    }

    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }
}

/// Payload of the contract's `NewEpicNFTMinted(address,uint256)` event.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MintCompleted {
    pub from: WalletAddress,
    pub token_id: TokenId,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TxReceipt {
    pub tx_hash: String,
    pub block_number: Option<u64>,
}

/// Everything the presentation layer renders.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub wallet_available: bool,
    pub account: Option<WalletAddress>,
    pub mint_count: u64,
    pub max_supply: u64,
    pub mint_status: MintStatus,
    pub minted_asset_url: Option<String>,
    pub last_tx_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionStateResponse {
    pub wallet_available: bool,
    pub account: Option<String>,
    pub mint_count: u64,
    pub max_supply: u64,
    pub mint_status: MintStatus,
    pub mint_status_label: String,
    pub minted_asset_url: Option<String>,
    pub last_tx_url: Option<String>,
}

impl From<SessionSnapshot> for SessionStateResponse {
    fn from(snapshot: SessionSnapshot) -> Self {
        Self {
            wallet_available: snapshot.wallet_available,
            account: snapshot.account.map(|account| account.0),
            mint_count: snapshot.mint_count,
            max_supply: snapshot.max_supply,
            mint_status_label: snapshot.mint_status.label().to_owned(),
            mint_status: snapshot.mint_status,
            minted_asset_url: snapshot.minted_asset_url,
            last_tx_url: snapshot.last_tx_url,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConnectResponse {
    pub account: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MintResponse {
    pub tx_hash: String,
    pub tx_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertsResponse {
    pub alerts: Vec<String>,
}
