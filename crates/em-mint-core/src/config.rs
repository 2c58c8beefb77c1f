use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::time::Duration;

pub const DEFAULT_CONTRACT_ADDRESS: &str = "0x270c530033053Ce342B4e5fD803357a925B940f9";
/// Goerli.
pub const DEFAULT_REQUIRED_CHAIN_ID: &str = "0x5";
pub const DEFAULT_OPENSEA_BASE: &str = "https://testnets.opensea.io/assets/goerli";
pub const DEFAULT_EXPLORER_TX_BASE: &str = "https://goerli.etherscan.io/tx";
pub const DEFAULT_MAX_SUPPLY: u64 = 10;
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 4_000;
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";

/// Runtime configuration, read from `EM_*` environment variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MintConfig {
    /// JSON-RPC endpoint of the wallet. `None` means no wallet is available.
    pub wallet_url: Option<String>,
    pub contract_address: String,
    pub required_chain_id: String,
    pub opensea_base: String,
    pub explorer_tx_base: String,
    pub max_supply: u64,
    pub poll_interval: Duration,
    pub confirm_timeout: Option<Duration>,
    pub bind_addr: SocketAddr,
}

impl MintConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_owned())
                .filter(|value| !value.is_empty())
        };

        let max_supply = match read("EM_MAX_SUPPLY") {
            Some(raw) => raw.parse().context("EM_MAX_SUPPLY must be an integer")?,
            None => DEFAULT_MAX_SUPPLY,
        };

        let poll_interval_ms: u64 = match read("EM_POLL_INTERVAL_MS") {
            Some(raw) => raw.parse().context("EM_POLL_INTERVAL_MS must be an integer")?,
            None => DEFAULT_POLL_INTERVAL_MS,
        };
        if poll_interval_ms == 0 {
            anyhow::bail!("EM_POLL_INTERVAL_MS must be greater than 0");
        }

        let confirm_timeout = read("EM_CONFIRM_TIMEOUT_SECS")
            .map(|raw| raw.parse::<u64>())
            .transpose()
            .context("EM_CONFIRM_TIMEOUT_SECS must be an integer")?
            .map(Duration::from_secs);

        let bind_addr = read("EM_BIND_ADDR")
            .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_owned())
            .parse()
            .context("EM_BIND_ADDR must be a socket address")?;

        Ok(Self {
            wallet_url: read("EM_WALLET_URL"),
            contract_address: read("EM_CONTRACT_ADDRESS")
                .unwrap_or_else(|| DEFAULT_CONTRACT_ADDRESS.to_owned()),
            required_chain_id: read("EM_REQUIRED_CHAIN_ID")
                .unwrap_or_else(|| DEFAULT_REQUIRED_CHAIN_ID.to_owned()),
            opensea_base: read("EM_OPENSEA_BASE")
                .unwrap_or_else(|| DEFAULT_OPENSEA_BASE.to_owned())
                .trim_end_matches('/')
                .to_owned(),
            explorer_tx_base: read("EM_EXPLORER_TX_BASE")
                .unwrap_or_else(|| DEFAULT_EXPLORER_TX_BASE.to_owned())
                .trim_end_matches('/')
                .to_owned(),
            max_supply,
            poll_interval: Duration::from_millis(poll_interval_ms),
            confirm_timeout,
            bind_addr,
        })
    }
}

impl Default for MintConfig {
    fn default() -> Self {
        Self {
            wallet_url: None,
            contract_address: DEFAULT_CONTRACT_ADDRESS.to_owned(),
            required_chain_id: DEFAULT_REQUIRED_CHAIN_ID.to_owned(),
            opensea_base: DEFAULT_OPENSEA_BASE.to_owned(),
            explorer_tx_base: DEFAULT_EXPLORER_TX_BASE.to_owned(),
            max_supply: DEFAULT_MAX_SUPPLY,
            poll_interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
            confirm_timeout: None,
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
        }
    }
}
