//! ABI bindings for the handful of calls the mint contract needs.

use alloy_primitives::{B256, U256, hex};
use alloy_sol_types::{SolCall, SolEvent, sol};
use em_api_types::{MintCompleted, TokenId, WalletAddress};
use em_chain_client::{ChainError, ChainResult};

sol! {
    function getTotalNFTsMintedSoFar() external view returns (uint256);
    function makeAnEpicNFT() external;
    event NewEpicNFTMinted(address sender, uint256 tokenId);
}

/// Call data for `getTotalNFTsMintedSoFar()`.
pub fn total_minted_calldata() -> String {
    hex::encode_prefixed(getTotalNFTsMintedSoFarCall {}.abi_encode())
}

/// Call data for `makeAnEpicNFT()`.
pub fn mint_calldata() -> String {
    hex::encode_prefixed(makeAnEpicNFTCall {}.abi_encode())
}

/// Topic 0 of `NewEpicNFTMinted(address,uint256)`.
pub fn minted_topic() -> String {
    hex::encode_prefixed(NewEpicNFTMinted::SIGNATURE_HASH)
}

/// Decodes the `eth_call` result of `getTotalNFTsMintedSoFar()`.
pub fn decode_total_minted(raw: &str) -> ChainResult<u64> {
    let bytes = decode_hex(raw)?;
    let total = getTotalNFTsMintedSoFarCall::abi_decode_returns(&bytes, true)
        .map_err(|err| ChainError::provider(format!("invalid getTotalNFTsMintedSoFar result: {err}")))?;
    to_u64(total._0)
}

/// Decodes a `NewEpicNFTMinted` log entry as returned by `eth_getFilterChanges`.
pub fn decode_minted_log(topics: &[String], data: &str) -> ChainResult<MintCompleted> {
    let signature = topics
        .first()
        .ok_or_else(|| ChainError::provider("NewEpicNFTMinted log without topics"))?;
    let signature: B256 = signature
        .parse()
        .map_err(|err| ChainError::provider(format!("invalid log topic {signature}: {err}")))?;
    if signature != NewEpicNFTMinted::SIGNATURE_HASH {
        return Err(ChainError::provider(format!("unexpected log topic {signature}")));
    }

    let data = decode_hex(data)?;
    let (sender, token_id) = NewEpicNFTMinted::abi_decode_data(&data, true)
        .map_err(|err| ChainError::provider(format!("malformed NewEpicNFTMinted log: {err}")))?;

    Ok(MintCompleted {
        from: WalletAddress(hex::encode_prefixed(sender)),
        token_id: TokenId(to_u64(token_id)?),
    })
}

/// Parses a JSON-RPC quantity such as `"0x1b4"`.
pub fn parse_quantity(raw: &str) -> ChainResult<u64> {
    let digits = raw
        .strip_prefix("0x")
        .ok_or_else(|| ChainError::provider(format!("quantity without 0x prefix: {raw}")))?;
    if digits.is_empty() {
        return Err(ChainError::provider("empty quantity"));
    }
    u64::from_str_radix(digits, 16)
        .map_err(|err| ChainError::provider(format!("invalid quantity {raw}: {err}")))
}

fn decode_hex(raw: &str) -> ChainResult<Vec<u8>> {
    hex::decode(raw).map_err(|err| ChainError::provider(format!("invalid hex {raw}: {err}")))
}

fn to_u64(value: U256) -> ChainResult<u64> {
    u64::try_from(value)
        .map_err(|_| ChainError::provider(format!("uint256 value {value} does not fit into u64")))
}
