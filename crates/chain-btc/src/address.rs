use bitcoin::address::{Address, NetworkUnchecked};
use bitcoin::PublicKey;

use crate::error::BtcError;
use crate::network::BtcNetwork;

/// Derive a legacy P2PKH address from a public key.
///
/// Compressed and uncompressed keys hash to different addresses, so the key's
/// own encoding is preserved. Returns `1...` on mainnet, `m...`/`n...` on
/// testnet.
pub fn pubkey_to_p2pkh_address(public_key: &PublicKey, network: BtcNetwork) -> String {
    Address::p2pkh(public_key.pubkey_hash(), network.kind()).to_string()
}

/// Parse an address string and require it to belong to `network`.
pub fn parse_address(address: &str, network: BtcNetwork) -> Result<Address, BtcError> {
    address
        .parse::<Address<NetworkUnchecked>>()
        .map_err(|e| BtcError::InvalidAddress(format!("{address}: {e}")))?
        .require_network(network.to_bitcoin_network())
        .map_err(|e| BtcError::InvalidAddress(format!("{address}: wrong network: {e}")))
}

/// Validate a Bitcoin address string for the given network.
///
/// Returns `true` if the address is valid for the specified network,
/// `false` if it is valid but for a different network.
pub fn validate_address(address: &str, network: BtcNetwork) -> Result<bool, BtcError> {
    let parsed = address
        .parse::<Address<NetworkUnchecked>>()
        .map_err(|e| BtcError::InvalidAddress(format!("failed to parse address: {e}")))?;

    Ok(parsed.is_valid_for_network(network.to_bitcoin_network()))
}
