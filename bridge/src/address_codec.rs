//! Address handling
//!
//! Two concerns live here:
//! - foreign addresses (network contract addresses, wrap recipients, token
//!   addresses) are validated according to the network class;
//! - local addresses owned by ed25519 keys (administrator, guardians) are
//!   derived from the key the same way Tendermint derives ed25519 account
//!   addresses: the first 20 bytes of `sha256(pubkey)`.

use cosmwasm_std::{Addr, Api, CanonicalAddr, StdError, StdResult};
use sha2::{Digest, Sha256};

use crate::error::ContractError;
use crate::state::NETWORK_CLASS_EVM;

/// Maximum length of a non-EVM foreign address
pub const MAX_FOREIGN_ADDRESS_LEN: usize = 128;

// ============================================================================
// Foreign Addresses
// ============================================================================

/// Parse a 0x-prefixed hex EVM address to 20 bytes
pub fn parse_evm_address(addr: &str) -> StdResult<[u8; 20]> {
    let hex_str = addr
        .strip_prefix("0x")
        .ok_or_else(|| StdError::generic_err("EVM address must be 0x-prefixed"))?;

    if hex_str.len() != 40 {
        return Err(StdError::generic_err(format!(
            "Invalid EVM address length: expected 40 hex chars, got {}",
            hex_str.len()
        )));
    }

    let bytes =
        hex::decode(hex_str).map_err(|e| StdError::generic_err(format!("Invalid hex: {}", e)))?;

    let mut result = [0u8; 20];
    result.copy_from_slice(&bytes);
    Ok(result)
}

/// Validate an address on a foreign network of class `network_class`.
pub fn validate_foreign_address(network_class: u32, addr: &str) -> Result<(), ContractError> {
    if network_class == NETWORK_CLASS_EVM {
        parse_evm_address(addr).map_err(|e| ContractError::forbidden(e.to_string()))?;
        return Ok(());
    }

    if addr.is_empty() || addr.len() > MAX_FOREIGN_ADDRESS_LEN {
        return Err(ContractError::forbidden(format!(
            "foreign address must be 1-{} characters",
            MAX_FOREIGN_ADDRESS_LEN
        )));
    }
    if addr.chars().any(char::is_whitespace) {
        return Err(ContractError::forbidden(
            "foreign address must not contain whitespace",
        ));
    }
    Ok(())
}

// ============================================================================
// Key-Owned Local Addresses
// ============================================================================

/// Canonical address owned by an ed25519 public key.
pub fn key_owner_canonical(pub_key: &[u8]) -> CanonicalAddr {
    let digest = Sha256::digest(pub_key);
    CanonicalAddr::from(&digest[..20])
}

/// Human-readable address owned by an ed25519 public key.
pub fn key_owner(api: &dyn Api, pub_key: &[u8]) -> StdResult<Addr> {
    api.addr_humanize(&key_owner_canonical(pub_key))
}

/// Whether `sender` is the address owned by `pub_key`.
pub fn is_key_owner(api: &dyn Api, sender: &Addr, pub_key: &[u8]) -> StdResult<bool> {
    let canonical = api.addr_canonicalize(sender.as_str())?;
    Ok(canonical == key_owner_canonical(pub_key))
}
