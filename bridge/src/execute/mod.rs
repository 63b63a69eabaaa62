//! Execute handlers for the embedded bridge contract.
//!
//! This module contains all execute message handlers, organized by category:
//! - `security` - administrator, TSS key, guardians and delays
//! - `recovery` - emergency and guardian votes for a new administrator
//! - `halt` - halt, unhalt and halt-related configuration
//! - `network` - networks and token pairs
//! - `wrap` - outbound requests (native and CW20 deposits)
//! - `unwrap` - inbound requests, redemption and revocation

mod halt;
mod network;
mod recovery;
mod security;
mod unwrap;
mod wrap;

pub use halt::*;
pub use network::*;
pub use recovery::*;
pub use security::*;
pub use unwrap::*;
pub use wrap::*;

use cosmwasm_std::{Addr, Api};

use crate::address_codec::is_key_owner;
use crate::error::ContractError;
use crate::state::{BridgeConfig, SecurityInfo};

/// Whether `sender` owns the current administrator key.
pub(crate) fn is_administrator(
    api: &dyn Api,
    sender: &Addr,
    security: &SecurityInfo,
) -> Result<bool, ContractError> {
    match security.administrator() {
        Some(key) => Ok(is_key_owner(api, sender, key)?),
        None => Ok(false),
    }
}

pub(crate) fn ensure_administrator(
    api: &dyn Api,
    sender: &Addr,
    security: &SecurityInfo,
) -> Result<(), ContractError> {
    if !is_administrator(api, sender, security)? {
        return Err(ContractError::PermissionDenied);
    }
    Ok(())
}

/// Index of the guardian whose key `sender` owns.
pub(crate) fn guardian_index(
    api: &dyn Api,
    sender: &Addr,
    security: &SecurityInfo,
) -> Result<Option<usize>, ContractError> {
    for (index, key) in security.guardians().iter().enumerate() {
        if is_key_owner(api, sender, key)? {
            return Ok(Some(index));
        }
    }
    Ok(None)
}

pub(crate) fn ensure_not_halted(bridge: &BridgeConfig, height: u64) -> Result<(), ContractError> {
    if bridge.is_halted(height) {
        return Err(ContractError::BridgeHalted);
    }
    Ok(())
}

pub(crate) fn validate_metadata(metadata: &str) -> Result<(), ContractError> {
    if metadata.len() > crate::state::MAX_METADATA_LEN {
        return Err(ContractError::forbidden(format!(
            "metadata exceeds {} bytes",
            crate::state::MAX_METADATA_LEN
        )));
    }
    Ok(())
}
