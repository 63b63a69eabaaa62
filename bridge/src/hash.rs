//! Canonical encodings and digests
//!
//! Every message signed off-chain (by the TSS key or by an administrator key)
//! and every time-challenge parameter hash is computed here, so the byte
//! layouts live in one place.
//!
//! # Slot layout
//! Signed digests are `keccak256` over a sequence of 32-byte slots, the same
//! shape as Solidity's `abi.encode` for static types:
//! - unsigned integers: big-endian, left-padded
//! - fixed 32-byte values: copied as-is
//! - strings and variable-length bytes: `keccak256` of the raw bytes
//!
//! The first two slots of every signed digest are the hashed action name and
//! the hashed address of this bridge contract, so a signature is bound to one
//! action on one deployment.

use cosmwasm_std::StdResult;
use serde::Serialize;
use tiny_keccak::{Hasher, Keccak};

/// Compute keccak256 hash of arbitrary data
pub fn keccak256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Keccak::v256();
    hasher.update(data);
    let mut output = [0u8; 32];
    hasher.finalize(&mut output);
    output
}

/// Builder for slot-encoded digests.
#[derive(Debug, Default)]
pub struct SlotEncoder {
    data: Vec<u8>,
}

impl SlotEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a digest bound to `action` on the bridge at `contract`.
    pub fn for_action(action: &str, contract: &str) -> Self {
        Self::new().string(action).string(contract)
    }

    pub fn uint(mut self, value: u128) -> Self {
        let mut slot = [0u8; 32];
        slot[16..].copy_from_slice(&value.to_be_bytes());
        self.data.extend_from_slice(&slot);
        self
    }

    pub fn bytes32(mut self, value: &[u8; 32]) -> Self {
        self.data.extend_from_slice(value);
        self
    }

    pub fn bytes(self, value: &[u8]) -> Self {
        let hashed = keccak256(value);
        self.bytes32(&hashed)
    }

    pub fn string(self, value: &str) -> Self {
        self.bytes(value.as_bytes())
    }

    pub fn encoded(&self) -> &[u8] {
        &self.data
    }

    pub fn digest(&self) -> [u8; 32] {
        keccak256(&self.data)
    }
}

// ============================================================================
// Time-Challenge Parameters
// ============================================================================

/// Hash of a guarded method's parameters: `keccak256(method ‖ 0x00 ‖ json(params))`.
///
/// The JSON encoding of `cw_serde` types is deterministic (declaration order,
/// no whitespace), which makes it the canonical parameter encoding.
pub fn params_hash<T: Serialize>(method: &str, params: &T) -> StdResult<[u8; 32]> {
    let json = cosmwasm_std::to_json_vec(params)?;
    let mut data = Vec::with_capacity(method.len() + 1 + json.len());
    data.extend_from_slice(method.as_bytes());
    data.push(0);
    data.extend_from_slice(&json);
    Ok(keccak256(&data))
}

// ============================================================================
// Signed Messages
// ============================================================================

/// Digest the TSS key signs to authorize an unwrap.
///
/// Slots: action, contract, network_class, chain_id, transaction_hash,
/// log_index, to_address, token_address, amount.
#[allow(clippy::too_many_arguments)]
pub fn compute_unwrap_digest(
    contract: &str,
    network_class: u32,
    chain_id: u32,
    transaction_hash: &[u8; 32],
    log_index: u32,
    to_address: &str,
    token_address: &str,
    amount: u128,
) -> [u8; 32] {
    SlotEncoder::for_action("UnwrapToken", contract)
        .uint(network_class.into())
        .uint(chain_id.into())
        .bytes32(transaction_hash)
        .uint(log_index.into())
        .string(to_address)
        .string(token_address)
        .uint(amount)
        .digest()
}

/// Digest the TSS key signs for an outbound request; relayed to the foreign
/// bridge at `foreign_contract`.
///
/// Slots: action, contract, network_class, chain_id, foreign_contract, id,
/// to_address, token_address, amount.
#[allow(clippy::too_many_arguments)]
pub fn compute_wrap_digest(
    contract: &str,
    network_class: u32,
    chain_id: u32,
    foreign_contract: &str,
    id: &[u8; 32],
    to_address: &str,
    token_address: &str,
    amount: u128,
) -> [u8; 32] {
    SlotEncoder::for_action("WrapToken", contract)
        .uint(network_class.into())
        .uint(chain_id.into())
        .string(foreign_contract)
        .bytes32(id)
        .string(to_address)
        .string(token_address)
        .uint(amount)
        .digest()
}

/// Digest the TSS key signs to halt the bridge without the administrator.
pub fn compute_halt_digest(contract: &str, tss_nonce: u64) -> [u8; 32] {
    SlotEncoder::for_action("Halt", contract)
        .uint(tss_nonce.into())
        .digest()
}

/// Digest signed by both the outgoing and the incoming TSS key during key
/// generation.
pub fn compute_tss_change_digest(contract: &str, tss_nonce: u64, new_key: &[u8]) -> [u8; 32] {
    SlotEncoder::for_action("ChangeTssKey", contract)
        .uint(tss_nonce.into())
        .bytes(new_key)
        .digest()
}

/// Message an administrator candidate signs with its own ed25519 key to prove
/// possession.
pub fn compute_administrator_proof_digest(
    contract: &str,
    proof_nonce: u64,
    new_key: &[u8],
) -> [u8; 32] {
    SlotEncoder::for_action("ChangeAdministratorKey", contract)
        .uint(proof_nonce.into())
        .bytes(new_key)
        .digest()
}

/// Id of the `sequence`-th wrap request.
pub fn compute_wrap_request_id(
    contract: &str,
    sequence: u64,
    height: u64,
    sender: &str,
    network_class: u32,
    chain_id: u32,
) -> [u8; 32] {
    SlotEncoder::for_action("WrapRequestId", contract)
        .uint(sequence.into())
        .uint(height.into())
        .string(sender)
        .uint(network_class.into())
        .uint(chain_id.into())
        .digest()
}

// ============================================================================
// Formatting
// ============================================================================

/// Convert 32-byte hash to hex string (for attributes)
pub fn bytes32_to_hex(bytes: &[u8; 32]) -> String {
    format!("0x{}", hex::encode(bytes))
}

/// Parse a 32-byte value from raw bytes
pub fn to_bytes32(bytes: &[u8]) -> Option<[u8; 32]> {
    bytes.try_into().ok()
}
