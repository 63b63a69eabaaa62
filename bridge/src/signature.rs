//! Signature-gated payloads and key validation.
//!
//! A [`Signed<T>`] can only be obtained through [`Signed::verify`], so a
//! handler holding one knows the payload was authorized by the TSS key. The
//! unwrap, halt and key-generation flows all take their payloads through it.

use cosmwasm_std::{Addr, Api, Binary, StdError, StdResult, Uint128};
use k256::elliptic_curve::sec1::ToEncodedPoint;

use crate::error::ContractError;
use crate::hash::{
    compute_administrator_proof_digest, compute_halt_digest, compute_tss_change_digest,
    compute_unwrap_digest, compute_wrap_digest, to_bytes32,
};
use crate::state::{TssKey, WrapTokenRequest};

/// Length of an ed25519 public key
pub const ED25519_PUBKEY_LEN: usize = 32;

/// Compact secp256k1 signature length (r ‖ s)
pub const SECP256K1_SIGNATURE_LEN: usize = 64;

// ============================================================================
// Signed<T>
// ============================================================================

/// A payload whose digest is signed by the TSS key.
pub trait SignedPayload {
    fn digest(&self, contract: &Addr) -> [u8; 32];
}

/// Payload `T` together with a TSS signature that has been verified over it.
#[derive(Debug, Clone, PartialEq)]
pub struct Signed<T> {
    payload: T,
    signature: Binary,
}

impl<T: SignedPayload> Signed<T> {
    /// Verify `signature` over `payload` under `key`.
    pub fn verify(
        api: &dyn Api,
        contract: &Addr,
        key: &TssKey,
        payload: T,
        signature: Binary,
    ) -> Result<Self, ContractError> {
        let digest = payload.digest(contract);
        verify_secp256k1(api, &key.compressed, &digest, &signature)?;
        Ok(Self { payload, signature })
    }

    pub fn payload(&self) -> &T {
        &self.payload
    }

    pub fn into_parts(self) -> (T, Binary) {
        (self.payload, self.signature)
    }
}

/// Inbound transfer attested by the TSS key.
#[derive(Debug, Clone, PartialEq)]
pub struct UnwrapPayload {
    pub network_class: u32,
    pub chain_id: u32,
    pub transaction_hash: [u8; 32],
    pub log_index: u32,
    pub to_address: Addr,
    pub token_address: String,
    pub amount: Uint128,
}

impl SignedPayload for UnwrapPayload {
    fn digest(&self, contract: &Addr) -> [u8; 32] {
        compute_unwrap_digest(
            contract.as_str(),
            self.network_class,
            self.chain_id,
            &self.transaction_hash,
            self.log_index,
            self.to_address.as_str(),
            &self.token_address,
            self.amount.u128(),
        )
    }
}

/// Outbound request as released by the foreign bridge at `foreign_contract`.
#[derive(Debug, Clone, PartialEq)]
pub struct WrapPayload {
    pub network_class: u32,
    pub chain_id: u32,
    pub foreign_contract: String,
    pub id: [u8; 32],
    pub to_address: String,
    pub token_address: String,
    pub amount: Uint128,
}

impl WrapPayload {
    pub fn from_request(request: &WrapTokenRequest, foreign_contract: String) -> StdResult<Self> {
        let id = to_bytes32(&request.id)
            .ok_or_else(|| StdError::generic_err("stored wrap request id is not 32 bytes"))?;
        Ok(Self {
            network_class: request.network_class,
            chain_id: request.chain_id,
            foreign_contract,
            id,
            to_address: request.to_address.clone(),
            token_address: request.token_address.clone(),
            amount: request.amount,
        })
    }
}

impl SignedPayload for WrapPayload {
    fn digest(&self, contract: &Addr) -> [u8; 32] {
        compute_wrap_digest(
            contract.as_str(),
            self.network_class,
            self.chain_id,
            &self.foreign_contract,
            &self.id,
            &self.to_address,
            &self.token_address,
            self.amount.u128(),
        )
    }
}

/// Halt request authorized by the TSS key at `tss_nonce`.
#[derive(Debug, Clone, PartialEq)]
pub struct HaltPayload {
    pub tss_nonce: u64,
}

impl SignedPayload for HaltPayload {
    fn digest(&self, contract: &Addr) -> [u8; 32] {
        compute_halt_digest(contract.as_str(), self.tss_nonce)
    }
}

/// Key handover signed by both the outgoing and the incoming TSS key.
#[derive(Debug, Clone, PartialEq)]
pub struct TssChangePayload {
    pub tss_nonce: u64,
    pub new_key: TssKey,
}

impl SignedPayload for TssChangePayload {
    fn digest(&self, contract: &Addr) -> [u8; 32] {
        compute_tss_change_digest(
            contract.as_str(),
            self.tss_nonce,
            self.new_key.decompressed.as_slice(),
        )
    }
}

// ============================================================================
// secp256k1 (TSS)
// ============================================================================

/// Validate a SEC1-encoded secp256k1 key and return both of its forms.
pub fn decompress_tss_key(raw: &[u8]) -> Result<TssKey, ContractError> {
    let key = k256::PublicKey::from_sec1_bytes(raw)
        .map_err(|_| ContractError::forbidden("TSS key is not a valid secp256k1 point"))?;

    Ok(TssKey {
        compressed: Binary::from(key.to_encoded_point(true).as_bytes().to_vec()),
        decompressed: Binary::from(key.to_encoded_point(false).as_bytes().to_vec()),
    })
}

/// Verify a compact ECDSA signature over a 32-byte digest. A trailing
/// recovery byte (65-byte form) is accepted and ignored.
pub fn verify_secp256k1(
    api: &dyn Api,
    pub_key: &[u8],
    digest: &[u8; 32],
    signature: &[u8],
) -> Result<(), ContractError> {
    let compact = match signature.len() {
        SECP256K1_SIGNATURE_LEN => signature,
        65 => &signature[..SECP256K1_SIGNATURE_LEN],
        _ => return Err(ContractError::InvalidSignature),
    };

    match api.secp256k1_verify(digest, compact, pub_key) {
        Ok(true) => Ok(()),
        _ => Err(ContractError::InvalidSignature),
    }
}

// ============================================================================
// ed25519 (administrator / guardians)
// ============================================================================

/// Reject keys that are not 32 bytes or are all zero.
pub fn validate_ed25519_key(key: &[u8]) -> Result<(), ContractError> {
    if key.len() != ED25519_PUBKEY_LEN {
        return Err(ContractError::forbidden(format!(
            "ed25519 key must be {} bytes, got {}",
            ED25519_PUBKEY_LEN,
            key.len()
        )));
    }
    if key.iter().all(|b| *b == 0) {
        return Err(ContractError::forbidden("zero key"));
    }
    Ok(())
}

/// Check that `proof` was produced by the private key behind `new_key`.
pub fn verify_administrator_proof(
    api: &dyn Api,
    contract: &Addr,
    proof_nonce: u64,
    new_key: &[u8],
    proof: &[u8],
) -> Result<(), ContractError> {
    let digest = compute_administrator_proof_digest(contract.as_str(), proof_nonce, new_key);
    match api.ed25519_verify(&digest, proof, new_key) {
        Ok(true) => Ok(()),
        _ => Err(ContractError::InvalidSignature),
    }
}
