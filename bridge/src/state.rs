//! State definitions for the embedded bridge contract
//!
//! This module defines all storage structures and state maps: the security
//! registry (administrator, TSS key, guardians), the network registry, and
//! the wrap/unwrap request ledgers.

use cosmwasm_schema::cw_serde;
use cosmwasm_std::{Addr, Binary, StdResult, Storage, Uint128};
use cw_storage_plus::{Item, Map};

use common::AssetInfo;

use crate::error::ContractError;
use crate::time_challenge::TimeChallenged;

// ============================================================================
// Security Registry
// ============================================================================

/// Delays (in momentums) applied by the time-challenge engine.
#[cw_serde]
pub struct SecurityDelays {
    /// Delay for administrator key rotation and for changing these delays
    pub administrator_delay: u64,
    /// Shared administrative delay (guardian nomination, token pairs)
    pub soft_delay: u64,
    /// Delay for TSS key rotation by the administrator
    pub tss_delay: u64,
}

/// TSS public key in both SEC1 forms.
#[cw_serde]
pub struct TssKey {
    /// 33-byte compressed point
    pub compressed: Binary,
    /// 65-byte uncompressed point
    pub decompressed: Binary,
}

/// Value proposed through `ChangeTssKey` by the administrator.
#[cw_serde]
pub struct TssKeyProposal {
    pub key: TssKey,
    pub key_sign_threshold: u32,
}

/// Administrator, TSS key and guardians, with their pending rotations.
///
/// Every rotatable field is a [`TimeChallenged`] value: `current` is the
/// authoritative value and `proposed` the requested one waiting out its delay.
#[cw_serde]
pub struct SecurityInfo {
    /// Administrator ed25519 public key. `None` while in emergency.
    pub administrator: TimeChallenged<Binary>,
    pub tss: TimeChallenged<TssKeyProposal>,
    /// Guardian ed25519 public keys (empty until the first nomination commits)
    pub guardians: TimeChallenged<Vec<Binary>>,
    /// One vote slot per guardian, parallel to `guardians`
    pub guardian_votes: Vec<Option<Binary>>,
    pub delays: TimeChallenged<SecurityDelays>,
    /// Advanced whenever a TSS-authorized action consumes a signature
    pub tss_nonce: u64,
    /// Whether the off-chain key generation ceremony may install a TSS key
    pub allow_key_gen: bool,
    /// Nonce bound into administrator key possession proofs
    pub proof_nonce: u64,
}

impl SecurityInfo {
    pub fn new(administrator: Binary, delays: Option<SecurityDelays>) -> Self {
        Self {
            administrator: TimeChallenged::with_current(Some(administrator)),
            tss: TimeChallenged::default(),
            guardians: TimeChallenged::default(),
            guardian_votes: vec![],
            delays: TimeChallenged::with_current(delays),
            tss_nonce: 0,
            allow_key_gen: false,
            proof_nonce: 0,
        }
    }

    pub fn administrator(&self) -> Option<&Binary> {
        self.administrator.current.as_ref()
    }

    pub fn tss_key(&self) -> Option<&TssKey> {
        self.tss.current.as_ref().map(|proposal| &proposal.key)
    }

    pub fn key_sign_threshold(&self) -> u32 {
        self.tss
            .current
            .as_ref()
            .map(|proposal| proposal.key_sign_threshold)
            .unwrap_or(0)
    }

    pub fn guardians(&self) -> &[Binary] {
        self.guardians.current.as_deref().unwrap_or(&[])
    }
}

// ============================================================================
// Bridge / Orchestrator Configuration
// ============================================================================

/// Halt state and free-form bridge metadata.
#[cw_serde]
pub struct BridgeConfig {
    pub halted: bool,
    /// Momentum height of the last `Unhalt`
    pub unhalted_at: u64,
    /// Momentums after an unhalt during which the bridge still counts as halted
    pub unhalt_duration_in_momentums: u64,
    pub metadata: String,
}

impl BridgeConfig {
    /// Halted explicitly, or still inside the post-unhalt cool-down.
    pub fn is_halted(&self, height: u64) -> bool {
        self.halted || height < self.unhalted_at.saturating_add(self.unhalt_duration_in_momentums)
    }
}

/// Parameters consumed by the off-chain orchestrators.
#[cw_serde]
#[derive(Default)]
pub struct OrchestratorInfo {
    pub window_size: u64,
    pub key_gen_threshold: u32,
    pub confirmations_to_finality: u32,
    pub estimated_momentum_time: u32,
    /// Height of the last `AllowKeygen`
    pub allow_key_gen_height: u64,
}

// ============================================================================
// Network Registry
// ============================================================================

/// Pairing between a local token and its representation on a foreign network.
#[cw_serde]
pub struct TokenPair {
    pub token_standard: AssetInfo,
    /// Token address on the foreign network
    pub token_address: String,
    pub bridgeable: bool,
    pub redeemable: bool,
    /// `true`: mint/burn model, `false`: custody model
    pub owned: bool,
    pub min_amount: Uint128,
    /// Hundredths of a percent (10000 = 100%)
    pub fee_percentage: u32,
    /// Momentums between unwrap registration and redemption
    pub redeem_delay: u64,
    pub metadata: String,
}

/// Foreign network keyed by `(network_class, chain_id)`.
#[cw_serde]
#[derive(Default)]
pub struct NetworkInfo {
    pub network_class: u32,
    pub chain_id: u32,
    pub name: String,
    /// Bridge contract address on the foreign network
    pub contract_address: String,
    pub metadata: String,
    pub token_pairs: Vec<TokenPair>,
}

impl NetworkInfo {
    pub fn pair_by_standard(&self, token_standard: &AssetInfo) -> Option<&TokenPair> {
        self.token_pairs
            .iter()
            .find(|pair| &pair.token_standard == token_standard)
    }

    pub fn pair_by_address(&self, token_address: &str) -> Option<&TokenPair> {
        self.token_pairs
            .iter()
            .find(|pair| pair.token_address.eq_ignore_ascii_case(token_address))
    }
}

// ============================================================================
// Request Ledgers
// ============================================================================

/// Outbound request: value left this chain and awaits release on a foreign one.
#[cw_serde]
pub struct WrapTokenRequest {
    pub id: Binary,
    pub network_class: u32,
    pub chain_id: u32,
    /// Recipient on the foreign network
    pub to_address: String,
    pub token_standard: AssetInfo,
    pub token_address: String,
    /// Net amount (gross minus fee)
    pub amount: Uint128,
    pub fee: Uint128,
    /// TSS signature, empty until attached by `UpdateWrapRequest`
    pub signature: Binary,
    pub creation_momentum_height: u64,
}

/// Inbound request registered from a foreign-chain event.
#[cw_serde]
pub struct UnwrapTokenRequest {
    pub registration_momentum_height: u64,
    pub network_class: u32,
    pub chain_id: u32,
    pub transaction_hash: Binary,
    pub log_index: u32,
    pub to_address: Addr,
    pub token_address: String,
    pub amount: Uint128,
    pub signature: Binary,
    pub redeemed: bool,
    pub revoked: bool,
}

// ============================================================================
// Constants
// ============================================================================

/// Contract name for cw2 migration info
pub const CONTRACT_NAME: &str = "crates.io:embedded-bridge";

/// Contract version for cw2 migration info
pub const CONTRACT_VERSION: &str = "1.0.0";

/// Minimum number of guardians in a nomination
pub const MIN_GUARDIANS: usize = 5;

/// Lower bound for `SetUnhaltDuration`
pub const MIN_UNHALT_DURATION_IN_MOMENTUMS: u64 = 10;

/// Unhalt cool-down used when instantiation does not set one
pub const DEFAULT_UNHALT_DURATION: u64 = MIN_UNHALT_DURATION_IN_MOMENTUMS;

/// Lower bound for the administrator delay
pub const MIN_ADMINISTRATOR_DELAY: u64 = 10;

/// Lower bound for the soft and TSS delays
pub const MIN_SOFT_DELAY: u64 = 5;

/// Network class of EVM chains (contract and recipient addresses are 20-byte hex)
pub const NETWORK_CLASS_EVM: u32 = 2;

/// Maximum length of network names
pub const MAX_NETWORK_NAME_LEN: usize = 64;

/// Maximum length of any metadata field
pub const MAX_METADATA_LEN: usize = 2048;

// ============================================================================
// Storage
// ============================================================================

pub const SECURITY: Item<SecurityInfo> = Item::new("security");

pub const BRIDGE: Item<BridgeConfig> = Item::new("bridge");

pub const ORCHESTRATOR: Item<OrchestratorInfo> = Item::new("orchestrator");

/// Key: (network_class, chain_id)
pub const NETWORKS: Map<(u32, u32), NetworkInfo> = Map::new("networks");

/// Wrap requests in creation order
/// Key: sequence number, Value: WrapTokenRequest
pub const WRAP_REQUESTS: Map<u64, WrapTokenRequest> = Map::new("wrap_requests");

/// Key: 32-byte request id, Value: sequence number in WRAP_REQUESTS
pub const WRAP_REQUEST_IDS: Map<&[u8], u64> = Map::new("wrap_request_ids");

/// Number of wrap requests created so far
pub const WRAP_SEQUENCE: Item<u64> = Item::new("wrap_sequence");

/// Key: (transaction_hash, log_index), Value: UnwrapTokenRequest
pub const UNWRAP_REQUESTS: Map<(&[u8], u32), UnwrapTokenRequest> = Map::new("unwrap_requests");

/// Tokens held by the bridge for custody-model pairs
/// Key: token key (denom or CW20 address), Value: held amount
pub const CUSTODY_BALANCES: Map<&str, Uint128> = Map::new("custody_balances");

// ============================================================================
// Custody Accounting
// ============================================================================

/// Add `amount` to the custody balance of `token`.
pub fn increase_custody(
    storage: &mut dyn Storage,
    token: &AssetInfo,
    amount: Uint128,
) -> StdResult<Uint128> {
    let key = token.key();
    let balance = CUSTODY_BALANCES
        .may_load(storage, &key)?
        .unwrap_or_default()
        .checked_add(amount)?;
    CUSTODY_BALANCES.save(storage, &key, &balance)?;
    Ok(balance)
}

/// Take `amount` out of the custody balance of `token`. Never goes negative.
pub fn decrease_custody(
    storage: &mut dyn Storage,
    token: &AssetInfo,
    amount: Uint128,
) -> Result<Uint128, ContractError> {
    let key = token.key();
    let balance = CUSTODY_BALANCES
        .may_load(storage, &key)?
        .unwrap_or_default()
        .checked_sub(amount)
        .map_err(|_| ContractError::InsufficientCustody {
            token: token.to_string(),
        })?;
    CUSTODY_BALANCES.save(storage, &key, &balance)?;
    Ok(balance)
}
