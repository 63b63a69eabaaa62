//! Message types for the embedded bridge contract
//!
//! This module defines all messages for instantiation, execution, and queries.
//! Every operation is a variant of a closed enum; the JSON variant tag is the
//! only place its name appears on the wire.

use common::AssetInfo;
use cosmwasm_schema::{cw_serde, QueryResponses};
use cosmwasm_std::{Addr, Binary, Uint128};
use cw20::Cw20ReceiveMsg;

use crate::fee_manager::FeeTokenPair;
use crate::state::{
    NetworkInfo, OrchestratorInfo, SecurityDelays, TssKey, TssKeyProposal, UnwrapTokenRequest,
    WrapTokenRequest,
};
use crate::time_challenge::TimeChallenge;

// ============================================================================
// Instantiate & Migrate
// ============================================================================

/// Migrate message
#[cw_serde]
pub struct MigrateMsg {}

/// Instantiate message
#[cw_serde]
pub struct InstantiateMsg {
    /// Initial administrator ed25519 public key
    pub administrator: Binary,
    /// Time-challenge delays. Can be set later through `SetSecurityDelays`.
    pub delays: Option<SecurityDelays>,
    /// Post-unhalt cool-down (defaults to the minimum)
    pub unhalt_duration: Option<u64>,
    pub metadata: Option<String>,
}

// ============================================================================
// Execute Messages
// ============================================================================

#[cw_serde]
pub enum ExecuteMsg {
    // ========================================================================
    // Security Registry
    // ========================================================================
    /// Rotate the administrator key (time-challenged, administrator delay).
    ///
    /// `proof` is an ed25519 signature by `new_key` over the administrator
    /// proof digest at the current proof nonce.
    ChangeAdministratorKey { new_key: Binary, proof: Binary },

    /// Rotate the TSS key.
    ///
    /// The administrator goes through the time challenge (TSS delay) and the
    /// signatures are ignored; the first key is always installed this way.
    /// Anyone else may replace the installed key while key generation is
    /// allowed, by presenting signatures of the outgoing and the new key.
    ChangeTssKey {
        /// SEC1 compressed (33 bytes) or uncompressed (65 bytes) point
        pub_key: Binary,
        old_key_signature: Option<Binary>,
        new_key_signature: Option<Binary>,
        key_sign_threshold: u32,
    },

    /// Replace the guardian set (time-challenged, soft delay)
    NominateGuardians { guardians: Vec<Binary> },

    /// Configure the time-challenge delays. Immediate the first time,
    /// time-challenged afterwards.
    SetSecurityDelays {
        administrator_delay: u64,
        soft_delay: u64,
        tss_delay: u64,
    },

    /// Open the TSS key-generation window
    AllowKeygen {},

    SetUnhaltDuration { duration: u64 },

    SetOrchestratorInfo {
        window_size: u64,
        key_gen_threshold: u32,
        confirmations_to_finality: u32,
        estimated_momentum_time: u32,
    },

    SetBridgeMetadata { metadata: String },

    // ========================================================================
    // Guardian Recovery
    // ========================================================================
    /// Drop the administrator key and halt the bridge
    Emergency {},

    /// Guardian vote for a new administrator while in emergency
    ProposeAdministrator { candidate: Binary },

    // ========================================================================
    // Halt Controller
    // ========================================================================
    /// Halt the bridge. Callers other than the administrator must supply a
    /// TSS signature over the halt digest at the current TSS nonce.
    Halt { signature: Option<Binary> },

    Unhalt {},

    // ========================================================================
    // Network Registry
    // ========================================================================
    AddNetwork {
        network_class: u32,
        chain_id: u32,
        name: String,
        contract_address: String,
        metadata: String,
    },

    RemoveNetwork { network_class: u32, chain_id: u32 },

    /// Create or update the pair of `token_standard` (time-challenged, soft delay)
    SetTokenPair {
        network_class: u32,
        chain_id: u32,
        token_standard: AssetInfo,
        token_address: String,
        bridgeable: bool,
        redeemable: bool,
        owned: bool,
        min_amount: Uint128,
        fee_percentage: u32,
        redeem_delay: u64,
        metadata: String,
    },

    RemoveTokenPair {
        network_class: u32,
        chain_id: u32,
        token_standard: AssetInfo,
    },

    UpdateNetworkMetadata {
        network_class: u32,
        chain_id: u32,
        metadata: String,
    },

    // ========================================================================
    // Wrap (outbound)
    // ========================================================================
    /// Wrap the native coin attached to the call
    WrapToken {
        network_class: u32,
        chain_id: u32,
        to_address: String,
    },

    /// CW20 receive hook; the embedded message is a [`ReceiveMsg`]
    Receive(Cw20ReceiveMsg),

    /// Attach the TSS signature produced off-chain to a wrap request.
    /// Must verify under the current TSS key over the request's message hash.
    UpdateWrapRequest { id: Binary, signature: Binary },

    // ========================================================================
    // Unwrap (inbound)
    // ========================================================================
    UnwrapToken {
        network_class: u32,
        chain_id: u32,
        transaction_hash: Binary,
        log_index: u32,
        to_address: String,
        token_address: String,
        amount: Uint128,
        signature: Binary,
    },

    RedeemUnwrap {
        transaction_hash: Binary,
        log_index: u32,
    },

    /// Block an unredeemed request (administrator or guardian)
    RevokeUnwrapRequest {
        transaction_hash: Binary,
        log_index: u32,
    },
}

/// Messages embedded in a CW20 `Send`
#[cw_serde]
pub enum ReceiveMsg {
    WrapToken {
        network_class: u32,
        chain_id: u32,
        to_address: String,
    },
}

// ============================================================================
// Query Messages
// ============================================================================

#[cw_serde]
#[derive(QueryResponses)]
pub enum QueryMsg {
    #[returns(SecurityInfoResponse)]
    SecurityInfo {},

    #[returns(BridgeInfoResponse)]
    BridgeInfo {},

    #[returns(OrchestratorInfo)]
    OrchestratorInfo {},

    /// Zero-valued record if the network does not exist
    #[returns(NetworkInfo)]
    NetworkInfo { network_class: u32, chain_id: u32 },

    #[returns(NetworksResponse)]
    AllNetworks {
        start_after: Option<(u32, u32)>,
        limit: Option<u32>,
    },

    /// Paginated by sequence number
    #[returns(WrapTokenRequestsResponse)]
    AllWrapTokenRequests {
        start_after: Option<u64>,
        limit: Option<u32>,
    },

    #[returns(WrapTokenRequestsResponse)]
    AllUnsignedWrapTokenRequests {
        start_after: Option<u64>,
        limit: Option<u32>,
    },

    #[returns(WrapTokenRequestResponse)]
    WrapTokenRequestById { id: Binary },

    #[returns(UnwrapTokenRequestResponse)]
    UnwrapTokenRequestByHashAndLog {
        transaction_hash: Binary,
        log_index: u32,
    },

    #[returns(UnwrapTokenRequestsResponse)]
    AllUnwrapTokenRequests {
        start_after: Option<(Binary, u32)>,
        limit: Option<u32>,
    },

    #[returns(FeeTokenPair)]
    FeeTokenPair { token_standard: AssetInfo },

    #[returns(TimeChallengesResponse)]
    TimeChallengesInfo {
        start_after: Option<String>,
        limit: Option<u32>,
    },

    #[returns(CustodyBalanceResponse)]
    CustodyBalance { token_standard: AssetInfo },
}

// ============================================================================
// Query Responses
// ============================================================================

#[cw_serde]
pub struct SecurityInfoResponse {
    pub administrator: Option<Binary>,
    /// Address owned by the administrator key
    pub administrator_address: Option<Addr>,
    pub requested_administrator: Option<Binary>,
    pub administrator_change_height: Option<u64>,
    pub tss_key: Option<TssKey>,
    pub requested_tss_key: Option<TssKeyProposal>,
    pub tss_change_height: Option<u64>,
    pub key_sign_threshold: u32,
    pub tss_nonce: u64,
    pub allow_key_gen: bool,
    pub guardians: Vec<Binary>,
    pub guardian_votes: Vec<Option<Binary>>,
    pub nominated_guardians: Vec<Binary>,
    pub nomination_height: Option<u64>,
    pub delays: Option<SecurityDelays>,
    pub requested_delays: Option<SecurityDelays>,
    pub proof_nonce: u64,
}

#[cw_serde]
pub struct BridgeInfoResponse {
    pub administrator: Option<Binary>,
    pub compressed_tss_pub_key: Option<Binary>,
    pub decompressed_tss_pub_key: Option<Binary>,
    pub allow_key_gen: bool,
    pub halted: bool,
    /// `halted` or still inside the post-unhalt cool-down
    pub effectively_halted: bool,
    pub unhalted_at: u64,
    pub unhalt_duration_in_momentums: u64,
    pub tss_nonce: u64,
    pub metadata: String,
}

#[cw_serde]
pub struct NetworksResponse {
    pub networks: Vec<NetworkInfo>,
}

#[cw_serde]
pub struct WrapTokenRequestResponse {
    pub sequence: u64,
    pub request: WrapTokenRequest,
    /// Momentums left until the request is final enough to sign
    pub confirmations_to_finality: u64,
    /// Digest the TSS key is expected to sign for this request
    pub message_hash: Binary,
}

#[cw_serde]
pub struct WrapTokenRequestsResponse {
    pub requests: Vec<WrapTokenRequestResponse>,
}

#[cw_serde]
pub struct UnwrapTokenRequestResponse {
    pub request: UnwrapTokenRequest,
    /// Momentums left before `RedeemUnwrap` is accepted
    pub redeem_delay_left: u64,
}

#[cw_serde]
pub struct UnwrapTokenRequestsResponse {
    pub requests: Vec<UnwrapTokenRequestResponse>,
}

#[cw_serde]
pub struct TimeChallengesResponse {
    pub challenges: Vec<TimeChallenge>,
}

#[cw_serde]
pub struct CustodyBalanceResponse {
    pub token_standard: AssetInfo,
    pub balance: Uint128,
}
