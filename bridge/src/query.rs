//! Query handlers for the embedded bridge contract.
//!
//! This module contains all query message handlers for retrieving contract state.
//! Queries are pure projections of storage; enumerations are paginated with
//! `start_after`/`limit`.

use cosmwasm_std::{Binary, Deps, Env, Order, StdResult, Uint128};
use cw_storage_plus::Bound;

use common::AssetInfo;

use crate::address_codec::key_owner;
use crate::fee_manager::{get_fee_token_pair, FeeTokenPair};
use crate::msg::{
    BridgeInfoResponse, CustodyBalanceResponse, NetworksResponse, SecurityInfoResponse,
    TimeChallengesResponse, UnwrapTokenRequestResponse, UnwrapTokenRequestsResponse,
    WrapTokenRequestResponse, WrapTokenRequestsResponse,
};
use crate::signature::{SignedPayload, WrapPayload};
use crate::state::{
    NetworkInfo, OrchestratorInfo, UnwrapTokenRequest, WrapTokenRequest, BRIDGE,
    CUSTODY_BALANCES, NETWORKS, ORCHESTRATOR, SECURITY, UNWRAP_REQUESTS, WRAP_REQUESTS,
    WRAP_REQUEST_IDS,
};
use crate::time_challenge::TIME_CHALLENGES;

const DEFAULT_LIMIT: u32 = 10;
const MAX_LIMIT: u32 = 30;

fn page_limit(limit: Option<u32>) -> usize {
    limit.unwrap_or(DEFAULT_LIMIT).min(MAX_LIMIT) as usize
}

// ============================================================================
// Security / Bridge Queries
// ============================================================================

pub fn query_security_info(deps: Deps) -> StdResult<SecurityInfoResponse> {
    let security = SECURITY.load(deps.storage)?;
    let administrator_address = security
        .administrator()
        .map(|key| key_owner(deps.api, key))
        .transpose()?;

    Ok(SecurityInfoResponse {
        administrator: security.administrator.current.clone(),
        administrator_address,
        requested_administrator: security.administrator.proposed.clone(),
        administrator_change_height: security.administrator.proposed_at,
        tss_key: security.tss_key().cloned(),
        requested_tss_key: security.tss.proposed.clone(),
        tss_change_height: security.tss.proposed_at,
        key_sign_threshold: security.key_sign_threshold(),
        tss_nonce: security.tss_nonce,
        allow_key_gen: security.allow_key_gen,
        guardians: security.guardians().to_vec(),
        guardian_votes: security.guardian_votes.clone(),
        nominated_guardians: security.guardians.proposed.clone().unwrap_or_default(),
        nomination_height: security.guardians.proposed_at,
        delays: security.delays.current.clone(),
        requested_delays: security.delays.proposed.clone(),
        proof_nonce: security.proof_nonce,
    })
}

pub fn query_bridge_info(deps: Deps, env: Env) -> StdResult<BridgeInfoResponse> {
    let security = SECURITY.load(deps.storage)?;
    let bridge = BRIDGE.load(deps.storage)?;
    let tss_key = security.tss_key();

    Ok(BridgeInfoResponse {
        administrator: security.administrator().cloned(),
        compressed_tss_pub_key: tss_key.map(|key| key.compressed.clone()),
        decompressed_tss_pub_key: tss_key.map(|key| key.decompressed.clone()),
        allow_key_gen: security.allow_key_gen,
        halted: bridge.halted,
        effectively_halted: bridge.is_halted(env.block.height),
        unhalted_at: bridge.unhalted_at,
        unhalt_duration_in_momentums: bridge.unhalt_duration_in_momentums,
        tss_nonce: security.tss_nonce,
        metadata: bridge.metadata,
    })
}

pub fn query_orchestrator_info(deps: Deps) -> StdResult<OrchestratorInfo> {
    ORCHESTRATOR.load(deps.storage)
}

pub fn query_time_challenges(
    deps: Deps,
    start_after: Option<String>,
    limit: Option<u32>,
) -> StdResult<TimeChallengesResponse> {
    let limit = page_limit(limit);
    let start = start_after.as_deref().map(Bound::exclusive);

    let challenges = TIME_CHALLENGES
        .range(deps.storage, start, None, Order::Ascending)
        .take(limit)
        .map(|item| item.map(|(_, challenge)| challenge))
        .collect::<StdResult<Vec<_>>>()?;

    Ok(TimeChallengesResponse { challenges })
}

// ============================================================================
// Network Queries
// ============================================================================

/// A missing network yields a zero-valued record, not an error.
pub fn query_network_info(deps: Deps, network_class: u32, chain_id: u32) -> StdResult<NetworkInfo> {
    Ok(NETWORKS
        .may_load(deps.storage, (network_class, chain_id))?
        .unwrap_or_default())
}

pub fn query_all_networks(
    deps: Deps,
    start_after: Option<(u32, u32)>,
    limit: Option<u32>,
) -> StdResult<NetworksResponse> {
    let limit = page_limit(limit);
    let start = start_after.map(Bound::exclusive);

    let networks = NETWORKS
        .range(deps.storage, start, None, Order::Ascending)
        .take(limit)
        .map(|item| item.map(|(_, network)| network))
        .collect::<StdResult<Vec<_>>>()?;

    Ok(NetworksResponse { networks })
}

// ============================================================================
// Wrap Request Queries
// ============================================================================

fn wrap_request_response(
    deps: Deps,
    env: &Env,
    confirmations_to_finality: u64,
    sequence: u64,
    request: WrapTokenRequest,
) -> StdResult<WrapTokenRequestResponse> {
    let foreign_contract = NETWORKS
        .may_load(deps.storage, (request.network_class, request.chain_id))?
        .map(|network| network.contract_address)
        .unwrap_or_default();
    let message_hash = WrapPayload::from_request(&request, foreign_contract)?
        .digest(&env.contract.address);

    let elapsed = env
        .block
        .height
        .saturating_sub(request.creation_momentum_height);

    Ok(WrapTokenRequestResponse {
        sequence,
        request,
        confirmations_to_finality: confirmations_to_finality.saturating_sub(elapsed),
        message_hash: Binary::from(message_hash.to_vec()),
    })
}

fn confirmations_to_finality(deps: Deps) -> StdResult<u64> {
    Ok(ORCHESTRATOR.load(deps.storage)?.confirmations_to_finality as u64)
}

pub fn query_all_wrap_token_requests(
    deps: Deps,
    env: Env,
    start_after: Option<u64>,
    limit: Option<u32>,
) -> StdResult<WrapTokenRequestsResponse> {
    let limit = page_limit(limit);
    let start = start_after.map(Bound::exclusive);
    let confirmations = confirmations_to_finality(deps)?;

    let requests = WRAP_REQUESTS
        .range(deps.storage, start, None, Order::Ascending)
        .take(limit)
        .map(|item| {
            let (sequence, request) = item?;
            wrap_request_response(deps, &env, confirmations, sequence, request)
        })
        .collect::<StdResult<Vec<_>>>()?;

    Ok(WrapTokenRequestsResponse { requests })
}

/// Requests still waiting for their TSS signature.
pub fn query_all_unsigned_wrap_token_requests(
    deps: Deps,
    env: Env,
    start_after: Option<u64>,
    limit: Option<u32>,
) -> StdResult<WrapTokenRequestsResponse> {
    let limit = page_limit(limit);
    let start = start_after.map(Bound::exclusive);
    let confirmations = confirmations_to_finality(deps)?;

    let requests = WRAP_REQUESTS
        .range(deps.storage, start, None, Order::Ascending)
        .filter(|item| {
            item.as_ref()
                .map(|(_, request)| request.signature.is_empty())
                .unwrap_or(true)
        })
        .take(limit)
        .map(|item| {
            let (sequence, request) = item?;
            wrap_request_response(deps, &env, confirmations, sequence, request)
        })
        .collect::<StdResult<Vec<_>>>()?;

    Ok(WrapTokenRequestsResponse { requests })
}

pub fn query_wrap_token_request_by_id(
    deps: Deps,
    env: Env,
    id: Binary,
) -> StdResult<WrapTokenRequestResponse> {
    let sequence = WRAP_REQUEST_IDS.load(deps.storage, id.as_slice())?;
    let request = WRAP_REQUESTS.load(deps.storage, sequence)?;
    let confirmations = confirmations_to_finality(deps)?;
    wrap_request_response(deps, &env, confirmations, sequence, request)
}

// ============================================================================
// Unwrap Request Queries
// ============================================================================

fn unwrap_request_response(
    deps: Deps,
    env: &Env,
    request: UnwrapTokenRequest,
) -> StdResult<UnwrapTokenRequestResponse> {
    let redeem_delay = NETWORKS
        .may_load(deps.storage, (request.network_class, request.chain_id))?
        .and_then(|network| {
            network
                .pair_by_address(&request.token_address)
                .map(|pair| pair.redeem_delay)
        })
        .unwrap_or(0);
    let elapsed = env
        .block
        .height
        .saturating_sub(request.registration_momentum_height);

    Ok(UnwrapTokenRequestResponse {
        request,
        redeem_delay_left: redeem_delay.saturating_sub(elapsed),
    })
}

pub fn query_unwrap_token_request(
    deps: Deps,
    env: Env,
    transaction_hash: Binary,
    log_index: u32,
) -> StdResult<UnwrapTokenRequestResponse> {
    let request = UNWRAP_REQUESTS.load(deps.storage, (transaction_hash.as_slice(), log_index))?;
    unwrap_request_response(deps, &env, request)
}

pub fn query_all_unwrap_token_requests(
    deps: Deps,
    env: Env,
    start_after: Option<(Binary, u32)>,
    limit: Option<u32>,
) -> StdResult<UnwrapTokenRequestsResponse> {
    let limit = page_limit(limit);
    let start = start_after
        .as_ref()
        .map(|(hash, log_index)| Bound::exclusive((hash.as_slice(), *log_index)));

    let requests = UNWRAP_REQUESTS
        .range(deps.storage, start, None, Order::Ascending)
        .take(limit)
        .map(|item| {
            let (_, request) = item?;
            unwrap_request_response(deps, &env, request)
        })
        .collect::<StdResult<Vec<_>>>()?;

    Ok(UnwrapTokenRequestsResponse { requests })
}

// ============================================================================
// Fee / Custody Queries
// ============================================================================

pub fn query_fee_token_pair(deps: Deps, token_standard: AssetInfo) -> StdResult<FeeTokenPair> {
    get_fee_token_pair(deps.storage, &token_standard)
}

pub fn query_custody_balance(
    deps: Deps,
    token_standard: AssetInfo,
) -> StdResult<CustodyBalanceResponse> {
    let balance = CUSTODY_BALANCES
        .may_load(deps.storage, &token_standard.key())?
        .unwrap_or(Uint128::zero());
    Ok(CustodyBalanceResponse {
        token_standard,
        balance,
    })
}
