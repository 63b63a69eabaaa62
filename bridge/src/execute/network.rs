//! Network registry handlers.
//!
//! This module handles:
//! - Adding and removing foreign networks
//! - Token pair configuration (time-challenged)
//! - Network metadata updates

use cosmwasm_schema::cw_serde;
use cosmwasm_std::{DepsMut, Env, MessageInfo, Response, Uint128};

use common::AssetInfo;

use crate::address_codec::validate_foreign_address;
use crate::error::ContractError;
use crate::execute::{ensure_administrator, validate_metadata};
use crate::fee_manager::validate_fee_percentage;
use crate::hash::params_hash;
use crate::state::{NetworkInfo, TokenPair, MAX_NETWORK_NAME_LEN, NETWORKS, SECURITY};
use crate::time_challenge::{challenge, ChallengeOutcome, TimeChallengeMethod};

/// Parameters hashed into the `SetTokenPair` time challenge
#[cw_serde]
struct SetTokenPairParams {
    network_class: u32,
    chain_id: u32,
    pair: TokenPair,
}

fn load_network(
    deps: &DepsMut,
    network_class: u32,
    chain_id: u32,
) -> Result<NetworkInfo, ContractError> {
    NETWORKS
        .may_load(deps.storage, (network_class, chain_id))?
        .ok_or_else(|| ContractError::forbidden("network does not exist"))
}

// ============================================================================
// Networks
// ============================================================================

pub fn execute_add_network(
    deps: DepsMut,
    info: MessageInfo,
    network_class: u32,
    chain_id: u32,
    name: String,
    contract_address: String,
    metadata: String,
) -> Result<Response, ContractError> {
    let security = SECURITY.load(deps.storage)?;
    ensure_administrator(deps.api, &info.sender, &security)?;

    if network_class == 0 || chain_id == 0 {
        return Err(ContractError::forbidden(
            "network class and chain id must be non-zero",
        ));
    }
    if name.is_empty() || name.chars().count() > MAX_NETWORK_NAME_LEN {
        return Err(ContractError::forbidden(format!(
            "network name must be 1-{} characters",
            MAX_NETWORK_NAME_LEN
        )));
    }
    validate_foreign_address(network_class, &contract_address)?;
    validate_metadata(&metadata)?;

    if NETWORKS.has(deps.storage, (network_class, chain_id)) {
        return Err(ContractError::forbidden("network already exists"));
    }

    let network = NetworkInfo {
        network_class,
        chain_id,
        name,
        contract_address,
        metadata,
        token_pairs: vec![],
    };
    NETWORKS.save(deps.storage, (network_class, chain_id), &network)?;

    Ok(Response::new()
        .add_attribute("method", "add_network")
        .add_attribute("network_class", network_class.to_string())
        .add_attribute("chain_id", chain_id.to_string())
        .add_attribute("name", network.name)
        .add_attribute("contract_address", network.contract_address))
}

/// Remove a network together with all of its token pairs.
pub fn execute_remove_network(
    deps: DepsMut,
    info: MessageInfo,
    network_class: u32,
    chain_id: u32,
) -> Result<Response, ContractError> {
    let security = SECURITY.load(deps.storage)?;
    ensure_administrator(deps.api, &info.sender, &security)?;

    let network = load_network(&deps, network_class, chain_id)?;
    NETWORKS.remove(deps.storage, (network_class, chain_id));

    Ok(Response::new()
        .add_attribute("method", "remove_network")
        .add_attribute("network_class", network_class.to_string())
        .add_attribute("chain_id", chain_id.to_string())
        .add_attribute("removed_pairs", network.token_pairs.len().to_string()))
}

pub fn execute_update_network_metadata(
    deps: DepsMut,
    info: MessageInfo,
    network_class: u32,
    chain_id: u32,
    metadata: String,
) -> Result<Response, ContractError> {
    let security = SECURITY.load(deps.storage)?;
    ensure_administrator(deps.api, &info.sender, &security)?;
    validate_metadata(&metadata)?;

    let mut network = load_network(&deps, network_class, chain_id)?;
    network.metadata = metadata;
    NETWORKS.save(deps.storage, (network_class, chain_id), &network)?;

    Ok(Response::new()
        .add_attribute("method", "update_network_metadata")
        .add_attribute("network_class", network_class.to_string())
        .add_attribute("chain_id", chain_id.to_string()))
}

// ============================================================================
// Token Pairs
// ============================================================================

/// Propose or commit a token pair. An existing pair for the same token
/// standard is overwritten in place.
#[allow(clippy::too_many_arguments)]
pub fn execute_set_token_pair(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
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
) -> Result<Response, ContractError> {
    let security = SECURITY.load(deps.storage)?;
    ensure_administrator(deps.api, &info.sender, &security)?;

    let mut network = load_network(&deps, network_class, chain_id)?;
    token_standard
        .validate(deps.api)
        .map_err(|e| ContractError::forbidden(e.to_string()))?;
    validate_foreign_address(network_class, &token_address)?;
    validate_fee_percentage(fee_percentage)?;
    validate_metadata(&metadata)?;
    if owned && token_standard.is_native() {
        return Err(ContractError::forbidden(
            "owned pairs require a CW20 token the bridge can mint",
        ));
    }
    if network.token_pairs.iter().any(|existing| {
        existing.token_standard != token_standard
            && existing.token_address.eq_ignore_ascii_case(&token_address)
    }) {
        return Err(ContractError::forbidden(
            "token address already paired with another token",
        ));
    }

    let pair = TokenPair {
        token_standard,
        token_address,
        bridgeable,
        redeemable,
        owned,
        min_amount,
        fee_percentage,
        redeem_delay,
        metadata,
    };

    let method = TimeChallengeMethod::SetTokenPair;
    let delay = method.required_delay(security.delays.current.as_ref())?;
    let params = SetTokenPairParams {
        network_class,
        chain_id,
        pair,
    };
    let hash = params_hash(method.name(), &params)?;
    let outcome = challenge(deps.storage, method, hash, env.block.height, delay)?;

    let pair = params.pair;
    if outcome == ChallengeOutcome::Committed {
        match network
            .token_pairs
            .iter_mut()
            .find(|existing| existing.token_standard == pair.token_standard)
        {
            Some(existing) => *existing = pair.clone(),
            None => network.token_pairs.push(pair.clone()),
        }
        NETWORKS.save(deps.storage, (network_class, chain_id), &network)?;
    }

    Ok(Response::new()
        .add_attribute("method", "set_token_pair")
        .add_attribute("outcome", outcome.as_str())
        .add_attribute("network_class", network_class.to_string())
        .add_attribute("chain_id", chain_id.to_string())
        .add_attribute("token_standard", pair.token_standard.to_string())
        .add_attribute("token_address", pair.token_address)
        .add_attribute("params_hash", hex::encode(hash)))
}

pub fn execute_remove_token_pair(
    deps: DepsMut,
    info: MessageInfo,
    network_class: u32,
    chain_id: u32,
    token_standard: AssetInfo,
) -> Result<Response, ContractError> {
    let security = SECURITY.load(deps.storage)?;
    ensure_administrator(deps.api, &info.sender, &security)?;

    let mut network = load_network(&deps, network_class, chain_id)?;
    let before = network.token_pairs.len();
    network
        .token_pairs
        .retain(|pair| pair.token_standard != token_standard);
    if network.token_pairs.len() == before {
        return Err(ContractError::InvalidToken);
    }
    NETWORKS.save(deps.storage, (network_class, chain_id), &network)?;

    Ok(Response::new()
        .add_attribute("method", "remove_token_pair")
        .add_attribute("network_class", network_class.to_string())
        .add_attribute("chain_id", chain_id.to_string())
        .add_attribute("token_standard", token_standard.to_string()))
}
