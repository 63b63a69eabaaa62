//! Inbound transfer handlers.
//!
//! 1. `UnwrapToken` registers a foreign-chain event signed by the TSS key.
//!    `(transaction_hash, log_index)` can be registered once.
//! 2. `RevokeUnwrapRequest` lets the administrator or a guardian block a
//!    request during its redeem delay.
//! 3. `RedeemUnwrap` releases the tokens once the pair's redeem delay has
//!    passed: minted for owned pairs, paid out of custody otherwise.

use cosmwasm_std::{Binary, DepsMut, Env, MessageInfo, Response, Uint128};

use common::Asset;

use crate::error::ContractError;
use crate::execute::{ensure_not_halted, guardian_index, is_administrator};
use crate::hash::{bytes32_to_hex, to_bytes32};
use crate::signature::{Signed, UnwrapPayload};
use crate::state::{
    decrease_custody, UnwrapTokenRequest, BRIDGE, NETWORKS, SECURITY, UNWRAP_REQUESTS,
};

// ============================================================================
// UnwrapToken
// ============================================================================

/// Register an inbound transfer attested by the TSS key.
#[allow(clippy::too_many_arguments)]
pub fn execute_unwrap_token(
    deps: DepsMut,
    env: Env,
    network_class: u32,
    chain_id: u32,
    transaction_hash: Binary,
    log_index: u32,
    to_address: String,
    token_address: String,
    amount: Uint128,
    signature: Binary,
) -> Result<Response, ContractError> {
    let bridge = BRIDGE.load(deps.storage)?;
    ensure_not_halted(&bridge, env.block.height)?;

    let security = SECURITY.load(deps.storage)?;
    let tss_key = security
        .tss_key()
        .ok_or(ContractError::BridgeNotInitialized)?;

    let network = NETWORKS
        .may_load(deps.storage, (network_class, chain_id))?
        .ok_or(ContractError::InvalidToken)?;
    network
        .pair_by_address(&token_address)
        .filter(|pair| pair.redeemable)
        .ok_or(ContractError::InvalidToken)?;
    if amount.is_zero() {
        return Err(ContractError::InvalidTokenOrAmount);
    }

    let tx_hash = to_bytes32(&transaction_hash)
        .ok_or_else(|| ContractError::forbidden("transaction hash must be 32 bytes"))?;
    if UNWRAP_REQUESTS.has(deps.storage, (tx_hash.as_slice(), log_index)) {
        return Err(ContractError::UnwrapRequestAlreadyExists);
    }
    let to_address = deps.api.addr_validate(&to_address)?;

    let payload = UnwrapPayload {
        network_class,
        chain_id,
        transaction_hash: tx_hash,
        log_index,
        to_address,
        token_address,
        amount,
    };
    let signed = Signed::verify(
        deps.api,
        &env.contract.address,
        tss_key,
        payload,
        signature,
    )?;
    let (payload, signature) = signed.into_parts();

    let request = UnwrapTokenRequest {
        registration_momentum_height: env.block.height,
        network_class: payload.network_class,
        chain_id: payload.chain_id,
        transaction_hash: Binary::from(payload.transaction_hash.to_vec()),
        log_index: payload.log_index,
        to_address: payload.to_address,
        token_address: payload.token_address,
        amount: payload.amount,
        signature,
        redeemed: false,
        revoked: false,
    };
    UNWRAP_REQUESTS.save(deps.storage, (tx_hash.as_slice(), log_index), &request)?;

    Ok(Response::new()
        .add_attribute("method", "unwrap_token")
        .add_attribute("transaction_hash", bytes32_to_hex(&tx_hash))
        .add_attribute("log_index", log_index.to_string())
        .add_attribute("to_address", request.to_address.to_string())
        .add_attribute("token_address", request.token_address)
        .add_attribute("amount", request.amount.to_string()))
}

// ============================================================================
// RedeemUnwrap
// ============================================================================

/// Release the tokens of a registered request after its redeem delay.
pub fn execute_redeem_unwrap(
    deps: DepsMut,
    env: Env,
    transaction_hash: Binary,
    log_index: u32,
) -> Result<Response, ContractError> {
    let bridge = BRIDGE.load(deps.storage)?;
    ensure_not_halted(&bridge, env.block.height)?;

    let tx_hash = to_bytes32(&transaction_hash).ok_or(ContractError::DataNonExistent)?;
    // Absent and already redeemed requests are indistinguishable to the caller
    let mut request = UNWRAP_REQUESTS
        .may_load(deps.storage, (tx_hash.as_slice(), log_index))?
        .filter(|request| !request.redeemed)
        .ok_or(ContractError::DataNonExistent)?;
    if request.revoked {
        return Err(ContractError::UnwrapRequestRevoked);
    }

    let network = NETWORKS
        .may_load(deps.storage, (request.network_class, request.chain_id))?
        .ok_or(ContractError::InvalidToken)?;
    let pair = network
        .pair_by_address(&request.token_address)
        .ok_or(ContractError::InvalidToken)?;

    let elapsed = env
        .block
        .height
        .saturating_sub(request.registration_momentum_height);
    if elapsed < pair.redeem_delay {
        return Err(ContractError::InvalidRedeemPeriod {
            remaining: pair.redeem_delay - elapsed,
        });
    }

    request.redeemed = true;
    UNWRAP_REQUESTS.save(deps.storage, (tx_hash.as_slice(), log_index), &request)?;

    let asset = Asset::new(pair.token_standard.clone(), request.amount);
    let msg = if pair.owned {
        asset.mint_msg(&request.to_address)?
    } else {
        decrease_custody(deps.storage, &asset.info, asset.amount)?;
        asset.transfer_msg(&request.to_address)?
    };

    Ok(Response::new()
        .add_message(msg)
        .add_attribute("method", "redeem_unwrap")
        .add_attribute("transaction_hash", bytes32_to_hex(&tx_hash))
        .add_attribute("log_index", log_index.to_string())
        .add_attribute("recipient", request.to_address.to_string())
        .add_attribute("token_standard", asset.info.to_string())
        .add_attribute("amount", asset.amount.to_string())
        .add_attribute("owned", pair.owned.to_string()))
}

// ============================================================================
// RevokeUnwrapRequest
// ============================================================================

/// Block an unredeemed request. Callable by the administrator or a guardian.
pub fn execute_revoke_unwrap_request(
    deps: DepsMut,
    info: MessageInfo,
    transaction_hash: Binary,
    log_index: u32,
) -> Result<Response, ContractError> {
    let security = SECURITY.load(deps.storage)?;
    if !is_administrator(deps.api, &info.sender, &security)?
        && guardian_index(deps.api, &info.sender, &security)?.is_none()
    {
        return Err(ContractError::PermissionDenied);
    }

    let tx_hash = to_bytes32(&transaction_hash).ok_or(ContractError::DataNonExistent)?;
    let mut request = UNWRAP_REQUESTS
        .may_load(deps.storage, (tx_hash.as_slice(), log_index))?
        .filter(|request| !request.redeemed)
        .ok_or(ContractError::DataNonExistent)?;

    request.revoked = true;
    UNWRAP_REQUESTS.save(deps.storage, (tx_hash.as_slice(), log_index), &request)?;

    Ok(Response::new()
        .add_attribute("method", "revoke_unwrap_request")
        .add_attribute("transaction_hash", bytes32_to_hex(&tx_hash))
        .add_attribute("log_index", log_index.to_string())
        .add_attribute("revoked_by", info.sender.to_string()))
}
