//! Outbound transfer handlers (WrapToken and Receive).
//!
//! These handlers take tokens deposited on this chain and register a wrap
//! request for release on a foreign network. The fee is split off and
//! accrued; the gross deposit is burned (owned pairs) or kept in custody.

use cosmwasm_std::{from_json, Addr, Binary, DepsMut, Env, MessageInfo, Response};
use cw20::Cw20ReceiveMsg;

use common::{Asset, AssetInfo};

use crate::address_codec::validate_foreign_address;
use crate::error::ContractError;
use crate::execute::ensure_not_halted;
use crate::fee_manager::{accrue_fee, split_amount};
use crate::hash::{bytes32_to_hex, compute_wrap_request_id, to_bytes32};
use crate::msg::ReceiveMsg;
use crate::signature::{Signed, WrapPayload};
use crate::state::{
    increase_custody, WrapTokenRequest, BRIDGE, NETWORKS, SECURITY, WRAP_REQUESTS,
    WRAP_REQUEST_IDS, WRAP_SEQUENCE,
};

/// Wrap the single native coin attached to the call.
pub fn execute_wrap_token(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
    network_class: u32,
    chain_id: u32,
    to_address: String,
) -> Result<Response, ContractError> {
    if info.funds.len() != 1 {
        return Err(ContractError::InvalidTokenOrAmount);
    }
    let coin = &info.funds[0];
    let deposit = Asset::new(AssetInfo::native(coin.denom.clone()), coin.amount);

    wrap(
        deps,
        &env,
        info.sender,
        network_class,
        chain_id,
        to_address,
        deposit,
    )
}

/// CW20 receive hook. `info.sender` is the token contract.
pub fn execute_receive(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
    cw20_msg: Cw20ReceiveMsg,
) -> Result<Response, ContractError> {
    let sender = deps.api.addr_validate(&cw20_msg.sender)?;
    let deposit = Asset::new(AssetInfo::cw20(info.sender), cw20_msg.amount);

    match from_json::<ReceiveMsg>(&cw20_msg.msg)? {
        ReceiveMsg::WrapToken {
            network_class,
            chain_id,
            to_address,
        } => wrap(
            deps,
            &env,
            sender,
            network_class,
            chain_id,
            to_address,
            deposit,
        ),
    }
}

fn wrap(
    deps: DepsMut,
    env: &Env,
    sender: Addr,
    network_class: u32,
    chain_id: u32,
    to_address: String,
    deposit: Asset,
) -> Result<Response, ContractError> {
    let height = env.block.height;

    let bridge = BRIDGE.load(deps.storage)?;
    ensure_not_halted(&bridge, height)?;

    let security = SECURITY.load(deps.storage)?;
    if security.administrator().is_none() || security.tss_key().is_none() {
        return Err(ContractError::BridgeNotInitialized);
    }

    let network = NETWORKS
        .may_load(deps.storage, (network_class, chain_id))?
        .ok_or(ContractError::InvalidToken)?;
    let pair = network
        .pair_by_standard(&deposit.info)
        .filter(|pair| pair.bridgeable)
        .ok_or(ContractError::InvalidToken)?;

    if deposit.amount.is_zero() || deposit.amount < pair.min_amount {
        return Err(ContractError::InvalidTokenOrAmount);
    }
    validate_foreign_address(network_class, &to_address)?;

    let (net_amount, fee) = split_amount(deposit.amount, pair.fee_percentage);
    accrue_fee(deps.storage, &deposit.info, fee)?;

    let mut response = Response::new();
    if pair.owned {
        response = response.add_message(deposit.burn_msg()?);
    } else {
        increase_custody(deps.storage, &deposit.info, deposit.amount)?;
    }

    let sequence = WRAP_SEQUENCE.may_load(deps.storage)?.unwrap_or(0);
    WRAP_SEQUENCE.save(deps.storage, &(sequence + 1))?;

    let id = compute_wrap_request_id(
        env.contract.address.as_str(),
        sequence,
        height,
        sender.as_str(),
        network_class,
        chain_id,
    );
    let request = WrapTokenRequest {
        id: Binary::from(id.to_vec()),
        network_class,
        chain_id,
        to_address,
        token_standard: deposit.info.clone(),
        token_address: pair.token_address.clone(),
        amount: net_amount,
        fee,
        signature: Binary::default(),
        creation_momentum_height: height,
    };
    WRAP_REQUESTS.save(deps.storage, sequence, &request)?;
    WRAP_REQUEST_IDS.save(deps.storage, id.as_slice(), &sequence)?;

    Ok(response
        .add_attribute("method", "wrap_token")
        .add_attribute("id", bytes32_to_hex(&id))
        .add_attribute("sequence", sequence.to_string())
        .add_attribute("sender", sender.to_string())
        .add_attribute("to_address", request.to_address)
        .add_attribute("token_standard", deposit.info.to_string())
        .add_attribute("amount", net_amount.to_string())
        .add_attribute("fee", fee.to_string())
        .add_attribute("owned", pair.owned.to_string()))
}

/// Attach (or replace) the TSS signature of a wrap request. The signature
/// must verify over the request's message hash.
pub fn execute_update_wrap_request(
    deps: DepsMut,
    env: Env,
    id: Binary,
    signature: Binary,
) -> Result<Response, ContractError> {
    let bridge = BRIDGE.load(deps.storage)?;
    ensure_not_halted(&bridge, env.block.height)?;

    if signature.is_empty() {
        return Err(ContractError::forbidden("empty signature"));
    }

    let id = to_bytes32(&id).ok_or(ContractError::DataNonExistent)?;
    let sequence = WRAP_REQUEST_IDS
        .may_load(deps.storage, id.as_slice())?
        .ok_or(ContractError::DataNonExistent)?;
    let mut request = WRAP_REQUESTS.load(deps.storage, sequence)?;

    let security = SECURITY.load(deps.storage)?;
    let tss_key = security
        .tss_key()
        .ok_or(ContractError::BridgeNotInitialized)?;
    let foreign_contract = NETWORKS
        .may_load(deps.storage, (request.network_class, request.chain_id))?
        .map(|network| network.contract_address)
        .unwrap_or_default();
    let payload = WrapPayload::from_request(&request, foreign_contract)?;
    let (_, signature) = Signed::verify(
        deps.api,
        &env.contract.address,
        tss_key,
        payload,
        signature,
    )?
    .into_parts();

    request.signature = signature;
    WRAP_REQUESTS.save(deps.storage, sequence, &request)?;

    Ok(Response::new()
        .add_attribute("method", "update_wrap_request")
        .add_attribute("id", bytes32_to_hex(&id))
        .add_attribute("sequence", sequence.to_string()))
}
