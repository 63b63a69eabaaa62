//! Embedded Bridge Contract - Entry Points
//!
//! The implementation is modularized into:
//! - `execute/` - Execute message handlers
//! - `query` - Query message handlers

use cosmwasm_std::{
    entry_point, to_json_binary, Binary, Deps, DepsMut, Env, MessageInfo, Response, StdResult,
};
use cw2::set_contract_version;

use crate::error::ContractError;
use crate::execute::{
    execute_add_network, execute_allow_keygen, execute_change_administrator_key,
    execute_change_tss_key, execute_emergency, execute_halt, execute_nominate_guardians,
    execute_propose_administrator, execute_receive, execute_redeem_unwrap, execute_remove_network,
    execute_remove_token_pair, execute_revoke_unwrap_request, execute_set_bridge_metadata,
    execute_set_orchestrator_info, execute_set_security_delays, execute_set_token_pair,
    execute_set_unhalt_duration, execute_unhalt, execute_unwrap_token,
    execute_update_network_metadata, execute_update_wrap_request, execute_wrap_token,
    validate_metadata, validate_security_delays, validate_unhalt_duration,
};
use crate::msg::{ExecuteMsg, InstantiateMsg, MigrateMsg, QueryMsg};
use crate::query::{
    query_all_networks, query_all_unsigned_wrap_token_requests, query_all_unwrap_token_requests,
    query_all_wrap_token_requests, query_bridge_info, query_custody_balance,
    query_fee_token_pair, query_network_info, query_orchestrator_info, query_security_info,
    query_time_challenges, query_unwrap_token_request, query_wrap_token_request_by_id,
};
use crate::signature::validate_ed25519_key;
use crate::state::{
    BridgeConfig, OrchestratorInfo, SecurityDelays, SecurityInfo, BRIDGE, CONTRACT_NAME,
    CONTRACT_VERSION, DEFAULT_UNHALT_DURATION, ORCHESTRATOR, SECURITY, WRAP_SEQUENCE,
};

// ============================================================================
// Instantiate
// ============================================================================

#[cfg_attr(not(feature = "library"), entry_point)]
pub fn instantiate(
    deps: DepsMut,
    _env: Env,
    _info: MessageInfo,
    msg: InstantiateMsg,
) -> Result<Response, ContractError> {
    set_contract_version(deps.storage, CONTRACT_NAME, CONTRACT_VERSION)?;

    validate_ed25519_key(&msg.administrator)?;
    if let Some(delays) = &msg.delays {
        validate_security_delays(delays)?;
    }
    let unhalt_duration = msg.unhalt_duration.unwrap_or(DEFAULT_UNHALT_DURATION);
    validate_unhalt_duration(unhalt_duration)?;
    let metadata = msg.metadata.unwrap_or_default();
    validate_metadata(&metadata)?;

    let security = SecurityInfo::new(msg.administrator.clone(), msg.delays.clone());
    SECURITY.save(deps.storage, &security)?;

    let bridge = BridgeConfig {
        halted: false,
        unhalted_at: 0,
        unhalt_duration_in_momentums: unhalt_duration,
        metadata,
    };
    BRIDGE.save(deps.storage, &bridge)?;

    ORCHESTRATOR.save(deps.storage, &OrchestratorInfo::default())?;
    WRAP_SEQUENCE.save(deps.storage, &0u64)?;

    Ok(Response::new()
        .add_attribute("method", "instantiate")
        .add_attribute("administrator", hex::encode(msg.administrator.as_slice()))
        .add_attribute("delays_configured", msg.delays.is_some().to_string())
        .add_attribute("unhalt_duration", unhalt_duration.to_string()))
}

// ============================================================================
// Execute
// ============================================================================

#[cfg_attr(not(feature = "library"), entry_point)]
pub fn execute(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
    msg: ExecuteMsg,
) -> Result<Response, ContractError> {
    match msg {
        // Security registry
        ExecuteMsg::ChangeAdministratorKey { new_key, proof } => {
            execute_change_administrator_key(deps, env, info, new_key, proof)
        }
        ExecuteMsg::ChangeTssKey {
            pub_key,
            old_key_signature,
            new_key_signature,
            key_sign_threshold,
        } => execute_change_tss_key(
            deps,
            env,
            info,
            pub_key,
            old_key_signature,
            new_key_signature,
            key_sign_threshold,
        ),
        ExecuteMsg::NominateGuardians { guardians } => {
            execute_nominate_guardians(deps, env, info, guardians)
        }
        ExecuteMsg::SetSecurityDelays {
            administrator_delay,
            soft_delay,
            tss_delay,
        } => execute_set_security_delays(
            deps,
            env,
            info,
            SecurityDelays {
                administrator_delay,
                soft_delay,
                tss_delay,
            },
        ),
        ExecuteMsg::AllowKeygen {} => execute_allow_keygen(deps, env, info),
        ExecuteMsg::SetUnhaltDuration { duration } => {
            execute_set_unhalt_duration(deps, info, duration)
        }
        ExecuteMsg::SetOrchestratorInfo {
            window_size,
            key_gen_threshold,
            confirmations_to_finality,
            estimated_momentum_time,
        } => execute_set_orchestrator_info(
            deps,
            info,
            window_size,
            key_gen_threshold,
            confirmations_to_finality,
            estimated_momentum_time,
        ),
        ExecuteMsg::SetBridgeMetadata { metadata } => {
            execute_set_bridge_metadata(deps, info, metadata)
        }

        // Guardian recovery
        ExecuteMsg::Emergency {} => execute_emergency(deps, info),
        ExecuteMsg::ProposeAdministrator { candidate } => {
            execute_propose_administrator(deps, info, candidate)
        }

        // Halt controller
        ExecuteMsg::Halt { signature } => execute_halt(deps, env, info, signature),
        ExecuteMsg::Unhalt {} => execute_unhalt(deps, env, info),

        // Network registry
        ExecuteMsg::AddNetwork {
            network_class,
            chain_id,
            name,
            contract_address,
            metadata,
        } => execute_add_network(
            deps,
            info,
            network_class,
            chain_id,
            name,
            contract_address,
            metadata,
        ),
        ExecuteMsg::RemoveNetwork {
            network_class,
            chain_id,
        } => execute_remove_network(deps, info, network_class, chain_id),
        ExecuteMsg::SetTokenPair {
            network_class,
            chain_id,
            token_standard,
            token_address,
            bridgeable,
            redeemable,
            owned,
            min_amount,
            fee_percentage,
            redeem_delay,
            metadata,
        } => execute_set_token_pair(
            deps,
            env,
            info,
            network_class,
            chain_id,
            token_standard,
            token_address,
            bridgeable,
            redeemable,
            owned,
            min_amount,
            fee_percentage,
            redeem_delay,
            metadata,
        ),
        ExecuteMsg::RemoveTokenPair {
            network_class,
            chain_id,
            token_standard,
        } => execute_remove_token_pair(deps, info, network_class, chain_id, token_standard),
        ExecuteMsg::UpdateNetworkMetadata {
            network_class,
            chain_id,
            metadata,
        } => execute_update_network_metadata(deps, info, network_class, chain_id, metadata),

        // Wrap
        ExecuteMsg::WrapToken {
            network_class,
            chain_id,
            to_address,
        } => execute_wrap_token(deps, env, info, network_class, chain_id, to_address),
        ExecuteMsg::Receive(cw20_msg) => execute_receive(deps, env, info, cw20_msg),
        ExecuteMsg::UpdateWrapRequest { id, signature } => {
            execute_update_wrap_request(deps, env, id, signature)
        }

        // Unwrap
        ExecuteMsg::UnwrapToken {
            network_class,
            chain_id,
            transaction_hash,
            log_index,
            to_address,
            token_address,
            amount,
            signature,
        } => execute_unwrap_token(
            deps,
            env,
            network_class,
            chain_id,
            transaction_hash,
            log_index,
            to_address,
            token_address,
            amount,
            signature,
        ),
        ExecuteMsg::RedeemUnwrap {
            transaction_hash,
            log_index,
        } => execute_redeem_unwrap(deps, env, transaction_hash, log_index),
        ExecuteMsg::RevokeUnwrapRequest {
            transaction_hash,
            log_index,
        } => execute_revoke_unwrap_request(deps, info, transaction_hash, log_index),
    }
}

// ============================================================================
// Query
// ============================================================================

#[cfg_attr(not(feature = "library"), entry_point)]
pub fn query(deps: Deps, env: Env, msg: QueryMsg) -> StdResult<Binary> {
    match msg {
        // Security / bridge
        QueryMsg::SecurityInfo {} => to_json_binary(&query_security_info(deps)?),
        QueryMsg::BridgeInfo {} => to_json_binary(&query_bridge_info(deps, env)?),
        QueryMsg::OrchestratorInfo {} => to_json_binary(&query_orchestrator_info(deps)?),
        QueryMsg::TimeChallengesInfo { start_after, limit } => {
            to_json_binary(&query_time_challenges(deps, start_after, limit)?)
        }

        // Networks
        QueryMsg::NetworkInfo {
            network_class,
            chain_id,
        } => to_json_binary(&query_network_info(deps, network_class, chain_id)?),
        QueryMsg::AllNetworks { start_after, limit } => {
            to_json_binary(&query_all_networks(deps, start_after, limit)?)
        }

        // Wrap requests
        QueryMsg::AllWrapTokenRequests { start_after, limit } => {
            to_json_binary(&query_all_wrap_token_requests(deps, env, start_after, limit)?)
        }
        QueryMsg::AllUnsignedWrapTokenRequests { start_after, limit } => to_json_binary(
            &query_all_unsigned_wrap_token_requests(deps, env, start_after, limit)?,
        ),
        QueryMsg::WrapTokenRequestById { id } => {
            to_json_binary(&query_wrap_token_request_by_id(deps, env, id)?)
        }

        // Unwrap requests
        QueryMsg::UnwrapTokenRequestByHashAndLog {
            transaction_hash,
            log_index,
        } => to_json_binary(&query_unwrap_token_request(
            deps,
            env,
            transaction_hash,
            log_index,
        )?),
        QueryMsg::AllUnwrapTokenRequests { start_after, limit } => {
            to_json_binary(&query_all_unwrap_token_requests(deps, env, start_after, limit)?)
        }

        // Fees / custody
        QueryMsg::FeeTokenPair { token_standard } => {
            to_json_binary(&query_fee_token_pair(deps, token_standard)?)
        }
        QueryMsg::CustodyBalance { token_standard } => {
            to_json_binary(&query_custody_balance(deps, token_standard)?)
        }
    }
}

// ============================================================================
// Migrate
// ============================================================================

#[cfg_attr(not(feature = "library"), entry_point)]
pub fn migrate(deps: DepsMut, _env: Env, _msg: MigrateMsg) -> Result<Response, ContractError> {
    set_contract_version(deps.storage, CONTRACT_NAME, CONTRACT_VERSION)?;

    Ok(Response::new()
        .add_attribute("action", "migrate")
        .add_attribute("version", CONTRACT_VERSION))
}
