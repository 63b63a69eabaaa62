//! Halt controller handlers.
//!
//! The bridge counts as halted while `halted` is set and for
//! `unhalt_duration_in_momentums` momentums after the last unhalt.

use cosmwasm_std::{Binary, DepsMut, Env, MessageInfo, Response};

use crate::error::ContractError;
use crate::execute::{ensure_administrator, is_administrator};
use crate::signature::{HaltPayload, Signed};
use crate::state::{BRIDGE, MIN_UNHALT_DURATION_IN_MOMENTUMS, SECURITY};

/// Halt the bridge, as administrator or with a TSS signature.
pub fn execute_halt(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
    signature: Option<Binary>,
) -> Result<Response, ContractError> {
    let mut security = SECURITY.load(deps.storage)?;

    let authorized_by = if is_administrator(deps.api, &info.sender, &security)? {
        "administrator"
    } else {
        let signature = signature.ok_or(ContractError::PermissionDenied)?;
        let tss_key = security
            .tss_key()
            .ok_or(ContractError::BridgeNotInitialized)?;
        Signed::verify(
            deps.api,
            &env.contract.address,
            tss_key,
            HaltPayload {
                tss_nonce: security.tss_nonce,
            },
            signature,
        )?;
        security.tss_nonce += 1;
        SECURITY.save(deps.storage, &security)?;
        "tss"
    };

    let mut bridge = BRIDGE.load(deps.storage)?;
    bridge.halted = true;
    BRIDGE.save(deps.storage, &bridge)?;

    Ok(Response::new()
        .add_attribute("method", "halt")
        .add_attribute("authorized_by", authorized_by)
        .add_attribute("tss_nonce", security.tss_nonce.to_string()))
}

pub fn execute_unhalt(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
) -> Result<Response, ContractError> {
    let security = SECURITY.load(deps.storage)?;
    ensure_administrator(deps.api, &info.sender, &security)?;
    if security.tss_key().is_none() {
        return Err(ContractError::BridgeNotInitialized);
    }

    let mut bridge = BRIDGE.load(deps.storage)?;
    bridge.halted = false;
    bridge.unhalted_at = env.block.height;
    BRIDGE.save(deps.storage, &bridge)?;

    Ok(Response::new()
        .add_attribute("method", "unhalt")
        .add_attribute("unhalted_at", env.block.height.to_string())
        .add_attribute(
            "active_from",
            env.block
                .height
                .saturating_add(bridge.unhalt_duration_in_momentums)
                .to_string(),
        ))
}

pub fn execute_set_unhalt_duration(
    deps: DepsMut,
    info: MessageInfo,
    duration: u64,
) -> Result<Response, ContractError> {
    let security = SECURITY.load(deps.storage)?;
    ensure_administrator(deps.api, &info.sender, &security)?;
    validate_unhalt_duration(duration)?;

    let mut bridge = BRIDGE.load(deps.storage)?;
    bridge.unhalt_duration_in_momentums = duration;
    BRIDGE.save(deps.storage, &bridge)?;

    Ok(Response::new()
        .add_attribute("method", "set_unhalt_duration")
        .add_attribute("duration", duration.to_string()))
}

pub fn validate_unhalt_duration(duration: u64) -> Result<(), ContractError> {
    if duration < MIN_UNHALT_DURATION_IN_MOMENTUMS {
        return Err(ContractError::forbidden(format!(
            "unhalt duration must be at least {}",
            MIN_UNHALT_DURATION_IN_MOMENTUMS
        )));
    }
    Ok(())
}
