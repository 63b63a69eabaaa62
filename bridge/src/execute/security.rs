//! Security registry handlers.
//!
//! This module handles:
//! - Administrator and TSS key rotation
//! - Guardian nomination
//! - Time-challenge delays
//! - Key generation window and orchestrator parameters

use std::collections::HashSet;

use cosmwasm_std::{Binary, DepsMut, Env, MessageInfo, Response};

use crate::error::ContractError;
use crate::execute::{ensure_administrator, is_administrator, validate_metadata};
use crate::hash::keccak256;
use crate::signature::{
    decompress_tss_key, validate_ed25519_key, verify_administrator_proof, Signed,
    TssChangePayload,
};
use crate::state::{
    SecurityDelays, TssKeyProposal, BRIDGE, MIN_ADMINISTRATOR_DELAY, MIN_GUARDIANS,
    MIN_SOFT_DELAY, ORCHESTRATOR, SECURITY,
};
use crate::time_challenge::{ChallengeOutcome, TimeChallengeMethod};

// ============================================================================
// Administrator Key
// ============================================================================

/// Propose or commit a new administrator key.
pub fn execute_change_administrator_key(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
    new_key: Binary,
    proof: Binary,
) -> Result<Response, ContractError> {
    let mut security = SECURITY.load(deps.storage)?;
    ensure_administrator(deps.api, &info.sender, &security)?;

    validate_ed25519_key(&new_key)?;
    verify_administrator_proof(
        deps.api,
        &env.contract.address,
        security.proof_nonce,
        &new_key,
        &proof,
    )?;

    let method = TimeChallengeMethod::ChangeAdministratorKey;
    let delay = method.required_delay(security.delays.current.as_ref())?;
    let outcome = security.administrator.propose_or_commit(
        deps.storage,
        method,
        new_key.clone(),
        env.block.height,
        delay,
    )?;
    if outcome == ChallengeOutcome::Committed {
        security.proof_nonce += 1;
    }
    SECURITY.save(deps.storage, &security)?;

    Ok(Response::new()
        .add_attribute("method", "change_administrator_key")
        .add_attribute("outcome", outcome.as_str())
        .add_attribute("new_key", hex::encode(new_key.as_slice())))
}

// ============================================================================
// TSS Key
// ============================================================================

/// Rotate the TSS key, either through the administrator's time challenge or
/// through the key-generation ceremony. The ceremony can only replace an
/// installed key.
pub fn execute_change_tss_key(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
    pub_key: Binary,
    old_key_signature: Option<Binary>,
    new_key_signature: Option<Binary>,
    key_sign_threshold: u32,
) -> Result<Response, ContractError> {
    let mut security = SECURITY.load(deps.storage)?;
    let new_key = decompress_tss_key(&pub_key)?;
    if key_sign_threshold == 0 {
        return Err(ContractError::forbidden("key sign threshold must be positive"));
    }
    let proposal = TssKeyProposal {
        key: new_key.clone(),
        key_sign_threshold,
    };

    if is_administrator(deps.api, &info.sender, &security)? {
        let method = TimeChallengeMethod::ChangeTssKey;
        let delay = method.required_delay(security.delays.current.as_ref())?;
        let outcome = security.tss.propose_or_commit(
            deps.storage,
            method,
            proposal,
            env.block.height,
            delay,
        )?;
        if outcome == ChallengeOutcome::Committed {
            security.tss_nonce += 1;
        }
        SECURITY.save(deps.storage, &security)?;

        return Ok(Response::new()
            .add_attribute("method", "change_tss_key")
            .add_attribute("path", "administrator")
            .add_attribute("outcome", outcome.as_str())
            .add_attribute("tss_key", hex::encode(new_key.compressed.as_slice())));
    }

    // The first key can only come from the administrator
    let current = match security.tss_key() {
        Some(current) if security.allow_key_gen => current,
        _ => return Err(ContractError::PermissionDenied),
    };

    let payload = TssChangePayload {
        tss_nonce: security.tss_nonce,
        new_key: new_key.clone(),
    };
    let signature = old_key_signature.ok_or(ContractError::InvalidSignature)?;
    Signed::verify(
        deps.api,
        &env.contract.address,
        current,
        payload.clone(),
        signature,
    )?;
    let signature = new_key_signature.ok_or(ContractError::InvalidSignature)?;
    Signed::verify(deps.api, &env.contract.address, &new_key, payload, signature)?;

    security.tss.current = Some(proposal);
    security.allow_key_gen = false;
    security.tss_nonce += 1;
    SECURITY.save(deps.storage, &security)?;

    Ok(Response::new()
        .add_attribute("method", "change_tss_key")
        .add_attribute("path", "key_gen")
        .add_attribute("outcome", "committed")
        .add_attribute("tss_key", hex::encode(new_key.compressed.as_slice())))
}

// ============================================================================
// Guardians
// ============================================================================

/// Propose or commit a new guardian set.
pub fn execute_nominate_guardians(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
    guardians: Vec<Binary>,
) -> Result<Response, ContractError> {
    let mut security = SECURITY.load(deps.storage)?;
    ensure_administrator(deps.api, &info.sender, &security)?;

    if guardians.len() < MIN_GUARDIANS {
        return Err(ContractError::forbidden(format!(
            "at least {} guardians required, got {}",
            MIN_GUARDIANS,
            guardians.len()
        )));
    }
    let mut seen = HashSet::new();
    for guardian in &guardians {
        validate_ed25519_key(guardian)?;
        if !seen.insert(guardian.as_slice()) {
            return Err(ContractError::forbidden("duplicate guardian"));
        }
    }

    let count = guardians.len();
    let method = TimeChallengeMethod::NominateGuardians;
    let delay = method.required_delay(security.delays.current.as_ref())?;
    let outcome = security.guardians.propose_or_commit(
        deps.storage,
        method,
        guardians,
        env.block.height,
        delay,
    )?;
    if outcome == ChallengeOutcome::Committed {
        security.guardian_votes = vec![None; count];
    }
    SECURITY.save(deps.storage, &security)?;

    Ok(Response::new()
        .add_attribute("method", "nominate_guardians")
        .add_attribute("outcome", outcome.as_str())
        .add_attribute("guardian_count", count.to_string()))
}

// ============================================================================
// Delays
// ============================================================================

/// Configure the time-challenge delays.
pub fn execute_set_security_delays(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
    delays: SecurityDelays,
) -> Result<Response, ContractError> {
    let mut security = SECURITY.load(deps.storage)?;
    ensure_administrator(deps.api, &info.sender, &security)?;
    validate_security_delays(&delays)?;

    let outcome = match security.delays.current.clone() {
        // First configuration: nothing to time-challenge against yet
        None => {
            security.delays.current = Some(delays.clone());
            "applied"
        }
        Some(current) => {
            let method = TimeChallengeMethod::SetSecurityDelays;
            let delay = method.required_delay(Some(&current))?;
            security
                .delays
                .propose_or_commit(
                    deps.storage,
                    method,
                    delays.clone(),
                    env.block.height,
                    delay,
                )?
                .as_str()
        }
    };
    SECURITY.save(deps.storage, &security)?;

    Ok(Response::new()
        .add_attribute("method", "set_security_delays")
        .add_attribute("outcome", outcome)
        .add_attribute("administrator_delay", delays.administrator_delay.to_string())
        .add_attribute("soft_delay", delays.soft_delay.to_string())
        .add_attribute("tss_delay", delays.tss_delay.to_string()))
}

pub fn validate_security_delays(delays: &SecurityDelays) -> Result<(), ContractError> {
    if delays.administrator_delay < MIN_ADMINISTRATOR_DELAY {
        return Err(ContractError::forbidden(format!(
            "administrator delay must be at least {}",
            MIN_ADMINISTRATOR_DELAY
        )));
    }
    if delays.soft_delay < MIN_SOFT_DELAY || delays.tss_delay < MIN_SOFT_DELAY {
        return Err(ContractError::forbidden(format!(
            "soft and TSS delays must be at least {}",
            MIN_SOFT_DELAY
        )));
    }
    Ok(())
}

// ============================================================================
// Key Generation / Orchestrator
// ============================================================================

/// Open the key-generation window for the next TSS key.
pub fn execute_allow_keygen(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
) -> Result<Response, ContractError> {
    let mut security = SECURITY.load(deps.storage)?;
    ensure_administrator(deps.api, &info.sender, &security)?;

    security.allow_key_gen = true;
    SECURITY.save(deps.storage, &security)?;

    let mut orchestrator = ORCHESTRATOR.load(deps.storage)?;
    orchestrator.allow_key_gen_height = env.block.height;
    ORCHESTRATOR.save(deps.storage, &orchestrator)?;

    Ok(Response::new()
        .add_attribute("method", "allow_keygen")
        .add_attribute("height", env.block.height.to_string()))
}

pub fn execute_set_orchestrator_info(
    deps: DepsMut,
    info: MessageInfo,
    window_size: u64,
    key_gen_threshold: u32,
    confirmations_to_finality: u32,
    estimated_momentum_time: u32,
) -> Result<Response, ContractError> {
    let security = SECURITY.load(deps.storage)?;
    ensure_administrator(deps.api, &info.sender, &security)?;

    if window_size == 0
        || key_gen_threshold == 0
        || confirmations_to_finality == 0
        || estimated_momentum_time == 0
    {
        return Err(ContractError::forbidden(
            "orchestrator parameters must be positive",
        ));
    }

    let mut orchestrator = ORCHESTRATOR.load(deps.storage)?;
    orchestrator.window_size = window_size;
    orchestrator.key_gen_threshold = key_gen_threshold;
    orchestrator.confirmations_to_finality = confirmations_to_finality;
    orchestrator.estimated_momentum_time = estimated_momentum_time;
    ORCHESTRATOR.save(deps.storage, &orchestrator)?;

    Ok(Response::new()
        .add_attribute("method", "set_orchestrator_info")
        .add_attribute("window_size", window_size.to_string())
        .add_attribute("key_gen_threshold", key_gen_threshold.to_string())
        .add_attribute(
            "confirmations_to_finality",
            confirmations_to_finality.to_string(),
        ))
}

pub fn execute_set_bridge_metadata(
    deps: DepsMut,
    info: MessageInfo,
    metadata: String,
) -> Result<Response, ContractError> {
    let security = SECURITY.load(deps.storage)?;
    ensure_administrator(deps.api, &info.sender, &security)?;
    validate_metadata(&metadata)?;

    let mut bridge = BRIDGE.load(deps.storage)?;
    bridge.metadata = metadata;
    BRIDGE.save(deps.storage, &bridge)?;

    Ok(Response::new()
        .add_attribute("method", "set_bridge_metadata")
        .add_attribute(
            "metadata_hash",
            hex::encode(keccak256(bridge.metadata.as_bytes())),
        ))
}
