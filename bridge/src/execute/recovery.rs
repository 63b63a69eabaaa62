//! Guardian recovery handlers.
//!
//! `Emergency` drops the administrator key, discards every pending time
//! challenge and halts the bridge. While no administrator is set, guardians
//! vote with `ProposeAdministrator`; the first candidate to gather a majority
//! (`N/2 + 1`) becomes administrator at once.
//! The bridge stays halted until the new administrator unhalts it.

use cosmwasm_std::{Binary, DepsMut, MessageInfo, Response};

use crate::error::ContractError;
use crate::execute::{ensure_administrator, guardian_index};
use crate::signature::validate_ed25519_key;
use crate::state::{BRIDGE, SECURITY};
use crate::time_challenge::{TimeChallenged, TimeChallengeMethod, TIME_CHALLENGES};

/// Votes needed out of `guardians`
pub fn quorum_threshold(guardians: usize) -> usize {
    guardians / 2 + 1
}

pub fn execute_emergency(deps: DepsMut, info: MessageInfo) -> Result<Response, ContractError> {
    let mut security = SECURITY.load(deps.storage)?;
    ensure_administrator(deps.api, &info.sender, &security)?;

    // Proposals of the outgoing administrator must not carry over to the next
    security.administrator = TimeChallenged::default();
    security.tss.clear_proposal();
    security.guardians.clear_proposal();
    security.delays.clear_proposal();
    SECURITY.save(deps.storage, &security)?;
    for method in TimeChallengeMethod::ALL {
        TIME_CHALLENGES.remove(deps.storage, method.name());
    }

    let mut bridge = BRIDGE.load(deps.storage)?;
    bridge.halted = true;
    BRIDGE.save(deps.storage, &bridge)?;

    Ok(Response::new().add_attribute("method", "emergency"))
}

pub fn execute_propose_administrator(
    deps: DepsMut,
    info: MessageInfo,
    candidate: Binary,
) -> Result<Response, ContractError> {
    let mut security = SECURITY.load(deps.storage)?;
    if security.administrator().is_some() {
        return Err(ContractError::NotEmergency);
    }

    let index =
        guardian_index(deps.api, &info.sender, &security)?.ok_or(ContractError::NotGuardian)?;
    validate_ed25519_key(&candidate)?;

    let guardians = security.guardians().len();
    security.guardian_votes.resize(guardians, None);
    security.guardian_votes[index] = Some(candidate.clone());

    let votes = security
        .guardian_votes
        .iter()
        .filter(|vote| vote.as_ref() == Some(&candidate))
        .count();
    let elected = votes >= quorum_threshold(guardians);
    if elected {
        security.administrator = TimeChallenged::with_current(Some(candidate.clone()));
        security.guardian_votes = vec![None; guardians];
    }
    SECURITY.save(deps.storage, &security)?;

    Ok(Response::new()
        .add_attribute("method", "propose_administrator")
        .add_attribute("guardian_index", index.to_string())
        .add_attribute("candidate", hex::encode(candidate.as_slice()))
        .add_attribute("votes", votes.to_string())
        .add_attribute("elected", elected.to_string()))
}
