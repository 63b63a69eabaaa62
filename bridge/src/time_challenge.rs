//! Two-phase, time-delayed commit engine.
//!
//! A guarded method is called twice with identical parameters. The first call
//! records `(method, params_hash, height)` and returns [`ChallengeOutcome::Proposed`];
//! a second call with the same hash once the method's delay has elapsed
//! returns [`ChallengeOutcome::Committed`] and clears the record. A call with
//! different parameters replaces the record and restarts the timer.
//!
//! Pending challenges never expire; they are only superseded or committed.

use cosmwasm_schema::cw_serde;
use cosmwasm_std::{Binary, Storage};
use cw_storage_plus::Map;
use serde::Serialize;

use crate::error::ContractError;
use crate::hash::params_hash;
use crate::state::SecurityDelays;

/// Pending proposal for one method.
#[cw_serde]
pub struct TimeChallenge {
    pub method_name: String,
    pub params_hash: Binary,
    pub challenge_start_height: u64,
}

/// Key: method name, Value: TimeChallenge
pub const TIME_CHALLENGES: Map<&str, TimeChallenge> = Map::new("time_challenges");

/// Methods routed through the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeChallengeMethod {
    ChangeAdministratorKey,
    ChangeTssKey,
    NominateGuardians,
    SetTokenPair,
    SetSecurityDelays,
}

impl TimeChallengeMethod {
    pub const ALL: [TimeChallengeMethod; 5] = [
        TimeChallengeMethod::ChangeAdministratorKey,
        TimeChallengeMethod::ChangeTssKey,
        TimeChallengeMethod::NominateGuardians,
        TimeChallengeMethod::SetTokenPair,
        TimeChallengeMethod::SetSecurityDelays,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            TimeChallengeMethod::ChangeAdministratorKey => "ChangeAdministratorKey",
            TimeChallengeMethod::ChangeTssKey => "ChangeTssKey",
            TimeChallengeMethod::NominateGuardians => "NominateGuardians",
            TimeChallengeMethod::SetTokenPair => "SetTokenPair",
            TimeChallengeMethod::SetSecurityDelays => "SetSecurityDelays",
        }
    }

    /// Delay for this method, or `SecurityNotInitialized` if no delays are set.
    pub fn required_delay(&self, delays: Option<&SecurityDelays>) -> Result<u64, ContractError> {
        let delays = delays.ok_or(ContractError::SecurityNotInitialized)?;
        Ok(match self {
            TimeChallengeMethod::ChangeAdministratorKey
            | TimeChallengeMethod::SetSecurityDelays => delays.administrator_delay,
            TimeChallengeMethod::ChangeTssKey => delays.tss_delay,
            TimeChallengeMethod::NominateGuardians | TimeChallengeMethod::SetTokenPair => {
                delays.soft_delay
            }
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChallengeOutcome {
    Proposed,
    Committed,
}

impl ChallengeOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChallengeOutcome::Proposed => "proposed",
            ChallengeOutcome::Committed => "committed",
        }
    }
}

/// Run one step of the engine for `method`.
pub fn challenge(
    storage: &mut dyn Storage,
    method: TimeChallengeMethod,
    params_hash: [u8; 32],
    height: u64,
    delay: u64,
) -> Result<ChallengeOutcome, ContractError> {
    let name = method.name();

    match TIME_CHALLENGES.may_load(storage, name)? {
        Some(existing) if existing.params_hash.as_slice() == params_hash.as_slice() => {
            let elapsed = height.saturating_sub(existing.challenge_start_height);
            if elapsed < delay {
                return Err(ContractError::TimeChallengeNotDue {
                    remaining: delay - elapsed,
                });
            }
            TIME_CHALLENGES.remove(storage, name);
            Ok(ChallengeOutcome::Committed)
        }
        _ => {
            let record = TimeChallenge {
                method_name: name.to_string(),
                params_hash: Binary::from(params_hash.to_vec()),
                challenge_start_height: height,
            };
            TIME_CHALLENGES.save(storage, name, &record)?;
            Ok(ChallengeOutcome::Proposed)
        }
    }
}

// ============================================================================
// TimeChallenged<T>
// ============================================================================

/// A value guarded by the engine: the authoritative `current` value and the
/// `proposed` one waiting out its delay.
#[cw_serde]
pub struct TimeChallenged<T> {
    pub current: Option<T>,
    pub proposed: Option<T>,
    /// Height at which `proposed` was recorded
    pub proposed_at: Option<u64>,
}

impl<T> Default for TimeChallenged<T> {
    fn default() -> Self {
        Self {
            current: None,
            proposed: None,
            proposed_at: None,
        }
    }
}

impl<T> TimeChallenged<T> {
    /// Forget the pending proposal, keeping the current value.
    pub fn clear_proposal(&mut self) {
        self.proposed = None;
        self.proposed_at = None;
    }
}

impl<T: Serialize> TimeChallenged<T> {
    pub fn with_current(current: Option<T>) -> Self {
        Self {
            current,
            proposed: None,
            proposed_at: None,
        }
    }

    /// Propose `value`, or install it if the identical proposal is due.
    pub fn propose_or_commit(
        &mut self,
        storage: &mut dyn Storage,
        method: TimeChallengeMethod,
        value: T,
        height: u64,
        delay: u64,
    ) -> Result<ChallengeOutcome, ContractError> {
        let hash = params_hash(method.name(), &value)?;
        let outcome = challenge(storage, method, hash, height, delay)?;
        match outcome {
            ChallengeOutcome::Proposed => {
                self.proposed = Some(value);
                self.proposed_at = Some(height);
            }
            ChallengeOutcome::Committed => {
                self.current = Some(value);
                self.clear_proposal();
            }
        }
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cosmwasm_std::testing::MockStorage;

    const DELAY: u64 = 30;

    #[test]
    fn test_commit_requires_full_delay() {
        let mut storage = MockStorage::new();
        let hash = [7u8; 32];
        let method = TimeChallengeMethod::ChangeAdministratorKey;

        assert_eq!(
            challenge(&mut storage, method, hash, 100, DELAY).unwrap(),
            ChallengeOutcome::Proposed
        );
        assert_eq!(
            challenge(&mut storage, method, hash, 129, DELAY).unwrap_err(),
            ContractError::TimeChallengeNotDue { remaining: 1 }
        );
        assert_eq!(
            challenge(&mut storage, method, hash, 130, DELAY).unwrap(),
            ChallengeOutcome::Committed
        );
        assert!(TIME_CHALLENGES
            .may_load(&storage, method.name())
            .unwrap()
            .is_none());

        // Committed once; the next identical call starts over
        assert_eq!(
            challenge(&mut storage, method, hash, 131, DELAY).unwrap(),
            ChallengeOutcome::Proposed
        );
    }

    #[test]
    fn test_different_params_restart_timer() {
        let mut storage = MockStorage::new();
        let method = TimeChallengeMethod::NominateGuardians;

        challenge(&mut storage, method, [1u8; 32], 100, DELAY).unwrap();
        assert_eq!(
            challenge(&mut storage, method, [2u8; 32], 120, DELAY).unwrap(),
            ChallengeOutcome::Proposed
        );

        // Elapsed time of the first proposal is not inherited
        assert_eq!(
            challenge(&mut storage, method, [2u8; 32], 140, DELAY).unwrap_err(),
            ContractError::TimeChallengeNotDue { remaining: 10 }
        );
        assert_eq!(
            challenge(&mut storage, method, [2u8; 32], 150, DELAY).unwrap(),
            ChallengeOutcome::Committed
        );
    }

    #[test]
    fn test_methods_are_independent() {
        let mut storage = MockStorage::new();
        challenge(
            &mut storage,
            TimeChallengeMethod::ChangeTssKey,
            [1u8; 32],
            10,
            DELAY,
        )
        .unwrap();
        challenge(
            &mut storage,
            TimeChallengeMethod::SetTokenPair,
            [1u8; 32],
            20,
            DELAY,
        )
        .unwrap();

        let all: Vec<_> = TIME_CHALLENGES
            .range(&storage, None, None, cosmwasm_std::Order::Ascending)
            .collect::<cosmwasm_std::StdResult<_>>()
            .unwrap();
        assert_eq!(all.len(), 2);
    }

    #[test]
    fn test_required_delay() {
        let delays = SecurityDelays {
            administrator_delay: 30,
            soft_delay: 20,
            tss_delay: 25,
        };
        assert_eq!(
            TimeChallengeMethod::ChangeAdministratorKey
                .required_delay(Some(&delays))
                .unwrap(),
            30
        );
        assert_eq!(
            TimeChallengeMethod::ChangeTssKey
                .required_delay(Some(&delays))
                .unwrap(),
            25
        );
        assert_eq!(
            TimeChallengeMethod::SetTokenPair
                .required_delay(Some(&delays))
                .unwrap(),
            20
        );
        assert_eq!(
            TimeChallengeMethod::NominateGuardians
                .required_delay(None)
                .unwrap_err(),
            ContractError::SecurityNotInitialized
        );
    }

    #[test]
    fn test_time_challenged_value() {
        let mut storage = MockStorage::new();
        let mut value: TimeChallenged<String> = TimeChallenged::with_current(Some("a".into()));
        let method = TimeChallengeMethod::ChangeAdministratorKey;

        value
            .propose_or_commit(&mut storage, method, "b".into(), 10, DELAY)
            .unwrap();
        assert_eq!(value.current.as_deref(), Some("a"));
        assert_eq!(value.proposed.as_deref(), Some("b"));
        assert_eq!(value.proposed_at, Some(10));

        let outcome = value
            .propose_or_commit(&mut storage, method, "b".into(), 40, DELAY)
            .unwrap();
        assert_eq!(outcome, ChallengeOutcome::Committed);
        assert_eq!(value.current.as_deref(), Some("b"));
        assert!(value.proposed.is_none());
        assert!(value.proposed_at.is_none());
    }

    #[test]
    fn test_clear_proposal_keeps_current() {
        let mut storage = MockStorage::new();
        let mut value: TimeChallenged<String> = TimeChallenged::with_current(Some("a".into()));
        let method = TimeChallengeMethod::SetSecurityDelays;
        value
            .propose_or_commit(&mut storage, method, "b".into(), 10, DELAY)
            .unwrap();

        value.clear_proposal();
        assert_eq!(value.current.as_deref(), Some("a"));
        assert!(value.proposed.is_none());
        assert!(value.proposed_at.is_none());

        let names: Vec<&str> = TimeChallengeMethod::ALL.iter().map(|m| m.name()).collect();
        assert_eq!(names.len(), 5);
        assert!(names.contains(&method.name()));
    }
}
