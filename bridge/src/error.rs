//! Error types for the embedded bridge contract
//!
//! Every variant belongs to exactly one [`ErrorKind`] so that off-chain
//! orchestrators can tell whether to retry, wait, or abandon a call.

use cosmwasm_std::StdError;
use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum ContractError {
    #[error("{0}")]
    Std(#[from] StdError),

    // ========================================================================
    // Authorization Errors
    // ========================================================================

    #[error("Permission denied")]
    PermissionDenied,

    #[error("Caller is not a guardian")]
    NotGuardian,

    #[error("Bridge is not in emergency mode")]
    NotEmergency,

    // ========================================================================
    // Temporal Guard Errors
    // ========================================================================

    #[error("Time challenge not due: {remaining} momentums remaining")]
    TimeChallengeNotDue { remaining: u64 },

    #[error("Invalid redeem period: {remaining} momentums remaining")]
    InvalidRedeemPeriod { remaining: u64 },

    // ========================================================================
    // Configuration / State Errors
    // ========================================================================

    #[error("Bridge not initialized")]
    BridgeNotInitialized,

    #[error("Bridge is halted")]
    BridgeHalted,

    #[error("Security not initialized")]
    SecurityNotInitialized,

    // ========================================================================
    // Validation Errors
    // ========================================================================

    #[error("Forbidden parameter: {reason}")]
    ForbiddenParam { reason: String },

    #[error("Invalid token")]
    InvalidToken,

    #[error("Invalid token or amount")]
    InvalidTokenOrAmount,

    // ========================================================================
    // Integrity / Replay Errors
    // ========================================================================

    #[error("Data non existent")]
    DataNonExistent,

    #[error("Invalid signature")]
    InvalidSignature,

    #[error("Unwrap request already registered")]
    UnwrapRequestAlreadyExists,

    #[error("Unwrap request revoked")]
    UnwrapRequestRevoked,

    #[error("Insufficient custody balance for {token}")]
    InsufficientCustody { token: String },
}

/// Coarse classification of a rejected call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Caller identity or protocol phase mismatch. Never retried.
    Authorization,
    /// The call is valid but early; resubmit later.
    TemporalGuard,
    /// The system is not ready for this class of operation.
    Configuration,
    /// Malformed caller input.
    Validation,
    /// Unknown, consumed, replayed or unauthenticated data.
    Integrity,
    /// Storage or serialization failure surfaced by the host.
    Storage,
}

impl ContractError {
    pub fn forbidden(reason: impl Into<String>) -> Self {
        ContractError::ForbiddenParam {
            reason: reason.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            ContractError::Std(_) => ErrorKind::Storage,
            ContractError::PermissionDenied
            | ContractError::NotGuardian
            | ContractError::NotEmergency => ErrorKind::Authorization,
            ContractError::TimeChallengeNotDue { .. }
            | ContractError::InvalidRedeemPeriod { .. } => ErrorKind::TemporalGuard,
            ContractError::BridgeNotInitialized
            | ContractError::BridgeHalted
            | ContractError::SecurityNotInitialized => ErrorKind::Configuration,
            ContractError::ForbiddenParam { .. }
            | ContractError::InvalidToken
            | ContractError::InvalidTokenOrAmount => ErrorKind::Validation,
            ContractError::DataNonExistent
            | ContractError::InvalidSignature
            | ContractError::UnwrapRequestAlreadyExists
            | ContractError::UnwrapRequestRevoked
            | ContractError::InsufficientCustody { .. } => ErrorKind::Integrity,
        }
    }
}
