//! Embedded Bridge Contract - Custody Security for Cross-Chain Bridging
//!
//! This contract controls the release of tokens representing value locked on
//! foreign networks. Custody is shared between an administrator key, a
//! rotating TSS key, and a set of guardians.
//!
//! # Outbound Flow (Wrap)
//! 1. User deposits tokens with `WrapToken` (native) or a CW20 `Send`
//! 2. The fee is accrued; the rest is burned (owned pairs) or held in custody
//! 3. Orchestrators sign the request off-chain and attach the signature
//!    with `UpdateWrapRequest`
//!
//! # Inbound Flow (Unwrap)
//! 1. A relayer registers a foreign-chain event with `UnwrapToken`, signed by
//!    the TSS key
//! 2. The pair's redeem delay acts as a challenge window; the administrator or
//!    a guardian may revoke the request
//! 3. After the delay, anyone calls `RedeemUnwrap` to mint or release tokens
//!
//! # Security
//! - Two-phase, time-delayed rotation of every sensitive parameter
//! - Guardian majority vote replaces a lost administrator
//! - Replay protection on `(transaction_hash, log_index)`
//! - Halt with a cool-down after unhalt

pub mod address_codec;
pub mod contract;
pub mod error;
mod execute;
pub mod fee_manager;
pub mod hash;
pub mod msg;
mod query;
pub mod signature;
pub mod state;
pub mod time_challenge;

pub use crate::error::{ContractError, ErrorKind};
pub use crate::fee_manager::{calculate_fee, FeeTokenPair};
pub use crate::hash::keccak256;
pub use crate::signature::Signed;
pub use crate::time_challenge::{TimeChallenged, TimeChallengeMethod};
