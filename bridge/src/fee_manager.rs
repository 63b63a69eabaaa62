//! Fee Manager Module
//!
//! Wrap fees are charged per token pair in hundredths of a percent and
//! accumulate per token standard until harvested.
//!
//! ## Fee Structure
//!
//! | fee_percentage | Rate    |
//! |----------------|---------|
//! | 10             | 0.1%    |
//! | 100            | 1%      |
//! | 10000          | 100%    |
//!
//! `fee = amount * fee_percentage / 10000` (floor), `net = amount - fee`.

use cosmwasm_schema::cw_serde;
use cosmwasm_std::{StdResult, Storage, Uint128};
use cw_storage_plus::Map;

use common::AssetInfo;

use crate::error::ContractError;

// ============================================================================
// Constants
// ============================================================================

/// Fee denominator (10000 = 100%)
pub const FEE_DENOMINATOR: u128 = 10000;

/// Maximum fee percentage
pub const MAX_FEE_PERCENTAGE: u32 = 10000;

// ============================================================================
// Data Structures
// ============================================================================

/// Fees collected for one token standard.
#[cw_serde]
pub struct FeeTokenPair {
    pub token_standard: AssetInfo,
    pub accumulated_fee: Uint128,
}

// ============================================================================
// Storage
// ============================================================================

/// Key: token key (denom or CW20 address), Value: FeeTokenPair
pub const FEE_TOKEN_PAIRS: Map<&str, FeeTokenPair> = Map::new("fee_token_pairs");

// ============================================================================
// Fee Calculation Functions
// ============================================================================

/// Calculate the fee charged on `amount`
pub fn calculate_fee(amount: Uint128, fee_percentage: u32) -> Uint128 {
    amount.multiply_ratio(fee_percentage as u128, FEE_DENOMINATOR)
}

/// Split `amount` into `(net, fee)`
pub fn split_amount(amount: Uint128, fee_percentage: u32) -> (Uint128, Uint128) {
    let fee = calculate_fee(amount, fee_percentage);
    (amount - fee, fee)
}

/// Validate fee percentage is within bounds
pub fn validate_fee_percentage(fee_percentage: u32) -> Result<(), ContractError> {
    if fee_percentage > MAX_FEE_PERCENTAGE {
        return Err(ContractError::forbidden(format!(
            "fee percentage {} exceeds max {}",
            fee_percentage, MAX_FEE_PERCENTAGE
        )));
    }
    Ok(())
}

// ============================================================================
// Accounting
// ============================================================================

/// Add `fee` to the accumulator of `token_standard`
pub fn accrue_fee(
    storage: &mut dyn Storage,
    token_standard: &AssetInfo,
    fee: Uint128,
) -> StdResult<FeeTokenPair> {
    let key = token_standard.key();
    let mut entry = FEE_TOKEN_PAIRS
        .may_load(storage, &key)?
        .unwrap_or_else(|| FeeTokenPair {
            token_standard: token_standard.clone(),
            accumulated_fee: Uint128::zero(),
        });
    entry.accumulated_fee = entry.accumulated_fee.checked_add(fee)?;
    FEE_TOKEN_PAIRS.save(storage, &key, &entry)?;
    Ok(entry)
}

/// Accumulated fees of `token_standard`, zero if nothing was collected
pub fn get_fee_token_pair(
    storage: &dyn Storage,
    token_standard: &AssetInfo,
) -> StdResult<FeeTokenPair> {
    Ok(FEE_TOKEN_PAIRS
        .may_load(storage, &token_standard.key())?
        .unwrap_or_else(|| FeeTokenPair {
            token_standard: token_standard.clone(),
            accumulated_fee: Uint128::zero(),
        }))
}
