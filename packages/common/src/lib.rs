//! Common - Shared Types for the Embedded Bridge Contracts
//!
//! The bridge refers to local tokens (ZTS) either by a bank denom or by a
//! CW20 contract address. This package holds that representation and the
//! transfer helpers used when the bridge releases custody.

pub mod asset;

pub use asset::{Asset, AssetInfo};
