//! Pricing and settlement engine for a basket pool.
//!
//! The pool holds a set of ordinary assets priced by an external price feed,
//! a reserve asset priced on a constant product curve against the ordinary
//! assets, and its own share token.

pub mod asset;
pub mod config;
pub mod engine;
pub mod error;
pub mod fee;
pub mod pool;
pub mod price_feed;
pub mod reserve;
pub mod tiers;
pub mod trade;
pub mod valuation;

#[cfg(test)]
mod tests;

pub use {
    asset::{Asset, AssetRegistry, Category, CategoryWeights, Registry},
    config::Config,
    engine::{Engine, ExitOutcome, JoinOutcome, Parameters, SwapKind, SwapOutcome, SwapRequest},
    error::Error,
    pool::{BalanceFee, PoolState, PoolStore, Snapshot},
    price_feed::{PriceFeed, PriceKind, PriceSource, StaticPriceSource},
};
