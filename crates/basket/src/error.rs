use {
    number::fixed_point,
    primitive_types::{H160, U256},
};

/// Errors surfaced by pricing and settlement. None of them are retried
/// internally; a failing settlement leaves the pool state untouched.
#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
pub enum Error {
    #[error("arithmetic overflow")]
    Overflow,
    #[error("division by zero")]
    DivisionByZero,
    #[error("no price source for asset {0:?}")]
    NoPriceSource(H160),
    #[error("cyclic or too deep price reference through asset {0:?}")]
    CyclicPriceReference(H160),
    #[error("got {balances} balances for {assets} assets")]
    LengthMismatch { assets: usize, balances: usize },
    #[error("insufficient balance of {asset:?}: requested {requested}, available {available}")]
    InsufficientBalance {
        asset: H160,
        requested: U256,
        available: U256,
    },
    #[error("stale pool snapshot: presented version {presented}, current version {current}")]
    ReplayWindowViolation { presented: u64, current: u64 },
    #[error("swaps are locked")]
    PoolLocked,
    #[error("unknown asset {0:?}")]
    UnknownAsset(H160),
    #[error("asset {0:?} cannot be listed or delisted in its category")]
    InvalidCategory(H160),
    #[error("invalid trade")]
    InvalidTrade,
    #[error("invalid pricing tiers")]
    InvalidTiers,
    #[error("category weight total overflow")]
    WeightOverflow,
    #[error("asset {0:?} is already listed")]
    AssetAlreadyListed(H160),
    #[error("asset {0:?} still has a pool balance")]
    NonZeroBalance(H160),
    #[error("pool held share balance exceeds total supply")]
    SupplyUnderflow,
}

impl From<fixed_point::Error> for Error {
    fn from(err: fixed_point::Error) -> Self {
        match err {
            fixed_point::Error::Overflow => Self::Overflow,
            fixed_point::Error::DivisionByZero => Self::DivisionByZero,
        }
    }
}
