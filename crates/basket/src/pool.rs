//! Pool state and the versioned store settlements are committed to.
//!
//! Every committed change bumps the store version. A settlement is priced
//! against a [`Snapshot`] and may only be committed while that snapshot is
//! still the latest one, so two settlements can never both act on the same
//! balances.

use {
    crate::{
        error::Error,
        valuation::{self, Holdings},
    },
    parking_lot::RwLock,
    primitive_types::{H160, U256},
};

/// Balance fee in tenths of a percent, or the sentinel that locks swaps.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct BalanceFee(u8);

impl BalanceFee {
    pub const LOCKED: Self = Self(u8::MAX);
    pub const MAX: u8 = u8::MAX - 1;

    /// Creates an active balance fee, clamping it to [`BalanceFee::MAX`].
    pub fn new(tenths_of_percent: u8) -> Self {
        Self(tenths_of_percent.min(Self::MAX))
    }

    pub fn is_locked(self) -> bool {
        self == Self::LOCKED
    }

    /// Returns `None` when swaps are locked.
    pub fn tenths_of_percent(self) -> Option<u8> {
        (!self.is_locked()).then_some(self.0)
    }
}

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct PoolState {
    /// Every asset the pool holds, including the reserve asset and the
    /// pool's own share token balance.
    pub assets: Vec<H160>,
    pub balances: Vec<U256>,
    pub total_supply: U256,
    /// Share tokens owed to the protocol but not minted yet.
    pub due_protocol_fees: U256,
    pub balance_fee: BalanceFee,
}

impl PoolState {
    pub fn index_of(&self, asset: H160) -> Result<usize, Error> {
        self.assets
            .iter()
            .position(|candidate| *candidate == asset)
            .ok_or(Error::UnknownAsset(asset))
    }

    pub fn balance_of(&self, asset: H160) -> U256 {
        self.index_of(asset)
            .ok()
            .and_then(|index| self.balances.get(index).copied())
            .unwrap_or_default()
    }

    pub fn holdings(&self) -> Holdings<'_> {
        Holdings {
            assets: &self.assets,
            balances: &self.balances,
            total_supply: self.total_supply,
            due_protocol_fees: self.due_protocol_fees,
        }
    }

    /// Shares in public hands, counting unminted protocol fees.
    pub fn circulating_supply(&self, share: H160) -> Result<U256, Error> {
        valuation::circulating_supply(
            self.total_supply,
            self.balance_of(share),
            self.due_protocol_fees,
        )
    }
}

/// Changes a single settlement makes to the pool state.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Delta {
    pub credits: Vec<(H160, U256)>,
    pub debits: Vec<(H160, U256)>,
    pub minted: U256,
    pub burned: U256,
    /// Protocol fees accrued by this settlement.
    pub accrued_fees: U256,
    /// Previously accrued protocol fees that are now minted.
    pub issued_fees: U256,
}

impl Delta {
    pub fn apply(&self, state: &mut PoolState) -> Result<(), Error> {
        if state.assets.len() != state.balances.len() {
            return Err(Error::LengthMismatch {
                assets: state.assets.len(),
                balances: state.balances.len(),
            });
        }
        for &(asset, amount) in &self.credits {
            let index = state.index_of(asset)?;
            state.balances[index] = state.balances[index]
                .checked_add(amount)
                .ok_or(Error::Overflow)?;
        }
        for &(asset, amount) in &self.debits {
            let index = state.index_of(asset)?;
            let available = state.balances[index];
            state.balances[index] =
                available
                    .checked_sub(amount)
                    .ok_or(Error::InsufficientBalance {
                        asset,
                        requested: amount,
                        available,
                    })?;
        }
        state.total_supply = state
            .total_supply
            .checked_add(self.minted)
            .ok_or(Error::Overflow)?
            .checked_sub(self.burned)
            .ok_or(Error::SupplyUnderflow)?;
        state.due_protocol_fees = state
            .due_protocol_fees
            .checked_add(self.accrued_fees)
            .ok_or(Error::Overflow)?
            .checked_sub(self.issued_fees)
            .ok_or(Error::SupplyUnderflow)?;
        Ok(())
    }
}

/// A consistent read of the pool state together with its version token.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Snapshot {
    pub version: u64,
    pub state: PoolState,
}

/// Shared pool state store.
#[derive(Debug, Default)]
pub struct PoolStore {
    inner: RwLock<Snapshot>,
}

impl PoolStore {
    pub fn new(state: PoolState) -> Self {
        Self {
            inner: RwLock::new(Snapshot { version: 0, state }),
        }
    }

    pub fn snapshot(&self) -> Snapshot {
        self.inner.read().clone()
    }

    pub fn version(&self) -> u64 {
        self.inner.read().version
    }

    /// Applies `delta` if `version` is still current and returns the new
    /// version. Nothing is written when the delta does not apply cleanly.
    pub fn commit(&self, version: u64, delta: &Delta) -> Result<u64, Error> {
        let mut inner = self.inner.write();
        if version != inner.version {
            return Err(Error::ReplayWindowViolation {
                presented: version,
                current: inner.version,
            });
        }

        let mut state = inner.state.clone();
        delta.apply(&mut state)?;
        inner.state = state;
        inner.version += 1;
        Ok(inner.version)
    }

    /// Applies an external change (deposits by the venue, administrative
    /// parameter updates) and invalidates outstanding snapshots.
    pub fn modify(&self, f: impl FnOnce(&mut PoolState)) -> u64 {
        let mut inner = self.inner.write();
        f(&mut inner.state);
        inner.version += 1;
        inner.version
    }
}
