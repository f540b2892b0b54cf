//! Basket wide valuation.

use {
    crate::{
        asset::AssetRegistry,
        error::Error,
        price_feed::{PriceFeed, PriceKind},
        reserve,
    },
    number::fixed_point,
    primitive_types::{H160, U256},
};

/// USD price of one whole token and the USD value of the pool's balance,
/// both 18-decimal fixed point.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Valuation {
    pub price: U256,
    pub value: U256,
}

/// Result of [`aggregate`].
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Aggregate {
    /// Total USD value of every ordinary asset, i.e. excluding the reserve
    /// asset and the share token.
    pub total_value: U256,
    pub circulating_supply: U256,
    /// Valuation of the asset at the first requested index.
    pub a: Valuation,
    /// Valuation of the asset at the second requested index.
    pub b: Valuation,
}

/// Input to [`aggregate`]: the pool's assets with aligned balances.
#[derive(Clone, Copy, Debug)]
pub struct Holdings<'a> {
    pub assets: &'a [H160],
    pub balances: &'a [U256],
    pub total_supply: U256,
    pub due_protocol_fees: U256,
}

/// Values the whole basket at RAW prices and captures the valuations of the
/// assets at `index_a` and `index_b`.
///
/// The reserve asset and the share token are skipped during the sweep; when
/// requested, their valuations are derived from the ordinary total instead
/// of the price feed.
pub fn aggregate(
    feed: &PriceFeed,
    registry: &dyn AssetRegistry,
    holdings: Holdings<'_>,
    index_a: usize,
    index_b: usize,
) -> Result<Aggregate, Error> {
    let Holdings {
        assets, balances, ..
    } = holdings;
    if assets.len() != balances.len() {
        return Err(Error::LengthMismatch {
            assets: assets.len(),
            balances: balances.len(),
        });
    }
    if index_a >= assets.len() || index_b >= assets.len() {
        return Err(Error::InvalidTrade);
    }

    let mut aggregate = Aggregate::default();
    let mut share_balance = U256::zero();
    for (index, (&asset, &balance)) in assets.iter().zip(balances).enumerate() {
        if asset == registry.share() {
            share_balance = balance;
            continue;
        }
        if asset == registry.reserve() {
            continue;
        }
        let requested = index == index_a || index == index_b;
        if balance.is_zero() && !requested {
            continue;
        }

        let price = feed.quote(registry, asset, PriceKind::Raw)?;
        let unit = fixed_point::unit(registry.get(asset)?.decimals)?;
        let valuation = Valuation {
            price,
            value: fixed_point::mul_div_down(price, balance, unit)?,
        };
        aggregate.total_value = aggregate
            .total_value
            .checked_add(valuation.value)
            .ok_or(Error::Overflow)?;
        if index == index_a {
            aggregate.a = valuation;
        }
        if index == index_b {
            aggregate.b = valuation;
        }
    }

    aggregate.circulating_supply = circulating_supply(
        holdings.total_supply,
        share_balance,
        holdings.due_protocol_fees,
    )?;
    for index in [index_a, index_b] {
        let asset = assets[index];
        if !registry.is_base(asset) {
            continue;
        }
        let unit = fixed_point::unit(registry.get(asset)?.decimals)?;
        let valuation = if asset == registry.reserve() {
            reserve::reserve_valuation(aggregate.total_value, balances[index], unit)?
        } else {
            reserve::share_valuation(
                aggregate.total_value,
                aggregate.circulating_supply,
                balances[index],
                unit,
            )?
        };
        if index == index_a {
            aggregate.a = valuation;
        }
        if index == index_b {
            aggregate.b = valuation;
        }
    }

    Ok(aggregate)
}

/// `total_supply - pool_held + due_fees`.
pub fn circulating_supply(
    total_supply: U256,
    pool_held: U256,
    due_fees: U256,
) -> Result<U256, Error> {
    total_supply
        .checked_sub(pool_held)
        .ok_or(Error::SupplyUnderflow)?
        .checked_add(due_fees)
        .ok_or(Error::Overflow)
}
