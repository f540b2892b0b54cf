//! Pricing of the two base assets.
//!
//! The reserve asset trades on a constant product curve against the total
//! value of the ordinary assets: `k = T * B`. Trades are priced at their
//! average price over the whole amount, never at the marginal price.
//!
//! The share token is worth the ordinary total divided by the circulating
//! supply. The reserve's own value is deliberately left out of that base.

use {
    crate::{
        error::Error,
        tiers::{Known, Side, Tiers},
        valuation::Valuation,
    },
    number::fixed_point::{self, ONE_18},
    primitive_types::{H160, U256},
};

/// Instantaneous reserve valuation. An empty reserve is priced at zero.
pub fn reserve_valuation(total_value: U256, balance: U256, unit: U256) -> Result<Valuation, Error> {
    let price = if balance.is_zero() {
        U256::zero()
    } else {
        fixed_point::mul_div_down(total_value, unit, balance)?
    };
    Ok(Valuation {
        price,
        value: total_value,
    })
}

/// Price of one whole share token. With nothing in circulation the share is
/// worth exactly one USD.
pub fn share_price(total_value: U256, circulating_supply: U256, unit: U256) -> Result<U256, Error> {
    if circulating_supply.is_zero() {
        return Ok(*ONE_18);
    }
    Ok(fixed_point::mul_div_down(total_value, unit, circulating_supply)?)
}

pub fn share_valuation(
    total_value: U256,
    circulating_supply: U256,
    pool_held: U256,
    unit: U256,
) -> Result<Valuation, Error> {
    let price = share_price(total_value, circulating_supply, unit)?;
    Ok(Valuation {
        price,
        value: fixed_point::mul_div_down(price, pool_held, unit)?,
    })
}

/// Average price of a reserve trade on the constant product curve, as a
/// single unbounded tier.
///
/// | side | known      | price             |
/// |------|------------|-------------------|
/// | in   | amount `d` | `T * u / (B + d)` |
/// | in   | value `U`  | `(T - U) * u / B` |
/// | out  | amount `d` | `T * u / (B - d)` |
/// | out  | value `U`  | `(T + U) * u / B` |
pub fn reserve_tiers(
    asset: H160,
    total_value: U256,
    balance: U256,
    unit: U256,
    side: Side,
    known: Known,
) -> Result<Tiers, Error> {
    let insufficient = |requested| Error::InsufficientBalance {
        asset,
        requested,
        available: balance,
    };

    let (numerator, denominator) = match (side, known) {
        // With no reserve there is no curve to price against: `k` is zero.
        (Side::In, Known::Amount(_)) if balance.is_zero() => {
            return Err(insufficient(U256::zero()));
        }
        (Side::In, Known::Amount(amount)) => (
            total_value,
            balance.checked_add(amount).ok_or(Error::Overflow)?,
        ),
        (Side::In, Known::Value(value)) => {
            let remaining = total_value
                .checked_sub(value)
                .filter(|remaining| !remaining.is_zero())
                .ok_or(Error::InsufficientBalance {
                    asset,
                    requested: value,
                    available: total_value,
                })?;
            (remaining, balance)
        }
        (Side::Out, Known::Amount(amount)) => {
            let remaining = balance
                .checked_sub(amount)
                .filter(|remaining| !remaining.is_zero())
                .ok_or_else(|| insufficient(amount))?;
            (total_value, remaining)
        }
        (Side::Out, Known::Value(value)) => (
            total_value.checked_add(value).ok_or(Error::Overflow)?,
            balance,
        ),
    };
    if denominator.is_zero() {
        return Err(insufficient(U256::zero()));
    }

    let price = fixed_point::mul_div_down(numerator, unit, denominator)?;
    Tiers::single(unit, price)
}
