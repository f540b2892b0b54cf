//! Conversion between token amounts and USD value across pricing tiers.

use {
    crate::{
        error::Error,
        tiers::{Capacity, Tiers},
    },
    number::fixed_point,
    primitive_types::U256,
};

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Rounding {
    Down,
    Up,
}

impl Rounding {
    fn mul_div(self, x: U256, y: U256, z: U256) -> Result<U256, Error> {
        Ok(match self {
            Self::Down => fixed_point::mul_div_down(x, y, z)?,
            Self::Up => fixed_point::mul_div_up(x, y, z)?,
        })
    }
}

/// USD value of `amount` native units consumed through `tiers` in order.
pub fn value_of(tiers: &Tiers, amount: U256, rounding: Rounding) -> Result<U256, Error> {
    let mut remaining = amount;
    let mut value = U256::zero();
    for tier in tiers.iter() {
        if remaining.is_zero() {
            break;
        }
        let consumed = match tier.capacity {
            Capacity::Bounded(capacity) => remaining.min(capacity),
            Capacity::Unbounded => remaining,
        };
        let tier_value = rounding.mul_div(consumed, tier.price, tiers.unit())?;
        value = value.checked_add(tier_value).ok_or(Error::Overflow)?;
        remaining -= consumed;
    }
    Ok(value)
}

/// Native token amount worth `value` USD when taken through `tiers` in
/// order.
pub fn amount_for(tiers: &Tiers, value: U256, rounding: Rounding) -> Result<U256, Error> {
    let mut remaining = value;
    let mut amount = U256::zero();
    for tier in tiers.iter() {
        if remaining.is_zero() {
            break;
        }
        let consumed = match tier.capacity {
            Capacity::Bounded(capacity) => {
                let capacity_value =
                    fixed_point::mul_div_down(capacity, tier.price, tiers.unit())?;
                if remaining > capacity_value {
                    remaining -= capacity_value;
                    amount = amount.checked_add(capacity).ok_or(Error::Overflow)?;
                    continue;
                }
                remaining
            }
            Capacity::Unbounded => remaining,
        };
        let tier_amount = rounding.mul_div(consumed, tiers.unit(), tier.price)?;
        amount = amount.checked_add(tier_amount).ok_or(Error::Overflow)?;
        remaining = U256::zero();
    }
    Ok(amount)
}

/// Converts `amount` of the input asset into the output asset by valuing it
/// through `in_tiers` and spending that value through the tiers `out_tiers`
/// builds for it. Returns the output amount and the USD value transferred.
/// Both are rounded down.
pub fn convert(
    in_tiers: &Tiers,
    out_tiers: impl FnOnce(U256) -> Result<Tiers, Error>,
    amount: U256,
) -> Result<(U256, U256), Error> {
    let value = value_of(in_tiers, amount, Rounding::Down)?;
    let out = amount_for(&out_tiers(value)?, value, Rounding::Down)?;
    Ok((out, value))
}
