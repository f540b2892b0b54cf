//! Protocol fee on ordinary to ordinary swaps.
//!
//! The fee is a share of the spread the pool earned: the difference between
//! the realized trade and the same trade settled at RAW prices.

use {
    crate::{engine::SwapKind, error::Error},
    number::fixed_point,
    primitive_types::U256,
};

/// One side of a settled swap.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Leg {
    /// RAW USD price of one whole token.
    pub price: U256,
    pub unit: U256,
    /// Realized amount in native units.
    pub amount: U256,
}

impl Leg {
    fn value(&self, amount: U256) -> Result<U256, Error> {
        Ok(fixed_point::mul_div_down(amount, self.price, self.unit)?)
    }
}

/// Price of the share token before the trade.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct SharePrice {
    pub price: U256,
    pub unit: U256,
}

/// Protocol fee in share tokens. Never negative: a trade that was not worse
/// for the trader than the RAW price trade pays nothing.
pub fn protocol_fee(
    kind: SwapKind,
    input: &Leg,
    output: &Leg,
    rate: U256,
    share: &SharePrice,
) -> Result<U256, Error> {
    let spread = match kind {
        SwapKind::GivenIn => {
            let value = input.value(input.amount)?;
            let hypothetical = fixed_point::mul_div_down(value, output.unit, output.price)?;
            output.value(hypothetical.saturating_sub(output.amount))?
        }
        SwapKind::GivenOut => {
            let value = fixed_point::mul_div_up(output.amount, output.price, output.unit)?;
            let hypothetical = fixed_point::mul_div_up(value, input.unit, input.price)?;
            input.value(input.amount.saturating_sub(hypothetical))?
        }
    };
    if spread.is_zero() || rate.is_zero() {
        return Ok(U256::zero());
    }

    let fee = fixed_point::mul_down(spread, rate)?;
    Ok(fixed_point::mul_div_down(fee, share.unit, share.price)?)
}
