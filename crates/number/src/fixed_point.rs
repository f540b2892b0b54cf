//! Overflow checked arithmetic on unsigned 18-decimal fixed point values.
//!
//! Every product is computed at double width and rejected when it does not
//! fit back into 256 bits, so callers never divide an already truncated
//! product.

use {
    primitive_types::{U256, U512},
    std::sync::LazyLock,
};

/// `1e18`, the fixed point representation of one.
pub static ONE_18: LazyLock<U256> = LazyLock::new(|| U256::exp10(18));

#[derive(Clone, Copy, Debug, Eq, PartialEq, thiserror::Error)]
pub enum Error {
    #[error("fixed point multiplication overflow")]
    Overflow,
    #[error("fixed point division by zero")]
    DivisionByZero,
}

/// Multiplies `x` by `y`, failing when the high word of the 512-bit product
/// is nonzero.
pub fn mul(x: U256, y: U256) -> Result<U256, Error> {
    let product: U512 = x.full_mul(y);
    U256::try_from(product).map_err(|_| Error::Overflow)
}

/// Computes `x * y / d` rounding down.
pub fn mul_div_down(x: U256, y: U256, d: U256) -> Result<U256, Error> {
    if d.is_zero() {
        return Err(Error::DivisionByZero);
    }
    Ok(mul(x, y)? / d)
}

/// Computes `x * y / d` rounding up.
pub fn mul_div_up(x: U256, y: U256, d: U256) -> Result<U256, Error> {
    if d.is_zero() {
        return Err(Error::DivisionByZero);
    }
    let product = mul(x, y)?;
    if product.is_zero() {
        return Ok(U256::zero());
    }
    Ok((product - 1) / d + 1)
}

/// Fixed point multiplication `x * y / 1e18`, rounding down.
pub fn mul_down(x: U256, y: U256) -> Result<U256, Error> {
    mul_div_down(x, y, *ONE_18)
}

/// Fixed point division `x * 1e18 / y`, rounding down.
pub fn div_down(x: U256, y: U256) -> Result<U256, Error> {
    mul_div_down(x, *ONE_18, y)
}

/// `10^decimals`, the number of native units in one whole token.
pub fn unit(decimals: u8) -> Result<U256, Error> {
    if decimals > 77 {
        return Err(Error::Overflow);
    }
    Ok(U256::exp10(decimals.into()))
}
