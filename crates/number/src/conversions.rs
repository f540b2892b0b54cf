use {
    num::{BigInt, BigUint, Signed, bigint::Sign},
    primitive_types::U256,
};

pub fn u256_to_big_uint(input: &U256) -> BigUint {
    let mut bytes = [0; 32];
    input.to_big_endian(&mut bytes);
    BigUint::from_bytes_be(&bytes)
}

pub fn u256_to_big_int(input: &U256) -> BigInt {
    BigInt::from_biguint(Sign::Plus, u256_to_big_uint(input))
}

/// Converts a non-negative `BigInt` that fits in 256 bits back into a `U256`.
pub fn big_int_to_u256(input: &BigInt) -> Option<U256> {
    if input.is_negative() {
        return None;
    }
    let (_, bytes) = input.to_bytes_be();
    if bytes.len() > 32 {
        return None;
    }
    Some(U256::from_big_endian(&bytes))
}
