use crate::U256_1;
use crate::error::MathError;
use alloy_primitives::{I256, U256, U512};

/// Narrows a 512-bit quotient back to 256 bits, failing if any high limb is set.
#[inline]
fn narrow(x: U512) -> Result<U256, MathError> {
    let limbs = x.as_limbs();
    if limbs[4..].iter().any(|&limb| limb != 0) {
        return Err(MathError::Overflow);
    }
    Ok(U256::from_limbs_slice(&limbs[..4]))
}

/// `floor(a * b / denominator)` with a full 512-bit intermediate product.
///
/// Fails with `DivisionByZero` for a zero denominator and with `Overflow` when
/// the quotient does not fit in 256 bits.
#[inline]
pub fn mul_div(a: U256, b: U256, denominator: U256) -> Result<U256, MathError> {
    if denominator.is_zero() {
        return Err(MathError::DivisionByZero);
    }
    let product = U512::from(a) * U512::from(b);
    narrow(product / U512::from(denominator))
}

/// `ceil(a * b / denominator)`.
#[inline]
pub fn mul_div_rounding_up(a: U256, b: U256, denominator: U256) -> Result<U256, MathError> {
    if denominator.is_zero() {
        return Err(MathError::DivisionByZero);
    }
    let product = U512::from(a) * U512::from(b);
    let (quotient, remainder) = product.div_rem(U512::from(denominator));
    let result = narrow(quotient)?;
    if remainder.is_zero() {
        Ok(result)
    } else {
        result.checked_add(U256_1).ok_or(MathError::Overflow)
    }
}

/// `ceil(a / b)`. Fails with `DivisionByZero` when `b` is zero.
#[inline]
pub fn div_rounding_up(a: U256, b: U256) -> Result<U256, MathError> {
    if b.is_zero() {
        return Err(MathError::DivisionByZero);
    }
    let (quotient, remainder) = a.div_rem(b);
    if remainder.is_zero() {
        Ok(quotient)
    } else {
        Ok(quotient + U256_1)
    }
}

/// Lower 128 bits of `x`. Used where a value is known to be bounded, or where
/// truncation is the intended modular behaviour.
#[inline]
pub fn truncate_u128(x: U256) -> u128 {
    let limbs = x.as_limbs();
    (limbs[0] as u128) | ((limbs[1] as u128) << 64)
}

/// `x` as `u128`, or `Overflow` if it does not fit.
#[inline]
pub fn checked_u128(x: U256) -> Result<u128, MathError> {
    let limbs = x.as_limbs();
    if limbs[2] != 0 || limbs[3] != 0 {
        return Err(MathError::Overflow);
    }
    Ok(truncate_u128(x))
}

/// Reinterprets `x` as a non-negative `I256`, failing when it needs the sign bit.
#[inline]
pub fn to_i256(x: U256) -> Result<I256, MathError> {
    if x.bit(255) {
        return Err(MathError::Overflow);
    }
    Ok(I256::from_raw(x))
}

/// Exact `i128 -> I256` widening.
#[inline]
pub fn i256_from_i128(x: i128) -> I256 {
    let magnitude = I256::from_raw(U256::from(x.unsigned_abs()));
    if x < 0 { -magnitude } else { magnitude }
}
