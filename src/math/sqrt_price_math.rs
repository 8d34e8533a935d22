use crate::math::math_helpers::{div_rounding_up, mul_div, mul_div_rounding_up, to_i256};
use crate::math::tick_math::get_sqrt_ratio_at_tick;
use crate::{
    Q96, RESOLUTION, U160_MAX,
    error::{Error, MathError, StateError},
};
use alloy_primitives::{I256, U256};

/// Next sqrt price after adding (or removing) `amount` of token0, rounded up.
pub fn get_next_sqrt_price_from_amount_0_rounding_up(
    sqrt_p_x96: U256,
    liquidity: u128,
    amount: U256,
    add: bool,
) -> Result<U256, Error> {
    if amount.is_zero() {
        return Ok(sqrt_p_x96);
    }

    let numerator1 = U256::from(liquidity) << RESOLUTION;
    let product = amount.wrapping_mul(sqrt_p_x96);
    let product_exact = product / amount == sqrt_p_x96;

    if add {
        if product_exact {
            let (denominator, overflowed) = numerator1.overflowing_add(product);
            if !overflowed {
                return Ok(mul_div_rounding_up(numerator1, sqrt_p_x96, denominator)?);
            }
        }
        // L / (L / sqrtP + amount), which cannot overflow the price
        let denominator = (numerator1 / sqrt_p_x96)
            .checked_add(amount)
            .ok_or(MathError::Overflow)?;
        Ok(div_rounding_up(numerator1, denominator)?)
    } else {
        if !product_exact || numerator1 <= product {
            return Err(StateError::InsufficientReserves.into());
        }
        Ok(mul_div_rounding_up(numerator1, sqrt_p_x96, numerator1 - product)?)
    }
}

/// Next sqrt price after adding (or removing) `amount` of token1, rounded down.
pub fn get_next_sqrt_price_from_amount_1_rounding_down(
    sqrt_p_x96: U256,
    liquidity: u128,
    amount: U256,
    add: bool,
) -> Result<U256, Error> {
    let liquidity = U256::from(liquidity);
    if add {
        let quotient = if amount <= U160_MAX {
            (amount << RESOLUTION) / liquidity
        } else {
            mul_div(amount, Q96, liquidity)?
        };
        let result = sqrt_p_x96
            .checked_add(quotient)
            .ok_or(MathError::Overflow)?;
        if result > U160_MAX {
            return Err(MathError::Overflow.into());
        }
        Ok(result)
    } else {
        let quotient = if amount <= U160_MAX {
            div_rounding_up(amount << RESOLUTION, liquidity)?
        } else {
            mul_div_rounding_up(amount, Q96, liquidity)?
        };
        if sqrt_p_x96 <= quotient {
            return Err(StateError::InsufficientReserves.into());
        }
        Ok(sqrt_p_x96 - quotient)
    }
}

/// Token0 between two prices: `L * (sqrtB - sqrtA) / (sqrtA * sqrtB)`.
pub fn get_amount_0_delta_base(
    mut sqrt_ratio_a_x96: U256,
    mut sqrt_ratio_b_x96: U256,
    liquidity: u128,
    round_up: bool,
) -> Result<U256, Error> {
    if sqrt_ratio_a_x96 > sqrt_ratio_b_x96 {
        (sqrt_ratio_a_x96, sqrt_ratio_b_x96) = (sqrt_ratio_b_x96, sqrt_ratio_a_x96)
    };
    if sqrt_ratio_a_x96.is_zero() {
        return Err(StateError::SqrtRatioIsZero.into());
    }

    let numerator1 = U256::from(liquidity) << RESOLUTION;
    let numerator2 = sqrt_ratio_b_x96 - sqrt_ratio_a_x96;

    if round_up {
        Ok(div_rounding_up(
            mul_div_rounding_up(numerator1, numerator2, sqrt_ratio_b_x96)?,
            sqrt_ratio_a_x96,
        )?)
    } else {
        Ok(mul_div(numerator1, numerator2, sqrt_ratio_b_x96)? / sqrt_ratio_a_x96)
    }
}

/// Token1 between two prices: `L * (sqrtB - sqrtA)`.
pub fn get_amount_1_delta_base(
    mut sqrt_ratio_a_x96: U256,
    mut sqrt_ratio_b_x96: U256,
    liquidity: u128,
    round_up: bool,
) -> Result<U256, MathError> {
    if sqrt_ratio_a_x96 > sqrt_ratio_b_x96 {
        (sqrt_ratio_a_x96, sqrt_ratio_b_x96) = (sqrt_ratio_b_x96, sqrt_ratio_a_x96)
    };
    let liquidity = U256::from(liquidity);
    let spread = sqrt_ratio_b_x96 - sqrt_ratio_a_x96;

    if round_up {
        mul_div_rounding_up(liquidity, spread, Q96)
    } else {
        mul_div(liquidity, spread, Q96)
    }
}

/// Signed token0 delta for a signed liquidity change. Adding liquidity rounds
/// the owed amount up; removing rounds the returned amount down.
pub fn get_amount_0_delta(
    sqrt_ratio_a_x96: U256,
    sqrt_ratio_b_x96: U256,
    liquidity: i128,
) -> Result<I256, Error> {
    let amount = get_amount_0_delta_base(
        sqrt_ratio_a_x96,
        sqrt_ratio_b_x96,
        liquidity.unsigned_abs(),
        liquidity >= 0,
    )?;
    let amount = to_i256(amount)?;
    Ok(if liquidity < 0 { -amount } else { amount })
}

/// Signed token1 delta for a signed liquidity change.
pub fn get_amount_1_delta(
    sqrt_ratio_a_x96: U256,
    sqrt_ratio_b_x96: U256,
    liquidity: i128,
) -> Result<I256, MathError> {
    let amount = get_amount_1_delta_base(
        sqrt_ratio_a_x96,
        sqrt_ratio_b_x96,
        liquidity.unsigned_abs(),
        liquidity >= 0,
    )?;
    let amount = to_i256(amount)?;
    Ok(if liquidity < 0 { -amount } else { amount })
}

/// Token amounts a position of `liquidity_delta` requires (positive) or
/// releases (negative) given where the current price sits relative to the
/// range.
pub fn get_amounts_for_liquidity(
    sqrt_price_x96: U256,
    tick_current: i32,
    tick_lower: i32,
    tick_upper: i32,
    liquidity_delta: i128,
) -> Result<(I256, I256), Error> {
    if liquidity_delta == 0 {
        return Ok((I256::ZERO, I256::ZERO));
    }
    let sqrt_lower = get_sqrt_ratio_at_tick(tick_lower)?;
    let sqrt_upper = get_sqrt_ratio_at_tick(tick_upper)?;

    if tick_current < tick_lower {
        // entirely token0
        Ok((
            get_amount_0_delta(sqrt_lower, sqrt_upper, liquidity_delta)?,
            I256::ZERO,
        ))
    } else if tick_current < tick_upper {
        Ok((
            get_amount_0_delta(sqrt_price_x96, sqrt_upper, liquidity_delta)?,
            get_amount_1_delta(sqrt_lower, sqrt_price_x96, liquidity_delta)?,
        ))
    } else {
        // entirely token1
        Ok((
            I256::ZERO,
            get_amount_1_delta(sqrt_lower, sqrt_upper, liquidity_delta)?,
        ))
    }
}

/// Price after swapping `amount_in` of the input token into the pool.
pub fn get_next_sqrt_price_from_input(
    sqrt_p_x96: U256,
    liquidity: u128,
    amount_in: U256,
    zero_for_one: bool,
) -> Result<U256, Error> {
    if sqrt_p_x96.is_zero() {
        return Err(StateError::SqrtPriceIsZero.into());
    }
    if liquidity == 0 {
        return Err(StateError::LiquidityIsZero.into());
    }

    if zero_for_one {
        get_next_sqrt_price_from_amount_0_rounding_up(sqrt_p_x96, liquidity, amount_in, true)
    } else {
        get_next_sqrt_price_from_amount_1_rounding_down(sqrt_p_x96, liquidity, amount_in, true)
    }
}

/// Price after taking `amount_out` of the output token out of the pool.
pub fn get_next_sqrt_price_from_output(
    sqrt_p_x96: U256,
    liquidity: u128,
    amount_out: U256,
    zero_for_one: bool,
) -> Result<U256, Error> {
    if sqrt_p_x96.is_zero() {
        return Err(StateError::SqrtPriceIsZero.into());
    }
    if liquidity == 0 {
        return Err(StateError::LiquidityIsZero.into());
    }

    if zero_for_one {
        get_next_sqrt_price_from_amount_1_rounding_down(sqrt_p_x96, liquidity, amount_out, false)
    } else {
        get_next_sqrt_price_from_amount_0_rounding_up(sqrt_p_x96, liquidity, amount_out, false)
    }
}
