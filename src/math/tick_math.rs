use crate::error::StateError;
use crate::math::bit_math::most_significant_bit;
use alloy_primitives::U256;

pub const MIN_TICK: i32 = -887272;
pub const MAX_TICK: i32 = -MIN_TICK;

/// `get_sqrt_ratio_at_tick(MIN_TICK)`.
pub const MIN_SQRT_RATIO: U256 = U256::from_limbs([4295128739, 0, 0, 0]);
/// `get_sqrt_ratio_at_tick(MAX_TICK)`.
pub const MAX_SQRT_RATIO: U256 =
    U256::from_limbs([6743328256752651558, 17280870778742802505, 4294805859, 0]);

const fn u128_to_u256(x: u128) -> U256 {
    U256::from_limbs([x as u64, (x >> 64) as u64, 0, 0])
}

// 1 / sqrt(1.0001)^(2^i) as Q128.128, one entry per bit of |tick| above bit 0.
const RATIO_BIT_0: U256 = u128_to_u256(0xfffcb933bd6fad37aa2d162d1a594001);
const RATIO_MULTIPLIERS: [(u32, U256); 19] = [
    (0x2, u128_to_u256(0xfff97272373d413259a46990580e213a)),
    (0x4, u128_to_u256(0xfff2e50f5f656932ef12357cf3c7fdcc)),
    (0x8, u128_to_u256(0xffe5caca7e10e4e61c3624eaa0941cd0)),
    (0x10, u128_to_u256(0xffcb9843d60f6159c9db58835c926644)),
    (0x20, u128_to_u256(0xff973b41fa98c081472e6896dfb254c0)),
    (0x40, u128_to_u256(0xff2ea16466c96a3843ec78b326b52861)),
    (0x80, u128_to_u256(0xfe5dee046a99a2a811c461f1969c3053)),
    (0x100, u128_to_u256(0xfcbe86c7900a88aedcffc83b479aa3a4)),
    (0x200, u128_to_u256(0xf987a7253ac413176f2b074cf7815e54)),
    (0x400, u128_to_u256(0xf3392b0822b70005940c7a398e4b70f3)),
    (0x800, u128_to_u256(0xe7159475a2c29b7443b29c7fa6e889d9)),
    (0x1000, u128_to_u256(0xd097f3bdfd2022b8845ad8f792aa5825)),
    (0x2000, u128_to_u256(0xa9f746462d870fdf8a65dc1f90e061e5)),
    (0x4000, u128_to_u256(0x70d869a156d2a1b890bb3df62baf32f7)),
    (0x8000, u128_to_u256(0x31be135f97d08fd981231505542fcfa6)),
    (0x10000, u128_to_u256(0x9aa508b5b7a84e1c677de54f3e99bc9)),
    (0x20000, u128_to_u256(0x5d6af8dedb81196699c329225ee604)),
    (0x40000, u128_to_u256(0x2216e584f5fa1ea926041bedfe98)),
    (0x80000, u128_to_u256(0x48a170391f7dc42444e8fa2)),
];

// log_sqrt(1.0001)(2) as Q64, and the error bounds of the log2 estimate in Q128.
const LOG_SQRT_10001: U256 = u128_to_u256(255738958999603826347141);
const TICK_LOW_ERROR: U256 = u128_to_u256(3402992956809132418596140100660247210);
const TICK_HIGH_ERROR: U256 = u128_to_u256(291339464771989622907027621153398088495);

/// Sqrt price at `tick` as a Q64.96 value: `sqrt(1.0001^tick) * 2^96`.
///
/// Fails with `TickOutOfBounds` when `|tick| > MAX_TICK`.
pub fn get_sqrt_ratio_at_tick(tick: i32) -> Result<U256, StateError> {
    let abs_tick = tick.unsigned_abs();
    if abs_tick > MAX_TICK as u32 {
        return Err(StateError::TickOutOfBounds);
    }

    let mut ratio = if abs_tick & 0x1 != 0 {
        RATIO_BIT_0
    } else {
        U256::from_limbs([0, 0, 1, 0])
    };
    for (bit, multiplier) in RATIO_MULTIPLIERS {
        if abs_tick & bit != 0 {
            // both factors are below 2^128
            ratio = (ratio * multiplier) >> 128usize;
        }
    }

    if tick > 0 {
        ratio = U256::MAX / ratio;
    }

    // Q128.128 -> Q128.96, rounding up so the inverse lookup stays consistent
    let round_up = ratio.as_limbs()[0] & 0xffff_ffff != 0;
    Ok((ratio >> 32) + U256::from(round_up as u8))
}

/// Arithmetic right shift by 128 of a two's complement value held in a `U256`.
#[inline]
fn sar_128(x: U256) -> U256 {
    if x.bit(255) { !((!x) >> 128usize) } else { x >> 128usize }
}

/// Low 32 bits of a two's complement value known to fit in an `i32`.
#[inline]
fn low_i32(x: U256) -> i32 {
    x.as_limbs()[0] as i64 as i32
}

/// Greatest tick whose sqrt price is `<= sqrt_price_x96`.
///
/// Fails with `SqrtPriceOutOfBounds` unless
/// `MIN_SQRT_RATIO <= sqrt_price_x96 < MAX_SQRT_RATIO`.
pub fn get_tick_at_sqrt_ratio(sqrt_price_x96: U256) -> Result<i32, StateError> {
    if sqrt_price_x96 < MIN_SQRT_RATIO || sqrt_price_x96 >= MAX_SQRT_RATIO {
        return Err(StateError::SqrtPriceOutOfBounds);
    }

    let ratio = sqrt_price_x96 << 32;
    let msb = most_significant_bit(ratio).map_err(|_| StateError::SqrtRatioIsZero)? as usize;

    // normalise to [2^127, 2^128)
    let mut r = if msb >= 128 {
        ratio >> (msb - 127)
    } else {
        ratio << (127 - msb)
    };

    // integer part of log2(ratio / 2^128) in Q64, then 14 fractional bits by squaring
    let mut log_2: i128 = (msb as i128 - 128) << 64;
    for shift in (50..=63).rev() {
        r = (r * r) >> 127;
        if r.bit(128) {
            log_2 |= 1i128 << shift;
            r >>= 1;
        }
    }

    let magnitude = U256::from(log_2.unsigned_abs()) * LOG_SQRT_10001;
    let log_sqrt10001 = if log_2 < 0 {
        magnitude.wrapping_neg()
    } else {
        magnitude
    };

    let tick_low = low_i32(sar_128(log_sqrt10001.wrapping_sub(TICK_LOW_ERROR)));
    let tick_high = low_i32(sar_128(log_sqrt10001.wrapping_add(TICK_HIGH_ERROR)));

    Ok(if tick_low == tick_high {
        tick_low
    } else if get_sqrt_ratio_at_tick(tick_high)? <= sqrt_price_x96 {
        tick_high
    } else {
        tick_low
    })
}
