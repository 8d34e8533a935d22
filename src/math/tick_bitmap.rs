//! Sparse index of initialized ticks.
//!
//! A tick is first compressed by the spacing (rounding toward negative
//! infinity), then split into a signed word index (`compressed >> 8`) and a bit
//! position (`compressed & 0xff`). Word `-1` therefore covers compressed ticks
//! `-256..=-1` with bit 255 for `-1`.

use crate::FastMap;
use crate::U256_1;
use crate::error::{MathError, TickError};
use crate::math::bit_math::{least_significant_bit, most_significant_bit};
use alloy_primitives::U256;

pub type TickBitmap = FastMap<i16, U256>;

/// Word index and bit position of a compressed tick.
#[inline]
pub fn position(compressed: i32) -> (i16, u8) {
    ((compressed >> 8) as i16, (compressed & 0xff) as u8)
}

/// `tick / tick_spacing`, rounded toward negative infinity.
#[inline]
pub fn compress(tick: i32, tick_spacing: i32) -> i32 {
    tick.div_euclid(tick_spacing)
}

/// The word stored at `word`, zero if absent.
#[inline]
pub fn get_word(bitmap: &TickBitmap, word: i16) -> U256 {
    bitmap.get(&word).copied().unwrap_or(U256::ZERO)
}

/// Toggles the initialized bit of `tick`. Words that become empty are dropped
/// so the map only holds words with at least one set bit.
pub fn flip_tick(bitmap: &mut TickBitmap, tick: i32, tick_spacing: i32) -> Result<(), TickError> {
    if tick % tick_spacing != 0 {
        return Err(TickError::NotSpaced {
            tick,
            spacing: tick_spacing,
        });
    }
    let (word_pos, bit_pos) = position(tick / tick_spacing);
    let word = get_word(bitmap, word_pos) ^ (U256_1 << bit_pos);
    if word.is_zero() {
        bitmap.remove(&word_pos);
    } else {
        bitmap.insert(word_pos, word);
    }
    Ok(())
}

/// Whether the bit for `tick` is set.
pub fn is_initialized(bitmap: &TickBitmap, tick: i32, tick_spacing: i32) -> bool {
    if tick % tick_spacing != 0 {
        return false;
    }
    let (word_pos, bit_pos) = position(tick / tick_spacing);
    get_word(bitmap, word_pos).bit(bit_pos as usize)
}

/// Next initialized tick contained in the same word as `tick` (or, searching
/// right, the word of `tick + spacing`).
///
/// With `lte` the search covers `tick` itself and everything to its left;
/// otherwise it starts strictly to the right. When the word holds no candidate
/// the word boundary is returned with `false`, and the caller steps again from
/// there.
pub fn next_initialized_tick_within_one_word(
    bitmap: &TickBitmap,
    tick: i32,
    tick_spacing: i32,
    lte: bool,
) -> Result<(i32, bool), MathError> {
    let compressed = compress(tick, tick_spacing);

    if lte {
        let (word_pos, bit_pos) = position(compressed);
        // bits at or below bit_pos
        let mask = (U256_1 << bit_pos) - U256_1 + (U256_1 << bit_pos);
        let masked = get_word(bitmap, word_pos) & mask;

        let initialized = !masked.is_zero();
        let next = if initialized {
            (compressed - (bit_pos - most_significant_bit(masked)?) as i32) * tick_spacing
        } else {
            (compressed - bit_pos as i32) * tick_spacing
        };
        Ok((next, initialized))
    } else {
        let (word_pos, bit_pos) = position(compressed + 1);
        // bits at or above bit_pos
        let mask = !((U256_1 << bit_pos) - U256_1);
        let masked = get_word(bitmap, word_pos) & mask;

        let initialized = !masked.is_zero();
        let next = if initialized {
            (compressed + 1 + (least_significant_bit(masked)? - bit_pos) as i32) * tick_spacing
        } else {
            (compressed + 1 + (u8::MAX - bit_pos) as i32) * tick_spacing
        };
        Ok((next, initialized))
    }
}
