use crate::error::MathError;
use alloy_primitives::U256;

/// Index of the highest set bit, so that `x >= 2**msb` and `x < 2**(msb+1)`.
pub fn most_significant_bit(x: U256) -> Result<u8, MathError> {
    if x.is_zero() {
        return Err(MathError::ZeroValue);
    }
    Ok((255 - x.leading_zeros()) as u8)
}

/// Index of the lowest set bit, so that `x & (2**lsb) != 0` and
/// `x & (2**lsb - 1) == 0`.
pub fn least_significant_bit(x: U256) -> Result<u8, MathError> {
    if x.is_zero() {
        return Err(MathError::ZeroValue);
    }
    Ok(x.trailing_zeros() as u8)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_has_no_significant_bit() {
        assert_eq!(most_significant_bit(U256::ZERO), Err(MathError::ZeroValue));
        assert_eq!(least_significant_bit(U256::ZERO), Err(MathError::ZeroValue));
    }

    #[test]
    fn powers_of_two_agree_on_both_ends() {
        for i in 0..=255usize {
            let x = U256::from(1u8) << i;
            assert_eq!(most_significant_bit(x).unwrap() as usize, i);
            assert_eq!(least_significant_bit(x).unwrap() as usize, i);
        }
    }

    #[test]
    fn msb_ignores_lower_bits() {
        assert_eq!(most_significant_bit(U256::from(0b1001_0100u64)).unwrap(), 7);
        assert_eq!(most_significant_bit(U256::MAX).unwrap(), 255);
    }

    #[test]
    fn lsb_ignores_higher_bits() {
        assert_eq!(least_significant_bit(U256::from(0b10_1100_1000u64)).unwrap(), 3);
        assert_eq!(least_significant_bit(U256::MAX).unwrap(), 0);
    }
}
