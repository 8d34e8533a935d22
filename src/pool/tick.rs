use crate::U160_MAX;
use crate::error::{Error, LiquidityError, MathError};
use crate::math::liquidity_math::add_delta;
use crate::math::tick_math::{MAX_TICK, MIN_TICK};
use alloy_primitives::U256;
use serde::Serialize;

/// Per-tick liquidity and "outside" accumulators.
///
/// The outside values hold growth on the side of the tick away from the
/// current price. They are only meaningful relative to each other, so they
/// wrap freely.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct TickInfo {
    /// Total liquidity of the positions using this tick as a bound.
    pub liquidity_gross: u128,
    /// Liquidity added when the price crosses this tick left to right.
    pub liquidity_net: i128,
    pub fee_growth_outside_0_x128: U256,
    pub fee_growth_outside_1_x128: U256,
    pub tick_cumulative_outside: i64,
    /// 160-bit.
    pub seconds_per_liquidity_outside_x128: U256,
    pub seconds_outside: u32,
    pub initialized: bool,
}

/// Global accumulators at the moment a tick is touched.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct GrowthSnapshot {
    pub fee_growth_global_0_x128: U256,
    pub fee_growth_global_1_x128: U256,
    pub tick_cumulative: i64,
    pub seconds_per_liquidity_cumulative_x128: U256,
    pub time: u32,
}

/// Largest `liquidity_gross` any tick may hold so that the sum over every
/// usable tick still fits in a `u128`.
pub fn tick_spacing_to_max_liquidity_per_tick(tick_spacing: i32) -> u128 {
    let min_tick = (MIN_TICK / tick_spacing) * tick_spacing;
    let max_tick = (MAX_TICK / tick_spacing) * tick_spacing;
    let num_ticks = ((max_tick - min_tick) / tick_spacing) as u128 + 1;
    u128::MAX / num_ticks
}

impl TickInfo {
    /// Applies `liquidity_delta` from a position that has `tick` as its lower
    /// (or, with `upper`, its upper) bound. Returns whether the tick flipped
    /// between initialized and uninitialized.
    pub fn update(
        &mut self,
        tick: i32,
        tick_current: i32,
        liquidity_delta: i128,
        snapshot: &GrowthSnapshot,
        upper: bool,
        max_liquidity: u128,
    ) -> Result<bool, Error> {
        let gross_before = self.liquidity_gross;
        let gross_after = add_delta(gross_before, liquidity_delta).map_err(|e| match e {
            MathError::Underflow => Error::from(LiquidityError::InsufficientLiquidity),
            _ => Error::from(LiquidityError::TickLiquidityOverflow { tick }),
        })?;
        if gross_after > max_liquidity {
            return Err(LiquidityError::TickLiquidityOverflow { tick }.into());
        }

        let flipped = (gross_after == 0) != (gross_before == 0);

        if gross_before == 0 {
            // growth before a tick is initialized is assumed to happen below it
            if tick <= tick_current {
                self.fee_growth_outside_0_x128 = snapshot.fee_growth_global_0_x128;
                self.fee_growth_outside_1_x128 = snapshot.fee_growth_global_1_x128;
                self.seconds_per_liquidity_outside_x128 =
                    snapshot.seconds_per_liquidity_cumulative_x128;
                self.tick_cumulative_outside = snapshot.tick_cumulative;
                self.seconds_outside = snapshot.time;
            }
            self.initialized = true;
        }

        self.liquidity_gross = gross_after;
        self.liquidity_net = if upper {
            self.liquidity_net.checked_sub(liquidity_delta)
        } else {
            self.liquidity_net.checked_add(liquidity_delta)
        }
        .ok_or(MathError::Overflow)?;

        Ok(flipped)
    }

    /// Flips the outside accumulators as the price moves through the tick and
    /// returns its `liquidity_net`.
    pub fn cross(&mut self, snapshot: &GrowthSnapshot) -> i128 {
        self.fee_growth_outside_0_x128 = snapshot
            .fee_growth_global_0_x128
            .wrapping_sub(self.fee_growth_outside_0_x128);
        self.fee_growth_outside_1_x128 = snapshot
            .fee_growth_global_1_x128
            .wrapping_sub(self.fee_growth_outside_1_x128);
        self.seconds_per_liquidity_outside_x128 = snapshot
            .seconds_per_liquidity_cumulative_x128
            .wrapping_sub(self.seconds_per_liquidity_outside_x128)
            & U160_MAX;
        self.tick_cumulative_outside = snapshot
            .tick_cumulative
            .wrapping_sub(self.tick_cumulative_outside);
        self.seconds_outside = snapshot.time.wrapping_sub(self.seconds_outside);
        self.liquidity_net
    }
}

/// Fee growth per unit of liquidity accrued strictly between two ticks.
pub fn get_fee_growth_inside(
    lower: &TickInfo,
    upper: &TickInfo,
    tick_lower: i32,
    tick_upper: i32,
    tick_current: i32,
    fee_growth_global_0_x128: U256,
    fee_growth_global_1_x128: U256,
) -> (U256, U256) {
    let (below_0, below_1) = if tick_current >= tick_lower {
        (lower.fee_growth_outside_0_x128, lower.fee_growth_outside_1_x128)
    } else {
        (
            fee_growth_global_0_x128.wrapping_sub(lower.fee_growth_outside_0_x128),
            fee_growth_global_1_x128.wrapping_sub(lower.fee_growth_outside_1_x128),
        )
    };

    let (above_0, above_1) = if tick_current < tick_upper {
        (upper.fee_growth_outside_0_x128, upper.fee_growth_outside_1_x128)
    } else {
        (
            fee_growth_global_0_x128.wrapping_sub(upper.fee_growth_outside_0_x128),
            fee_growth_global_1_x128.wrapping_sub(upper.fee_growth_outside_1_x128),
        )
    };

    (
        fee_growth_global_0_x128
            .wrapping_sub(below_0)
            .wrapping_sub(above_0),
        fee_growth_global_1_x128
            .wrapping_sub(below_1)
            .wrapping_sub(above_1),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn u(s: &str) -> U256 {
        U256::from_str(s).unwrap()
    }

    fn snapshot(g0: u64, g1: u64) -> GrowthSnapshot {
        GrowthSnapshot {
            fee_growth_global_0_x128: U256::from(g0),
            fee_growth_global_1_x128: U256::from(g1),
            ..Default::default()
        }
    }

    fn outside(g0: u64, g1: u64) -> TickInfo {
        TickInfo {
            fee_growth_outside_0_x128: U256::from(g0),
            fee_growth_outside_1_x128: U256::from(g1),
            ..Default::default()
        }
    }

    #[test]
    fn max_liquidity_per_tick_by_spacing() {
        assert_eq!(
            tick_spacing_to_max_liquidity_per_tick(10),
            1917569901783203986719870431555990
        );
        assert_eq!(
            tick_spacing_to_max_liquidity_per_tick(60),
            11505743598341114571880798222544994
        );
        assert_eq!(
            tick_spacing_to_max_liquidity_per_tick(200),
            38350317471085141830651933667504588
        );
        // only min, max and 0 remain
        assert_eq!(
            tick_spacing_to_max_liquidity_per_tick(887272),
            u128::MAX / 3
        );
        assert_eq!(
            tick_spacing_to_max_liquidity_per_tick(2302),
            441351967472034323558203122479595605
        );
    }

    #[test]
    fn fee_growth_inside_uninitialized_ticks() {
        let empty = TickInfo::default();
        let g = (U256::from(15u8), U256::from(15u8));
        // price inside
        assert_eq!(get_fee_growth_inside(&empty, &empty, -2, 2, 0, g.0, g.1), g);
        // price above and below
        assert_eq!(
            get_fee_growth_inside(&empty, &empty, -2, 2, 4, g.0, g.1),
            (U256::ZERO, U256::ZERO)
        );
        assert_eq!(
            get_fee_growth_inside(&empty, &empty, -2, 2, -4, g.0, g.1),
            (U256::ZERO, U256::ZERO)
        );
    }

    #[test]
    fn fee_growth_inside_subtracts_both_sides() {
        let lower = outside(2, 3);
        let upper = outside(4, 1);
        assert_eq!(
            get_fee_growth_inside(&lower, &upper, -2, 2, 0, U256::from(15u8), U256::from(15u8)),
            (U256::from(9u8), U256::from(11u8))
        );
    }

    #[test]
    fn fee_growth_inside_wraps() {
        let lower = TickInfo {
            fee_growth_outside_0_x128: U256::MAX - U256::from(3u8),
            fee_growth_outside_1_x128: U256::MAX - U256::from(2u8),
            ..Default::default()
        };
        let upper = outside(3, 5);
        assert_eq!(
            get_fee_growth_inside(&lower, &upper, -2, 2, 0, U256::from(15u8), U256::from(15u8)),
            (U256::from(16u8), U256::from(13u8))
        );
    }

    #[test]
    fn update_flips_from_zero_to_nonzero_and_back() {
        let snap = snapshot(0, 0);
        let mut info = TickInfo::default();
        assert!(info.update(0, 0, 1, &snap, false, 3).unwrap());
        assert!(!info.update(0, 0, 1, &snap, false, 3).unwrap());
        assert!(!info.update(0, 0, -1, &snap, false, 3).unwrap());
        assert!(info.update(0, 0, -1, &snap, false, 3).unwrap());
        assert_eq!(info.liquidity_gross, 0);
        assert_eq!(info.liquidity_net, 0);
    }

    #[test]
    fn update_rejects_gross_above_max() {
        let snap = snapshot(0, 0);
        let mut info = TickInfo::default();
        info.update(0, 0, 2, &snap, false, 3).unwrap();
        info.update(0, 0, 1, &snap, true, 3).unwrap();
        assert_eq!(
            info.update(0, 0, 1, &snap, false, 3),
            Err(LiquidityError::TickLiquidityOverflow { tick: 0 }.into())
        );
    }

    #[test]
    fn update_net_and_gross() {
        let snap = snapshot(0, 0);
        let mut info = TickInfo::default();
        info.update(0, 0, 2, &snap, false, 10).unwrap();
        info.update(0, 0, 1, &snap, true, 10).unwrap();
        info.update(0, 0, 3, &snap, true, 10).unwrap();
        info.update(0, 0, 1, &snap, false, 10).unwrap();
        assert_eq!(info.liquidity_gross, 7);
        assert_eq!(info.liquidity_net, 2 - 1 - 3 + 1);

        info.update(0, 0, -2, &snap, false, 10).unwrap();
        info.update(0, 0, -1, &snap, true, 10).unwrap();
        assert_eq!(info.liquidity_gross, 4);
        assert_eq!(info.liquidity_net, -2);
    }

    #[test]
    fn update_rejects_removing_more_than_gross() {
        let snap = snapshot(0, 0);
        let mut info = TickInfo::default();
        info.update(0, 0, 1, &snap, false, 10).unwrap();
        assert_eq!(
            info.update(0, 0, -2, &snap, false, 10),
            Err(LiquidityError::InsufficientLiquidity.into())
        );
    }

    #[test]
    fn first_update_at_or_below_current_snapshots_globals() {
        let snap = GrowthSnapshot {
            fee_growth_global_0_x128: U256::from(1u8),
            fee_growth_global_1_x128: U256::from(2u8),
            tick_cumulative: 3,
            seconds_per_liquidity_cumulative_x128: U256::from(4u8),
            time: 5,
        };
        let mut info = TickInfo::default();
        info.update(1, 1, 1, &snap, false, u128::MAX).unwrap();
        assert_eq!(info.fee_growth_outside_0_x128, U256::from(1u8));
        assert_eq!(info.fee_growth_outside_1_x128, U256::from(2u8));
        assert_eq!(info.tick_cumulative_outside, 3);
        assert_eq!(info.seconds_per_liquidity_outside_x128, U256::from(4u8));
        assert_eq!(info.seconds_outside, 5);
        assert!(info.initialized);
    }

    #[test]
    fn first_update_above_current_leaves_outside_zero() {
        let snap = GrowthSnapshot {
            fee_growth_global_0_x128: U256::from(1u8),
            fee_growth_global_1_x128: U256::from(2u8),
            tick_cumulative: 3,
            seconds_per_liquidity_cumulative_x128: U256::from(4u8),
            time: 5,
        };
        let mut info = TickInfo::default();
        info.update(2, 1, 1, &snap, false, u128::MAX).unwrap();
        assert_eq!(info.fee_growth_outside_0_x128, U256::ZERO);
        assert_eq!(info.seconds_outside, 0);
        assert_eq!(info.tick_cumulative_outside, 0);
        assert!(info.initialized);
    }

    #[test]
    fn cross_flips_outside_values() {
        let mut info = TickInfo {
            fee_growth_outside_0_x128: U256::from(1u8),
            fee_growth_outside_1_x128: U256::from(2u8),
            liquidity_gross: 3,
            liquidity_net: 4,
            seconds_per_liquidity_outside_x128: U256::from(5u8),
            tick_cumulative_outside: 6,
            seconds_outside: 7,
            initialized: true,
        };
        let snap = GrowthSnapshot {
            fee_growth_global_0_x128: U256::from(7u8),
            fee_growth_global_1_x128: U256::from(9u8),
            tick_cumulative: 15,
            seconds_per_liquidity_cumulative_x128: U256::from(8u8),
            time: 10,
        };
        assert_eq!(info.cross(&snap), 4);
        assert_eq!(info.fee_growth_outside_0_x128, U256::from(6u8));
        assert_eq!(info.fee_growth_outside_1_x128, U256::from(7u8));
        assert_eq!(info.seconds_per_liquidity_outside_x128, U256::from(3u8));
        assert_eq!(info.tick_cumulative_outside, 9);
        assert_eq!(info.seconds_outside, 3);

        // crossing back restores the original values
        info.cross(&snap);
        assert_eq!(info.fee_growth_outside_0_x128, U256::from(1u8));
        assert_eq!(info.tick_cumulative_outside, 6);
        assert_eq!(info.seconds_outside, 7);
    }

    #[test]
    fn cross_wraps_seconds_per_liquidity_at_160_bits() {
        let mut info = TickInfo {
            seconds_per_liquidity_outside_x128: U256::from(5u8),
            ..Default::default()
        };
        let snap = GrowthSnapshot {
            seconds_per_liquidity_cumulative_x128: U256::from(2u8),
            ..Default::default()
        };
        info.cross(&snap);
        assert_eq!(
            info.seconds_per_liquidity_outside_x128,
            u("1461501637330902918203684832716283019655932542973")
        );
    }
}
