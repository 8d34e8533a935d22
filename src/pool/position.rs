use crate::Q128;
use crate::error::{Error, LiquidityError, MathError};
use crate::math::liquidity_math::add_delta;
use crate::math::math_helpers::{mul_div, truncate_u128};
use alloy_primitives::{Address, U256};
use serde::Serialize;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct PositionKey {
    pub owner: Address,
    pub tick_lower: i32,
    pub tick_upper: i32,
}

impl PositionKey {
    pub fn new(owner: Address, tick_lower: i32, tick_upper: i32) -> Self {
        Self {
            owner,
            tick_lower,
            tick_upper,
        }
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Position {
    pub liquidity: u128,
    /// Fee growth inside the range as of the last touch.
    pub fee_growth_inside_0_last_x128: U256,
    pub fee_growth_inside_1_last_x128: U256,
    pub tokens_owed_0: u128,
    pub tokens_owed_1: u128,
}

impl Position {
    /// Credits fees earned since the last touch and applies `liquidity_delta`.
    ///
    /// A zero delta only settles fees and is rejected on an empty position.
    pub fn update(
        &mut self,
        liquidity_delta: i128,
        fee_growth_inside_0_x128: U256,
        fee_growth_inside_1_x128: U256,
    ) -> Result<(), Error> {
        let liquidity_next = if liquidity_delta == 0 {
            if self.liquidity == 0 {
                return Err(LiquidityError::EmptyPosition.into());
            }
            self.liquidity
        } else {
            add_delta(self.liquidity, liquidity_delta).map_err(|e| match e {
                MathError::Underflow => Error::from(LiquidityError::InsufficientLiquidity),
                other => Error::from(other),
            })?
        };

        let liquidity = U256::from(self.liquidity);
        let owed_0 = truncate_u128(mul_div(
            fee_growth_inside_0_x128.wrapping_sub(self.fee_growth_inside_0_last_x128),
            liquidity,
            Q128,
        )?);
        let owed_1 = truncate_u128(mul_div(
            fee_growth_inside_1_x128.wrapping_sub(self.fee_growth_inside_1_last_x128),
            liquidity,
            Q128,
        )?);

        self.liquidity = liquidity_next;
        self.fee_growth_inside_0_last_x128 = fee_growth_inside_0_x128;
        self.fee_growth_inside_1_last_x128 = fee_growth_inside_1_x128;
        // owed balances must be collected before they reach u128::MAX
        self.tokens_owed_0 = self.tokens_owed_0.wrapping_add(owed_0);
        self.tokens_owed_1 = self.tokens_owed_1.wrapping_add(owed_1);
        Ok(())
    }

    /// No liquidity and nothing left to collect.
    pub fn is_empty(&self) -> bool {
        self.liquidity == 0 && self.tokens_owed_0 == 0 && self.tokens_owed_1 == 0
    }
}
