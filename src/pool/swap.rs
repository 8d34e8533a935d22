use crate::{MAX_FEE_PIPS, Q128, U256_E6};
use crate::error::{Error, MathError, SwapError};
use crate::math::liquidity_math::add_delta;
use crate::math::math_helpers::{mul_div, to_i256, truncate_u128};
use crate::math::sqrt_price_math::{get_amount_0_delta_base, get_amount_1_delta_base};
use crate::math::swap_math::compute_swap_step;
use crate::math::tick_bitmap::next_initialized_tick_within_one_word;
use crate::math::tick_math::{
    MAX_SQRT_RATIO, MAX_TICK, MIN_SQRT_RATIO, MIN_TICK, get_sqrt_ratio_at_tick,
    get_tick_at_sqrt_ratio,
};
use crate::pool::cl_pool::PoolState;
use crate::pool::oracle::PendingWrite;
use crate::pool::tick::{GrowthSnapshot, TickInfo};
use alloy_primitives::{I256, U256};

#[derive(Copy, Clone, Debug)]
pub struct SwapParams {
    /// Swap direction: `true` for token0 → token1, `false` for token1 → token0.
    pub zero_for_one: bool,
    /// Signed amount being swapped. Positive means “exact in”, negative means “exact out”.
    pub amount_specified: I256,
    /// Sqrt‑price limit in Q96 that bounds how far the price is allowed to move.
    pub sqrt_price_limit_x96: U256,
}

impl SwapParams {
    #[inline]
    pub fn new(zero_for_one: bool, amount_specified: I256, sqrt_price_limit_x96: U256) -> Self {
        Self {
            zero_for_one,
            amount_specified,
            sqrt_price_limit_x96,
        }
    }

    /// Parameters that let the price run to the edge of the tick domain.
    pub fn unbounded(zero_for_one: bool, amount_specified: I256) -> Self {
        let limit = if zero_for_one {
            MIN_SQRT_RATIO + U256::from(1u8)
        } else {
            MAX_SQRT_RATIO - U256::from(1u8)
        };
        Self::new(zero_for_one, amount_specified, limit)
    }
}

/// Signed token deltas from the pool's point of view (positive: paid in)
/// plus the price the swap stops at.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct SwapResult {
    pub amount0_delta: I256,
    pub amount1_delta: I256,
    /// Input-token fees charged, protocol share included.
    pub fees_paid: U256,
    pub sqrt_price_x96: U256,
    pub tick: i32,
    pub liquidity: u128,
}

/// Everything a swap changes, computed against a borrowed state.
#[derive(Clone, Debug)]
pub(crate) struct SwapOutcome {
    pub result: SwapResult,
    /// New global fee growth of the input token.
    pub fee_growth_global_x128: U256,
    /// Protocol share of the input-token fees.
    pub protocol_fee: u128,
    pub crossed: Vec<(i32, TickInfo)>,
    pub observation: Option<PendingWrite>,
}

// the top level state of the swap, the results of which are recorded in storage at the end
#[derive(Default)]
struct SwapState {
    // the amount remaining to be swapped in/out of the input/output asset
    amount_specified_remaining: I256,
    // the amount already swapped out/in of the output/input asset
    amount_calculated: I256,
    // current sqrt(price)
    sqrt_price_x96: U256,
    // the tick associated with the current price
    tick: i32,
    // the global fee growth of the input token
    fee_growth_global_x128: U256,
    // amount of input token paid as protocol fee
    protocol_fee: u128,
    // the current liquidity in range
    liquidity: u128,
    // accumulated swap fees
    swap_fee: U256,
}

#[derive(Default)]
struct StepComputations {
    // the price at the beginning of the step
    sqrt_price_start_x96: U256,
    // the next tick to swap to from the current tick in the swap direction
    tick_next: i32,
    // whether tickNext is initialized or not
    initialized: bool,
    // sqrt(price) for the next tick (1/0)
    sqrt_price_next_x96: U256,
    // how much is being swapped in this step
    amount_in: U256,
    // how much is being swapped out
    amount_out: U256,
    // how much fee is being paid in
    fee_amount: U256,
}

#[inline]
fn checked(result: Option<I256>) -> Result<I256, MathError> {
    result.ok_or(MathError::Overflow)
}

/// Runs the swap loop against `pool` without touching it.
pub(crate) fn compute_swap(
    pool: &PoolState,
    tick_spacing: i32,
    fee_pips: u32,
    params: &SwapParams,
    time: u32,
) -> Result<SwapOutcome, Error> {
    let amount_specified = params.amount_specified;
    if amount_specified.is_zero() {
        return Err(SwapError::AmountSpecifiedIsZero.into());
    }

    let slot0 = pool.slot0;
    let zero_for_one = params.zero_for_one;
    let sqrt_price_limit_x96 = params.sqrt_price_limit_x96;
    let limit_ok = if zero_for_one {
        sqrt_price_limit_x96 < slot0.sqrt_price_x96 && sqrt_price_limit_x96 > MIN_SQRT_RATIO
    } else {
        sqrt_price_limit_x96 > slot0.sqrt_price_x96 && sqrt_price_limit_x96 < MAX_SQRT_RATIO
    };
    if !limit_ok {
        return Err(SwapError::SqrtPriceLimitOutOfBounds.into());
    }

    let fee_protocol = if zero_for_one {
        slot0.fee_protocol % 16
    } else {
        slot0.fee_protocol >> 4
    };
    let liquidity_start = pool.liquidity;
    let exact_input = amount_specified.is_positive();

    let mut state = SwapState {
        amount_specified_remaining: amount_specified,
        amount_calculated: I256::ZERO,
        sqrt_price_x96: slot0.sqrt_price_x96,
        tick: slot0.tick,
        fee_growth_global_x128: if zero_for_one {
            pool.fee_growth_global_0_x128
        } else {
            pool.fee_growth_global_1_x128
        },
        protocol_fee: 0,
        liquidity: liquidity_start,
        swap_fee: U256::ZERO,
    };

    // oracle cumulatives are read once, on the first tick crossing
    let mut cumulatives: Option<(i64, U256)> = None;
    let mut crossed = Vec::new();

    while !state.amount_specified_remaining.is_zero()
        && state.sqrt_price_x96 != sqrt_price_limit_x96
    {
        let mut step = StepComputations {
            sqrt_price_start_x96: state.sqrt_price_x96,
            ..Default::default()
        };

        (step.tick_next, step.initialized) = next_initialized_tick_within_one_word(
            &pool.bitmap,
            state.tick,
            tick_spacing,
            zero_for_one,
        )?;

        step.tick_next = step.tick_next.clamp(MIN_TICK, MAX_TICK);

        step.sqrt_price_next_x96 = get_sqrt_ratio_at_tick(step.tick_next)?;

        let target = if zero_for_one {
            step.sqrt_price_next_x96.max(sqrt_price_limit_x96)
        } else {
            step.sqrt_price_next_x96.min(sqrt_price_limit_x96)
        };
        let swap_step = compute_swap_step(
            state.sqrt_price_x96,
            target,
            state.liquidity,
            state.amount_specified_remaining,
            fee_pips,
        )?;
        state.sqrt_price_x96 = swap_step.sqrt_price_next_x96;
        step.amount_in = swap_step.amount_in;
        step.amount_out = swap_step.amount_out;
        step.fee_amount = swap_step.fee_amount;

        let paid_in = to_i256(
            step.amount_in
                .checked_add(step.fee_amount)
                .ok_or(MathError::Overflow)?,
        )?;
        let paid_out = to_i256(step.amount_out)?;
        if exact_input {
            state.amount_specified_remaining =
                checked(state.amount_specified_remaining.checked_sub(paid_in))?;
            state.amount_calculated = checked(state.amount_calculated.checked_sub(paid_out))?;
        } else {
            state.amount_specified_remaining =
                checked(state.amount_specified_remaining.checked_add(paid_out))?;
            state.amount_calculated = checked(state.amount_calculated.checked_add(paid_in))?;
        }

        state.swap_fee = state.swap_fee.saturating_add(step.fee_amount);

        if fee_protocol > 0 {
            let delta = step.fee_amount / U256::from(fee_protocol);
            step.fee_amount -= delta;
            state.protocol_fee = state.protocol_fee.wrapping_add(truncate_u128(delta));
        }

        if state.liquidity > 0 {
            state.fee_growth_global_x128 = state.fee_growth_global_x128.wrapping_add(mul_div(
                step.fee_amount,
                Q128,
                U256::from(state.liquidity),
            )?);
        }

        if state.sqrt_price_x96 == step.sqrt_price_next_x96 {
            if step.initialized {
                let (tick_cumulative, seconds_per_liquidity_cumulative_x128) = match cumulatives {
                    Some(values) => values,
                    None => {
                        let values = pool.observations.observe_single(
                            time,
                            0,
                            slot0.tick,
                            slot0.observation_index,
                            liquidity_start,
                            slot0.observation_cardinality,
                        )?;
                        cumulatives = Some(values);
                        values
                    }
                };

                let snapshot = GrowthSnapshot {
                    fee_growth_global_0_x128: if zero_for_one {
                        state.fee_growth_global_x128
                    } else {
                        pool.fee_growth_global_0_x128
                    },
                    fee_growth_global_1_x128: if zero_for_one {
                        pool.fee_growth_global_1_x128
                    } else {
                        state.fee_growth_global_x128
                    },
                    tick_cumulative,
                    seconds_per_liquidity_cumulative_x128,
                    time,
                };

                let mut info = pool.ticks.get(&step.tick_next).copied().unwrap_or_default();
                let mut liquidity_net = info.cross(&snapshot);
                crossed.push((step.tick_next, info));

                if zero_for_one {
                    liquidity_net = liquidity_net.checked_neg().ok_or(MathError::Overflow)?;
                }
                state.liquidity = add_delta(state.liquidity, liquidity_net)?;
            }
            state.tick = if zero_for_one {
                step.tick_next - 1
            } else {
                step.tick_next
            };
        } else if state.sqrt_price_x96 != step.sqrt_price_start_x96 {
            state.tick = get_tick_at_sqrt_ratio(state.sqrt_price_x96)?;
        }
    }

    let observation = if state.tick != slot0.tick {
        pool.observations.prepare_write(
            slot0.observation_index,
            time,
            slot0.tick,
            liquidity_start,
            slot0.observation_cardinality,
            slot0.observation_cardinality_next,
        )
    } else {
        None
    };

    let amount_used = checked(amount_specified.checked_sub(state.amount_specified_remaining))?;
    let (amount0, amount1): (I256, I256) = if zero_for_one == exact_input {
        (amount_used, state.amount_calculated)
    } else {
        (state.amount_calculated, amount_used)
    };

    Ok(SwapOutcome {
        result: SwapResult {
            amount0_delta: amount0,
            amount1_delta: amount1,
            fees_paid: state.swap_fee,
            sqrt_price_x96: state.sqrt_price_x96,
            tick: state.tick,
            liquidity: state.liquidity,
        },
        fee_growth_global_x128: state.fee_growth_global_x128,
        protocol_fee: state.protocol_fee,
        crossed,
        observation,
    })
}

/// Largest input, fee included, the pool can absorb in one direction before
/// reaching the edge of the tick domain or a stretch without liquidity.
///
/// Useful as an upper bound when searching for an optimal swap size.
pub(crate) fn max_input_amount(
    pool: &PoolState,
    tick_spacing: i32,
    fee_pips: u32,
    zero_for_one: bool,
) -> Result<U256, Error> {
    let mut sqrt_price_x96 = pool.slot0.sqrt_price_x96;
    let mut tick = pool.slot0.tick;
    let mut liquidity = pool.liquidity;
    let mut max_token_amount = U256::ZERO;

    while tick > MIN_TICK && tick < MAX_TICK && liquidity != 0 {
        let (tick_next, initialized) =
            next_initialized_tick_within_one_word(&pool.bitmap, tick, tick_spacing, zero_for_one)?;
        let tick_next = tick_next.clamp(MIN_TICK, MAX_TICK);
        let sqrt_price_next_x96 = get_sqrt_ratio_at_tick(tick_next)?;

        let step_amount = if zero_for_one {
            get_amount_0_delta_base(sqrt_price_next_x96, sqrt_price_x96, liquidity, true)?
        } else {
            get_amount_1_delta_base(sqrt_price_x96, sqrt_price_next_x96, liquidity, true)?
        };
        max_token_amount = max_token_amount.saturating_add(step_amount);
        sqrt_price_x96 = sqrt_price_next_x96;

        if initialized {
            let mut liquidity_net = pool
                .ticks
                .get(&tick_next)
                .map(|info| info.liquidity_net)
                .unwrap_or_default();
            if zero_for_one {
                liquidity_net = liquidity_net.checked_neg().ok_or(MathError::Overflow)?;
            }
            liquidity = add_delta(liquidity, liquidity_net)?;
        }
        tick = if zero_for_one { tick_next - 1 } else { tick_next };
    }

    Ok(mul_div(
        max_token_amount,
        U256_E6,
        U256::from(MAX_FEE_PIPS - fee_pips),
    )
    .unwrap_or(U256::MAX))
}
