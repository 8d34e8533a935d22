use crate::error::{Error, FactoryError, LiquidityError, MathError, PoolError, SettlementError, TickError};
use crate::factory::{MAX_TICK_SPACING, SwapFeeModule, resolve_swap_fee};
use crate::math::liquidity_math::add_delta;
use crate::math::math_helpers::{mul_div, mul_div_rounding_up, truncate_u128};
use crate::math::sqrt_price_math::get_amounts_for_liquidity;
use crate::math::tick_bitmap::{TickBitmap, flip_tick, get_word};
use crate::math::tick_math::{MAX_TICK, MIN_TICK, get_tick_at_sqrt_ratio};
use crate::pool::callback::{FlashCallback, MintCallback, Payment, SwapCallback};
use crate::pool::event::PoolEvent;
use crate::pool::lock::PoolGuard;
use crate::pool::oracle::{Observation, Observations, PendingWrite};
use crate::pool::position::{Position, PositionKey};
use crate::pool::swap::{SwapOutcome, SwapParams, SwapResult, compute_swap, max_input_amount};
use crate::pool::tick::{GrowthSnapshot, TickInfo, get_fee_growth_inside, tick_spacing_to_max_liquidity_per_tick};
use crate::{FastMap, MAX_FEE_PIPS, Q128, U160_MAX, U256_E6};
use alloy_primitives::{Address, Bytes, I256, U256};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Static description of a pool.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PoolConfig {
    pub token0: Address,
    pub token1: Address,
    pub tick_spacing: i32,
    /// Swap fee in hundredths of a bip, used when no fee module overrides it.
    pub fee_pips: u32,
}

impl PoolConfig {
    pub fn new(token0: Address, token1: Address, tick_spacing: i32, fee_pips: u32) -> Self {
        Self {
            token0,
            token1,
            tick_spacing,
            fee_pips,
        }
    }

    pub fn validate(&self) -> Result<(), Error> {
        if self.tick_spacing <= 0 || self.tick_spacing >= MAX_TICK_SPACING {
            return Err(TickError::UnsupportedSpacing(self.tick_spacing).into());
        }
        if self.fee_pips >= MAX_FEE_PIPS {
            return Err(FactoryError::InvalidFee(self.fee_pips).into());
        }
        Ok(())
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Slot0 {
    pub sqrt_price_x96: U256,
    pub tick: i32,
    /// Index of the most recently written observation.
    pub observation_index: u16,
    pub observation_cardinality: u16,
    pub observation_cardinality_next: u16,
    /// Protocol share denominators: token0 in the low nibble, token1 in the high one.
    pub fee_protocol: u8,
    pub unlocked: bool,
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ProtocolFees {
    pub token0: u128,
    pub token1: u128,
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Balances {
    pub token0: U256,
    pub token1: U256,
}

/// Everything a pool mutates. Operations borrow it whole through a
/// [`PoolGuard`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PoolState {
    pub slot0: Slot0,
    pub fee_growth_global_0_x128: U256,
    pub fee_growth_global_1_x128: U256,
    pub protocol_fees: ProtocolFees,
    /// In-range liquidity.
    pub liquidity: u128,
    pub ticks: FastMap<i32, TickInfo>,
    pub bitmap: TickBitmap,
    pub positions: FastMap<PositionKey, Position>,
    pub observations: Observations,
    pub balances: Balances,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PopulatedTick {
    pub tick: i32,
    pub liquidity_net: i128,
    pub liquidity_gross: u128,
}

/// Accumulator growth inside a range, only comparable between two snapshots
/// of the same range taken while the position existed.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct CumulativesInside {
    pub tick_cumulative_inside: i64,
    pub seconds_per_liquidity_inside_x128: U256,
    pub seconds_inside: u32,
}

/// A position change computed against the current state but not yet stored.
struct ModifyPosition {
    key: PositionKey,
    position: Position,
    /// Updated bound ticks and whether each flipped. Absent for a zero delta.
    ticks: Option<[(i32, TickInfo, bool); 2]>,
    liquidity: u128,
    observation: Option<PendingWrite>,
    amount0: I256,
    amount1: I256,
}

impl PoolState {
    fn observe_now(&self, time: u32) -> Result<(i64, U256), Error> {
        let slot0 = self.slot0;
        Ok(self.observations.observe_single(
            time,
            0,
            slot0.tick,
            slot0.observation_index,
            self.liquidity,
            slot0.observation_cardinality,
        )?)
    }

    fn stage_modify_position(
        &self,
        max_liquidity_per_tick: u128,
        key: PositionKey,
        liquidity_delta: i128,
        time: u32,
    ) -> Result<ModifyPosition, Error> {
        let slot0 = self.slot0;
        let tick_current = slot0.tick;
        let (tick_lower, tick_upper) = (key.tick_lower, key.tick_upper);

        let mut lower = self.ticks.get(&tick_lower).copied().unwrap_or_default();
        let mut upper = self.ticks.get(&tick_upper).copied().unwrap_or_default();

        let ticks = if liquidity_delta != 0 {
            let (tick_cumulative, seconds_per_liquidity_cumulative_x128) = self.observe_now(time)?;
            let snapshot = GrowthSnapshot {
                fee_growth_global_0_x128: self.fee_growth_global_0_x128,
                fee_growth_global_1_x128: self.fee_growth_global_1_x128,
                tick_cumulative,
                seconds_per_liquidity_cumulative_x128,
                time,
            };
            let flipped_lower = lower.update(
                tick_lower,
                tick_current,
                liquidity_delta,
                &snapshot,
                false,
                max_liquidity_per_tick,
            )?;
            let flipped_upper = upper.update(
                tick_upper,
                tick_current,
                liquidity_delta,
                &snapshot,
                true,
                max_liquidity_per_tick,
            )?;
            Some([
                (tick_lower, lower, flipped_lower),
                (tick_upper, upper, flipped_upper),
            ])
        } else {
            None
        };

        let (fee_growth_inside_0_x128, fee_growth_inside_1_x128) = get_fee_growth_inside(
            &lower,
            &upper,
            tick_lower,
            tick_upper,
            tick_current,
            self.fee_growth_global_0_x128,
            self.fee_growth_global_1_x128,
        );
        let mut position = self.positions.get(&key).copied().unwrap_or_default();
        position.update(
            liquidity_delta,
            fee_growth_inside_0_x128,
            fee_growth_inside_1_x128,
        )?;

        let (amount0, amount1) = get_amounts_for_liquidity(
            slot0.sqrt_price_x96,
            tick_current,
            tick_lower,
            tick_upper,
            liquidity_delta,
        )?;

        let mut liquidity = self.liquidity;
        let mut observation = None;
        if liquidity_delta != 0 && tick_current >= tick_lower && tick_current < tick_upper {
            observation = self.observations.prepare_write(
                slot0.observation_index,
                time,
                tick_current,
                liquidity,
                slot0.observation_cardinality,
                slot0.observation_cardinality_next,
            );
            liquidity = add_delta(liquidity, liquidity_delta)?;
        }

        Ok(ModifyPosition {
            key,
            position,
            ticks,
            liquidity,
            observation,
            amount0,
            amount1,
        })
    }

    fn apply_modify_position(
        &mut self,
        staged: ModifyPosition,
        tick_spacing: i32,
        liquidity_delta: i128,
    ) -> Result<(), Error> {
        if let Some(ticks) = staged.ticks {
            for (tick, info, flipped) in ticks {
                if flipped {
                    flip_tick(&mut self.bitmap, tick, tick_spacing)?;
                }
                if flipped && liquidity_delta < 0 {
                    self.ticks.remove(&tick);
                } else {
                    self.ticks.insert(tick, info);
                }
            }
        }
        if let Some(write) = staged.observation {
            self.commit_observation(write);
        }
        self.liquidity = staged.liquidity;
        self.positions.insert(staged.key, staged.position);
        Ok(())
    }

    fn commit_observation(&mut self, write: PendingWrite) {
        let (index, cardinality) = self.observations.commit(write);
        self.slot0.observation_index = index;
        self.slot0.observation_cardinality = cardinality;
    }

    fn apply_swap(&mut self, outcome: SwapOutcome, zero_for_one: bool) {
        if let Some(write) = outcome.observation {
            self.commit_observation(write);
        }
        let result = outcome.result;
        self.slot0.sqrt_price_x96 = result.sqrt_price_x96;
        self.slot0.tick = result.tick;
        self.liquidity = result.liquidity;

        if zero_for_one {
            self.fee_growth_global_0_x128 = outcome.fee_growth_global_x128;
            self.protocol_fees.token0 = self.protocol_fees.token0.wrapping_add(outcome.protocol_fee);
        } else {
            self.fee_growth_global_1_x128 = outcome.fee_growth_global_x128;
            self.protocol_fees.token1 = self.protocol_fees.token1.wrapping_add(outcome.protocol_fee);
        }
        for (tick, info) in outcome.crossed {
            self.ticks.insert(tick, info);
        }
    }

    fn withdraw(&self, amount0: U256, amount1: U256) -> Result<Balances, SettlementError> {
        let token0 = self.balances.token0.checked_sub(amount0).ok_or(
            SettlementError::InsufficientBalance {
                requested: amount0,
                available: self.balances.token0,
            },
        )?;
        let token1 = self.balances.token1.checked_sub(amount1).ok_or(
            SettlementError::InsufficientBalance {
                requested: amount1,
                available: self.balances.token1,
            },
        )?;
        Ok(Balances { token0, token1 })
    }
}

fn check_ticks(tick_lower: i32, tick_upper: i32) -> Result<(), TickError> {
    if tick_lower >= tick_upper {
        return Err(TickError::InvalidRange {
            lower: tick_lower,
            upper: tick_upper,
        });
    }
    if tick_lower < MIN_TICK {
        return Err(TickError::LowerOutOfBounds(tick_lower));
    }
    if tick_upper > MAX_TICK {
        return Err(TickError::UpperOutOfBounds(tick_upper));
    }
    Ok(())
}

fn check_spaced(tick: i32, spacing: i32) -> Result<(), TickError> {
    if tick % spacing != 0 {
        return Err(TickError::NotSpaced { tick, spacing });
    }
    Ok(())
}

/// Checks what a payer transferred against what it owed.
fn verify_payment(payment: &Payment) -> Result<(), SettlementError> {
    if payment.paid0() < payment.owed0() {
        tracing::warn!(owed = %payment.owed0(), paid = %payment.paid0(), "token0 not paid");
        return Err(SettlementError::Amount0NotPaid {
            owed: payment.owed0(),
            paid: payment.paid0(),
        });
    }
    if payment.paid1() < payment.owed1() {
        tracing::warn!(owed = %payment.owed1(), paid = %payment.paid1(), "token1 not paid");
        return Err(SettlementError::Amount1NotPaid {
            owed: payment.owed1(),
            paid: payment.paid1(),
        });
    }
    Ok(())
}

/// Splits a fee into its protocol share and the part credited to liquidity
/// providers as fee growth.
fn split_fee(fee: U256, fee_protocol: u8, liquidity: u128) -> Result<(u128, U256), Error> {
    let protocol = if fee_protocol == 0 {
        U256::ZERO
    } else {
        fee / U256::from(fee_protocol)
    };
    let growth = mul_div(fee - protocol, Q128, U256::from(liquidity))?;
    Ok((truncate_u128(protocol), growth))
}

/// A single concentrated-liquidity pool.
///
/// Every mutating operation is all-or-nothing: it computes its full effect
/// against the current state, runs the payer callback, verifies settlement
/// and only then writes. An `Err` leaves the pool unchanged.
#[derive(Clone)]
pub struct ClPool {
    config: PoolConfig,
    max_liquidity_per_tick: u128,
    fee_module: Option<Arc<dyn SwapFeeModule>>,
    state: PoolState,
    events: Vec<PoolEvent>,
}

impl std::fmt::Debug for ClPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClPool")
            .field("config", &self.config)
            .field("max_liquidity_per_tick", &self.max_liquidity_per_tick)
            .field("fee_module", &self.fee_module.is_some())
            .field("state", &self.state)
            .finish()
    }
}

impl ClPool {
    pub fn new(config: PoolConfig) -> Result<Self, Error> {
        config.validate()?;
        Ok(Self {
            config,
            max_liquidity_per_tick: tick_spacing_to_max_liquidity_per_tick(config.tick_spacing),
            fee_module: None,
            state: PoolState::default(),
            events: Vec::new(),
        })
    }

    pub fn with_swap_fee_module(mut self, module: Arc<dyn SwapFeeModule>) -> Self {
        self.fee_module = Some(module);
        self
    }

    pub fn set_swap_fee_module(&mut self, module: Option<Arc<dyn SwapFeeModule>>) {
        self.fee_module = module;
    }

    /// Fee charged on swaps and flash loans right now, in pips.
    pub fn fee(&self) -> u32 {
        resolve_swap_fee(self.fee_module.as_deref(), &self.config)
    }

    /// Sets the starting price. The oracle's first observation is taken at `time`.
    pub fn initialize(&mut self, sqrt_price_x96: U256, time: u32) -> Result<(), Error> {
        if !self.state.slot0.sqrt_price_x96.is_zero() {
            return Err(PoolError::AlreadyInitialized.into());
        }
        let tick = get_tick_at_sqrt_ratio(sqrt_price_x96)?;

        let mut observations = Observations::default();
        let (cardinality, cardinality_next) = observations.initialize(time);

        self.state.observations = observations;
        self.state.slot0 = Slot0 {
            sqrt_price_x96,
            tick,
            observation_index: 0,
            observation_cardinality: cardinality,
            observation_cardinality_next: cardinality_next,
            fee_protocol: 0,
            unlocked: true,
        };
        tracing::debug!(%sqrt_price_x96, tick, time, "pool initialized");
        self.events.push(PoolEvent::Initialize {
            sqrt_price_x96,
            tick,
        });
        Ok(())
    }

    /// Adds `amount` liquidity to `owner`'s range. The callback must pay the
    /// returned token amounts.
    #[allow(clippy::too_many_arguments)]
    pub fn mint<C: MintCallback + ?Sized>(
        &mut self,
        owner: Address,
        tick_lower: i32,
        tick_upper: i32,
        amount: u128,
        data: &Bytes,
        time: u32,
        callback: &mut C,
    ) -> Result<(U256, U256), Error> {
        if amount == 0 {
            return Err(LiquidityError::ZeroAmount.into());
        }
        check_ticks(tick_lower, tick_upper)?;
        check_spaced(tick_lower, self.config.tick_spacing)?;
        check_spaced(tick_upper, self.config.tick_spacing)?;
        let liquidity_delta = i128::try_from(amount).map_err(|_| MathError::Overflow)?;

        let mut guard = PoolGuard::acquire(&mut self.state)?;
        let key = PositionKey::new(owner, tick_lower, tick_upper);
        let staged =
            guard.stage_modify_position(self.max_liquidity_per_tick, key, liquidity_delta, time)?;

        let amount0 = staged.amount0.unsigned_abs();
        let amount1 = staged.amount1.unsigned_abs();
        let mut payment = Payment::new(amount0, amount1);
        callback.mint_callback(amount0, amount1, data, &mut payment)?;
        verify_payment(&payment)?;

        guard.apply_modify_position(staged, self.config.tick_spacing, liquidity_delta)?;
        guard.balances.token0 = guard.balances.token0.saturating_add(payment.paid0());
        guard.balances.token1 = guard.balances.token1.saturating_add(payment.paid1());
        tracing::debug!(
            %owner,
            tick_lower,
            tick_upper,
            amount,
            %amount0,
            %amount1,
            liquidity = guard.liquidity,
            "mint"
        );
        drop(guard);

        self.events.push(PoolEvent::Mint {
            owner,
            tick_lower,
            tick_upper,
            amount,
            amount0,
            amount1,
        });
        Ok((amount0, amount1))
    }

    /// Removes `amount` liquidity from `owner`'s range. The released tokens
    /// are added to the position's owed balances; nothing is transferred until
    /// [`Self::collect`]. An `amount` of zero only settles accrued fees.
    pub fn burn(
        &mut self,
        owner: Address,
        tick_lower: i32,
        tick_upper: i32,
        amount: u128,
        time: u32,
    ) -> Result<(U256, U256), Error> {
        check_ticks(tick_lower, tick_upper)?;
        check_spaced(tick_lower, self.config.tick_spacing)?;
        check_spaced(tick_upper, self.config.tick_spacing)?;
        let liquidity_delta = i128::try_from(amount)
            .map_err(|_| MathError::Overflow)?
            .checked_neg()
            .ok_or(MathError::Overflow)?;

        let mut guard = PoolGuard::acquire(&mut self.state)?;
        let key = PositionKey::new(owner, tick_lower, tick_upper);
        let mut staged =
            guard.stage_modify_position(self.max_liquidity_per_tick, key, liquidity_delta, time)?;

        let amount0 = staged.amount0.unsigned_abs();
        let amount1 = staged.amount1.unsigned_abs();
        staged.position.tokens_owed_0 = staged
            .position
            .tokens_owed_0
            .wrapping_add(truncate_u128(amount0));
        staged.position.tokens_owed_1 = staged
            .position
            .tokens_owed_1
            .wrapping_add(truncate_u128(amount1));

        guard.apply_modify_position(staged, self.config.tick_spacing, liquidity_delta)?;
        tracing::debug!(
            %owner,
            tick_lower,
            tick_upper,
            amount,
            %amount0,
            %amount1,
            liquidity = guard.liquidity,
            "burn"
        );
        drop(guard);

        self.events.push(PoolEvent::Burn {
            owner,
            tick_lower,
            tick_upper,
            amount,
            amount0,
            amount1,
        });
        Ok((amount0, amount1))
    }

    /// Pays out up to the requested owed amounts of `owner`'s position.
    pub fn collect(
        &mut self,
        owner: Address,
        recipient: Address,
        tick_lower: i32,
        tick_upper: i32,
        amount0_requested: u128,
        amount1_requested: u128,
    ) -> Result<(u128, u128), Error> {
        let mut guard = PoolGuard::acquire(&mut self.state)?;
        let key = PositionKey::new(owner, tick_lower, tick_upper);
        let mut position = guard.positions.get(&key).copied().unwrap_or_default();

        let amount0 = amount0_requested.min(position.tokens_owed_0);
        let amount1 = amount1_requested.min(position.tokens_owed_1);
        let balances = guard.withdraw(U256::from(amount0), U256::from(amount1))?;

        position.tokens_owed_0 -= amount0;
        position.tokens_owed_1 -= amount1;
        if position.is_empty() {
            guard.positions.remove(&key);
        } else {
            guard.positions.insert(key, position);
        }
        guard.balances = balances;
        tracing::debug!(%owner, %recipient, tick_lower, tick_upper, amount0, amount1, "collect");
        drop(guard);

        self.events.push(PoolEvent::Collect {
            owner,
            recipient,
            tick_lower,
            tick_upper,
            amount0,
            amount1,
        });
        Ok((amount0, amount1))
    }

    /// Swaps against the pool. Output is transferred to `recipient` before the
    /// callback runs; the callback must then pay the positive delta.
    pub fn swap<C: SwapCallback + ?Sized>(
        &mut self,
        recipient: Address,
        params: SwapParams,
        data: &Bytes,
        time: u32,
        callback: &mut C,
    ) -> Result<SwapResult, Error> {
        let fee = self.fee();
        let mut guard = PoolGuard::acquire(&mut self.state)?;
        let outcome = compute_swap(&guard, self.config.tick_spacing, fee, &params, time)?;
        let result = outcome.result;

        let owed = |delta: I256| {
            if delta.is_positive() {
                delta.unsigned_abs()
            } else {
                U256::ZERO
            }
        };
        let sent = |delta: I256| {
            if delta.is_negative() {
                delta.unsigned_abs()
            } else {
                U256::ZERO
            }
        };
        let (sent0, sent1) = (sent(result.amount0_delta), sent(result.amount1_delta));
        let remaining = guard.withdraw(sent0, sent1)?;

        let mut payment = Payment::new(owed(result.amount0_delta), owed(result.amount1_delta));
        callback.swap_callback(result.amount0_delta, result.amount1_delta, data, &mut payment)?;
        verify_payment(&payment)?;

        guard.apply_swap(outcome, params.zero_for_one);
        guard.balances = Balances {
            token0: remaining.token0.saturating_add(payment.paid0()),
            token1: remaining.token1.saturating_add(payment.paid1()),
        };
        tracing::debug!(
            %recipient,
            amount0 = %result.amount0_delta,
            amount1 = %result.amount1_delta,
            sqrt_price_x96 = %result.sqrt_price_x96,
            tick = result.tick,
            liquidity = result.liquidity,
            "swap"
        );
        drop(guard);

        self.events.push(PoolEvent::Swap {
            recipient,
            amount0: result.amount0_delta,
            amount1: result.amount1_delta,
            sqrt_price_x96: result.sqrt_price_x96,
            liquidity: result.liquidity,
            tick: result.tick,
        });
        Ok(result)
    }

    /// Lends `amount0`/`amount1` for the duration of the callback, which must
    /// return them plus the fee. Anything paid on top of the loan is shared
    /// with in-range liquidity providers.
    pub fn flash<C: FlashCallback + ?Sized>(
        &mut self,
        recipient: Address,
        amount0: U256,
        amount1: U256,
        data: &Bytes,
        callback: &mut C,
    ) -> Result<(U256, U256), Error> {
        let fee = U256::from(self.fee());
        let mut guard = PoolGuard::acquire(&mut self.state)?;
        let liquidity = guard.liquidity;
        if liquidity == 0 {
            return Err(LiquidityError::NoLiquidity.into());
        }

        let fee0 = mul_div_rounding_up(amount0, fee, U256_E6)?;
        let fee1 = mul_div_rounding_up(amount1, fee, U256_E6)?;
        let owed0 = amount0.checked_add(fee0).ok_or(MathError::Overflow)?;
        let owed1 = amount1.checked_add(fee1).ok_or(MathError::Overflow)?;
        let remaining = guard.withdraw(amount0, amount1)?;

        let mut payment = Payment::new(owed0, owed1);
        callback.flash_callback(fee0, fee1, data, &mut payment)?;
        verify_payment(&payment)?;

        let paid0 = payment.paid0() - amount0;
        let paid1 = payment.paid1() - amount1;
        let fee_protocol = guard.slot0.fee_protocol;
        let (protocol0, growth0) = split_fee(paid0, fee_protocol % 16, liquidity)?;
        let (protocol1, growth1) = split_fee(paid1, fee_protocol >> 4, liquidity)?;

        guard.fee_growth_global_0_x128 = guard.fee_growth_global_0_x128.wrapping_add(growth0);
        guard.fee_growth_global_1_x128 = guard.fee_growth_global_1_x128.wrapping_add(growth1);
        guard.protocol_fees.token0 = guard.protocol_fees.token0.wrapping_add(protocol0);
        guard.protocol_fees.token1 = guard.protocol_fees.token1.wrapping_add(protocol1);
        guard.balances = Balances {
            token0: remaining.token0.saturating_add(payment.paid0()),
            token1: remaining.token1.saturating_add(payment.paid1()),
        };
        tracing::debug!(%recipient, %amount0, %amount1, %paid0, %paid1, "flash");
        drop(guard);

        self.events.push(PoolEvent::Flash {
            recipient,
            amount0,
            amount1,
            paid0,
            paid1,
        });
        Ok((paid0, paid1))
    }

    /// Reserves oracle capacity. Takes effect the next time the write index wraps.
    pub fn increase_observation_cardinality_next(
        &mut self,
        observation_cardinality_next: u16,
    ) -> Result<(), Error> {
        let mut guard = PoolGuard::acquire(&mut self.state)?;
        let old = guard.slot0.observation_cardinality_next;
        let new = guard
            .observations
            .grow(old, observation_cardinality_next)?;
        guard.slot0.observation_cardinality_next = new;
        drop(guard);

        if old != new {
            tracing::debug!(old, new, "observation cardinality next increased");
            self.events
                .push(PoolEvent::IncreaseObservationCardinalityNext { old, new });
        }
        Ok(())
    }

    /// Sets the protocol's share of swap fees to `1/fee_protocol` per token.
    /// Zero turns the share off; otherwise values must be in `4..=10`.
    pub fn set_fee_protocol(&mut self, fee_protocol0: u8, fee_protocol1: u8) -> Result<(), Error> {
        let valid = |fee: u8| fee == 0 || (4..=10).contains(&fee);
        if !valid(fee_protocol0) || !valid(fee_protocol1) {
            return Err(PoolError::InvalidFeeProtocol {
                fee0: fee_protocol0,
                fee1: fee_protocol1,
            }
            .into());
        }

        let mut guard = PoolGuard::acquire(&mut self.state)?;
        let old = guard.slot0.fee_protocol;
        guard.slot0.fee_protocol = fee_protocol0 + (fee_protocol1 << 4);
        drop(guard);

        tracing::debug!(fee_protocol0, fee_protocol1, "fee protocol set");
        self.events.push(PoolEvent::SetFeeProtocol {
            fee_protocol0_old: old % 16,
            fee_protocol1_old: old >> 4,
            fee_protocol0_new: fee_protocol0,
            fee_protocol1_new: fee_protocol1,
        });
        Ok(())
    }

    /// Pays out up to the requested amounts of accrued protocol fees.
    pub fn collect_protocol(
        &mut self,
        recipient: Address,
        amount0_requested: u128,
        amount1_requested: u128,
    ) -> Result<(u128, u128), Error> {
        let mut guard = PoolGuard::acquire(&mut self.state)?;
        let amount0 = amount0_requested.min(guard.protocol_fees.token0);
        let amount1 = amount1_requested.min(guard.protocol_fees.token1);
        let balances = guard.withdraw(U256::from(amount0), U256::from(amount1))?;

        guard.protocol_fees.token0 -= amount0;
        guard.protocol_fees.token1 -= amount1;
        guard.balances = balances;
        drop(guard);

        tracing::debug!(%recipient, amount0, amount1, "protocol fees collected");
        self.events.push(PoolEvent::CollectProtocol {
            recipient,
            amount0,
            amount1,
        });
        Ok((amount0, amount1))
    }

    /// Tick and seconds-per-liquidity cumulatives `seconds_agos` before `time`.
    pub fn observe(&self, seconds_agos: &[u32], time: u32) -> Result<(Vec<i64>, Vec<U256>), Error> {
        let slot0 = self.state.slot0;
        Ok(self.state.observations.observe(
            time,
            seconds_agos,
            slot0.tick,
            slot0.observation_index,
            self.state.liquidity,
            slot0.observation_cardinality,
        )?)
    }

    /// Accumulator growth while the price sat inside `[tick_lower, tick_upper)`.
    /// Both bounds must be initialized.
    pub fn snapshot_cumulatives_inside(
        &self,
        tick_lower: i32,
        tick_upper: i32,
        time: u32,
    ) -> Result<CumulativesInside, Error> {
        check_ticks(tick_lower, tick_upper)?;
        let initialized = |tick: i32| {
            self.state
                .ticks
                .get(&tick)
                .filter(|info| info.initialized)
                .copied()
                .ok_or(TickError::NotInitialized(tick))
        };
        let lower = initialized(tick_lower)?;
        let upper = initialized(tick_upper)?;
        let tick_current = self.state.slot0.tick;

        let inside = if tick_current < tick_lower {
            CumulativesInside {
                tick_cumulative_inside: lower
                    .tick_cumulative_outside
                    .wrapping_sub(upper.tick_cumulative_outside),
                seconds_per_liquidity_inside_x128: lower
                    .seconds_per_liquidity_outside_x128
                    .wrapping_sub(upper.seconds_per_liquidity_outside_x128)
                    & U160_MAX,
                seconds_inside: lower.seconds_outside.wrapping_sub(upper.seconds_outside),
            }
        } else if tick_current < tick_upper {
            let (tick_cumulative, seconds_per_liquidity_cumulative_x128) =
                self.state.observe_now(time)?;
            CumulativesInside {
                tick_cumulative_inside: tick_cumulative
                    .wrapping_sub(lower.tick_cumulative_outside)
                    .wrapping_sub(upper.tick_cumulative_outside),
                seconds_per_liquidity_inside_x128: seconds_per_liquidity_cumulative_x128
                    .wrapping_sub(lower.seconds_per_liquidity_outside_x128)
                    .wrapping_sub(upper.seconds_per_liquidity_outside_x128)
                    & U160_MAX,
                seconds_inside: time
                    .wrapping_sub(lower.seconds_outside)
                    .wrapping_sub(upper.seconds_outside),
            }
        } else {
            CumulativesInside {
                tick_cumulative_inside: upper
                    .tick_cumulative_outside
                    .wrapping_sub(lower.tick_cumulative_outside),
                seconds_per_liquidity_inside_x128: upper
                    .seconds_per_liquidity_outside_x128
                    .wrapping_sub(lower.seconds_per_liquidity_outside_x128)
                    & U160_MAX,
                seconds_inside: upper.seconds_outside.wrapping_sub(lower.seconds_outside),
            }
        };
        Ok(inside)
    }

    /// Initialized ticks of one bitmap word, highest tick first.
    pub fn populated_ticks_in_word(&self, word: i16) -> Vec<PopulatedTick> {
        let bits = get_word(&self.state.bitmap, word);
        let spacing = self.config.tick_spacing;
        (0..256usize)
            .rev()
            .filter(|&bit| bits.bit(bit))
            .map(|bit| {
                let tick = ((i32::from(word) << 8) + bit as i32) * spacing;
                let info = self.state.ticks.get(&tick).copied().unwrap_or_default();
                PopulatedTick {
                    tick,
                    liquidity_net: info.liquidity_net,
                    liquidity_gross: info.liquidity_gross,
                }
            })
            .collect()
    }

    /// Result of `params` against the current state, without callbacks or writes.
    pub fn quote_swap(&self, params: &SwapParams, time: u32) -> Result<SwapResult, Error> {
        if self.state.slot0.sqrt_price_x96.is_zero() {
            return Err(PoolError::NotInitialized.into());
        }
        let outcome = compute_swap(&self.state, self.config.tick_spacing, self.fee(), params, time)?;
        Ok(outcome.result)
    }

    /// Largest input, fee included, a swap in this direction can consume.
    pub fn max_input_amount(&self, zero_for_one: bool) -> Result<U256, Error> {
        max_input_amount(&self.state, self.config.tick_spacing, self.fee(), zero_for_one)
    }

    pub fn config(&self) -> &PoolConfig {
        &self.config
    }

    pub fn max_liquidity_per_tick(&self) -> u128 {
        self.max_liquidity_per_tick
    }

    pub fn state(&self) -> &PoolState {
        &self.state
    }

    pub fn slot0(&self) -> Slot0 {
        self.state.slot0
    }

    pub fn liquidity(&self) -> u128 {
        self.state.liquidity
    }

    pub fn fee_growth_global(&self) -> (U256, U256) {
        (
            self.state.fee_growth_global_0_x128,
            self.state.fee_growth_global_1_x128,
        )
    }

    pub fn protocol_fees(&self) -> ProtocolFees {
        self.state.protocol_fees
    }

    pub fn balances(&self) -> Balances {
        self.state.balances
    }

    pub fn tick(&self, tick: i32) -> Option<&TickInfo> {
        self.state.ticks.get(&tick)
    }

    pub fn position(&self, owner: Address, tick_lower: i32, tick_upper: i32) -> Option<&Position> {
        self.state
            .positions
            .get(&PositionKey::new(owner, tick_lower, tick_upper))
    }

    pub fn observation(&self, index: u16) -> Observation {
        self.state.observations.get(index)
    }

    pub fn tick_bitmap(&self, word: i16) -> U256 {
        get_word(&self.state.bitmap, word)
    }

    pub fn events(&self) -> &[PoolEvent] {
        &self.events
    }

    pub fn take_events(&mut self) -> Vec<PoolEvent> {
        std::mem::take(&mut self.events)
    }
}
