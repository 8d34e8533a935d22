//! Concentrated-liquidity pool engine in pure Rust.
//!
//! The crate is layered the way the pool is reasoned about:
//! - `math::*`: fixed-point primitives for ticks, sqrt prices, liquidity and a
//!   single swap step, plus the sparse tick bitmap.
//! - `pool::*`: tick and position accounting, the TWAP oracle ring buffer, the
//!   reentrancy guard and [`ClPool`], which runs initialize / mint / burn /
//!   collect / swap / flash as all-or-nothing state transitions.
//! - [`factory`]: pool registry keyed by `(token0, token1, tick_spacing)` with
//!   the tick-spacing to fee table.
//!
//! Time is always an input. The engine never reads a clock.
//!
//! # Example
//! ```no_run
//! use clmm_core::{
//!     error::{CallbackError, Error},
//!     math::tick_math::get_sqrt_ratio_at_tick,
//!     pool::{Payment, PoolConfig, SwapParams},
//!     Address, Bytes, ClPool, I256, U256,
//! };
//!
//! # fn main() -> Result<(), Error> {
//! let config = PoolConfig::new(Address::repeat_byte(1), Address::repeat_byte(2), 60, 3000);
//! let mut pool = ClPool::new(config)?;
//! pool.initialize(get_sqrt_ratio_at_tick(0)?, 1_700_000_000)?;
//!
//! let owner = Address::repeat_byte(9);
//! let mut pay = |owed0: U256, owed1: U256, _: &Bytes, payment: &mut Payment| {
//!     payment.pay0(owed0);
//!     payment.pay1(owed1);
//!     Ok::<(), CallbackError>(())
//! };
//! pool.mint(owner, -600, 600, 1_000_000_000, &Bytes::new(), 1_700_000_000, &mut pay)?;
//!
//! let params = SwapParams::unbounded(true, I256::from_raw(U256::from(1_000)));
//! let mut pay = |amount0: I256, _: I256, _: &Bytes, payment: &mut Payment| {
//!     payment.pay0(amount0.unsigned_abs());
//!     Ok::<(), CallbackError>(())
//! };
//! let result = pool.swap(owner, params, &Bytes::new(), 1_700_000_060, &mut pay)?;
//! assert!(result.amount1_delta.is_negative());
//! # Ok(())
//! # }
//! ```

pub use alloy_primitives::{Address, Bytes, I256, U256};

pub mod error;
pub mod factory;
mod hash;
pub mod math;
pub mod pool;

pub use hash::FastMap;
pub use pool::cl_pool::ClPool;

const U256_1: U256 = U256::from_limbs([1, 0, 0, 0]);
const U256_E6: U256 = U256::from_limbs([1000000, 0, 0, 0]);

pub const RESOLUTION: u8 = 96;
pub const Q96: U256 = U256::from_limbs([0, 4294967296, 0, 0]);
pub const Q128: U256 = U256::from_limbs([0, 0, 1, 0]);

/// 2^160 - 1. Mask for the 160-bit seconds-per-liquidity accumulators.
pub const U160_MAX: U256 = U256::from_limbs([u64::MAX, u64::MAX, 4294967295, 0]);

/// Largest fee, in hundredths of a bip, that a pool may charge.
pub const MAX_FEE_PIPS: u32 = 1_000_000;
