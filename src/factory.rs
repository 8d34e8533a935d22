//! Pool registry keyed by `(token0, token1, tick_spacing)`.
//!
//! The factory owns the tick-spacing to fee table and, optionally, a
//! [`SwapFeeModule`] that pools consult for a dynamic fee. Pools are plain
//! values stored in creation order; there is no deployment step.

use crate::FastMap;
use crate::error::{Error, FactoryError};
use crate::pool::cl_pool::{ClPool, PoolConfig};
use alloy_primitives::Address;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Highest fee a registry entry or a fee module may set, in pips.
pub const MAX_FEE: u32 = 100_000;

/// Tick spacings must stay below this so a bitmap word search stays bounded.
pub const MAX_TICK_SPACING: i32 = 16384;

/// Source of a per-pool swap fee that overrides the registry fee.
pub trait SwapFeeModule: Send + Sync {
    fn get_fee(&self, pool: &PoolConfig) -> u32;
}

impl<F> SwapFeeModule for F
where
    F: Fn(&PoolConfig) -> u32 + Send + Sync,
{
    fn get_fee(&self, pool: &PoolConfig) -> u32 {
        self(pool)
    }
}

/// Fee charged by `pool`: the module's answer when it is at most
/// [`MAX_FEE`], otherwise the pool's configured fee.
pub fn resolve_swap_fee(module: Option<&dyn SwapFeeModule>, pool: &PoolConfig) -> u32 {
    module
        .map(|module| module.get_fee(pool))
        .filter(|fee| *fee <= MAX_FEE)
        .unwrap_or(pool.fee_pips)
}

/// Returns the token pair sorted by numeric address.
pub fn sort_tokens(token_a: Address, token_b: Address) -> (Address, Address) {
    if token_a < token_b {
        (token_a, token_b)
    } else {
        (token_b, token_a)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PoolKey {
    pub token0: Address,
    pub token1: Address,
    pub tick_spacing: i32,
}

impl PoolKey {
    /// Key for a pair in either order.
    pub fn new(token_a: Address, token_b: Address, tick_spacing: i32) -> Self {
        let (token0, token1) = sort_tokens(token_a, token_b);
        Self {
            token0,
            token1,
            tick_spacing,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickSpacingFee {
    pub tick_spacing: i32,
    pub fee: u32,
}

/// Registry entries enabled at construction.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FactoryConfig {
    pub tick_spacings: Vec<TickSpacingFee>,
}

impl Default for FactoryConfig {
    fn default() -> Self {
        let tick_spacings = [(1, 100), (50, 500), (100, 500), (200, 3_000), (2_000, 10_000)]
            .into_iter()
            .map(|(tick_spacing, fee)| TickSpacingFee { tick_spacing, fee })
            .collect();
        Self { tick_spacings }
    }
}

pub struct PoolFactory {
    tick_spacing_to_fee: FastMap<i32, u32>,
    tick_spacings: Vec<i32>,
    swap_fee_module: Option<Arc<dyn SwapFeeModule>>,
    pools: Vec<ClPool>,
    index: FastMap<PoolKey, usize>,
}

impl std::fmt::Debug for PoolFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PoolFactory")
            .field("tick_spacings", &self.tick_spacings)
            .field("swap_fee_module", &self.swap_fee_module.is_some())
            .field("pools", &self.pools.len())
            .finish()
    }
}

impl Default for PoolFactory {
    fn default() -> Self {
        let config = FactoryConfig::default();
        let mut factory = Self::empty();
        for entry in config.tick_spacings {
            factory
                .tick_spacing_to_fee
                .insert(entry.tick_spacing, entry.fee);
            factory.tick_spacings.push(entry.tick_spacing);
        }
        factory
    }
}

impl PoolFactory {
    fn empty() -> Self {
        Self {
            tick_spacing_to_fee: FastMap::default(),
            tick_spacings: Vec::new(),
            swap_fee_module: None,
            pools: Vec::new(),
            index: FastMap::default(),
        }
    }

    pub fn new(config: FactoryConfig) -> Result<Self, Error> {
        let mut factory = Self::empty();
        for entry in config.tick_spacings {
            factory.enable_tick_spacing(entry.tick_spacing, entry.fee)?;
        }
        Ok(factory)
    }

    /// Adds a tick spacing to the registry. Entries are permanent.
    pub fn enable_tick_spacing(&mut self, tick_spacing: i32, fee: u32) -> Result<(), Error> {
        if tick_spacing <= 0 || tick_spacing >= MAX_TICK_SPACING {
            return Err(FactoryError::InvalidTickSpacing(tick_spacing).into());
        }
        if fee == 0 || fee > MAX_FEE {
            return Err(FactoryError::InvalidFee(fee).into());
        }
        if self.tick_spacing_to_fee.contains_key(&tick_spacing) {
            return Err(FactoryError::TickSpacingEnabled(tick_spacing).into());
        }
        self.tick_spacing_to_fee.insert(tick_spacing, fee);
        self.tick_spacings.push(tick_spacing);
        tracing::debug!(tick_spacing, fee, "tick spacing enabled");
        Ok(())
    }

    pub fn tick_spacing_to_fee(&self, tick_spacing: i32) -> Option<u32> {
        self.tick_spacing_to_fee.get(&tick_spacing).copied()
    }

    /// Enabled tick spacings in the order they were added.
    pub fn tick_spacings(&self) -> &[i32] {
        &self.tick_spacings
    }

    /// Creates an uninitialized pool for the pair and returns it.
    pub fn create_pool(
        &mut self,
        token_a: Address,
        token_b: Address,
        tick_spacing: i32,
    ) -> Result<&mut ClPool, Error> {
        if token_a == token_b {
            return Err(FactoryError::IdenticalTokens.into());
        }
        let key = PoolKey::new(token_a, token_b, tick_spacing);
        if key.token0 == Address::ZERO {
            return Err(FactoryError::ZeroAddress.into());
        }
        let fee = self
            .tick_spacing_to_fee(tick_spacing)
            .ok_or(FactoryError::InvalidTickSpacing(tick_spacing))?;
        if self.index.contains_key(&key) {
            return Err(FactoryError::PoolExists.into());
        }

        let config = PoolConfig::new(key.token0, key.token1, tick_spacing, fee);
        let mut pool = ClPool::new(config)?;
        pool.set_swap_fee_module(self.swap_fee_module.clone());

        let position = self.pools.len();
        self.pools.push(pool);
        self.index.insert(key, position);
        tracing::debug!(
            token0 = %key.token0,
            token1 = %key.token1,
            tick_spacing,
            fee,
            "pool created"
        );
        Ok(&mut self.pools[position])
    }

    pub fn get_pool(&self, token_a: Address, token_b: Address, tick_spacing: i32) -> Option<&ClPool> {
        let key = PoolKey::new(token_a, token_b, tick_spacing);
        self.index.get(&key).map(|&i| &self.pools[i])
    }

    pub fn get_pool_mut(
        &mut self,
        token_a: Address,
        token_b: Address,
        tick_spacing: i32,
    ) -> Option<&mut ClPool> {
        let key = PoolKey::new(token_a, token_b, tick_spacing);
        let i = *self.index.get(&key)?;
        self.pools.get_mut(i)
    }

    /// Two distinct pools at once, for routing a swap through both.
    pub fn get_pool_pair_mut(
        &mut self,
        first: &PoolKey,
        second: &PoolKey,
    ) -> Option<(&mut ClPool, &mut ClPool)> {
        let i = *self.index.get(first)?;
        let j = *self.index.get(second)?;
        if i == j {
            return None;
        }
        if i < j {
            let (left, right) = self.pools.split_at_mut(j);
            Some((&mut left[i], &mut right[0]))
        } else {
            let (left, right) = self.pools.split_at_mut(i);
            Some((&mut right[0], &mut left[j]))
        }
    }

    pub fn all_pools(&self) -> &[ClPool] {
        &self.pools
    }

    /// Installs (or removes) the fee module for every existing and future pool.
    pub fn set_swap_fee_module(&mut self, module: Option<Arc<dyn SwapFeeModule>>) {
        for pool in &mut self.pools {
            pool.set_swap_fee_module(module.clone());
        }
        self.swap_fee_module = module;
    }

    /// Fee a pool with this configuration would charge right now.
    pub fn get_swap_fee(&self, pool: &PoolConfig) -> u32 {
        resolve_swap_fee(self.swap_fee_module.as_deref(), pool)
    }
}
