//! Ring buffer of cumulative tick and seconds-per-liquidity samples.
//!
//! The buffer only ever holds `cardinality` live slots. `grow` reserves room
//! for more, but the extra slots only join the ring when the write index wraps
//! past the end of the current one. Timestamps are `u32` seconds and are
//! compared modulo 2^32 with [`lte`], so a buffer keeps working across the
//! 2106 rollover as long as its samples span less than 2^31 seconds.

use crate::U160_MAX;
use crate::error::OracleError;
use alloy_primitives::U256;
use serde::Serialize;

/// Largest number of slots the buffer may hold.
pub const MAX_CARDINALITY: u16 = u16::MAX;

/// Writes less than this many seconds after the previous one are dropped.
pub const MIN_OBSERVATION_INTERVAL: u32 = 15;

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Observation {
    pub block_timestamp: u32,
    /// Running sum of `tick * seconds`.
    pub tick_cumulative: i64,
    /// Running sum of `seconds << 128 / max(liquidity, 1)`, modulo 2^160.
    pub seconds_per_liquidity_cumulative_x128: U256,
    pub initialized: bool,
}

impl Observation {
    /// The observation that would be recorded at `time` if `tick` and
    /// `liquidity` had held since this one.
    pub fn transform(&self, time: u32, tick: i32, liquidity: u128) -> Observation {
        let delta = time.wrapping_sub(self.block_timestamp);
        let liquidity = U256::from(liquidity.max(1));
        Observation {
            block_timestamp: time,
            tick_cumulative: self
                .tick_cumulative
                .wrapping_add(i64::from(tick) * i64::from(delta)),
            seconds_per_liquidity_cumulative_x128: self
                .seconds_per_liquidity_cumulative_x128
                .wrapping_add((U256::from(delta) << 128) / liquidity)
                & U160_MAX,
            initialized: true,
        }
    }
}

/// `a <= b` for timestamps at most 2^31 seconds apart.
#[inline]
pub fn lte(a: u32, b: u32) -> bool {
    b.wrapping_sub(a) < 1 << 31
}

/// A write computed against the buffer but not yet stored.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct PendingWrite {
    pub index: u16,
    pub cardinality: u16,
    pub observation: Observation,
}

/// Observation storage. Slots past the reserved length read as zeroed,
/// uninitialized observations.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Observations {
    slots: Vec<Observation>,
}

impl Observations {
    pub fn get(&self, index: u16) -> Observation {
        self.slots
            .get(index as usize)
            .copied()
            .unwrap_or_default()
    }

    /// Number of slots reserved so far.
    pub fn reserved(&self) -> usize {
        self.slots.len()
    }

    /// Resets the buffer to a single observation at `time`. Returns the new
    /// `(cardinality, cardinality_next)`.
    pub fn initialize(&mut self, time: u32) -> (u16, u16) {
        self.slots.clear();
        self.slots.push(Observation {
            block_timestamp: time,
            initialized: true,
            ..Default::default()
        });
        (1, 1)
    }

    /// Computes the write for `time` without storing it. `None` means the
    /// write falls inside the minimum interval and is a no-op.
    pub fn prepare_write(
        &self,
        index: u16,
        time: u32,
        tick: i32,
        liquidity: u128,
        cardinality: u16,
        cardinality_next: u16,
    ) -> Option<PendingWrite> {
        if cardinality == 0 {
            return None;
        }
        let last = self.get(index);
        if time.wrapping_sub(last.block_timestamp) < MIN_OBSERVATION_INTERVAL {
            return None;
        }

        let cardinality = if cardinality_next > cardinality && index == cardinality - 1 {
            cardinality_next
        } else {
            cardinality
        };
        let index = ((u32::from(index) + 1) % u32::from(cardinality)) as u16;

        Some(PendingWrite {
            index,
            cardinality,
            observation: last.transform(time, tick, liquidity),
        })
    }

    /// Stores a prepared write and returns its `(index, cardinality)`.
    pub fn commit(&mut self, write: PendingWrite) -> (u16, u16) {
        let slot = write.index as usize;
        if self.slots.len() <= slot {
            self.slots.resize(slot + 1, Observation::default());
        }
        self.slots[slot] = write.observation;
        (write.index, write.cardinality)
    }

    /// Appends a sample for `time` using the tick and liquidity that held
    /// since the last one. Returns the new `(index, cardinality)`.
    pub fn write(
        &mut self,
        index: u16,
        time: u32,
        tick: i32,
        liquidity: u128,
        cardinality: u16,
        cardinality_next: u16,
    ) -> (u16, u16) {
        match self.prepare_write(index, time, tick, liquidity, cardinality, cardinality_next) {
            Some(write) => self.commit(write),
            None => (index, cardinality),
        }
    }

    /// Reserves slots up to `next`, returning the new `cardinality_next`.
    pub fn grow(&mut self, current: u16, next: u16) -> Result<u16, OracleError> {
        if current == 0 {
            return Err(OracleError::Uninitialized);
        }
        if next <= current {
            return Ok(current);
        }
        if self.slots.len() < next as usize {
            self.slots.resize(next as usize, Observation::default());
        }
        // non-zero timestamp marks the slot as reserved
        for slot in &mut self.slots[current as usize..next as usize] {
            *slot = Observation {
                block_timestamp: 1,
                ..Default::default()
            };
        }
        Ok(next)
    }

    /// Observations bracketing `target`. When `target` is at or after the
    /// newest sample the second element is that sample transformed forward.
    fn surrounding_observations(
        &self,
        target: u32,
        tick: i32,
        index: u16,
        liquidity: u128,
        cardinality: u16,
    ) -> Result<(Observation, Observation), OracleError> {
        let newest = self.get(index);
        if lte(newest.block_timestamp, target) {
            if newest.block_timestamp == target {
                return Ok((newest, newest));
            }
            return Ok((newest, newest.transform(target, tick, liquidity)));
        }

        let mut oldest = self.get(((u32::from(index) + 1) % u32::from(cardinality)) as u16);
        if !oldest.initialized {
            oldest = self.get(0);
        }
        if !lte(oldest.block_timestamp, target) {
            return Err(OracleError::TooOld { target });
        }

        self.binary_search(target, index, cardinality)
    }

    fn binary_search(
        &self,
        target: u32,
        index: u16,
        cardinality: u16,
    ) -> Result<(Observation, Observation), OracleError> {
        let cardinality = u32::from(cardinality);
        let mut l = (u32::from(index) + 1) % cardinality;
        let mut r = l + cardinality - 1;

        while l <= r {
            let i = (l + r) / 2;
            let before = self.get((i % cardinality) as u16);
            if !before.initialized {
                l = i + 1;
                continue;
            }
            let after = self.get(((i + 1) % cardinality) as u16);

            let target_at_or_after = lte(before.block_timestamp, target);
            if target_at_or_after && lte(target, after.block_timestamp) {
                return Ok((before, after));
            }
            if target_at_or_after {
                l = i + 1;
            } else if i == 0 {
                break;
            } else {
                r = i - 1;
            }
        }
        Err(OracleError::TooOld { target })
    }

    /// Cumulatives as of `seconds_ago` before `time`, interpolated between
    /// stored samples or extrapolated from the newest one.
    pub fn observe_single(
        &self,
        time: u32,
        seconds_ago: u32,
        tick: i32,
        index: u16,
        liquidity: u128,
        cardinality: u16,
    ) -> Result<(i64, U256), OracleError> {
        if cardinality == 0 {
            return Err(OracleError::Uninitialized);
        }

        if seconds_ago == 0 {
            let mut last = self.get(index);
            if last.block_timestamp != time {
                last = last.transform(time, tick, liquidity);
            }
            return Ok((last.tick_cumulative, last.seconds_per_liquidity_cumulative_x128));
        }

        let target = time.wrapping_sub(seconds_ago);
        let (before, after) =
            self.surrounding_observations(target, tick, index, liquidity, cardinality)?;

        if target == before.block_timestamp {
            return Ok((before.tick_cumulative, before.seconds_per_liquidity_cumulative_x128));
        }
        if target == after.block_timestamp {
            return Ok((after.tick_cumulative, after.seconds_per_liquidity_cumulative_x128));
        }

        let observation_delta = after.block_timestamp.wrapping_sub(before.block_timestamp);
        let target_delta = target.wrapping_sub(before.block_timestamp);

        let tick_rate =
            after.tick_cumulative.wrapping_sub(before.tick_cumulative) / i64::from(observation_delta);
        let tick_cumulative = before
            .tick_cumulative
            .wrapping_add(tick_rate.wrapping_mul(i64::from(target_delta)));

        let spl_delta = after
            .seconds_per_liquidity_cumulative_x128
            .wrapping_sub(before.seconds_per_liquidity_cumulative_x128)
            & U160_MAX;
        let spl = before
            .seconds_per_liquidity_cumulative_x128
            .wrapping_add(spl_delta * U256::from(target_delta) / U256::from(observation_delta))
            & U160_MAX;

        Ok((tick_cumulative, spl))
    }

    /// [`Self::observe_single`] for each entry of `seconds_agos`.
    pub fn observe(
        &self,
        time: u32,
        seconds_agos: &[u32],
        tick: i32,
        index: u16,
        liquidity: u128,
        cardinality: u16,
    ) -> Result<(Vec<i64>, Vec<U256>), OracleError> {
        if cardinality == 0 {
            return Err(OracleError::Uninitialized);
        }
        let mut tick_cumulatives = Vec::with_capacity(seconds_agos.len());
        let mut seconds_per_liquidity = Vec::with_capacity(seconds_agos.len());
        for &seconds_ago in seconds_agos {
            let (tick_cumulative, spl) =
                self.observe_single(time, seconds_ago, tick, index, liquidity, cardinality)?;
            tick_cumulatives.push(tick_cumulative);
            seconds_per_liquidity.push(spl);
        }
        Ok((tick_cumulatives, seconds_per_liquidity))
    }
}
