#![allow(dead_code)]

use clmm_core::math::math_helpers::{i256_from_i128, mul_div, mul_div_rounding_up};
use clmm_core::math::sqrt_price_math::{get_amount_0_delta_base, get_amount_1_delta_base};
use clmm_core::math::swap_math::compute_swap_step;
use clmm_core::math::tick_bitmap::{TickBitmap, flip_tick, next_initialized_tick_within_one_word};
use clmm_core::math::tick_math::{get_sqrt_ratio_at_tick, get_tick_at_sqrt_ratio};
use clmm_core::pool::{ExactPayer, PoolConfig, SwapParams};
use clmm_core::{Address, Bytes, ClPool, Q96, Q128, U256};
use criterion::{BenchmarkId, Criterion, black_box};

pub const TIME: u32 = 1_700_000_000;
const SPACING: i32 = 60;

pub fn bench_tick_math(c: &mut Criterion) {
    let mut group = c.benchmark_group("tick_math");
    for tick in [-887272, -50_000, 0, 50_000, 887272] {
        group.bench_with_input(BenchmarkId::new("sqrt_ratio_at_tick", tick), &tick, |b, &tick| {
            b.iter(|| get_sqrt_ratio_at_tick(black_box(tick)))
        });
        let price = get_sqrt_ratio_at_tick(tick).unwrap();
        group.bench_with_input(BenchmarkId::new("tick_at_sqrt_ratio", tick), &price, |b, &price| {
            b.iter(|| get_tick_at_sqrt_ratio(black_box(price)))
        });
    }
    group.finish();
}

pub fn bench_sqrt_price_math(c: &mut Criterion) {
    let lower = get_sqrt_ratio_at_tick(-600).unwrap();
    let upper = get_sqrt_ratio_at_tick(600).unwrap();
    let liquidity = 1_000_000_000_000_000_000u128;
    c.bench_function("amount_0_delta", |b| {
        b.iter(|| get_amount_0_delta_base(black_box(lower), black_box(upper), liquidity, true))
    });
    c.bench_function("amount_1_delta", |b| {
        b.iter(|| get_amount_1_delta_base(black_box(lower), black_box(upper), liquidity, true))
    });
}

pub fn bench_swap_math(c: &mut Criterion) {
    let target = get_sqrt_ratio_at_tick(-600).unwrap();
    let amount = i256_from_i128(1_000_000_000_000_000);
    c.bench_function("compute_swap_step", |b| {
        b.iter(|| {
            compute_swap_step(
                black_box(Q96),
                black_box(target),
                1_000_000_000_000_000_000,
                black_box(amount),
                3_000,
            )
        })
    });
}

pub fn bench_math_helpers(c: &mut Criterion) {
    let a = U256::from(123_456_789_000_000_000u128) * Q96;
    let b = U256::from(987_654_321u64);
    c.bench_function("mul_div", |bench| {
        bench.iter(|| mul_div(black_box(a), black_box(b), black_box(Q128)))
    });
    c.bench_function("mul_div_rounding_up", |bench| {
        bench.iter(|| mul_div_rounding_up(black_box(a), black_box(b), black_box(Q128)))
    });
}

pub fn bench_tick_bitmap(c: &mut Criterion) {
    let mut bitmap = TickBitmap::default();
    for tick in (-256..256).step_by(7) {
        flip_tick(&mut bitmap, tick * SPACING, SPACING).unwrap();
    }
    c.bench_function("next_initialized_tick_lte", |b| {
        b.iter(|| next_initialized_tick_within_one_word(&bitmap, black_box(1_000), SPACING, true))
    });
    c.bench_function("next_initialized_tick_gt", |b| {
        b.iter(|| next_initialized_tick_within_one_word(&bitmap, black_box(-1_000), SPACING, false))
    });
}

/// Pool at price 1 with full-range liquidity plus a ladder of narrow
/// positions, so swaps cross initialized ticks.
pub fn laddered_pool() -> ClPool {
    let config = PoolConfig::new(Address::repeat_byte(1), Address::repeat_byte(2), SPACING, 3_000);
    let mut pool = ClPool::new(config).unwrap();
    pool.initialize(Q96, TIME).unwrap();
    let owner = Address::repeat_byte(9);
    pool.mint(owner, -887220, 887220, 1_000_000_000_000_000_000, &Bytes::new(), TIME, &mut ExactPayer)
        .unwrap();
    for i in 1..=50 {
        let width = i * SPACING;
        pool.mint(owner, -width, width, 10_000_000_000_000_000, &Bytes::new(), TIME, &mut ExactPayer)
            .unwrap();
    }
    pool
}

pub fn bench_pool_swap(c: &mut Criterion) {
    let pool = laddered_pool();
    let mut group = c.benchmark_group("pool_swap");
    for amount in [1_000_000_000_000_000i128, 100_000_000_000_000_000] {
        let params = SwapParams::unbounded(true, i256_from_i128(amount));
        group.bench_with_input(BenchmarkId::new("quote", amount), &params, |b, params| {
            b.iter(|| pool.quote_swap(black_box(params), TIME))
        });
        group.bench_with_input(BenchmarkId::new("swap", amount), &params, |b, params| {
            b.iter_batched(
                || pool.clone(),
                |mut pool| pool.swap(Address::ZERO, *params, &Bytes::new(), TIME, &mut ExactPayer),
                criterion::BatchSize::LargeInput,
            )
        });
    }
    group.finish();
}

pub fn bench_pool_oracle(c: &mut Criterion) {
    let mut pool = laddered_pool();
    pool.increase_observation_cardinality_next(64).unwrap();
    let mut time = TIME;
    for i in 0..128 {
        time += 60;
        let zero_for_one = i % 2 == 0;
        pool.swap(
            Address::ZERO,
            SwapParams::unbounded(zero_for_one, i256_from_i128(1_000_000_000_000_000)),
            &Bytes::new(),
            time,
            &mut ExactPayer,
        )
        .unwrap();
    }
    let seconds_agos: Vec<u32> = (0..32).map(|i| i * 90).collect();
    c.bench_function("observe_32", |b| {
        b.iter(|| pool.observe(black_box(&seconds_agos), time))
    });
}
