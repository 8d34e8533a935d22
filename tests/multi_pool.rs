use clmm_core::error::{CallbackError, Error, SettlementError};
use clmm_core::factory::{FactoryConfig, PoolFactory, PoolKey, TickSpacingFee};
use clmm_core::math::math_helpers::i256_from_i128;
use clmm_core::math::tick_math::MAX_TICK;
use clmm_core::pool::{ExactPayer, Payment, PoolEvent, SwapParams};
use clmm_core::{Address, Bytes, I256, Q96, U256};
use alloy_primitives::address;

const TOKEN_A: Address = address!("0x1000000000000000000000000000000000000000");
const TOKEN_B: Address = address!("0x2000000000000000000000000000000000000000");
const TOKEN_C: Address = address!("0x3000000000000000000000000000000000000000");
const WALLET: Address = address!("0x00000000000000000000000000000000000000aa");

const SPACING: i32 = 60;
const TIME: u32 = 1_650_000_000;
const E18: u128 = 1_000_000_000_000_000_000;

fn full_range() -> (i32, i32) {
    let max = (MAX_TICK / SPACING) * SPACING;
    (-max, max)
}

fn int(v: i128) -> I256 {
    i256_from_i128(v)
}

/// A/B and B/C pools at price 1 with 1e18 of full-range liquidity each.
fn two_pools() -> PoolFactory {
    let config = FactoryConfig {
        tick_spacings: vec![TickSpacingFee {
            tick_spacing: SPACING,
            fee: 3_000,
        }],
    };
    let mut factory = PoolFactory::new(config).unwrap();
    let (lower, upper) = full_range();
    for (a, b) in [(TOKEN_A, TOKEN_B), (TOKEN_C, TOKEN_B)] {
        let pool = factory.create_pool(a, b, SPACING).unwrap();
        pool.initialize(Q96, TIME).unwrap();
        pool.mint(WALLET, lower, upper, E18, &Bytes::new(), TIME, &mut ExactPayer)
            .unwrap();
    }
    factory
}

fn keys() -> (PoolKey, PoolKey) {
    (
        PoolKey::new(TOKEN_A, TOKEN_B, SPACING),
        PoolKey::new(TOKEN_B, TOKEN_C, SPACING),
    )
}

#[test]
fn pools_are_created_with_sorted_tokens() {
    let factory = two_pools();
    let (ab, bc) = keys();
    assert_eq!((ab.token0, ab.token1), (TOKEN_A, TOKEN_B));
    assert_eq!((bc.token0, bc.token1), (TOKEN_B, TOKEN_C));

    let pool = factory.get_pool(TOKEN_C, TOKEN_B, SPACING).unwrap();
    assert_eq!(pool.config().token0, TOKEN_B);
    assert_eq!(pool.config().token1, TOKEN_C);
    assert_eq!(pool.fee(), 3_000);
}

#[test]
fn exact_output_through_two_pools() {
    let mut factory = two_pools();
    let (ab, bc) = keys();
    let (input_pool, output_pool) = factory.get_pool_pair_mut(&ab, &bc).unwrap();

    let mut paid_a = I256::ZERO;
    // C out of B/C is paid for with B, which is bought from A/B with A
    let mut route = |amount0: I256, _: I256, data: &Bytes, payment: &mut Payment| {
        let owed_b = amount0;
        let inner = input_pool.swap(
            WALLET,
            SwapParams::unbounded(true, -owed_b),
            data,
            TIME,
            &mut ExactPayer,
        )?;
        paid_a = inner.amount0_delta;
        payment.pay0(owed_b.unsigned_abs());
        Ok::<(), CallbackError>(())
    };
    let result = output_pool
        .swap(
            WALLET,
            SwapParams::unbounded(true, int(-100)),
            &Bytes::new(),
            TIME,
            &mut route,
        )
        .unwrap();

    assert_eq!(result.amount1_delta, int(-100));
    assert_eq!(result.amount0_delta, int(102));
    assert_eq!(paid_a, int(104));

    let (input_pool, output_pool) = factory.get_pool_pair_mut(&ab, &bc).unwrap();
    assert!(matches!(
        input_pool.events().last(),
        Some(PoolEvent::Swap { amount0, amount1, .. }) if *amount0 == int(104) && *amount1 == int(-102)
    ));
    assert!(matches!(
        output_pool.events().last(),
        Some(PoolEvent::Swap { amount0, amount1, .. }) if *amount0 == int(102) && *amount1 == int(-100)
    ));
}

#[test]
fn failure_in_the_inner_hop_unwinds_both_pools() {
    let mut factory = two_pools();
    let (ab, bc) = keys();
    let (input_pool, output_pool) = factory.get_pool_pair_mut(&ab, &bc).unwrap();
    let input_before = input_pool.state().clone();
    let output_before = output_pool.state().clone();

    let mut route = |amount0: I256, _: I256, data: &Bytes, payment: &mut Payment| {
        let mut refuse = |_: I256, _: I256, _: &Bytes, _: &mut Payment| {
            Err::<(), _>(CallbackError::Rejected("out of funds".into()))
        };
        input_pool.swap(
            WALLET,
            SwapParams::unbounded(true, -amount0),
            data,
            TIME,
            &mut refuse,
        )?;
        payment.pay0(amount0.unsigned_abs());
        Ok::<(), CallbackError>(())
    };
    let err = output_pool
        .swap(
            WALLET,
            SwapParams::unbounded(true, int(-100)),
            &Bytes::new(),
            TIME,
            &mut route,
        )
        .unwrap_err();

    assert!(matches!(
        err,
        Error::SettlementError(SettlementError::Callback(CallbackError::Nested(_)))
    ));
    assert_eq!(input_pool.state(), &input_before);
    assert_eq!(output_pool.state(), &output_before);
}

#[test]
fn caller_restores_committed_hops_from_a_snapshot() {
    let mut factory = two_pools();
    let (ab, bc) = keys();
    let (input_pool, output_pool) = factory.get_pool_pair_mut(&ab, &bc).unwrap();
    let snapshot = input_pool.clone();

    // the inner hop commits, then the outer payment comes up short
    let mut route = |amount0: I256, _: I256, data: &Bytes, payment: &mut Payment| {
        input_pool.swap(
            WALLET,
            SwapParams::unbounded(true, -amount0),
            data,
            TIME,
            &mut ExactPayer,
        )?;
        payment.pay0(amount0.unsigned_abs() - U256::from(1));
        Ok::<(), CallbackError>(())
    };
    let result = output_pool.swap(
        WALLET,
        SwapParams::unbounded(true, int(-100)),
        &Bytes::new(),
        TIME,
        &mut route,
    );
    assert!(result.is_err());
    assert_ne!(input_pool.state(), snapshot.state());

    *input_pool = snapshot.clone();
    assert_eq!(input_pool.state(), snapshot.state());
}

#[test]
fn fee_module_applies_to_every_pool() {
    let mut factory = two_pools();
    factory.set_swap_fee_module(Some(std::sync::Arc::new(
        |pool: &clmm_core::pool::PoolConfig| {
            if pool.token0 == TOKEN_A { 500_u32 } else { 3_000 }
        },
    )));
    assert_eq!(factory.get_pool(TOKEN_A, TOKEN_B, SPACING).unwrap().fee(), 500);
    assert_eq!(factory.get_pool(TOKEN_B, TOKEN_C, SPACING).unwrap().fee(), 3_000);
}
