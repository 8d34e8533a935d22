use alloy_primitives::U256;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MathError {
    #[error("Math error - overflow")]
    Overflow,
    #[error("Math error - underflow")]
    Underflow,
    #[error("Math error - out of bounds")]
    OutOfBounds,
    #[error("Math error - division by zero")]
    DivisionByZero,
    #[error("BitMath error - zero input value")]
    ZeroValue,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StateError {
    #[error("State error - sqrtPrice out of bounds")]
    SqrtPriceOutOfBounds,
    #[error("State error - sqrtPrice is 0")]
    SqrtPriceIsZero,
    #[error("State error - sqrtRatio is 0")]
    SqrtRatioIsZero,

    #[error("State error - tick out of bounds")]
    TickOutOfBounds,

    #[error("State error - liquidity is 0")]
    LiquidityIsZero,

    #[error("State error - requested amount exceeds pool reserves")]
    InsufficientReserves,
}

/// Lifecycle and reentrancy violations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PoolError {
    #[error("Pool error - pool is locked (reentrant call)")]
    Locked,
    #[error("Pool error - already initialized")]
    AlreadyInitialized,
    #[error("Pool error - not initialized")]
    NotInitialized,
    #[error("Pool error - invalid protocol fee ({fee0}, {fee1})")]
    InvalidFeeProtocol { fee0: u8, fee1: u8 },
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TickError {
    #[error("Tick error - lower tick {lower} is not below upper tick {upper}")]
    InvalidRange { lower: i32, upper: i32 },
    #[error("Tick error - lower tick {0} below MIN_TICK")]
    LowerOutOfBounds(i32),
    #[error("Tick error - upper tick {0} above MAX_TICK")]
    UpperOutOfBounds(i32),
    #[error("Tick error - tick {tick} is not a multiple of spacing {spacing}")]
    NotSpaced { tick: i32, spacing: i32 },
    #[error("Tick error - tick spacing {0} is not supported")]
    UnsupportedSpacing(i32),
    #[error("Tick error - tick {0} is not initialized")]
    NotInitialized(i32),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LiquidityError {
    #[error("Liquidity error - gross liquidity at tick {tick} would exceed the per-tick maximum")]
    TickLiquidityOverflow { tick: i32 },
    #[error("Liquidity error - insufficient liquidity")]
    InsufficientLiquidity,
    #[error("Liquidity error - amount is 0")]
    ZeroAmount,
    #[error("Liquidity error - cannot poke a position with no liquidity")]
    EmptyPosition,
    #[error("Liquidity error - no in-range liquidity")]
    NoLiquidity,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum OracleError {
    #[error("Oracle error - target {target} is older than the oldest observation")]
    TooOld { target: u32 },
    #[error("Oracle error - not initialized")]
    Uninitialized,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SwapError {
    #[error("Swap error - amount specified is 0")]
    AmountSpecifiedIsZero,
    #[error("Swap error - sqrtPriceLimit out of bounds")]
    SqrtPriceLimitOutOfBounds,
}

/// Raised by payer callbacks. Pool failures from nested calls travel boxed.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CallbackError {
    #[error("callback rejected: {0}")]
    Rejected(String),
    #[error("nested pool call failed: {0}")]
    Nested(Box<Error>),
}

impl From<Error> for CallbackError {
    fn from(err: Error) -> Self {
        CallbackError::Nested(Box::new(err))
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SettlementError {
    #[error("Settlement error - token0 owed {owed}, paid {paid}")]
    Amount0NotPaid { owed: U256, paid: U256 },
    #[error("Settlement error - token1 owed {owed}, paid {paid}")]
    Amount1NotPaid { owed: U256, paid: U256 },
    #[error("Settlement error - pool holds {available}, transfer needs {requested}")]
    InsufficientBalance { requested: U256, available: U256 },
    #[error(transparent)]
    Callback(#[from] CallbackError),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FactoryError {
    #[error("Factory error - identical tokens")]
    IdenticalTokens,
    #[error("Factory error - zero address")]
    ZeroAddress,
    #[error("Factory error - pool already exists")]
    PoolExists,
    #[error("Factory error - invalid tick spacing {0}")]
    InvalidTickSpacing(i32),
    #[error("Factory error - invalid fee {0}")]
    InvalidFee(u32),
    #[error("Factory error - tick spacing {0} already enabled")]
    TickSpacingEnabled(i32),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    #[error(transparent)]
    MathError(#[from] crate::error::MathError),

    #[error(transparent)]
    StateError(#[from] crate::error::StateError),

    #[error(transparent)]
    PoolError(#[from] PoolError),

    #[error(transparent)]
    TickError(#[from] TickError),

    #[error(transparent)]
    LiquidityError(#[from] LiquidityError),

    #[error(transparent)]
    OracleError(#[from] OracleError),

    #[error(transparent)]
    SwapError(#[from] SwapError),

    #[error(transparent)]
    SettlementError(#[from] SettlementError),

    #[error(transparent)]
    FactoryError(#[from] FactoryError),
}

impl From<CallbackError> for Error {
    fn from(err: CallbackError) -> Self {
        Error::SettlementError(SettlementError::Callback(err))
    }
}
