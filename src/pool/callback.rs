//! Payer hooks invoked in the middle of mint, swap and flash.
//!
//! The pool computes what it is owed, hands the callback a [`Payment`] that
//! records transfers into the pool, and checks the recorded amounts after the
//! callback returns. Any closure with the matching signature implements the
//! traits; [`ExactPayer`] pays exactly what is asked.

use crate::error::CallbackError;
use alloy_primitives::{Bytes, I256, U256};

/// Tokens transferred to the pool during a callback.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Payment {
    owed0: U256,
    owed1: U256,
    paid0: U256,
    paid1: U256,
}

impl Payment {
    pub fn new(owed0: U256, owed1: U256) -> Self {
        Self {
            owed0,
            owed1,
            ..Default::default()
        }
    }

    pub fn pay0(&mut self, amount: U256) {
        self.paid0 = self.paid0.saturating_add(amount);
    }

    pub fn pay1(&mut self, amount: U256) {
        self.paid1 = self.paid1.saturating_add(amount);
    }

    /// Pays whatever is still owed on both sides.
    pub fn settle(&mut self) {
        self.paid0 = self.paid0.max(self.owed0);
        self.paid1 = self.paid1.max(self.owed1);
    }

    pub fn owed0(&self) -> U256 {
        self.owed0
    }

    pub fn owed1(&self) -> U256 {
        self.owed1
    }

    pub fn paid0(&self) -> U256 {
        self.paid0
    }

    pub fn paid1(&self) -> U256 {
        self.paid1
    }
}

pub trait MintCallback {
    fn mint_callback(
        &mut self,
        amount0_owed: U256,
        amount1_owed: U256,
        data: &Bytes,
        payment: &mut Payment,
    ) -> Result<(), CallbackError>;
}

pub trait SwapCallback {
    /// Deltas are from the pool's side: positive is owed to the pool.
    fn swap_callback(
        &mut self,
        amount0_delta: I256,
        amount1_delta: I256,
        data: &Bytes,
        payment: &mut Payment,
    ) -> Result<(), CallbackError>;
}

pub trait FlashCallback {
    /// `payment` already carries the borrowed amounts plus fees as owed.
    fn flash_callback(
        &mut self,
        fee0: U256,
        fee1: U256,
        data: &Bytes,
        payment: &mut Payment,
    ) -> Result<(), CallbackError>;
}

impl<F> MintCallback for F
where
    F: FnMut(U256, U256, &Bytes, &mut Payment) -> Result<(), CallbackError>,
{
    fn mint_callback(
        &mut self,
        amount0_owed: U256,
        amount1_owed: U256,
        data: &Bytes,
        payment: &mut Payment,
    ) -> Result<(), CallbackError> {
        self(amount0_owed, amount1_owed, data, payment)
    }
}

impl<F> SwapCallback for F
where
    F: FnMut(I256, I256, &Bytes, &mut Payment) -> Result<(), CallbackError>,
{
    fn swap_callback(
        &mut self,
        amount0_delta: I256,
        amount1_delta: I256,
        data: &Bytes,
        payment: &mut Payment,
    ) -> Result<(), CallbackError> {
        self(amount0_delta, amount1_delta, data, payment)
    }
}

/// Pays every callback in full and nothing more.
#[derive(Copy, Clone, Debug, Default)]
pub struct ExactPayer;

impl MintCallback for ExactPayer {
    fn mint_callback(
        &mut self,
        _: U256,
        _: U256,
        _: &Bytes,
        payment: &mut Payment,
    ) -> Result<(), CallbackError> {
        payment.settle();
        Ok(())
    }
}

impl SwapCallback for ExactPayer {
    fn swap_callback(
        &mut self,
        _: I256,
        _: I256,
        _: &Bytes,
        payment: &mut Payment,
    ) -> Result<(), CallbackError> {
        payment.settle();
        Ok(())
    }
}

impl FlashCallback for ExactPayer {
    fn flash_callback(
        &mut self,
        _: U256,
        _: U256,
        _: &Bytes,
        payment: &mut Payment,
    ) -> Result<(), CallbackError> {
        payment.settle();
        Ok(())
    }
}
