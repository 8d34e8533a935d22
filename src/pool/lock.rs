use crate::error::PoolError;
use crate::pool::cl_pool::PoolState;
use std::ops::{Deref, DerefMut};

/// Exclusive access to a pool's state for the length of one operation.
///
/// Acquiring clears `slot0.unlocked`; dropping sets it again, whether the
/// operation returned normally or bailed out with `?`.
#[derive(Debug)]
pub struct PoolGuard<'a> {
    state: &'a mut PoolState,
}

impl<'a> PoolGuard<'a> {
    pub fn acquire(state: &'a mut PoolState) -> Result<Self, PoolError> {
        if !state.slot0.unlocked {
            return Err(if state.slot0.sqrt_price_x96.is_zero() {
                PoolError::NotInitialized
            } else {
                PoolError::Locked
            });
        }
        state.slot0.unlocked = false;
        Ok(Self { state })
    }
}

impl Deref for PoolGuard<'_> {
    type Target = PoolState;

    fn deref(&self) -> &PoolState {
        self.state
    }
}

impl DerefMut for PoolGuard<'_> {
    fn deref_mut(&mut self) -> &mut PoolState {
        self.state
    }
}

impl Drop for PoolGuard<'_> {
    fn drop(&mut self) {
        self.state.slot0.unlocked = true;
    }
}
