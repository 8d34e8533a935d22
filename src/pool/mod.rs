pub mod callback;
pub mod cl_pool;
pub mod event;
pub mod lock;
pub mod oracle;
pub mod position;
pub mod swap;
pub mod tick;

pub use callback::{ExactPayer, FlashCallback, MintCallback, Payment, SwapCallback};
pub use cl_pool::{PoolConfig, PoolState, Slot0};
pub use event::PoolEvent;
pub use swap::{SwapParams, SwapResult};
