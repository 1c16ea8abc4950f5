//! Synchronization primitives
//!
//! The TLMM block is guarded by one lock that is also taken from the summary
//! interrupt, so the only primitive here is an interrupt-masking spinlock.

pub mod spinlock;

// Re-export for convenience
pub use spinlock::{IrqSpinLock, IrqSpinLockGuard};
