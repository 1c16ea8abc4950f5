//! Utility functions and data structures
//!
//! Bit-set storage and the memory barriers the register layer needs.

pub mod bitmap;

// Re-export commonly used utilities
pub use self::bitmap::Bitmap;

/// Data synchronization barrier
///
/// Every TLMM access that changes interrupt or direction state is followed by
/// one of these so the pad sees the write before the caller returns.
#[inline]
pub fn dsb() {
    cfg_if::cfg_if! {
        if #[cfg(target_arch = "aarch64")] {
            aarch64_cpu::asm::barrier::dsb(aarch64_cpu::asm::barrier::SY);
        } else {
            core::sync::atomic::fence(core::sync::atomic::Ordering::SeqCst);
        }
    }
}

/// Write memory barrier, issued before handing a value to the secure world
#[inline]
pub fn wmb() {
    cfg_if::cfg_if! {
        if #[cfg(target_arch = "aarch64")] {
            aarch64_cpu::asm::barrier::dmb(aarch64_cpu::asm::barrier::SY);
        } else {
            core::sync::atomic::fence(core::sync::atomic::Ordering::Release);
        }
    }
}
