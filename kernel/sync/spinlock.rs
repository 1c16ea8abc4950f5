//! Interrupt-safe spinlock
//!
//! Acquiring the lock masks IRQs on the local CPU and the guard restores the
//! previous mask on drop, so the same lock can be shared between thread
//! context and the summary interrupt handler. Critical sections must be short
//! and must not block.

use core::cell::UnsafeCell;
use core::ops::{Deref, DerefMut};
use core::sync::atomic::{AtomicBool, Ordering};

/// Saved local interrupt mask
#[derive(Debug, Clone, Copy)]
struct IrqFlags(u64);

/// Mask local IRQs and return the previous state
#[inline]
fn local_irq_save() -> IrqFlags {
    // Host unit tests run at EL0, where DAIF cannot be written
    cfg_if::cfg_if! {
        if #[cfg(all(target_arch = "aarch64", not(test)))] {
            let daif: u64;
            unsafe {
                core::arch::asm!("mrs {}, daif", out(reg) daif, options(nomem, nostack, preserves_flags));
                core::arch::asm!("msr daifset, #2", options(nostack, preserves_flags));
            }
            IrqFlags(daif)
        } else {
            IrqFlags(0)
        }
    }
}

/// Restore a mask saved by [`local_irq_save`]
#[inline]
fn local_irq_restore(flags: IrqFlags) {
    cfg_if::cfg_if! {
        if #[cfg(all(target_arch = "aarch64", not(test)))] {
            unsafe {
                core::arch::asm!("msr daif, {}", in(reg) flags.0, options(nostack, preserves_flags));
            }
        } else {
            let _ = flags;
        }
    }
}

/// A spinlock that disables local interrupts while held
pub struct IrqSpinLock<T> {
    /// Atomic flag indicating if the lock is held
    locked: AtomicBool,
    /// The data protected by the lock
    data: UnsafeCell<T>,
}

unsafe impl<T: Send> Send for IrqSpinLock<T> {}
unsafe impl<T: Send> Sync for IrqSpinLock<T> {}

impl<T> IrqSpinLock<T> {
    /// Create a new spinlock
    pub const fn new(data: T) -> Self {
        Self {
            locked: AtomicBool::new(false),
            data: UnsafeCell::new(data),
        }
    }

    /// Try to acquire the lock without spinning
    pub fn try_lock(&self) -> Option<IrqSpinLockGuard<'_, T>> {
        let flags = local_irq_save();
        if self
            .locked
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .is_ok()
        {
            Some(IrqSpinLockGuard { lock: self, flags })
        } else {
            local_irq_restore(flags);
            None
        }
    }

    /// Acquire the lock, spinning until it's available
    pub fn lock(&self) -> IrqSpinLockGuard<'_, T> {
        loop {
            if let Some(guard) = self.try_lock() {
                return guard;
            }
            // Spin with interrupts restored so a pending IRQ can drain
            while self.locked.load(Ordering::Relaxed) {
                core::hint::spin_loop();
            }
        }
    }

    /// Check if the lock is currently held
    pub fn is_locked(&self) -> bool {
        self.locked.load(Ordering::Acquire)
    }

    /// Consume the lock and return the data
    pub fn into_inner(self) -> T {
        self.data.into_inner()
    }
}

/// A guard that provides access to the data protected by an IrqSpinLock
pub struct IrqSpinLockGuard<'a, T> {
    lock: &'a IrqSpinLock<T>,
    flags: IrqFlags,
}

impl<'a, T> Deref for IrqSpinLockGuard<'a, T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        unsafe { &*self.lock.data.get() }
    }
}

impl<'a, T> DerefMut for IrqSpinLockGuard<'a, T> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        unsafe { &mut *self.lock.data.get() }
    }
}

impl<'a, T> Drop for IrqSpinLockGuard<'a, T> {
    fn drop(&mut self) {
        self.lock.locked.store(false, Ordering::Release);
        local_irq_restore(self.flags);
    }
}
