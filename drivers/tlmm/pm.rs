//! Power management hooks
//!
//! All hooks run in the no-IRQ phase. Suspend disarms every enabled line
//! that is not a wake source; resume re-arms every line still in
//! `enabled_irqs`. The pair must be called strictly in order.

use heapless::Vec;

use crate::config::MAX_LINES;
use crate::kernel::irq::IrqNumber;
use crate::utils::dsb;
use crate::Result;

use super::regs::{IntrCfg, TlmmBus};
use super::TlmmGpio;

impl<'a, B: TlmmBus> TlmmGpio<'a, B> {
    /// Disarm enabled lines that may not wake the system
    pub fn suspend(&self) -> Result<()> {
        let state = self.state.lock();
        for line in state.enabled_irqs.iter() {
            if !state.wake_irqs.test(line) {
                state.regs.clear_intr_cfg(line, IntrCfg::LIVE);
            }
        }
        dsb();
        Ok(())
    }

    /// Re-arm every enabled line
    pub fn resume(&self) -> Result<()> {
        let state = self.state.lock();
        for line in state.enabled_irqs.iter() {
            state.regs.set_intr_cfg(line, IntrCfg::LIVE);
        }
        dsb();
        Ok(())
    }

    /// Hibernation image freeze, same as [`Self::suspend`]
    pub fn freeze(&self) -> Result<()> {
        self.suspend()
    }

    /// Hibernation thaw, same as [`Self::resume`]
    pub fn thaw(&self) -> Result<()> {
        self.resume()
    }

    /// Power-off after the image is saved, same as [`Self::suspend`]
    pub fn poweroff(&self) -> Result<()> {
        self.suspend()
    }

    /// Restore from a hibernation image, same as [`Self::resume`]
    pub fn restore(&self) -> Result<()> {
        self.resume()
    }

    /// Report the wake lines that have a latched interrupt
    ///
    /// Meant to be called right after resume to find out what woke the
    /// system.
    pub fn show_resume_irq(&self) -> Vec<IrqNumber, MAX_LINES> {
        let mut triggered = Vec::new();
        let state = self.state.lock();
        for line in state.wake_irqs.iter() {
            if state.regs.intr_pending(line) {
                let irq = self.line_to_irq(line);
                log::warn!("{}: irq {} triggered", self.config.label, irq);
                // Capacity equals the largest possible line count
                let _ = triggered.push(irq);
            }
        }
        triggered
    }
}
