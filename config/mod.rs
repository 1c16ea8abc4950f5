//! Configuration management
//!
//! Static description of one TLMM instance: where it is mapped, how many
//! lines it has, which interrupt numbers it owns and which address windows
//! are owned by the secure world.

use crate::kernel::irq::IrqNumber;
use crate::{Error, Result};

/// Hard capacity of the per-line bitmaps
///
/// The per-line register bank ends at 0x2000, where the SDC pad registers
/// begin.
pub const MAX_LINES: usize = 256;

/// Highest register offset touched by the driver, plus its width
const REGISTER_SPAN: usize = 0x20a8;

/// A register window whose writes must go through the secure monitor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SecureWindow {
    /// Window name, for logs
    pub name: &'static str,
    /// Virtual start address
    pub virt: usize,
    /// Physical start address handed to the secure monitor
    pub phys: u32,
    /// Window size in bytes
    pub size: usize,
}

impl SecureWindow {
    /// Check if `addr` falls inside this window
    pub fn contains(&self, addr: usize) -> bool {
        addr >= self.virt && addr - self.virt < self.size
    }

    /// Translate a virtual address inside the window to its physical address
    pub fn translate(&self, addr: usize) -> Option<u32> {
        if self.contains(addr) {
            Some(self.phys + (addr - self.virt) as u32)
        } else {
            None
        }
    }
}

/// Protected windows of the MSM8x60 static I/O map
pub const MSM8X60_SECURE_WINDOWS: &[SecureWindow] = &[SecureWindow {
    name: "tlmm",
    virt: 0xFA00_4000,
    phys: 0x0080_0000,
    size: 0x4000,
}];

/// TLMM controller configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TlmmConfig {
    /// Chip label
    pub label: &'static str,
    /// Virtual address the register block is mapped at
    pub virt_base: usize,
    /// Size of the mapping in bytes
    pub size: usize,
    /// Number of GPIO lines
    pub ngpio: u32,
    /// Global GPIO number of line 0
    pub gpio_base: u32,
    /// Virtual interrupt number of line 0
    pub irq_base: IrqNumber,
    /// The shared summary interrupt
    pub summary_irq: IrqNumber,
    /// Number of direct-connect interrupt slots
    pub nr_dir_conn_irqs: u32,
    /// Windows whose writes go through the secure monitor
    pub secure_windows: &'static [SecureWindow],
}

impl TlmmConfig {
    /// MSM8x60 TLMM
    pub const MSM8X60: TlmmConfig = TlmmConfig {
        label: "msmgpio",
        virt_base: 0xFA00_4000,
        size: 0x4000,
        ngpio: 173,
        gpio_base: 0,
        irq_base: 256,
        summary_irq: 32 + 16,
        nr_dir_conn_irqs: 8,
        secure_windows: MSM8X60_SECURE_WINDOWS,
    };

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.ngpio == 0 || self.ngpio as usize > MAX_LINES {
            log::error!("{}: unsupported line count {}", self.label, self.ngpio);
            return Err(Error::InvalidConfig);
        }

        if self.size < REGISTER_SPAN {
            log::error!("{}: mapping of {:#x} bytes is too small", self.label, self.size);
            return Err(Error::InvalidConfig);
        }

        let irq_end = self.irq_base.checked_add(self.ngpio).ok_or(Error::InvalidConfig)?;
        if (self.irq_base..irq_end).contains(&self.summary_irq) {
            log::error!(
                "{}: summary irq {} inside line irq range {}..{}",
                self.label,
                self.summary_irq,
                self.irq_base,
                irq_end
            );
            return Err(Error::InvalidConfig);
        }

        Ok(())
    }

    /// Find the secure window covering a virtual address
    pub fn secure_window(&self, addr: usize) -> Option<&'static SecureWindow> {
        self.secure_windows.iter().find(|w| w.contains(addr))
    }
}

impl Default for TlmmConfig {
    fn default() -> Self {
        Self::MSM8X60
    }
}
