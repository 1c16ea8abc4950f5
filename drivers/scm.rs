//! Secure monitor register access
//!
//! Some TLMM registers (the interrupt target-processor fields) are owned by
//! the secure world. Writes to them are forwarded to the secure monitor with
//! an SCM IO call carrying the register's physical address.

use crate::{Error, Result};

/// SCM service id for register I/O
const SCM_SVC_IO: u32 = 0x5;

/// Build an SCM IO command id
const fn scm_io_cmd(cmd: u32, args: u32, rets: u32) -> u32 {
    (((SCM_SVC_IO << 10) | cmd) << 12) | (args << 8) | rets
}

/// Secure register read command
pub const SCM_IO_READ: u32 = scm_io_cmd(0x1, 0x2, 0x1);

/// Secure register write command
pub const SCM_IO_WRITE: u32 = scm_io_cmd(0x2, 0x2, 0x2);

/// Write primitive for trust-zone owned registers
///
/// Implementations must not block: the driver calls this from interrupt
/// context.
pub trait SecureMonitor {
    /// Write `value` to the register at physical address `phys`
    fn secure_write(&self, phys: u32, value: u32) -> Result<()>;
}

/// SMC based secure monitor
#[derive(Debug, Default, Clone, Copy)]
pub struct ScmIo;

impl ScmIo {
    /// Create a new SCM IO accessor
    pub const fn new() -> Self {
        Self
    }

    #[cfg(target_arch = "aarch64")]
    fn smc_write(phys: u32, value: u32) -> u64 {
        let mut context_id: u32 = 0;
        let mut x0: u64 = SCM_IO_WRITE as u64;
        crate::utils::wmb();
        unsafe {
            core::arch::asm!(
                "smc #0",
                inout("x0") x0,
                in("x1") &mut context_id as *mut u32 as u64,
                in("x2") phys as u64,
                in("x3") value as u64,
                options(nostack)
            );
        }
        x0
    }

    #[cfg(not(target_arch = "aarch64"))]
    fn smc_write(phys: u32, value: u32) -> u64 {
        log::error!("scm: no secure monitor on this target ({:#010x} <- {:#x})", phys, value);
        u64::MAX
    }
}

impl SecureMonitor for ScmIo {
    fn secure_write(&self, phys: u32, value: u32) -> Result<()> {
        match Self::smc_write(phys, value) {
            0 => Ok(()),
            ret => {
                log::error!("scm: io write of {:#010x} failed: {:#x}", phys, ret);
                Err(Error::SecureWriteFailed)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scm_io_command_ids() {
        assert_eq!(SCM_IO_READ, 0x0140_1201);
        assert_eq!(SCM_IO_WRITE, 0x0140_2202);
    }

    #[cfg(not(target_arch = "aarch64"))]
    #[test]
    fn test_scm_unavailable_off_target() {
        assert_eq!(ScmIo::new().secure_write(0x0080_0400, 7), Err(Error::SecureWriteFailed));
    }
}
