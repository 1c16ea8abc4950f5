//! Software both-edge triggering
//!
//! The pads only detect one edge at a time. A both-edge line is re-armed for
//! the edge opposite to its current level after every acknowledged interrupt.
//! If the level moves while the polarity is being written, the new polarity
//! may be wrong and an edge may be lost, so the arm is retried until either
//! the level held still or the hardware latched an edge anyway.

use crate::kernel::irq::IrqType;
use crate::{Error, Result};

use super::regs::{IntrCfg, TlmmBus, TlmmRegs};

/// Upper bound on re-arm attempts
pub(super) const REARM_LIMIT: usize = 100;

/// Arm `line` for the edge away from its current level
///
/// Called with the controller lock held. Returns the edge that was armed so
/// the caller can mirror it into the wake router once the lock is dropped.
pub(super) fn update_dual_edge_pos<B: TlmmBus>(regs: &TlmmRegs<B>, line: usize) -> Result<IrqType> {
    let mut before = false;
    let mut after = false;

    for _ in 0..REARM_LIMIT {
        before = regs.input(line);
        if before {
            regs.clear_intr_cfg(line, IntrCfg::POL_CTL_HI);
        } else {
            regs.set_intr_cfg(line, IntrCfg::POL_CTL_HI);
        }

        after = regs.input(line);
        if regs.intr_pending(line) || before == after {
            return Ok(if before {
                IrqType::EDGE_FALLING
            } else {
                IrqType::EDGE_RISING
            });
        }
    }

    log::warn!(
        "gpio {}: dual-edge irq failed to stabilize, interrupts dropped ({} != {})",
        line,
        before as u8,
        after as u8
    );
    Err(Error::InterruptsDropped)
}
