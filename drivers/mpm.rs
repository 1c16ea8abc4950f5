//! Wake-capable interrupt router interface
//!
//! On MSM parts a second interrupt path (the MPM) stays powered in deep
//! sleep. Every trigger, enable and wake change made on a GPIO interrupt is
//! mirrored into it so the line can still wake the system.

use crate::kernel::irq::{IrqNumber, IrqType};
use crate::Result;

/// Deep-sleep interrupt routing
pub trait WakeRouter {
    /// Mirror an unmask/mask of `irq`
    fn enable_irq(&self, irq: IrqNumber, on: bool);

    /// Mirror the trigger configuration of `irq`
    fn set_irq_type(&self, irq: IrqNumber, flow: IrqType) -> Result<()>;

    /// Mirror the wake setting of `irq`
    fn set_irq_wake(&self, irq: IrqNumber, on: bool) -> Result<()>;
}
