//! Interrupt framework interfaces
//!
//! This module defines the contract between a second-level interrupt
//! controller and the host interrupt subsystem: the chip callbacks the host
//! invokes per virtual interrupt, and the host services a chip driver calls
//! back into.

use bitflags::bitflags;

use crate::Result;

/// Interrupt number type
pub type IrqNumber = u32;

bitflags! {
    /// Trigger flow type requested for an interrupt line
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct IrqType: u32 {
        /// Rising edge
        const EDGE_RISING = 0x0000_0001;
        /// Falling edge
        const EDGE_FALLING = 0x0000_0002;
        /// Both edges
        const EDGE_BOTH = Self::EDGE_RISING.bits() | Self::EDGE_FALLING.bits();
        /// High level
        const LEVEL_HIGH = 0x0000_0004;
        /// Low level
        const LEVEL_LOW = 0x0000_0008;
    }
}

impl IrqType {
    /// True if any edge bit is requested
    pub fn is_edge(self) -> bool {
        self.intersects(IrqType::EDGE_BOTH)
    }

    /// True only if both edges are requested
    pub fn is_dual_edge(self) -> bool {
        self.contains(IrqType::EDGE_BOTH)
    }

    /// True if the active polarity is high (rising or high level)
    pub fn is_active_high(self) -> bool {
        self.intersects(IrqType::EDGE_RISING | IrqType::LEVEL_HIGH)
    }
}

/// Flow handler the host runs for a virtual interrupt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowHandler {
    /// Mask and ack before the action runs, unmask after
    Level,
    /// Ack before the action runs, edges arriving meanwhile are replayed
    Edge,
}

/// Callbacks a chip registers for each of its virtual interrupts
///
/// The host serializes calls per interrupt number.
pub trait IrqChip {
    /// Chip name as shown by the host
    fn name(&self) -> &'static str;

    /// Stop delivering `irq`
    fn mask(&self, irq: IrqNumber);

    /// Resume delivering `irq`
    fn unmask(&self, irq: IrqNumber);

    /// Clear the latched status of `irq` once its handler has run
    fn ack(&self, irq: IrqNumber);

    /// Configure trigger mode and polarity
    fn set_type(&self, irq: IrqNumber, flow: IrqType) -> Result<()>;

    /// Mark `irq` as able to wake the system from suspend
    fn set_wake(&self, irq: IrqNumber, on: bool) -> Result<()>;

    /// Enable callback; defaults to unmask
    fn enable(&self, irq: IrqNumber) {
        self.unmask(irq)
    }

    /// Disable callback; defaults to mask
    fn disable(&self, irq: IrqNumber) {
        self.mask(irq)
    }
}

/// Services the host interrupt subsystem offers a chained chip driver
pub trait IrqHost {
    /// Select the flow handler the host runs for `irq`
    fn set_flow_handler(&self, irq: IrqNumber, flow: FlowHandler);

    /// Hook `parent` so the host calls the chip's summary handler for it
    fn set_chained_handler(&self, parent: IrqNumber) -> Result<()>;

    /// Undo [`IrqHost::set_chained_handler`]
    fn clear_chained_handler(&self, parent: IrqNumber);

    /// Mark a parent line as a wakeup source
    fn set_irq_wake(&self, irq: IrqNumber, on: bool) -> Result<()>;

    /// Run the host dispatch for a demultiplexed virtual interrupt
    ///
    /// The host may call straight back into the chip's callbacks.
    fn handle_nested(&self, irq: IrqNumber);

    /// Acknowledge the parent line after a summary scan
    fn ack_parent(&self, parent: IrqNumber);
}
