//! GPIO framework interfaces

use crate::kernel::irq::IrqNumber;
use crate::Result;

/// Line offset within a chip
pub type LineOffset = u32;

/// Line operations a GPIO chip exposes to consumers
pub trait GpioChip {
    /// Chip label
    fn label(&self) -> &'static str;

    /// Number of lines
    fn ngpio(&self) -> u32;

    /// Claim the line's pad for GPIO use
    fn request(&self, offset: LineOffset) -> Result<()>;

    /// Release a line claimed with [`GpioChip::request`]
    fn free(&self, offset: LineOffset);

    /// Read the input level
    fn get(&self, offset: LineOffset) -> Result<bool>;

    /// Drive the output latch
    fn set(&self, offset: LineOffset, value: bool);

    /// Make the line an input
    fn direction_input(&self, offset: LineOffset) -> Result<()>;

    /// Make the line an output driving `value`
    fn direction_output(&self, offset: LineOffset, value: bool) -> Result<()>;

    /// Virtual interrupt number for the line
    fn to_irq(&self, offset: LineOffset) -> Result<IrqNumber>;
}

/// Registration with the host GPIO framework
pub trait GpioHost {
    /// Publish `ngpio` lines starting at global number `base`
    fn add_chip(&self, label: &'static str, base: u32, ngpio: u32) -> Result<()>;

    /// Withdraw a chip published with [`GpioHost::add_chip`]
    fn remove_chip(&self, base: u32) -> Result<()>;
}
