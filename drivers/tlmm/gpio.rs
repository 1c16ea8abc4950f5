//! GPIO line operations

use crate::kernel::gpio::{GpioChip, LineOffset};
use crate::kernel::irq::IrqNumber;
use crate::utils::dsb;
use crate::Result;

use super::regs::TlmmBus;
use super::TlmmGpio;

impl<'a, B: TlmmBus> GpioChip for TlmmGpio<'a, B> {
    fn label(&self) -> &'static str {
        self.config.label
    }

    fn ngpio(&self) -> u32 {
        self.config.ngpio
    }

    fn request(&self, offset: LineOffset) -> Result<()> {
        self.line(offset)?;
        self.platform.pinmux.reserve(self.config.gpio_base + offset)
    }

    fn free(&self, offset: LineOffset) {
        if self.line(offset).is_ok() {
            self.platform.pinmux.release(self.config.gpio_base + offset);
        }
    }

    fn get(&self, offset: LineOffset) -> Result<bool> {
        let line = self.line(offset)?;
        let state = self.state.lock();
        let level = state.regs.input(line);
        dsb();
        Ok(level)
    }

    fn set(&self, offset: LineOffset, value: bool) {
        let Ok(line) = self.line(offset) else {
            log::warn!("{}: set on invalid line {}", self.config.label, offset);
            return;
        };
        let state = self.state.lock();
        state.regs.set_output(line, value);
        dsb();
    }

    fn direction_input(&self, offset: LineOffset) -> Result<()> {
        let line = self.line(offset)?;
        let state = self.state.lock();
        state.regs.set_output_enable(line, false);
        dsb();
        Ok(())
    }

    fn direction_output(&self, offset: LineOffset, value: bool) -> Result<()> {
        let line = self.line(offset)?;
        let state = self.state.lock();
        state.regs.set_output(line, value);
        state.regs.set_output_enable(line, true);
        dsb();
        Ok(())
    }

    fn to_irq(&self, offset: LineOffset) -> Result<IrqNumber> {
        let line = self.line(offset)?;
        Ok(self.line_to_irq(line))
    }
}

#[cfg(feature = "embedded-hal")]
pub use self::hal::Line;

#[cfg(feature = "embedded-hal")]
mod hal {
    use embedded_hal::digital::{ErrorType, InputPin, OutputPin, StatefulOutputPin};

    use super::*;

    /// A single line, usable wherever `embedded-hal` pins are expected
    pub struct Line<'c, 'a, B: TlmmBus> {
        chip: &'c TlmmGpio<'a, B>,
        offset: LineOffset,
    }

    impl<'a, B: TlmmBus> TlmmGpio<'a, B> {
        /// Claim a line and hand it out as a pin
        pub fn claim(&self, offset: LineOffset) -> Result<Line<'_, 'a, B>> {
            self.request(offset)?;
            Ok(Line { chip: self, offset })
        }
    }

    impl<'c, 'a, B: TlmmBus> Drop for Line<'c, 'a, B> {
        fn drop(&mut self) {
            self.chip.free(self.offset);
        }
    }

    impl<'c, 'a, B: TlmmBus> ErrorType for Line<'c, 'a, B> {
        type Error = crate::Error;
    }

    impl<'c, 'a, B: TlmmBus> InputPin for Line<'c, 'a, B> {
        fn is_high(&mut self) -> Result<bool> {
            self.chip.get(self.offset)
        }

        fn is_low(&mut self) -> Result<bool> {
            self.chip.get(self.offset).map(|level| !level)
        }
    }

    impl<'c, 'a, B: TlmmBus> OutputPin for Line<'c, 'a, B> {
        fn set_low(&mut self) -> Result<()> {
            self.chip.direction_output(self.offset, false)
        }

        fn set_high(&mut self) -> Result<()> {
            self.chip.direction_output(self.offset, true)
        }
    }

    impl<'c, 'a, B: TlmmBus> StatefulOutputPin for Line<'c, 'a, B> {
        fn is_set_high(&mut self) -> Result<bool> {
            let state = self.chip.state.lock();
            Ok(state.regs.output(self.offset as usize))
        }

        fn is_set_low(&mut self) -> Result<bool> {
            self.is_set_high().map(|level| !level)
        }
    }
}
