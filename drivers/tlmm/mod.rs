//! MSM TLMM v2 GPIO and interrupt controller
//!
//! One controller instance owns the register block, the three per-line
//! interrupt bitsets and the lock that serializes them. It is created by
//! [`TlmmGpio::attach`], which registers the lines with the host GPIO and
//! interrupt frameworks and hooks the summary interrupt, and torn down by
//! [`TlmmGpio::detach`].
//!
//! The host reaches the controller through the [`GpioChip`] and [`IrqChip`]
//! implementations and calls [`TlmmGpio::handle_summary_irq`] whenever the
//! shared summary line fires.
//!
//! [`GpioChip`]: crate::kernel::gpio::GpioChip
//! [`IrqChip`]: crate::kernel::irq::IrqChip

pub mod debug;
mod dual_edge;
pub mod gpio;
pub mod irq;
pub mod pm;
pub mod regs;

#[cfg(test)]
pub(crate) mod testing;

use crate::config::{TlmmConfig, MAX_LINES};
use crate::drivers::{PinMux, SecureMonitor, WakeRouter};
use crate::kernel::gpio::GpioHost;
use crate::kernel::irq::{FlowHandler, IrqHost, IrqNumber};
use crate::kernel::sync::IrqSpinLock;
use crate::utils::bitmap::{words_for, Bitmap};
use crate::utils::dsb;
use crate::{Error, Result};

use self::regs::{
    dir_conn_intr_cfg_su, gpio_intr_cfg_su, DirConnCopy, FieldCfg, HdriveTarget, IntrCfg,
    PullTarget, SuCopy, TargetProc, TlmmBus, TlmmRegs, DIR_CONN_INTR_CFG_SU, GPIO_INTR_CFG_SU,
    HDRV_WIDTH, PULL_WIDTH,
};

pub use self::regs::MmioBus;

/// One bit per line
pub type LineSet = Bitmap<{ words_for(MAX_LINES) }>;

/// Collaborators the controller calls out to
#[derive(Clone, Copy)]
pub struct Platform<'a> {
    /// Pad ownership arbitration
    pub pinmux: &'a (dyn PinMux + Sync),
    /// Writes to trust-zone owned registers
    pub scm: &'a (dyn SecureMonitor + Sync),
    /// Deep-sleep interrupt router
    pub mpm: &'a (dyn WakeRouter + Sync),
    /// Host interrupt framework
    pub irq_host: &'a (dyn IrqHost + Sync),
    /// Host GPIO framework
    pub gpio_host: &'a (dyn GpioHost + Sync),
}

/// Everything guarded by the controller lock
pub(crate) struct TlmmState<B> {
    pub(crate) regs: TlmmRegs<B>,
    /// Lines unmasked as summary-interrupt sources
    pub(crate) enabled_irqs: LineSet,
    /// Lines kept armed across suspend
    pub(crate) wake_irqs: LineSet,
    /// Lines emulating both-edge triggering
    pub(crate) dual_edge_irqs: LineSet,
}

impl<B: TlmmBus> TlmmState<B> {
    fn new(bus: B, ngpio: usize) -> Self {
        Self {
            regs: TlmmRegs::new(bus),
            enabled_irqs: LineSet::new(ngpio),
            wake_irqs: LineSet::new(ngpio),
            dual_edge_irqs: LineSet::new(ngpio),
        }
    }
}

/// Pad configuration word accepted by [`TlmmGpio::tlmm_config`]
///
/// Layout: pin in bits 4..14, function in 0..4, direction in bit 14, pull in
/// 15..17, drive strength in 17..21.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PadConfig {
    pub pin: u32,
    pub func: u32,
    /// Non-zero for output
    pub dir: u32,
    pub pull: u32,
    pub drvstr: u32,
}

impl PadConfig {
    /// Pack into the configuration word
    pub const fn to_word(self) -> u32 {
        ((self.pin & 0x3ff) << 4)
            | (self.func & 0xf)
            | ((self.dir & 0x1) << 14)
            | ((self.pull & 0x3) << 15)
            | ((self.drvstr & 0xf) << 17)
    }

    /// Unpack a configuration word
    pub const fn from_word(word: u32) -> Self {
        Self {
            pin: (word >> 4) & 0x3ff,
            func: word & 0xf,
            dir: (word >> 14) & 0x1,
            pull: (word >> 15) & 0x3,
            drvstr: (word >> 17) & 0xf,
        }
    }

    /// GPIO_CONFIG value for this pad
    pub const fn config_bits(self) -> u32 {
        ((self.dir << 9) & (0x1 << 9))
            | ((self.drvstr << 6) & (0x7 << 6))
            | ((self.func << 2) & (0xf << 2))
            | (self.pull & 0x3)
    }
}

/// The TLMM controller
pub struct TlmmGpio<'a, B: TlmmBus> {
    config: TlmmConfig,
    state: IrqSpinLock<TlmmState<B>>,
    platform: Platform<'a>,
}

impl<'a, B: TlmmBus> TlmmGpio<'a, B> {
    /// Bring up the controller
    ///
    /// Publishes the lines to the host GPIO framework, selects the level flow
    /// handler for every line interrupt and hooks the summary interrupt.
    pub fn attach(config: TlmmConfig, bus: B, platform: Platform<'a>) -> Result<Self> {
        config.validate()?;

        let gpio = Self {
            config,
            state: IrqSpinLock::new(TlmmState::new(bus, config.ngpio as usize)),
            platform,
        };

        platform
            .gpio_host
            .add_chip(config.label, config.gpio_base, config.ngpio)?;

        for line in 0..config.ngpio {
            platform
                .irq_host
                .set_flow_handler(config.irq_base + line, FlowHandler::Level);
        }

        if let Err(e) = platform.irq_host.set_chained_handler(config.summary_irq) {
            log::error!(
                "{}: cannot hook summary irq {}: {}",
                config.label,
                config.summary_irq,
                e
            );
            // Nothing else is registered yet, a failed removal leaves no more behind
            let _ = platform.gpio_host.remove_chip(config.gpio_base);
            return Err(e);
        }

        log::info!(
            "{}: {} lines, irqs {}..{} on summary irq {}",
            config.label,
            config.ngpio,
            config.irq_base,
            config.irq_base + config.ngpio,
            config.summary_irq
        );

        Ok(gpio)
    }

    /// Withdraw the controller from the host frameworks
    ///
    /// The summary interrupt stays hooked if the GPIO framework refuses to
    /// let go of the chip.
    pub fn detach(&self) -> Result<()> {
        self.platform.gpio_host.remove_chip(self.config.gpio_base)?;
        self.platform
            .irq_host
            .clear_chained_handler(self.config.summary_irq);
        log::info!("{}: detached", self.config.label);
        Ok(())
    }

    /// Controller configuration
    pub fn config(&self) -> &TlmmConfig {
        &self.config
    }

    /// Number of lines
    pub fn line_count(&self) -> usize {
        self.config.ngpio as usize
    }

    /// Validate a raw line index
    pub fn line(&self, index: u32) -> Result<usize> {
        if index < self.config.ngpio {
            Ok(index as usize)
        } else {
            Err(Error::InvalidLineIndex)
        }
    }

    /// Virtual interrupt number of a line already checked by [`Self::line`]
    pub(crate) fn line_to_irq(&self, line: usize) -> IrqNumber {
        self.config.irq_base + line as IrqNumber
    }

    /// Line index behind a virtual interrupt number
    pub fn irq_to_line(&self, irq: IrqNumber) -> Result<usize> {
        match irq.checked_sub(self.config.irq_base) {
            Some(line) if line < self.config.ngpio => Ok(line as usize),
            _ => Err(Error::InvalidIrq),
        }
    }

    /// Write a register that may be owned by the secure world
    ///
    /// Protected addresses go to the secure monitor and must be issued
    /// without the controller lock held. Everything else is a plain write.
    fn write_protected(&self, offset: usize, value: u32) -> Result<()> {
        let addr = self.config.virt_base + offset;
        match self
            .config
            .secure_window(addr)
            .and_then(|window| window.translate(addr))
        {
            Some(phys) => self.platform.scm.secure_write(phys, value),
            None => {
                let state = self.state.lock();
                state.regs.write(offset, value);
                dsb();
                Ok(())
            }
        }
    }

    /// Route a line's summary interrupt to `target`, logging failures
    fn set_owner(&self, line: usize, target: TargetProc) {
        let mut bits = SuCopy::new(0);
        bits.modify(GPIO_INTR_CFG_SU::TARGET_PROC.val(target as u32));
        if let Err(e) = self.write_protected(gpio_intr_cfg_su(line), bits.get()) {
            log::error!(
                "{}: gpio {} owner {:?}: {}",
                self.config.label,
                line,
                target,
                e
            );
        }
    }

    /// Route a line straight to a direct-connect interrupt
    ///
    /// The line stops feeding the summary interrupt. `polarity_high` selects
    /// an active-high input.
    pub fn install_direct_irq(&self, line: u32, slot: u32, polarity_high: bool) -> Result<()> {
        let line = self.line(line)?;
        if slot >= self.config.nr_dir_conn_irqs {
            return Err(Error::InvalidLineIndex);
        }

        {
            let mut state = self.state.lock();
            state.regs.set_output_enable(line, true);
            state.regs.clear_intr_cfg(line, IntrCfg::LIVE);
            // Off the summary path for good, resume must not re-arm it
            state.enabled_irqs.clear_bit(line);
            state.dual_edge_irqs.clear_bit(line);
            dsb();
        }

        let mut su = SuCopy::new(0);
        su.modify(
            GPIO_INTR_CFG_SU::DIR_CONN_EN::SET
                + GPIO_INTR_CFG_SU::TARGET_PROC.val(TargetProc::None as u32),
        );
        self.write_protected(gpio_intr_cfg_su(line), su.get())?;

        let mut dc = DirConnCopy::new(0);
        dc.modify(
            DIR_CONN_INTR_CFG_SU::TARGET_PROC.val(TargetProc::Scorpion as u32)
                + DIR_CONN_INTR_CFG_SU::GPIO_SEL.val(line as u32)
                + DIR_CONN_INTR_CFG_SU::POLARITY.val(polarity_high as u32),
        );
        self.write_protected(dir_conn_intr_cfg_su(slot as usize), dc.get())?;

        log::debug!(
            "{}: gpio {} routed to direct irq slot {}",
            self.config.label,
            line,
            slot
        );
        Ok(())
    }

    /// Program a pad from a packed configuration word
    pub fn tlmm_config(&self, word: u32) -> Result<()> {
        let pad = PadConfig::from_word(word);
        let line = self.line(pad.pin)?;

        let state = self.state.lock();
        state.regs.write_config(line, pad.config_bits());
        dsb();
        Ok(())
    }

    fn set_field(&self, field: FieldCfg, width: u32, value: u32) {
        let state = self.state.lock();
        state.regs.set_field(field, width, value);
    }

    /// Set the drive strength of an SDC pad group
    pub fn set_hdrive(&self, target: HdriveTarget, strength: u32) {
        self.set_field(target.field(), HDRV_WIDTH, strength);
    }

    /// Set the pull of an SDC pad group
    pub fn set_pull(&self, target: PullTarget, pull: u32) {
        self.set_field(target.field(), PULL_WIDTH, pull);
    }
}

#[cfg(test)]
mod tests {
    use super::regs::{gpio_config, gpio_intr_cfg, SDC3_HDRV_PULL_CTL, SDC4_HDRV_PULL_CTL};
    use super::testing::{self, FakeBus, MockPlatform, TEST_PHYS};
    use super::*;
    use crate::kernel::gpio::GpioChip;
    use crate::kernel::irq::{IrqChip, IrqType};

    #[test]
    fn test_attach_registers_lines() {
        let bus = FakeBus::new();
        let mock = MockPlatform::new(&bus);
        let gpio = testing::attach(&bus, &mock);

        assert_eq!(*mock.chips.lock().unwrap(), vec![(0, 256)]);
        assert_eq!(*mock.chained.lock().unwrap(), Some(48));
        let flow = mock.flow.lock().unwrap();
        assert_eq!(flow.len(), 256);
        assert!(flow.values().all(|&f| f == FlowHandler::Level));
        drop(flow);

        assert_eq!(gpio.line_count(), 256);
        gpio.detach().unwrap();
        assert!(mock.chips.lock().unwrap().is_empty());
        assert_eq!(*mock.chained.lock().unwrap(), None);
    }

    #[test]
    fn test_attach_rolls_back_when_summary_busy() {
        let bus = FakeBus::new();
        let mock = MockPlatform::new(&bus);
        *mock.chained.lock().unwrap() = Some(48);

        let res = TlmmGpio::attach(testing::test_config(), bus.clone(), mock.platform());
        assert!(matches!(res, Err(Error::ResourceBusy)));
        assert!(mock.chips.lock().unwrap().is_empty());
    }

    #[test]
    fn test_attach_rejects_bad_config() {
        let bus = FakeBus::new();
        let mock = MockPlatform::new(&bus);
        let mut cfg = testing::test_config();
        cfg.ngpio = 0;

        let res = TlmmGpio::attach(cfg, bus.clone(), mock.platform());
        assert!(matches!(res, Err(Error::InvalidConfig)));
        assert!(mock.chips.lock().unwrap().is_empty());
    }

    #[test]
    fn test_irq_line_bijection() {
        let bus = FakeBus::new();
        let mock = MockPlatform::new(&bus);
        let gpio = testing::attach(&bus, &mock);

        for line in 0..256u32 {
            let irq = gpio.to_irq(line).unwrap();
            let back = gpio.irq_to_line(irq).unwrap();
            assert_eq!(back, line as usize);
            assert_eq!(gpio.to_irq(back as u32).unwrap(), irq);
        }

        assert_eq!(gpio.irq_to_line(511), Err(Error::InvalidIrq));
        assert_eq!(gpio.irq_to_line(512 + 256), Err(Error::InvalidIrq));
        assert_eq!(gpio.to_irq(256), Err(Error::InvalidLineIndex));
    }

    #[test]
    fn test_install_direct_irq() {
        let bus = FakeBus::new();
        let mock = MockPlatform::new(&bus);
        let gpio = testing::attach(&bus, &mock);
        bus.poke(gpio_intr_cfg(21), (IntrCfg::LIVE | IntrCfg::POL_CTL_HI).bits());

        gpio.install_direct_irq(21, 2, true).unwrap();

        assert_eq!(bus.peek(gpio_config(21)) & (1 << 9), 1 << 9);
        assert_eq!(bus.peek(gpio_intr_cfg(21)), IntrCfg::POL_CTL_HI.bits());
        assert_eq!(mock.owner_of(21), Some((1 << 3) | 7));
        let writes = mock.secure_writes.lock().unwrap();
        assert_eq!(
            writes.last(),
            Some(&(TEST_PHYS + 0x708, 4 | (21 << 3) | (1 << 11)))
        );
    }

    #[test]
    fn test_direct_irq_line_stays_off_summary_path() {
        let bus = FakeBus::new();
        let mock = MockPlatform::new(&bus);
        let gpio = testing::attach(&bus, &mock);
        gpio.set_type(512 + 5, IrqType::EDGE_BOTH).unwrap();
        gpio.unmask(512 + 5);

        gpio.install_direct_irq(5, 0, true).unwrap();
        {
            let state = gpio.state.lock();
            assert!(!state.enabled_irqs.test(5));
            assert!(!state.dual_edge_irqs.test(5));
        }

        gpio.suspend().unwrap();
        gpio.resume().unwrap();

        let live = IntrCfg::from_bits_retain(bus.peek(gpio_intr_cfg(5))) & IntrCfg::LIVE;
        assert!(live.is_empty());
        assert!(!gpio.state.lock().enabled_irqs.test(5));
    }

    #[test]
    fn test_install_direct_irq_rejects_bad_indices() {
        let bus = FakeBus::new();
        let mock = MockPlatform::new(&bus);
        let gpio = testing::attach(&bus, &mock);

        assert_eq!(gpio.install_direct_irq(256, 0, false), Err(Error::InvalidLineIndex));
        assert_eq!(gpio.install_direct_irq(3, 8, false), Err(Error::InvalidLineIndex));
        assert!(mock.secure_writes.lock().unwrap().is_empty());
        assert_eq!(bus.peek(gpio_config(3)), 0);
    }

    #[test]
    fn test_plain_write_outside_secure_windows() {
        let bus = FakeBus::new();
        let mock = MockPlatform::new(&bus);
        let mut cfg = testing::test_config();
        cfg.secure_windows = &[];
        let gpio = TlmmGpio::attach(cfg, bus.clone(), mock.platform()).unwrap();

        gpio.install_direct_irq(4, 0, false).unwrap();

        assert!(mock.secure_writes.lock().unwrap().is_empty());
        assert_eq!(bus.peek(gpio_intr_cfg_su(4)), (1 << 3) | 7);
        assert_eq!(bus.peek(dir_conn_intr_cfg_su(0)), 4 | (4 << 3));
    }

    #[test]
    fn test_tlmm_config_packs_pad_word() {
        let bus = FakeBus::new();
        let mock = MockPlatform::new(&bus);
        let gpio = testing::attach(&bus, &mock);

        let pad = PadConfig { pin: 40, func: 2, dir: 1, pull: 3, drvstr: 5 };
        assert_eq!(PadConfig::from_word(pad.to_word()), pad);

        gpio.tlmm_config(pad.to_word()).unwrap();
        assert_eq!(bus.peek(gpio_config(40)), (1 << 9) | (5 << 6) | (2 << 2) | 3);

        let bad = PadConfig { pin: 300, ..pad };
        assert_eq!(gpio.tlmm_config(bad.to_word()), Err(Error::InvalidLineIndex));
    }

    #[test]
    fn test_sdc_drive_and_pull() {
        let bus = FakeBus::new();
        let mock = MockPlatform::new(&bus);
        let gpio = testing::attach(&bus, &mock);

        gpio.set_hdrive(HdriveTarget::Sdc4Clk, 0b111);
        gpio.set_pull(PullTarget::Sdc4Cmd, 0b10);
        gpio.set_hdrive(HdriveTarget::Sdc3Data, 0b011);

        assert_eq!(bus.peek(SDC4_HDRV_PULL_CTL), (0b111 << 6) | (0b10 << 11));
        assert_eq!(bus.peek(SDC3_HDRV_PULL_CTL), 0b011);
    }
}
