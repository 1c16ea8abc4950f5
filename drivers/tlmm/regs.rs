//! TLMM v2 register layout and access
//!
//! Every pad owns four 32-bit registers in a 16-byte stride (config,
//! input/output, interrupt config, interrupt status) plus a word in the
//! trust-zone owned target-processor bank. Two extra registers hold the
//! drive strength and pull of the SDC3/SDC4 pads.

use core::ptr::NonNull;

use bitflags::bitflags;
use tock_registers::{register_bitfields, LocalRegisterCopy};
use volatile::VolatilePtr;

use crate::utils::dsb;

/// Interrupt target-processor bank, one word per line
pub const fn gpio_intr_cfg_su(line: usize) -> usize {
    0x0400 + 0x04 * line
}

/// Direct-connect interrupt routing, one word per direct-connect slot
pub const fn dir_conn_intr_cfg_su(slot: usize) -> usize {
    0x0700 + 0x04 * slot
}

/// Pad configuration
pub const fn gpio_config(line: usize) -> usize {
    0x1000 + 0x10 * line
}

/// Input level and output latch
pub const fn gpio_in_out(line: usize) -> usize {
    0x1004 + 0x10 * line
}

/// Interrupt detection configuration
pub const fn gpio_intr_cfg(line: usize) -> usize {
    0x1008 + 0x10 * line
}

/// Latched interrupt status
pub const fn gpio_intr_status(line: usize) -> usize {
    0x100c + 0x10 * line
}

register_bitfields! {
    u32,
    pub GPIO_CFG [
        PULL OFFSET(0) NUMBITS(2) [
            NoPull = 0,
            PullDown = 1,
            Keeper = 2,
            PullUp = 3
        ],
        FUNC_SEL OFFSET(2) NUMBITS(4) [],
        DRV_STRENGTH OFFSET(6) NUMBITS(3) [],
        OE OFFSET(9) NUMBITS(1) []
    ],
    pub GPIO_IN_OUT [
        IN OFFSET(0) NUMBITS(1) [],
        OUT OFFSET(1) NUMBITS(1) []
    ],
    pub GPIO_INTR_CFG_SU [
        TARGET_PROC OFFSET(0) NUMBITS(3) [],
        DIR_CONN_EN OFFSET(3) NUMBITS(1) []
    ],
    pub DIR_CONN_INTR_CFG_SU [
        TARGET_PROC OFFSET(0) NUMBITS(3) [],
        GPIO_SEL OFFSET(3) NUMBITS(8) [],
        POLARITY OFFSET(11) NUMBITS(1) []
    ]
}

/// Decoded copy of a pad configuration register
pub type ConfigCopy = LocalRegisterCopy<u32, GPIO_CFG::Register>;

/// Decoded copy of an input/output register
pub type InOutCopy = LocalRegisterCopy<u32, GPIO_IN_OUT::Register>;

/// Decoded copy of a target-processor register
pub type SuCopy = LocalRegisterCopy<u32, GPIO_INTR_CFG_SU::Register>;

/// Decoded copy of a direct-connect routing register
pub type DirConnCopy = LocalRegisterCopy<u32, DIR_CONN_INTR_CFG_SU::Register>;

bitflags! {
    /// GPIO_INTR_CFG bits
    ///
    /// RAW_STATUS_EN gates whether a trigger latches GPIO_INTR_STATUS;
    /// ENABLE gates whether it reaches the summary line. Either may be set
    /// without the other.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct IntrCfg: u32 {
        const ENABLE = 1 << 0;
        const POL_CTL_HI = 1 << 1;
        const DECT_CTL_EDGE = 1 << 2;
        const RAW_STATUS_EN = 1 << 3;
    }
}

impl IntrCfg {
    /// Both bits needed for a line to be live on the summary interrupt
    pub const LIVE: IntrCfg = IntrCfg::RAW_STATUS_EN.union(IntrCfg::ENABLE);
}

/// Latched-status bit in GPIO_INTR_STATUS
pub const INTR_STATUS: u32 = 1 << 0;

/// Interrupt target processor codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum TargetProc {
    Mss = 0,
    Sps = 1,
    LpaDsp = 2,
    Rpm = 3,
    /// The application processor
    Scorpion = 4,
    Reserved5 = 5,
    Reserved6 = 6,
    None = 7,
}

impl TargetProc {
    /// Decode the 3-bit target field
    pub fn from_raw(value: u32) -> Self {
        match value & 0x7 {
            0 => Self::Mss,
            1 => Self::Sps,
            2 => Self::LpaDsp,
            3 => Self::Rpm,
            4 => Self::Scorpion,
            5 => Self::Reserved5,
            6 => Self::Reserved6,
            _ => Self::None,
        }
    }

    /// Owner label in the register dump, right-aligned to 8 columns
    pub fn label(self) -> &'static str {
        match self {
            Self::Mss => "MSS_PROC",
            Self::Sps => "SPS_PROC",
            Self::LpaDsp => " LPA_DSP",
            Self::Rpm => "RPM_PROC",
            Self::Scorpion => " SC_PROC",
            Self::Reserved5 | Self::Reserved6 => "RESERVED",
            Self::None => "    NONE",
        }
    }
}

/// Shared drive-strength/pull register for the SDC4 pads
pub const SDC4_HDRV_PULL_CTL: usize = 0x20a0;
/// Shared drive-strength/pull register for the SDC3 pads
pub const SDC3_HDRV_PULL_CTL: usize = 0x20a4;

/// Location of a narrow field in a shared register
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldCfg {
    pub reg: usize,
    pub off: u32,
}

/// Drive-strength targets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HdriveTarget {
    Sdc4Clk,
    Sdc4Cmd,
    Sdc4Data,
    Sdc3Clk,
    Sdc3Cmd,
    Sdc3Data,
}

/// Pull targets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PullTarget {
    Sdc4Cmd,
    Sdc4Data,
    Sdc3Cmd,
    Sdc3Data,
}

/// Width of a drive-strength field
pub const HDRV_WIDTH: u32 = 3;
/// Width of a pull field
pub const PULL_WIDTH: u32 = 2;

const HDRV_CFGS: [FieldCfg; 6] = [
    FieldCfg { reg: SDC4_HDRV_PULL_CTL, off: 6 },
    FieldCfg { reg: SDC4_HDRV_PULL_CTL, off: 3 },
    FieldCfg { reg: SDC4_HDRV_PULL_CTL, off: 0 },
    FieldCfg { reg: SDC3_HDRV_PULL_CTL, off: 6 },
    FieldCfg { reg: SDC3_HDRV_PULL_CTL, off: 3 },
    FieldCfg { reg: SDC3_HDRV_PULL_CTL, off: 0 },
];

const PULL_CFGS: [FieldCfg; 4] = [
    FieldCfg { reg: SDC4_HDRV_PULL_CTL, off: 11 },
    FieldCfg { reg: SDC4_HDRV_PULL_CTL, off: 9 },
    FieldCfg { reg: SDC3_HDRV_PULL_CTL, off: 11 },
    FieldCfg { reg: SDC3_HDRV_PULL_CTL, off: 9 },
];

impl HdriveTarget {
    pub fn field(self) -> FieldCfg {
        HDRV_CFGS[self as usize]
    }
}

impl PullTarget {
    pub fn field(self) -> FieldCfg {
        PULL_CFGS[self as usize]
    }
}

/// Raw 32-bit access to the TLMM register block
///
/// Offsets are relative to the start of the block.
pub trait TlmmBus {
    /// Read the register at `offset`
    fn read(&self, offset: usize) -> u32;

    /// Write the register at `offset`
    fn write(&self, offset: usize, value: u32);
}

/// Memory-mapped TLMM block
pub struct MmioBus {
    base: NonNull<u32>,
}

// The mapping is device memory owned by the driver; all access goes through
// volatile operations serialized by the controller lock.
unsafe impl Send for MmioBus {}

impl MmioBus {
    /// Wrap a mapped register block
    ///
    /// # Safety
    /// `base` must be the virtual address of a live, 4-byte aligned TLMM
    /// mapping covering every offset the driver touches, and nothing else
    /// may write it outside the driver.
    pub unsafe fn new(base: usize) -> Option<Self> {
        NonNull::new(base as *mut u32).map(|base| Self { base })
    }

    fn reg(&self, offset: usize) -> VolatilePtr<'_, u32> {
        // SAFETY: offsets come from the layout functions above and stay
        // inside the mapping promised to `new`.
        unsafe { VolatilePtr::new(NonNull::new_unchecked(self.base.as_ptr().add(offset / 4))) }
    }
}

impl TlmmBus for MmioBus {
    fn read(&self, offset: usize) -> u32 {
        self.reg(offset).read()
    }

    fn write(&self, offset: usize, value: u32) {
        self.reg(offset).write(value)
    }
}

/// Register access helpers over a bus
///
/// Callers hold the controller lock for every method here.
pub struct TlmmRegs<B> {
    bus: B,
}

impl<B: TlmmBus> TlmmRegs<B> {
    pub fn new(bus: B) -> Self {
        Self { bus }
    }

    pub fn read(&self, offset: usize) -> u32 {
        self.bus.read(offset)
    }

    pub fn write(&self, offset: usize, value: u32) {
        self.bus.write(offset, value)
    }

    /// Read-modify-write: OR `mask` in
    pub fn set_bits(&self, offset: usize, mask: u32) {
        self.write(offset, self.read(offset) | mask);
    }

    /// Read-modify-write: clear `mask`
    pub fn clear_bits(&self, offset: usize, mask: u32) {
        self.write(offset, self.read(offset) & !mask);
    }

    pub fn read_config(&self, line: usize) -> u32 {
        self.read(gpio_config(line))
    }

    pub fn write_config(&self, line: usize, bits: u32) {
        self.write(gpio_config(line), bits)
    }

    /// Decoded view of the pad configuration
    pub fn config(&self, line: usize) -> ConfigCopy {
        ConfigCopy::new(self.read_config(line))
    }

    /// Set or clear the output driver of a pad
    pub fn set_output_enable(&self, line: usize, enable: bool) {
        let mut cfg = self.config(line);
        cfg.modify(GPIO_CFG::OE.val(enable as u32));
        self.write_config(line, cfg.get());
    }

    /// Target processor a line's interrupt is routed to
    pub fn owner(&self, line: usize) -> TargetProc {
        let su = SuCopy::new(self.read(gpio_intr_cfg_su(line)));
        TargetProc::from_raw(su.read(GPIO_INTR_CFG_SU::TARGET_PROC))
    }

    pub fn read_in_out(&self, line: usize) -> u32 {
        self.read(gpio_in_out(line))
    }

    pub fn write_in_out(&self, line: usize, bits: u32) {
        self.write(gpio_in_out(line), bits)
    }

    pub fn read_intr_cfg(&self, line: usize) -> IntrCfg {
        IntrCfg::from_bits_retain(self.read(gpio_intr_cfg(line)))
    }

    pub fn write_intr_cfg(&self, line: usize, cfg: IntrCfg) {
        self.write(gpio_intr_cfg(line), cfg.bits())
    }

    pub fn set_intr_cfg(&self, line: usize, bits: IntrCfg) {
        self.set_bits(gpio_intr_cfg(line), bits.bits())
    }

    pub fn clear_intr_cfg(&self, line: usize, bits: IntrCfg) {
        self.clear_bits(gpio_intr_cfg(line), bits.bits())
    }

    pub fn read_intr_status(&self, line: usize) -> u32 {
        self.read(gpio_intr_status(line))
    }

    /// Current input level of a pad
    pub fn input(&self, line: usize) -> bool {
        InOutCopy::new(self.read_in_out(line)).is_set(GPIO_IN_OUT::IN)
    }

    /// Output latch of a pad
    pub fn output(&self, line: usize) -> bool {
        InOutCopy::new(self.read_in_out(line)).is_set(GPIO_IN_OUT::OUT)
    }

    /// Drive the output latch
    pub fn set_output(&self, line: usize, value: bool) {
        let mut bits = InOutCopy::new(0);
        bits.modify(GPIO_IN_OUT::OUT.val(value as u32));
        self.write_in_out(line, bits.get());
    }

    /// True if the line has latched an interrupt
    pub fn intr_pending(&self, line: usize) -> bool {
        self.read_intr_status(line) & INTR_STATUS != 0
    }

    /// Clear the latched interrupt of a line
    pub fn clear_intr_status(&self, line: usize) {
        self.write(gpio_intr_status(line), INTR_STATUS);
    }

    /// Write a narrow field of a shared register, leaving its neighbours alone
    pub fn set_field(&self, field: FieldCfg, width: u32, value: u32) {
        let mask = (1u32 << width) - 1;
        let mut reg = self.read(field.reg);
        reg &= !(mask << field.off);
        reg |= (value & mask) << field.off;
        self.write(field.reg, reg);
        dsb();
    }

    /// Read back a narrow field of a shared register
    pub fn field(&self, field: FieldCfg, width: u32) -> u32 {
        (self.read(field.reg) >> field.off) & ((1u32 << width) - 1)
    }
}
