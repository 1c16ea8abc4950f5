//! Register introspection
//!
//! Per-line attributes for external tooling and a text dump of every pad.

use core::fmt::{self, Write};

use heapless::String;

use crate::utils::dsb;
use crate::{Error, Result};

use super::regs::{
    gpio_intr_cfg_su, ConfigCopy, InOutCopy, IntrCfg, TargetProc, TlmmBus, GPIO_CFG, GPIO_IN_OUT,
};
use super::TlmmGpio;

/// First line of a register dump
pub const DUMP_TITLE: &str = "------------ MSM GPIO -------------";

/// One formatted dump line
pub type DumpLine = String<100>;

/// Per-line debug attributes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineAttr {
    /// 1 when the output driver is on
    Direction,
    /// Output latch for outputs, input level for inputs
    Level,
    DrvStrength,
    FuncSel,
    Pull,
    /// Read-only
    IntEnable,
    /// 1 when routed to the application processor
    IntOwner,
    /// Read-only: polarity in bit 0, edge detection in bit 1
    IntType,
}

impl LineAttr {
    pub const ALL: [LineAttr; 8] = [
        LineAttr::Direction,
        LineAttr::Level,
        LineAttr::DrvStrength,
        LineAttr::FuncSel,
        LineAttr::Pull,
        LineAttr::IntEnable,
        LineAttr::IntOwner,
        LineAttr::IntType,
    ];

    /// Attribute file name
    pub fn name(self) -> &'static str {
        match self {
            LineAttr::Direction => "direction",
            LineAttr::Level => "level",
            LineAttr::DrvStrength => "drv_strength",
            LineAttr::FuncSel => "func_sel",
            LineAttr::Pull => "pull",
            LineAttr::IntEnable => "int_enable",
            LineAttr::IntOwner => "int_owner",
            LineAttr::IntType => "int_type",
        }
    }

    pub fn is_writable(self) -> bool {
        !matches!(self, LineAttr::IntEnable | LineAttr::IntType)
    }
}

/// Register state of one pad, read in one critical section
struct PadSnapshot {
    cfg: ConfigCopy,
    in_out: u32,
    intr: IntrCfg,
    owner: TargetProc,
}

impl PadSnapshot {
    fn is_output(&self) -> bool {
        self.cfg.is_set(GPIO_CFG::OE)
    }

    fn level(&self) -> bool {
        let io = InOutCopy::new(self.in_out);
        if self.is_output() {
            io.is_set(GPIO_IN_OUT::OUT)
        } else {
            io.is_set(GPIO_IN_OUT::IN)
        }
    }
}

impl<'a, B: TlmmBus> TlmmGpio<'a, B> {
    fn snapshot(&self, line: usize) -> PadSnapshot {
        let state = self.state.lock();
        PadSnapshot {
            cfg: state.regs.config(line),
            in_out: state.regs.read_in_out(line),
            intr: state.regs.read_intr_cfg(line),
            owner: state.regs.owner(line),
        }
    }

    /// Read a debug attribute
    pub fn read_attr(&self, line: u32, attr: LineAttr) -> Result<u32> {
        let pad = self.snapshot(self.line(line)?);
        let value = match attr {
            LineAttr::Direction => pad.is_output() as u32,
            LineAttr::Level => pad.level() as u32,
            LineAttr::DrvStrength => pad.cfg.read(GPIO_CFG::DRV_STRENGTH),
            LineAttr::FuncSel => pad.cfg.read(GPIO_CFG::FUNC_SEL),
            LineAttr::Pull => pad.cfg.read(GPIO_CFG::PULL),
            LineAttr::IntEnable => pad.intr.contains(IntrCfg::ENABLE) as u32,
            LineAttr::IntOwner => pad.owner as u32,
            LineAttr::IntType => {
                (pad.intr & (IntrCfg::POL_CTL_HI | IntrCfg::DECT_CTL_EDGE)).bits() >> 1
            }
        };
        Ok(value)
    }

    /// Write a debug attribute
    ///
    /// Field values are truncated to the field width.
    pub fn write_attr(&self, line: u32, attr: LineAttr, value: u32) -> Result<()> {
        let line = self.line(line)?;

        let field = match attr {
            LineAttr::IntEnable | LineAttr::IntType => return Err(Error::PermissionDenied),
            LineAttr::IntOwner => {
                let target = if value != 0 { TargetProc::Scorpion } else { TargetProc::None };
                return self.write_protected(gpio_intr_cfg_su(line), target as u32);
            }
            LineAttr::Level => {
                let state = self.state.lock();
                state.regs.set_output(line, value != 0);
                dsb();
                return Ok(());
            }
            LineAttr::Direction => GPIO_CFG::OE.val((value != 0) as u32),
            LineAttr::DrvStrength => GPIO_CFG::DRV_STRENGTH.val(value & 0x7),
            LineAttr::FuncSel => GPIO_CFG::FUNC_SEL.val(value & 0xf),
            LineAttr::Pull => GPIO_CFG::PULL.val(value & 0x3),
        };

        let state = self.state.lock();
        let mut cfg = state.regs.config(line);
        cfg.modify(field);
        state.regs.write_config(line, cfg.get());
        dsb();
        Ok(())
    }

    /// Format the dump line of one pad
    pub fn dump_line(&self, line: u32) -> Result<DumpLine> {
        let line = self.line(line)?;
        Ok(self.format_line(line))
    }

    fn format_line(&self, line: usize) -> DumpLine {
        let pad = self.snapshot(line);
        let mut out = DumpLine::new();
        // A line that does not fit is cut short, like the fixed dump buffer
        let _ = format_pad(&mut out, self.config.gpio_base as usize + line, &pad);
        out
    }

    /// Write the full register dump
    pub fn dump<W: Write>(&self, out: &mut W) -> fmt::Result {
        writeln!(out, "{}", DUMP_TITLE)?;
        for line in 0..self.line_count() {
            writeln!(out, "{}", self.format_line(line))?;
        }
        Ok(())
    }

    /// Send the full register dump to the log
    pub fn log_dump(&self) {
        log::info!("{}", DUMP_TITLE);
        for line in 0..self.line_count() {
            log::info!("{}", self.format_line(line));
        }
    }
}

fn format_pad<W: Write>(out: &mut W, gpio: usize, pad: &PadSnapshot) -> fmt::Result {
    write!(out, "GPIO[{:3}]: ", gpio)?;
    write!(out, "[FS]0x{:x}, ", pad.cfg.read(GPIO_CFG::FUNC_SEL))?;

    let level = if pad.level() { "HIGH" } else { " LOW" };
    if pad.is_output() {
        write!(out, "[DIR]OUT, [VAL]{} ", level)?;
    } else {
        write!(out, "[DIR] IN, [VAL]{} ", level)?;
    }

    let pull = match pad.cfg.read(GPIO_CFG::PULL) {
        0 => "NO",
        1 => "PD",
        2 => "KP",
        _ => "PU",
    };
    write!(out, "[PULL]{}, ", pull)?;
    write!(out, "[DRV]{:2}mA, ", 2 * (pad.cfg.read(GPIO_CFG::DRV_STRENGTH) + 1))?;

    if !pad.is_output() {
        let enabled = pad.intr.contains(IntrCfg::ENABLE);
        write!(out, "[INT]{}, ", if enabled { "YES" } else { " NO" })?;
        if enabled {
            write!(out, "{}, ", pad.owner.label())?;
        }
    }
    Ok(())
}
