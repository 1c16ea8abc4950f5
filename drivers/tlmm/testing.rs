//! Simulated TLMM block and collaborators for unit tests

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use crate::config::{SecureWindow, TlmmConfig};
use crate::drivers::{PinMux, SecureMonitor, WakeRouter};
use crate::kernel::gpio::GpioHost;
use crate::kernel::irq::{FlowHandler, IrqHost, IrqNumber, IrqType};
use crate::{Error, Result};

use super::regs::{gpio_in_out, gpio_intr_cfg_su, gpio_intr_status, TlmmBus, INTR_STATUS};
use super::{Platform, TlmmGpio};

/// Virtual base the simulated block pretends to live at
pub const TEST_BASE: usize = 0x1000_0000;
/// Physical base the secure monitor sees
pub const TEST_PHYS: u32 = 0x0080_0000;

/// Only the target-processor banks are protected, like the real part
pub const TEST_WINDOWS: &[SecureWindow] = &[SecureWindow {
    name: "tlmm-su",
    virt: TEST_BASE + 0x400,
    phys: TEST_PHYS + 0x400,
    size: 0x400,
}];

/// A 256-line controller with its banks behind the secure monitor
pub fn test_config() -> TlmmConfig {
    TlmmConfig {
        label: "msmgpio-test",
        virt_base: TEST_BASE,
        size: 0x4000,
        ngpio: 256,
        gpio_base: 0,
        irq_base: 512,
        summary_irq: 48,
        nr_dir_conn_irqs: 8,
        secure_windows: TEST_WINDOWS,
    }
}

#[derive(Default)]
struct FakeRegs {
    regs: HashMap<usize, u32>,
    /// Lines whose input flips after every IN_OUT read
    toggling: HashSet<usize>,
    in_out_reads: HashMap<usize, usize>,
}

/// Register file with write-1-to-clear status registers
#[derive(Clone, Default)]
pub struct FakeBus {
    inner: Arc<Mutex<FakeRegs>>,
}

fn line_of(offset: usize) -> Option<usize> {
    (0x1000..0x2000).contains(&offset).then(|| (offset - 0x1000) / 0x10)
}

impl FakeBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read without side effects
    pub fn peek(&self, offset: usize) -> u32 {
        *self.inner.lock().unwrap().regs.get(&offset).unwrap_or(&0)
    }

    /// Write without side effects
    pub fn poke(&self, offset: usize, value: u32) {
        self.inner.lock().unwrap().regs.insert(offset, value);
    }

    /// Drive the input level of a pad
    pub fn set_input(&self, line: usize, high: bool) {
        let mut inner = self.inner.lock().unwrap();
        let reg = inner.regs.entry(gpio_in_out(line)).or_insert(0);
        if high {
            *reg |= 1;
        } else {
            *reg &= !1;
        }
    }

    /// Latch an interrupt on a pad
    pub fn raise(&self, line: usize) {
        let mut inner = self.inner.lock().unwrap();
        *inner.regs.entry(gpio_intr_status(line)).or_insert(0) |= INTR_STATUS;
    }

    /// Make a pad's input flip after every read
    pub fn toggle_on_read(&self, line: usize) {
        self.inner.lock().unwrap().toggling.insert(line);
    }

    /// Number of IN_OUT reads seen for a pad
    pub fn input_reads(&self, line: usize) -> usize {
        *self.inner.lock().unwrap().in_out_reads.get(&line).unwrap_or(&0)
    }
}

impl TlmmBus for FakeBus {
    fn read(&self, offset: usize) -> u32 {
        let mut inner = self.inner.lock().unwrap();
        let value = *inner.regs.get(&offset).unwrap_or(&0);
        if let Some(line) = line_of(offset) {
            if offset == gpio_in_out(line) {
                *inner.in_out_reads.entry(line).or_insert(0) += 1;
                if inner.toggling.contains(&line) {
                    inner.regs.insert(offset, value ^ 1);
                }
            }
        }
        value
    }

    fn write(&self, offset: usize, value: u32) {
        let mut inner = self.inner.lock().unwrap();
        match line_of(offset) {
            Some(line) if offset == gpio_intr_status(line) => {
                *inner.regs.entry(offset).or_insert(0) &= !value;
            }
            // The input bit is owned by the pad, writes only reach the latch
            Some(line) if offset == gpio_in_out(line) => {
                let reg = inner.regs.entry(offset).or_insert(0);
                *reg = (*reg & 1) | (value & !1);
            }
            _ => {
                inner.regs.insert(offset, value);
            }
        }
    }
}

/// Every collaborator the controller talks to, recording what it was told
#[derive(Default)]
pub struct MockPlatform {
    /// Bus the secure monitor writes land on
    pub bus: FakeBus,
    pub reserved: Mutex<HashSet<u32>>,
    pub secure_writes: Mutex<Vec<(u32, u32)>>,
    pub secure_fail: Mutex<bool>,
    pub mpm_enabled: Mutex<Vec<(IrqNumber, bool)>>,
    pub mpm_types: Mutex<Vec<(IrqNumber, IrqType)>>,
    pub mpm_wake: Mutex<Vec<(IrqNumber, bool)>>,
    pub flow: Mutex<HashMap<IrqNumber, FlowHandler>>,
    pub chained: Mutex<Option<IrqNumber>>,
    pub parent_wake: Mutex<Vec<(IrqNumber, bool)>>,
    pub nested: Mutex<Vec<IrqNumber>>,
    pub parent_acks: Mutex<Vec<IrqNumber>>,
    pub chips: Mutex<Vec<(u32, u32)>>,
}

impl MockPlatform {
    pub fn new(bus: &FakeBus) -> Self {
        Self {
            bus: bus.clone(),
            ..Default::default()
        }
    }

    pub fn platform(&self) -> Platform<'_> {
        Platform {
            pinmux: self,
            scm: self,
            mpm: self,
            irq_host: self,
            gpio_host: self,
        }
    }

    /// Last owner value the secure monitor wrote for a line
    pub fn owner_of(&self, line: usize) -> Option<u32> {
        let phys = TEST_PHYS + gpio_intr_cfg_su(line) as u32;
        self.secure_writes
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|(addr, _)| *addr == phys)
            .map(|&(_, v)| v)
    }
}

impl PinMux for MockPlatform {
    fn reserve(&self, pin: u32) -> Result<()> {
        if self.reserved.lock().unwrap().insert(pin) {
            Ok(())
        } else {
            Err(Error::AlreadyOwned)
        }
    }

    fn release(&self, pin: u32) {
        self.reserved.lock().unwrap().remove(&pin);
    }
}

impl SecureMonitor for MockPlatform {
    fn secure_write(&self, phys: u32, value: u32) -> Result<()> {
        if *self.secure_fail.lock().unwrap() {
            return Err(Error::SecureWriteFailed);
        }
        self.secure_writes.lock().unwrap().push((phys, value));
        self.bus.poke((phys - TEST_PHYS) as usize, value);
        Ok(())
    }
}

impl WakeRouter for MockPlatform {
    fn enable_irq(&self, irq: IrqNumber, on: bool) {
        self.mpm_enabled.lock().unwrap().push((irq, on));
    }

    fn set_irq_type(&self, irq: IrqNumber, flow: IrqType) -> Result<()> {
        self.mpm_types.lock().unwrap().push((irq, flow));
        Ok(())
    }

    fn set_irq_wake(&self, irq: IrqNumber, on: bool) -> Result<()> {
        self.mpm_wake.lock().unwrap().push((irq, on));
        Ok(())
    }
}

impl IrqHost for MockPlatform {
    fn set_flow_handler(&self, irq: IrqNumber, flow: FlowHandler) {
        self.flow.lock().unwrap().insert(irq, flow);
    }

    fn set_chained_handler(&self, parent: IrqNumber) -> Result<()> {
        let mut chained = self.chained.lock().unwrap();
        if chained.is_some() {
            return Err(Error::ResourceBusy);
        }
        *chained = Some(parent);
        Ok(())
    }

    fn clear_chained_handler(&self, _parent: IrqNumber) {
        *self.chained.lock().unwrap() = None;
    }

    fn set_irq_wake(&self, irq: IrqNumber, on: bool) -> Result<()> {
        self.parent_wake.lock().unwrap().push((irq, on));
        Ok(())
    }

    fn handle_nested(&self, irq: IrqNumber) {
        self.nested.lock().unwrap().push(irq);
    }

    fn ack_parent(&self, parent: IrqNumber) {
        self.parent_acks.lock().unwrap().push(parent);
    }
}

impl GpioHost for MockPlatform {
    fn add_chip(&self, _label: &'static str, base: u32, ngpio: u32) -> Result<()> {
        self.chips.lock().unwrap().push((base, ngpio));
        Ok(())
    }

    fn remove_chip(&self, base: u32) -> Result<()> {
        let mut chips = self.chips.lock().unwrap();
        let before = chips.len();
        chips.retain(|&(b, _)| b != base);
        if chips.len() == before {
            Err(Error::NotFound)
        } else {
            Ok(())
        }
    }
}

/// Attach a controller over `bus` with the test configuration
pub fn attach<'a>(bus: &FakeBus, mock: &'a MockPlatform) -> TlmmGpio<'a, FakeBus> {
    TlmmGpio::attach(test_config(), bus.clone(), mock.platform()).unwrap()
}

/// Logger that keeps every record so tests can assert on warnings
struct CaptureLog;

static CAPTURED: Mutex<Vec<String>> = Mutex::new(Vec::new());
static LOGGER: CaptureLog = CaptureLog;

impl log::Log for CaptureLog {
    fn enabled(&self, _: &log::Metadata) -> bool {
        true
    }

    fn log(&self, record: &log::Record) {
        let line = format!("{} {}", record.level(), record.args());
        CAPTURED.lock().unwrap().push(line);
    }

    fn flush(&self) {}
}

/// Start capturing log records; safe to call from every test
pub fn capture_log() {
    // Only the first caller installs it, the others find it in place
    let _ = log::set_logger(&LOGGER);
    log::set_max_level(log::LevelFilter::Trace);
}

/// Whether some captured record contains every fragment
pub fn logged(fragments: &[&str]) -> bool {
    CAPTURED
        .lock()
        .unwrap()
        .iter()
        .any(|line| fragments.iter().all(|f| line.contains(f)))
}
