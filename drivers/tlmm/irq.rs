//! Summary interrupt demultiplexing
//!
//! Every line interrupt is a virtual interrupt behind the one summary line.
//! The chip callbacks below keep `enabled_irqs`, `wake_irqs` and
//! `dual_edge_irqs` in step with the pad interrupt configuration, and mirror
//! each change into the wake router.

use crate::kernel::irq::{FlowHandler, IrqChip, IrqNumber, IrqType};
use crate::utils::dsb;
use crate::Result;

use super::dual_edge::update_dual_edge_pos;
use super::regs::{IntrCfg, TargetProc, TlmmBus};
use super::{LineSet, TlmmGpio};

impl<'a, B: TlmmBus> TlmmGpio<'a, B> {
    fn checked_line(&self, irq: IrqNumber) -> Option<usize> {
        match self.irq_to_line(irq) {
            Ok(line) => Some(line),
            Err(e) => {
                log::error!("{}: irq {}: {}", self.config.label, irq, e);
                None
            }
        }
    }

    /// Demultiplex one summary interrupt
    ///
    /// Dispatches every enabled line with a latched status, lowest line
    /// first, then acknowledges the summary line. The scan is taken in one
    /// critical section and the dispatch runs without the lock, since the
    /// host calls back into [`IrqChip::ack`] and friends.
    pub fn handle_summary_irq(&self) {
        let mut pending = LineSet::new(self.line_count());
        {
            let state = self.state.lock();
            for line in state.enabled_irqs.iter() {
                if state.regs.intr_pending(line) {
                    pending.set_bit(line);
                }
            }
        }

        if pending.none() {
            log::trace!("{}: spurious summary irq", self.config.label);
        }

        for line in pending.iter() {
            self.platform.irq_host.handle_nested(self.line_to_irq(line));
        }

        self.platform.irq_host.ack_parent(self.config.summary_irq);
    }
}

impl<'a, B: TlmmBus> IrqChip for TlmmGpio<'a, B> {
    fn name(&self) -> &'static str {
        self.config.label
    }

    fn mask(&self, irq: IrqNumber) {
        let Some(line) = self.checked_line(irq) else {
            return;
        };

        self.set_owner(line, TargetProc::None);
        {
            let mut state = self.state.lock();
            state.regs.clear_intr_cfg(line, IntrCfg::LIVE);
            state.enabled_irqs.clear_bit(line);
            dsb();
        }

        self.platform.mpm.enable_irq(irq, false);
    }

    fn unmask(&self, irq: IrqNumber) {
        let Some(line) = self.checked_line(irq) else {
            return;
        };

        {
            let mut state = self.state.lock();
            state.enabled_irqs.set_bit(line);
            state.regs.set_intr_cfg(line, IntrCfg::LIVE);
            dsb();
        }
        self.set_owner(line, TargetProc::Scorpion);

        self.platform.mpm.enable_irq(irq, true);
    }

    fn ack(&self, irq: IrqNumber) {
        let Some(line) = self.checked_line(irq) else {
            return;
        };

        let armed = {
            let state = self.state.lock();
            state.regs.clear_intr_status(line);
            let armed = if state.dual_edge_irqs.test(line) {
                update_dual_edge_pos(&state.regs, line).ok()
            } else {
                None
            };
            dsb();
            armed
        };

        if let Some(edge) = armed {
            self.mirror_type(irq, edge);
        }
    }

    fn set_type(&self, irq: IrqNumber, flow: IrqType) -> Result<()> {
        let line = self.irq_to_line(irq)?;

        let (handler, armed) = {
            let mut state = self.state.lock();
            let mut bits = state.regs.read_intr_cfg(line);

            let handler = if flow.is_edge() {
                bits.insert(IntrCfg::DECT_CTL_EDGE);
                state.dual_edge_irqs.set(line, flow.is_dual_edge());
                FlowHandler::Edge
            } else {
                bits.remove(IntrCfg::DECT_CTL_EDGE);
                state.dual_edge_irqs.clear_bit(line);
                FlowHandler::Level
            };

            bits.set(IntrCfg::POL_CTL_HI, flow.is_active_high());
            state.regs.write_intr_cfg(line, bits);

            let armed = if flow.is_dual_edge() {
                update_dual_edge_pos(&state.regs, line).ok()
            } else {
                None
            };
            dsb();
            (handler, armed)
        };

        self.platform.irq_host.set_flow_handler(irq, handler);
        if let Some(edge) = armed {
            self.mirror_type(irq, edge);
        }
        self.mirror_type(irq, flow);
        Ok(())
    }

    fn set_wake(&self, irq: IrqNumber, on: bool) -> Result<()> {
        let line = self.irq_to_line(irq)?;

        let summary_changed = {
            let mut state = self.state.lock();
            let was_empty = state.wake_irqs.none();
            state.wake_irqs.set(line, on);
            was_empty != state.wake_irqs.none()
        };

        if summary_changed {
            log::debug!(
                "{}: summary irq {} wake {}",
                self.config.label,
                self.config.summary_irq,
                on
            );
            if let Err(e) = self
                .platform
                .irq_host
                .set_irq_wake(self.config.summary_irq, on)
            {
                log::error!("{}: summary irq wake {}: {}", self.config.label, on, e);
            }
        }

        if let Err(e) = self.platform.mpm.set_irq_wake(irq, on) {
            log::error!("{}: mpm wake for irq {}: {}", self.config.label, irq, e);
        }
        Ok(())
    }
}

impl<'a, B: TlmmBus> TlmmGpio<'a, B> {
    fn mirror_type(&self, irq: IrqNumber, flow: IrqType) {
        if let Err(e) = self.platform.mpm.set_irq_type(irq, flow) {
            log::error!("{}: mpm type for irq {}: {}", self.config.label, irq, e);
        }
    }
}
