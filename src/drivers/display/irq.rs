//! # Interrupções do VOP
//!
//! Metade superior (`isr`): lê e reconhece `INTR_CTRL0` sob o lock de IRQ,
//! decodifica as causas e despacha. Nunca toca no estado dos planos.
//!
//! Metade inferior (`irq_thread`): confirma os commits pendentes de cada
//! plano comparando o hardware com o que foi programado.

use core::sync::atomic::Ordering;

use super::crtc::Vop;
use super::error::VopError;
use super::regs::{IntrStatus, DSP_LINE_NUM, INTR_CLR_SHIFT, INTR_CTRL0, INTR_MASK};
use crate::hal::IrqReturn;

/// Causa de interrupção tratada pelo driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IrqCause {
    /// Standby efetivado.
    DspHold,
    /// Linha de fim da área ativa alcançada.
    LineFlag,
    /// Início de frame.
    FrameStart,
}

/// Ordem de despacho.
const DISPATCH: [(IntrStatus, IrqCause); 3] = [
    (IntrStatus::DSP_HOLD_VALID, IrqCause::DspHold),
    (IntrStatus::LINE_FLAG, IrqCause::LineFlag),
    (IntrStatus::FS, IrqCause::FrameStart),
];

impl Vop {
    /// Metade superior da IRQ.
    pub fn isr(&self) -> IrqReturn {
        // INTR_CTRL0 mistura status, enable e clear: mesmo lock do enable_vblank
        let active = {
            let _guard = self.irq_lock.lock();
            let reg = self.regs.read_live(INTR_CTRL0);
            let active = reg & INTR_MASK;
            if active != 0 {
                self.regs.write_live(INTR_CTRL0, reg | (active << INTR_CLR_SHIFT));
            }
            active
        };

        // Linha compartilhada com o IOMMU
        if active == 0 {
            return IrqReturn::None;
        }

        let mut ret = IrqReturn::None;
        let mut rest = active;

        for (bit, cause) in DISPATCH {
            if rest & bit.bits() == 0 {
                continue;
            }
            rest &= !bit.bits();

            match cause {
                IrqCause::DspHold => {
                    self.dsp_hold_completion.complete();
                    ret = IrqReturn::Handled;
                }
                IrqCause::LineFlag => {
                    if !self.dmc_completion.is_done() {
                        let now = self.platform.clock.now_ns();
                        self.isr_time_ns.store(now, Ordering::Release);
                        self.dmc_completion.complete();
                    }
                    ret = IrqReturn::Handled;
                }
                IrqCause::FrameStart => {
                    self.platform.vblank.handle_vblank(self.pipe);
                    self.bottom_half.schedule();
                    self.stats.inc_frame_irqs();
                    ret = IrqReturn::WakeThread;
                }
            }
        }

        if rest != 0 {
            crate::kerror!("(VOP) IRQs desconhecidas: ", rest);
            self.stats.inc_unknown_irqs();
        }

        ret
    }

    /// Metade inferior da IRQ.
    pub fn irq_thread(&self) -> IrqReturn {
        self.bottom_half.run(|| {
            for idx in 0..self.planes.len() {
                self.process_pending(idx);
            }
        });
        IrqReturn::Handled
    }

    /// Liga a interrupção de início de frame.
    pub fn enable_vblank(&self) -> Result<(), VopError> {
        if !self.is_enabled() {
            return Err(VopError::NotEnabled);
        }
        self.set_irq_enabled(IntrStatus::FS, true);
        Ok(())
    }

    /// Desliga a interrupção de início de frame.
    pub fn disable_vblank(&self) {
        if !self.is_enabled() {
            return;
        }
        self.set_irq_enabled(IntrStatus::FS, false);
    }

    pub(super) fn set_irq_enabled(&self, cause: IntrStatus, on: bool) {
        if !self.is_enabled() {
            crate::kwarn!("(VOP) IRQ alterada com pipeline desligado: ", cause.bits());
            return;
        }
        let _guard = self.irq_lock.lock();
        self.regs.set(0, cause.enable_field(), on as u32);
    }

    /// Arma o LINE_FLAG no fim da área ativa do modo atual.
    pub(super) fn arm_line_flag(&self) {
        let vact_end = self.mode().vact_end();
        let _guard = self.irq_lock.lock();
        self.regs.set(0, DSP_LINE_NUM, vact_end);
        self.regs.set(0, IntrStatus::LINE_FLAG.enable_field(), 1);
    }

    pub(super) fn disarm_line_flag(&self) {
        let _guard = self.irq_lock.lock();
        self.regs.set(0, IntrStatus::LINE_FLAG.enable_field(), 0);
    }
}
