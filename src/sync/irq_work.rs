//! Arquivo: sync/irq_work.rs
//!
//! Propósito: Agendamento da metade inferior (thread) de uma IRQ.
//! A metade superior roda em contexto atômico e só marca o trabalho como
//! pendente; a thread de IRQ consome a marca e faz o trabalho que pode
//! bloquear (liberar buffers, sinalizar waiters).
//!
//! Regras:
//! 1. Agendar duas vezes antes de rodar resulta em UMA execução.
//! 2. Agendar durante a execução resulta em nova execução depois.

use core::sync::atomic::{AtomicU32, Ordering};

// Estados
const IRQ_WORK_SCHED: u32 = 1 << 0; // Agendado para execução
const IRQ_WORK_RUN: u32 = 1 << 1; // Executando no momento

/// Marca de trabalho diferido de IRQ.
pub struct IrqWork {
    state: AtomicU32,
}

impl IrqWork {
    pub const fn new() -> Self {
        Self {
            state: AtomicU32::new(0),
        }
    }

    /// Agenda o trabalho.
    /// Retorna `true` se agendou, `false` se já estava agendado.
    pub fn schedule(&self) -> bool {
        let state = self.state.load(Ordering::Relaxed);

        if (state & IRQ_WORK_SCHED) != 0 {
            return false;
        }

        self.state.fetch_or(IRQ_WORK_SCHED, Ordering::AcqRel) & IRQ_WORK_SCHED == 0
    }

    /// Está agendado?
    pub fn is_scheduled(&self) -> bool {
        self.state.load(Ordering::Acquire) & IRQ_WORK_SCHED != 0
    }

    /// Executa `func` se houver agendamento pendente.
    ///
    /// O bit SCHED é limpo ANTES de executar, então um `schedule` feito
    /// durante `func` não se perde. Retorna `true` se executou.
    pub fn run<F: FnOnce()>(&self, func: F) -> bool {
        let prev = self.state.fetch_and(!IRQ_WORK_SCHED, Ordering::AcqRel);
        if (prev & IRQ_WORK_SCHED) == 0 {
            return false;
        }

        self.state.fetch_or(IRQ_WORK_RUN, Ordering::Relaxed);
        func();
        self.state.fetch_and(!IRQ_WORK_RUN, Ordering::Release);

        true
    }
}

impl Default for IrqWork {
    fn default() -> Self {
        Self::new()
    }
}
