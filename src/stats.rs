//! Arquivo: stats.rs
//!
//! Propósito: Contadores estatísticos do pipeline VOP.
//! Usado para diagnóstico de commits, interrupções e timeouts de hardware.
//!
//! Detalhes de Implementação:
//! - Usa atômicos (AtomicU64) para atualizações concorrentes sem locks,
//!   inclusive a partir da metade superior da IRQ.
//! - Contadores monotônicos crescentes.

use core::sync::atomic::{AtomicU64, Ordering};

pub struct VopStats {
    pub commits: AtomicU64,
    pub deferred_commits: AtomicU64,
    pub confirmations: AtomicU64,
    pub frame_irqs: AtomicU64,
    pub unknown_irqs: AtomicU64,
    pub standby_timeouts: AtomicU64,
    pub dmc_timeouts: AtomicU64,
    pub forced_completions: AtomicU64,
    pub stalled_commits: AtomicU64,
}

impl VopStats {
    pub const fn new() -> Self {
        Self {
            commits: AtomicU64::new(0),
            deferred_commits: AtomicU64::new(0),
            confirmations: AtomicU64::new(0),
            frame_irqs: AtomicU64::new(0),
            unknown_irqs: AtomicU64::new(0),
            standby_timeouts: AtomicU64::new(0),
            dmc_timeouts: AtomicU64::new(0),
            forced_completions: AtomicU64::new(0),
            stalled_commits: AtomicU64::new(0),
        }
    }

    /// Incrementa contador de commits de registradores
    #[inline]
    pub fn inc_commits(&self) {
        self.commits.fetch_add(1, Ordering::Relaxed);
    }

    /// Incrementa contador de commits adiados por fence
    #[inline]
    pub fn inc_deferred_commits(&self) {
        self.deferred_commits.fetch_add(1, Ordering::Relaxed);
    }

    /// Incrementa contador de confirmações no vblank
    #[inline]
    pub fn inc_confirmations(&self) {
        self.confirmations.fetch_add(1, Ordering::Relaxed);
    }

    /// Incrementa contador de IRQs de frame start
    #[inline]
    pub fn inc_frame_irqs(&self) {
        self.frame_irqs.fetch_add(1, Ordering::Relaxed);
    }

    /// Incrementa contador de bits de IRQ desconhecidos
    #[inline]
    pub fn inc_unknown_irqs(&self) {
        self.unknown_irqs.fetch_add(1, Ordering::Relaxed);
    }

    /// Incrementa contador de timeouts de standby
    #[inline]
    pub fn inc_standby_timeouts(&self) {
        self.standby_timeouts.fetch_add(1, Ordering::Relaxed);
    }

    /// Incrementa contador de timeouts do line flag (DMC)
    #[inline]
    pub fn inc_dmc_timeouts(&self) {
        self.dmc_timeouts.fetch_add(1, Ordering::Relaxed);
    }

    /// Incrementa contador de conclusões forçadas no disable
    #[inline]
    pub fn inc_forced_completions(&self) {
        self.forced_completions.fetch_add(1, Ordering::Relaxed);
    }

    /// Incrementa contador de esperas que estouraram o prazo no gate
    #[inline]
    pub fn inc_stalled_commits(&self) {
        self.stalled_commits.fetch_add(1, Ordering::Relaxed);
    }

    /// Imprime estatísticas no log
    pub fn dump(&self) {
        crate::kinfo!("--- Estatísticas do VOP ---");
        crate::kinfo!("Commits:          ", self.commits.load(Ordering::Relaxed));
        crate::kinfo!(
            "Commits adiados:  ",
            self.deferred_commits.load(Ordering::Relaxed)
        );
        crate::kinfo!(
            "Confirmações:     ",
            self.confirmations.load(Ordering::Relaxed)
        );
        crate::kinfo!("IRQs de frame:    ", self.frame_irqs.load(Ordering::Relaxed));
        crate::kinfo!(
            "IRQs desconhecidas:",
            self.unknown_irqs.load(Ordering::Relaxed)
        );
        crate::kinfo!(
            "Timeouts standby: ",
            self.standby_timeouts.load(Ordering::Relaxed)
        );
        crate::kinfo!("Timeouts DMC:     ", self.dmc_timeouts.load(Ordering::Relaxed));
        crate::kinfo!(
            "Conclusões forçadas:",
            self.forced_completions.load(Ordering::Relaxed)
        );
        crate::kinfo!(
            "Commits travados: ",
            self.stalled_commits.load(Ordering::Relaxed)
        );
        crate::kinfo!("--------------------");
    }
}

impl Default for VopStats {
    fn default() -> Self {
        Self::new()
    }
}
