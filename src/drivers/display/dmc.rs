//! # Coordenação com o DMC
//!
//! O controlador de memória (DMC) troca de frequência apenas dentro do
//! vblank. Antes de trocar, o coordenador pergunta a cada pipeline até
//! quando a troca é segura; o pipeline espera o LINE_FLAG (fim da área
//! ativa) e responde `instante do flag + margem de vblank`.
//!
//! Se a margem de vblank é curta demais para a troca, o pipeline pausa o
//! escalonamento de frequência enquanto estiver ligado.

use alloc::sync::{Arc, Weak};
use core::sync::atomic::Ordering;

use super::crtc::Vop;
use super::error::VopError;

/// Limiares de tempo do DMC (ns).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DmcThresholds {
    /// Duração de uma troca de frequência.
    pub set_rate_time_ns: u64,
    /// Tempo para pausar as CPUs antes da troca.
    pub pause_cpu_time_ns: u64,
    /// Margem assumida quando o modo tem vblank curto.
    pub default_timeout_ns: u64,
    /// Espera máxima pelo LINE_FLAG.
    pub line_flag_timeout_ns: u64,
}

impl DmcThresholds {
    pub const DEFAULT: DmcThresholds = DmcThresholds {
        set_rate_time_ns: 500_000,
        pause_cpu_time_ns: 200_000,
        default_timeout_ns: 500_000,
        line_flag_timeout_ns: 100_000_000,
    };

    /// Margem de vblank mínima para deixar o DMC trocar de frequência.
    pub const fn threshold_ns(&self) -> u64 {
        self.set_rate_time_ns + self.pause_cpu_time_ns
    }
}

impl Default for DmcThresholds {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Cliente do coordenador (um por pipeline).
pub trait DmcClient: Send + Sync {
    /// Instante (ns, relógio monotônico) até o qual a troca é segura.
    fn rate_change_deadline(&self) -> Result<u64, VopError>;
}

/// Coordenador de frequência da memória (sistema externo).
pub trait DmcCoordinator: Send + Sync {
    fn register(&self, pipe: usize, client: Weak<dyn DmcClient>);

    fn unregister(&self, pipe: usize);

    /// Suspende as trocas de frequência (contado).
    fn pause(&self);

    /// Desfaz um `pause`.
    fn resume(&self);
}

impl Vop {
    /// Registra o pipeline no coordenador (enable).
    pub(super) fn dmc_attach(self: &Arc<Self>) {
        let dmc = &self.platform.dmc;

        if !self.dmc_disabled.load(Ordering::Acquire)
            && self.vblank_time_ns.load(Ordering::Acquire) <= self.config.dmc.threshold_ns()
        {
            dmc.pause();
            self.dmc_disabled.store(true, Ordering::Release);
        }

        let weak: Weak<Vop> = Arc::downgrade(self);
        let client: Weak<dyn DmcClient> = weak;
        dmc.register(self.pipe, client);
    }

    /// Sai do coordenador (disable).
    pub(super) fn dmc_detach(&self) {
        let dmc = &self.platform.dmc;
        dmc.unregister(self.pipe);
        if self.dmc_disabled.swap(false, Ordering::AcqRel) {
            dmc.resume();
        }
    }

    /// Modo com vblank curto: assume a margem padrão e pausa o DMC.
    pub(super) fn dmc_pause_for_short_vblank(&self) {
        self.vblank_time_ns
            .store(self.config.dmc.default_timeout_ns, Ordering::Release);
        if !self.dmc_disabled.swap(true, Ordering::AcqRel) {
            self.platform.dmc.pause();
        }
    }

    /// Modo com vblank longo: guarda a margem e libera o DMC.
    pub(super) fn dmc_resume_with_vblank(&self, vblank_time_ns: u64) {
        self.vblank_time_ns.store(vblank_time_ns, Ordering::Release);
        if self.dmc_disabled.swap(false, Ordering::AcqRel) {
            self.platform.dmc.resume();
        }
    }

    /// DMC pausado por este pipeline?
    pub fn dmc_paused(&self) -> bool {
        self.dmc_disabled.load(Ordering::Acquire)
    }
}

impl DmcClient for Vop {
    fn rate_change_deadline(&self) -> Result<u64, VopError> {
        if !self.is_enabled() {
            crate::kwarn!("(VOP) Pedido do DMC com pipeline desligado");
            return Err(VopError::NotEnabled);
        }

        self.dmc_completion.reinit();
        self.arm_line_flag();

        let clock = self.platform.clock.as_ref();
        let fired = self
            .dmc_completion
            .wait_timeout(clock, self.config.dmc.line_flag_timeout_ns);

        self.disarm_line_flag();

        if !fired {
            crate::kerror!("(VOP) Timeout esperando LINE_FLAG, pipe=", self.pipe);
            self.stats.inc_dmc_timeouts();
            return Err(VopError::Timeout);
        }

        let isr_time = self.isr_time_ns.load(Ordering::Acquire);
        Ok(isr_time + self.vblank_time_ns.load(Ordering::Acquire))
    }
}
