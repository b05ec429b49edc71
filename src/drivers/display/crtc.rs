//! # CRTC - Pipeline do VOP
//!
//! Dono do banco de registradores, dos planos e do ciclo de vida do
//! pipeline: bind/unbind, enable/disable e troca de timing. As operações
//! de plano ficam em `plane.rs`, as de IRQ em `irq.rs` e o acordo com o
//! coordenador de DMC em `dmc.rs`, todas como `impl Vop`.
//!
//! ## Locks
//!
//! ```text
//! lifecycle  → serializa enable/disable/change_timing/unbind
//! plane.state → pending/front de um plano
//! reg_lock   → read-modify-write dos registradores de janela e controle
//! irq_lock   → read-modify-write de INTR_CTRL0
//! ```
//!
//! Ordem: lifecycle → plane.state → (mode | reg_lock). `irq_lock` nunca
//! aninha com os outros.

use alloc::boxed::Box;
use alloc::sync::Arc;
use alloc::vec::Vec;
use core::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use spin::Mutex;

use super::buffer::Framebuffer;
use super::dmc::{DmcCoordinator, DmcThresholds};
use super::error::VopError;
use super::plane::Plane;
use super::regs::IntrStatus;
use super::shadow::RegisterBank;
use super::timing::{ConnectorType, DisplayMode, OutputConfig};
use super::variant::VopData;
use crate::hal::{
    ClockGate, DmaMapping, HalError, IrqLine, Monotonic, PowerDomain, RegisterIo, ResetLine,
};
use crate::stats::VopStats;
use crate::sync::{Completion, IrqWork};

// ============================================================================
// COLABORADORES EXTERNOS
// ============================================================================

/// Subsistema de timing/vblank (contagem de referências e eventos).
pub trait VblankHandler: Send + Sync {
    /// Notifica um início de frame no pipe.
    fn handle_vblank(&self, pipe: usize);

    /// Adquire uma referência de vblank (mantém a IRQ de frame ligada).
    fn vblank_get(&self, pipe: usize) -> Result<(), HalError>;

    /// Libera uma referência de vblank.
    fn vblank_put(&self, pipe: usize);

    /// Pipeline ligado: vblank volta a ser contado.
    fn vblank_on(&self, pipe: usize);

    /// Pipeline desligado: descarta waiters de vblank.
    fn vblank_off(&self, pipe: usize);
}

/// Recursos de plataforma do VOP.
pub struct VopPlatform {
    /// Clock do barramento AHB (acesso aos registradores).
    pub hclk: Box<dyn ClockGate>,
    /// Pixel clock.
    pub dclk: Box<dyn ClockGate>,
    /// Clock do barramento AXI (leitura de memória).
    pub aclk: Box<dyn ClockGate>,
    pub ahb_rst: Box<dyn ResetLine>,
    pub dclk_rst: Box<dyn ResetLine>,
    pub power: Box<dyn PowerDomain>,
    pub iommu: Box<dyn DmaMapping>,
    pub irq: Box<dyn IrqLine>,
    pub clock: Arc<dyn Monotonic>,
    pub vblank: Arc<dyn VblankHandler>,
    pub dmc: Arc<dyn DmcCoordinator>,
}

// ============================================================================
// CONFIG
// ============================================================================

/// Timeouts e limiares de runtime.
#[derive(Debug, Clone, Copy)]
pub struct VopConfig {
    /// Espera máxima por um commit em voo durante o disable.
    pub drain_timeout_ns: u64,
    /// Espera máxima pela confirmação de standby.
    pub standby_timeout_ns: u64,
    pub dmc: DmcThresholds,
}

impl VopConfig {
    pub const DEFAULT: VopConfig = VopConfig {
        drain_timeout_ns: 100_000_000,
        standby_timeout_ns: 50_000_000,
        dmc: DmcThresholds::DEFAULT,
    };
}

impl Default for VopConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

// ============================================================================
// VOP
// ============================================================================

/// Um pipeline de display (VOP + seus planos).
pub struct Vop {
    pub(super) pipe: usize,
    pub(super) data: &'static VopData,
    pub(super) config: VopConfig,
    pub(super) regs: RegisterBank,
    pub(super) reg_lock: Mutex<()>,
    pub(super) irq_lock: Mutex<()>,
    pub(super) planes: Vec<Plane>,
    pub(super) enabled: AtomicBool,
    pub(super) mode: Mutex<DisplayMode>,
    pub(super) output: Mutex<OutputConfig>,
    lifecycle: Mutex<()>,
    pub(super) platform: VopPlatform,
    pub(super) dsp_hold_completion: Completion,
    pub(super) dmc_completion: Completion,
    pub(super) isr_time_ns: AtomicU64,
    pub(super) vblank_time_ns: AtomicU64,
    pub(super) dmc_disabled: AtomicBool,
    pub(super) bottom_half: IrqWork,
    pub stats: VopStats,
}

impl Vop {
    /// Cria o pipeline: planos, reset do bloco e carga da tabela de init.
    ///
    /// O pipeline sai desligado, com a IRQ mascarada.
    pub fn bind(
        data: &'static VopData,
        io: Box<dyn RegisterIo>,
        platform: VopPlatform,
        config: VopConfig,
        pipe: usize,
    ) -> Result<Arc<Self>, VopError> {
        crate::kinfo!("(VOP) Bind do pipeline ", pipe);

        let planes = data
            .win
            .iter()
            .enumerate()
            .map(|(i, win)| Plane::new(i, win))
            .collect();

        let vop = Vop {
            pipe,
            data,
            config,
            regs: RegisterBank::new(io),
            reg_lock: Mutex::new(()),
            irq_lock: Mutex::new(()),
            planes,
            enabled: AtomicBool::new(false),
            mode: Mutex::new(DisplayMode::default()),
            output: Mutex::new(OutputConfig::default()),
            lifecycle: Mutex::new(()),
            platform,
            dsp_hold_completion: Completion::new(),
            dmc_completion: Completion::new(),
            isr_time_ns: AtomicU64::new(0),
            vblank_time_ns: AtomicU64::new(config.dmc.default_timeout_ns),
            dmc_disabled: AtomicBool::new(false),
            bottom_half: IrqWork::new(),
            stats: VopStats::new(),
        };

        vop.initial()?;

        crate::kinfo!("(VOP) Planos registrados: ", vop.planes.len());
        Ok(Arc::new(vop))
    }

    /// Destrói o pipeline: desliga, solta todos os planos e os clocks.
    pub fn unbind(&self) {
        self.disable();

        // Desligado: o disable de cada plano solta o buffer na hora
        for idx in 0..self.planes.len() {
            if self.acquire_gate_bounded(idx) && self.disable_plane_gated(idx).is_err() {
                crate::kwarn!("(VOP) Falha ao desligar plano no unbind: ", idx);
            }
            self.planes[idx].detach();
        }

        let p = &self.platform;
        p.aclk.unprepare();
        p.dclk.unprepare();
        p.hclk.unprepare();

        self.stats.dump();
        crate::kinfo!("(VOP) Unbind do pipeline ", self.pipe);
    }

    /// Identidade do pipeline.
    pub fn pipe(&self) -> usize {
        self.pipe
    }

    /// Pipeline ligado?
    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Acquire)
    }

    /// Número de planos.
    pub fn num_planes(&self) -> usize {
        self.planes.len()
    }

    /// Modo de vídeo atual.
    pub fn mode(&self) -> DisplayMode {
        *self.mode.lock()
    }

    /// Banco de registradores (sombra + hardware).
    pub fn registers(&self) -> &RegisterBank {
        &self.regs
    }

    /// Configura conector e formato de saída (aplicado no próximo timing).
    pub fn set_output(&self, output: OutputConfig) {
        *self.output.lock() = output;
    }

    // ------------------------------------------------------------------------
    // Bind
    // ------------------------------------------------------------------------

    fn initial(&self) -> Result<(), VopError> {
        let p = &self.platform;

        p.hclk.prepare().map_err(VopError::Clock)?;
        if let Err(e) = p.dclk.prepare() {
            crate::kerror!("(VOP) Falha ao preparar dclk");
            p.hclk.unprepare();
            return Err(VopError::Clock(e));
        }
        if let Err(e) = p.aclk.prepare() {
            crate::kerror!("(VOP) Falha ao preparar aclk");
            p.dclk.unprepare();
            p.hclk.unprepare();
            return Err(VopError::Clock(e));
        }

        if let Err(e) = self.reset_and_load() {
            p.aclk.unprepare();
            p.dclk.unprepare();
            p.hclk.unprepare();
            return Err(e);
        }

        Ok(())
    }

    fn reset_and_load(&self) -> Result<(), VopError> {
        let p = &self.platform;

        if let Err(e) = p.hclk.enable() {
            crate::kerror!("(VOP) Falha ao ligar hclk");
            return Err(VopError::Clock(e));
        }

        self.regs.set_live(true);
        let result = self.load_initial_state();
        self.regs.set_live(false);

        p.hclk.disable();
        result
    }

    fn load_initial_state(&self) -> Result<(), VopError> {
        let p = &self.platform;

        // Reset do domínio AHB: registradores voltam ao default
        p.ahb_rst.assert().map_err(VopError::Reset)?;
        p.clock.delay_us(10);
        p.ahb_rst.deassert().map_err(VopError::Reset)?;

        self.regs.snapshot();

        {
            let _guard = self.reg_lock.lock();
            for &(offset, value) in self.data.init_table {
                self.regs.write(offset, value);
            }
            for win in self.data.win {
                self.regs.set(win.base, win.phy.enable, 0);
            }
            self.regs.cfg_done();
        }

        // Reset do domínio de pixel: aplica a configuração acima
        p.dclk_rst.assert().map_err(VopError::Reset)?;
        p.clock.delay_us(10);
        p.dclk_rst.deassert().map_err(VopError::Reset)?;

        Ok(())
    }

    // ------------------------------------------------------------------------
    // Enable / Disable
    // ------------------------------------------------------------------------

    /// Liga o pipeline.
    ///
    /// Sequência: energia → hclk → dclk → aclk → IOMMU → restaura sombra →
    /// sai do standby → IRQ → vblank → DMC. Qualquer falha desfaz os passos
    /// anteriores e deixa o pipeline desligado.
    pub fn enable(self: &Arc<Self>) -> Result<(), VopError> {
        let _life = self.lifecycle.lock();
        if self.is_enabled() {
            return Ok(());
        }

        let p = &self.platform;

        p.power.get().map_err(VopError::Power)?;

        if let Err(e) = self.enable_clocks() {
            p.power.put();
            return Err(e);
        }

        if let Err(e) = p.iommu.attach() {
            crate::kerror!("(VOP) Falha ao anexar IOMMU");
            self.disable_clocks();
            p.power.put();
            return Err(VopError::DmaAttach(e));
        }

        // Os registradores ficaram só na sombra enquanto desligado
        self.regs.set_live(true);
        self.regs.flush();

        self.enabled.store(true, Ordering::Release);

        {
            let _guard = self.reg_lock.lock();
            self.regs.set(0, self.data.ctrl.standby, 0);
        }

        p.irq.enable();
        p.vblank.vblank_on(self.pipe);

        self.dmc_attach();

        crate::kinfo!("(VOP) Pipeline habilitado, pipe=", self.pipe);
        Ok(())
    }

    fn enable_clocks(&self) -> Result<(), VopError> {
        let p = &self.platform;

        if let Err(e) = p.hclk.enable() {
            crate::kerror!("(VOP) Falha ao ligar hclk");
            return Err(VopError::Clock(e));
        }
        if let Err(e) = p.dclk.enable() {
            crate::kerror!("(VOP) Falha ao ligar dclk");
            p.hclk.disable();
            return Err(VopError::Clock(e));
        }
        if let Err(e) = p.aclk.enable() {
            crate::kerror!("(VOP) Falha ao ligar aclk");
            p.dclk.disable();
            p.hclk.disable();
            return Err(VopError::Clock(e));
        }

        Ok(())
    }

    fn disable_clocks(&self) {
        let p = &self.platform;
        p.aclk.disable();
        p.dclk.disable();
        p.hclk.disable();
    }

    /// Desliga o pipeline.
    ///
    /// Desliga todos os planos, drena os commits em voo (forçando a
    /// conclusão se o hardware não confirmar a tempo), entra em standby e
    /// solta IRQ, IOMMU, clocks e energia. Timeouts são registrados e o
    /// disable segue.
    pub fn disable(&self) {
        let _life = self.lifecycle.lock();
        if !self.is_enabled() {
            return;
        }

        crate::kdebug!("(VOP) Desligando pipeline ", self.pipe);

        for idx in 0..self.planes.len() {
            if !self.acquire_gate_bounded(idx) {
                continue;
            }
            if self.disable_plane_gated(idx).is_err() {
                crate::kwarn!("(VOP) Falha ao desligar plano ", idx);
            }
        }

        // Espera as confirmações de desligamento dos planos
        for idx in 0..self.planes.len() {
            if self.acquire_gate_bounded(idx) {
                self.planes[idx].gate.complete();
            }
        }

        self.dmc_detach();

        let p = &self.platform;
        p.vblank.vblank_off(self.pipe);

        self.dsp_hold_completion.reinit();
        self.set_irq_enabled(IntrStatus::DSP_HOLD_VALID, true);

        {
            let _guard = self.reg_lock.lock();
            self.regs.set(0, self.data.ctrl.standby, 1);
        }

        if !self
            .dsp_hold_completion
            .wait_timeout(p.clock.as_ref(), self.config.standby_timeout_ns)
        {
            crate::kerror!("(VOP) Timeout esperando standby, pipe=", self.pipe);
            self.stats.inc_standby_timeouts();
        }

        // Sem vblank daqui em diante: nada mais será confirmado
        for idx in 0..self.planes.len() {
            self.force_complete(idx);
        }

        self.set_irq_enabled(IntrStatus::DSP_HOLD_VALID, false);
        p.irq.disable();

        self.enabled.store(false, Ordering::Release);
        self.regs.set_live(false);

        p.iommu.detach();
        self.disable_clocks();
        p.power.put();

        crate::kinfo!("(VOP) Pipeline desligado, pipe=", self.pipe);
    }

    /// Espera o gate do plano com prazo; no estouro força a conclusão do
    /// commit pendente. Retorna se o gate ficou com o chamador.
    fn acquire_gate_bounded(&self, idx: usize) -> bool {
        let plane = &self.planes[idx];
        let clock = self.platform.clock.as_ref();

        plane.gate.wait_timeout(clock, self.config.drain_timeout_ns) || self.reclaim_gate(idx)
    }

    /// Toma o gate de um plano cuja espera estourou o prazo.
    ///
    /// Sem commit pendente o gate pode ter sido solto pela metade inferior
    /// depois do prazo; só um commit parado em fence fica de fora.
    pub(super) fn reclaim_gate(&self, idx: usize) -> bool {
        let plane = &self.planes[idx];

        if self.force_complete(idx) {
            plane.gate.wait();
            return true;
        }
        if plane.gate.try_wait() {
            return true;
        }

        crate::kwarn!("(VOP) Commit aguardando fence no disable, plano=", idx);
        false
    }

    // ------------------------------------------------------------------------
    // Timing
    // ------------------------------------------------------------------------

    /// Reprograma o timing de saída.
    ///
    /// Com o pixel clock parado: conector, polaridade, totais, sync, área
    /// ativa e janela pós-escala. `base` reposiciona o plano primário antes
    /// do reset do domínio de pixel.
    pub fn change_timing(
        self: &Arc<Self>,
        mode: &DisplayMode,
        base: Option<ScanoutBase>,
    ) -> Result<(), VopError> {
        let _life = self.lifecycle.lock();

        if !mode.is_valid() {
            crate::kerror!("(VOP) Modo de vídeo inválido");
            return Err(VopError::InvalidMode);
        }
        if !self.is_enabled() {
            return Err(VopError::NotEnabled);
        }

        let p = &self.platform;
        let pixclk_hz = mode.clock_khz as u64 * 1_000;
        let vblank_time = mode.vblank_time_ns(p.dclk.round_rate(pixclk_hz));
        let short_vblank = vblank_time <= self.config.dmc.threshold_ns();

        if short_vblank {
            self.dmc_pause_for_short_vblank();
        }

        // Commit em voo no primário nunca confirmaria com o dclk parado
        if let Some(primary) = self.primary_index() {
            self.wait_gate(primary);
            self.planes[primary].gate.complete();
        }

        p.dclk.disable();

        self.program_timing(mode);
        *self.mode.lock() = *mode;

        let rebase = match base {
            Some(b) => self.mode_set_base(b.fb, b.x, b.y),
            None => Ok(()),
        };

        // Reset do domínio de pixel: registradores de timing valem já
        let reset = p
            .dclk_rst
            .assert()
            .and_then(|_| {
                p.clock.delay_us(10);
                p.dclk_rst.deassert()
            })
            .map_err(VopError::Reset);

        if let Err(e) = p.dclk.enable() {
            crate::kerror!("(VOP) Falha ao religar dclk");
            return Err(VopError::Clock(e));
        }
        if p.dclk.set_rate(pixclk_hz).is_err() {
            crate::kwarn!("(VOP) Falha ao programar pixel clock: ", pixclk_hz);
        }

        if !short_vblank {
            self.dmc_resume_with_vblank(vblank_time);
        }

        rebase?;
        reset?;

        crate::kdebug!("(VOP) Timing aplicado, vblank_ns=", vblank_time);
        Ok(())
    }

    fn program_timing(&self, mode: &DisplayMode) {
        let ctrl = self.data.ctrl;
        let output = *self.output.lock();

        let htotal = mode.htotal as u32;
        let hsync_len = (mode.hsync_end - mode.hsync_start) as u32;
        let hact_st = mode.hact_start();
        let hact_end = hact_st + mode.hdisplay as u32;
        let vtotal = mode.vtotal as u32;
        let vsync_len = (mode.vsync_end - mode.vsync_start) as u32;
        let vact_st = mode.vact_start();
        let vact_end = mode.vact_end();

        let _guard = self.reg_lock.lock();
        let regs = &self.regs;

        match output.connector {
            ConnectorType::Edp => regs.set(0, ctrl.edp_en, 1),
            ConnectorType::Hdmi => regs.set(0, ctrl.hdmi_en, 1),
            ConnectorType::Dsi => regs.set(0, ctrl.mipi_en, 1),
            ConnectorType::Lvds => regs.set(0, ctrl.rgb_en, 1),
        }
        regs.set(0, ctrl.out_mode, output.out_mode as u32);
        regs.set(0, ctrl.pin_pol, mode.pin_polarity());

        regs.set(0, ctrl.htotal_pw, (htotal << 16) | hsync_len);
        let hact = (hact_st << 16) | hact_end;
        regs.set(0, ctrl.hact_st_end, hact);
        regs.set(0, ctrl.hpost_st_end, hact);

        regs.set(0, ctrl.vtotal_pw, (vtotal << 16) | vsync_len);
        let vact = (vact_st << 16) | vact_end;
        regs.set(0, ctrl.vact_st_end, vact);
        regs.set(0, ctrl.vpost_st_end, vact);
    }
}

/// Framebuffer e origem de scan-out do plano primário.
pub struct ScanoutBase {
    pub fb: Arc<Framebuffer>,
    pub x: u32,
    pub y: u32,
}
