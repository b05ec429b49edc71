//! Hardware e colaboradores falsos para os testes do VOP.
//!
//! `FakeVop` modela o comportamento que o driver depende:
//! - registradores de janela são latchados só no frame seguinte a um
//!   `CFG_DONE` (ou no reset do domínio de pixel);
//! - status de `INTR_CTRL0` é W1C e só sobe se a causa estiver habilitada;
//! - com `standby` ligado o frame seguinte levanta DSP_HOLD em vez de FS.

use std::sync::atomic::{AtomicBool, AtomicI32, AtomicU64, AtomicUsize, Ordering};
use std::ops::Deref;
use std::sync::{Arc, Mutex, Weak};
use std::thread;
use std::time::{Duration, Instant};

use crate::drivers::display::crtc::{VblankHandler, Vop, VopConfig, VopPlatform};
use crate::drivers::display::dmc::{DmcClient, DmcCoordinator, DmcThresholds};
use crate::drivers::display::error::VopError;
use crate::drivers::display::fence::{FenceError, ReadyCallback, Reservation, SwFence};
use crate::drivers::display::regs::{
    IntrStatus, INTR_CLR_SHIFT, INTR_CTRL0, INTR_EN_SHIFT, INTR_MASK, REG_CFG_DONE, SYS_CTRL,
};
use crate::drivers::display::timing::{DisplayMode, ModeFlags};
use crate::drivers::display::variant::RK3288_VOP;
use crate::drivers::display::{BufferObject, Framebuffer, PixelFormat};
use crate::hal::{
    ClockGate, DmaMapping, HalError, IrqLine, IrqReturn, Monotonic, PowerDomain, RegisterIo,
    ResetLine,
};

// ============================================================================
// LOG DE EVENTOS
// ============================================================================

/// Sequência de chamadas aos colaboradores, para checar ordem.
#[derive(Clone, Default)]
pub struct EventLog(Arc<Mutex<Vec<String>>>);

impl EventLog {
    pub fn push(&self, event: &str) {
        self.0.lock().unwrap().push(event.to_string());
    }

    pub fn events(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }

    pub fn clear(&self) {
        self.0.lock().unwrap().clear();
    }

    /// Posição da primeira ocorrência de `event`.
    pub fn index_of(&self, event: &str) -> Option<usize> {
        self.0.lock().unwrap().iter().position(|e| e == event)
    }
}

// ============================================================================
// VOP FALSO
// ============================================================================

const WIN_REGS: std::ops::Range<u32> = 0x30..0x140;
const STANDBY_BIT: u32 = 1 << 22;

struct FakeRegs {
    live: Vec<u32>,
    staged: Vec<u32>,
    cfg_pending: bool,
}

pub struct FakeVop {
    regs: Mutex<FakeRegs>,
    /// Hardware "travado": não latcha nada.
    stalled: AtomicBool,
    writes: AtomicUsize,
}

impl FakeVop {
    pub fn new(len: usize) -> Arc<Self> {
        Arc::new(Self {
            regs: Mutex::new(FakeRegs {
                live: vec![0; len / 4],
                staged: vec![0; len / 4],
                cfg_pending: false,
            }),
            stalled: AtomicBool::new(false),
            writes: AtomicUsize::new(0),
        })
    }

    /// Valores de reset do bloco.
    pub fn reset(&self) {
        let mut r = self.regs.lock().unwrap();
        r.live.iter_mut().for_each(|w| *w = 0);
        r.staged.iter_mut().for_each(|w| *w = 0);
        r.live[0x04 / 4] = 0x0a05_0000;
        r.cfg_pending = false;
    }

    fn latch(r: &mut FakeRegs) {
        if !r.cfg_pending {
            return;
        }
        for off in WIN_REGS.step_by(4) {
            let i = (off / 4) as usize;
            r.live[i] = r.staged[i];
        }
        r.cfg_pending = false;
    }

    /// Reset do domínio de pixel: aplica o que está staged.
    pub fn pixel_reset(&self) {
        let mut r = self.regs.lock().unwrap();
        r.cfg_pending = true;
        Self::latch(&mut r);
    }

    /// Um frame de vídeo: latch + status de interrupção.
    pub fn frame(&self) {
        let mut r = self.regs.lock().unwrap();
        let intr_idx = (INTR_CTRL0 / 4) as usize;
        let intr = r.live[intr_idx];
        let enabled = (intr >> INTR_EN_SHIFT) & INTR_MASK;
        let standby = r.live[(SYS_CTRL / 4) as usize] & STANDBY_BIT != 0;

        let mut raised = 0;
        if standby {
            raised |= IntrStatus::DSP_HOLD_VALID.bits();
        } else {
            if !self.stalled.load(Ordering::Acquire) {
                Self::latch(&mut r);
            }
            raised |= IntrStatus::FS.bits() | IntrStatus::LINE_FLAG.bits();
        }

        r.live[intr_idx] |= raised & enabled;
    }

    /// Levanta status arbitrário (causas desconhecidas).
    pub fn raise(&self, bits: u32) {
        let mut r = self.regs.lock().unwrap();
        r.live[(INTR_CTRL0 / 4) as usize] |= bits & INTR_MASK;
    }

    pub fn set_stalled(&self, stalled: bool) {
        self.stalled.store(stalled, Ordering::Release);
    }

    /// Valor latchado (visível ao hardware).
    pub fn live(&self, offset: u32) -> u32 {
        self.regs.lock().unwrap().live[(offset / 4) as usize]
    }

    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::Acquire)
    }
}

/// Acesso do driver ao `FakeVop`.
pub struct FakeIo(pub Arc<FakeVop>);

impl RegisterIo for FakeIo {
    fn read(&self, offset: u32) -> u32 {
        self.0.live(offset)
    }

    fn write(&self, offset: u32, value: u32) {
        self.0.writes.fetch_add(1, Ordering::AcqRel);
        let mut r = self.0.regs.lock().unwrap();
        let i = (offset / 4) as usize;

        if offset == REG_CFG_DONE {
            r.cfg_pending = true;
        } else if offset == INTR_CTRL0 {
            let clear = (value >> INTR_CLR_SHIFT) & INTR_MASK;
            let status = r.live[i] & INTR_MASK & !clear;
            let keep = value & !INTR_MASK & !(INTR_MASK << INTR_CLR_SHIFT);
            r.live[i] = keep | status;
        } else if WIN_REGS.contains(&offset) {
            r.staged[i] = value;
        } else {
            r.live[i] = value;
        }
    }

    fn len(&self) -> usize {
        self.0.regs.lock().unwrap().live.len() * 4
    }
}

// ============================================================================
// PLATAFORMA FALSA
// ============================================================================

pub struct FakeClock {
    name: &'static str,
    log: EventLog,
    pub fail_enable: AtomicBool,
    pub fail_prepare: AtomicBool,
    pub prepared: AtomicI32,
    pub enabled: AtomicI32,
    pub rate: AtomicU64,
}

impl FakeClock {
    pub fn new(name: &'static str, log: &EventLog) -> Arc<Self> {
        Arc::new(Self {
            name,
            log: log.clone(),
            fail_enable: AtomicBool::new(false),
            fail_prepare: AtomicBool::new(false),
            prepared: AtomicI32::new(0),
            enabled: AtomicI32::new(0),
            rate: AtomicU64::new(0),
        })
    }

    fn event(&self, what: &str) {
        self.log.push(&format!("{}.{}", self.name, what));
    }
}

impl ClockGate for Arc<FakeClock> {
    fn prepare(&self) -> Result<(), HalError> {
        if self.fail_prepare.load(Ordering::Acquire) {
            return Err(HalError::IoError);
        }
        self.event("prepare");
        self.prepared.fetch_add(1, Ordering::AcqRel);
        Ok(())
    }

    fn unprepare(&self) {
        self.event("unprepare");
        self.prepared.fetch_sub(1, Ordering::AcqRel);
    }

    fn enable(&self) -> Result<(), HalError> {
        if self.fail_enable.load(Ordering::Acquire) {
            return Err(HalError::IoError);
        }
        self.event("enable");
        self.enabled.fetch_add(1, Ordering::AcqRel);
        Ok(())
    }

    fn disable(&self) {
        self.event("disable");
        self.enabled.fetch_sub(1, Ordering::AcqRel);
    }

    fn round_rate(&self, hz: u64) -> u64 {
        hz
    }

    fn set_rate(&self, hz: u64) -> Result<(), HalError> {
        self.rate.store(hz, Ordering::Release);
        Ok(())
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
pub enum ResetTarget {
    Ahb,
    Pixel,
}

pub struct FakeReset {
    target: ResetTarget,
    hw: Arc<FakeVop>,
    log: EventLog,
}

impl ResetLine for FakeReset {
    fn assert(&self) -> Result<(), HalError> {
        let name = match self.target {
            ResetTarget::Ahb => "ahb_rst.assert",
            ResetTarget::Pixel => "dclk_rst.assert",
        };
        self.log.push(name);
        if self.target == ResetTarget::Ahb {
            self.hw.reset();
        }
        Ok(())
    }

    fn deassert(&self) -> Result<(), HalError> {
        match self.target {
            ResetTarget::Ahb => self.log.push("ahb_rst.deassert"),
            ResetTarget::Pixel => {
                self.log.push("dclk_rst.deassert");
                self.hw.pixel_reset();
            }
        }
        Ok(())
    }
}

pub struct FakePower {
    log: EventLog,
    pub fail: AtomicBool,
    pub refs: AtomicI32,
}

impl PowerDomain for Arc<FakePower> {
    fn get(&self) -> Result<(), HalError> {
        if self.fail.load(Ordering::Acquire) {
            return Err(HalError::Busy);
        }
        self.log.push("power.get");
        self.refs.fetch_add(1, Ordering::AcqRel);
        Ok(())
    }

    fn put(&self) {
        self.log.push("power.put");
        self.refs.fetch_sub(1, Ordering::AcqRel);
    }
}

pub struct FakeIommu {
    log: EventLog,
    pub fail: AtomicBool,
    pub attached: AtomicBool,
}

impl DmaMapping for Arc<FakeIommu> {
    fn attach(&self) -> Result<(), HalError> {
        if self.fail.load(Ordering::Acquire) {
            return Err(HalError::IoError);
        }
        self.log.push("iommu.attach");
        self.attached.store(true, Ordering::Release);
        Ok(())
    }

    fn detach(&self) {
        self.log.push("iommu.detach");
        self.attached.store(false, Ordering::Release);
    }
}

pub struct FakeIrq {
    log: EventLog,
    pub enabled: AtomicBool,
}

impl IrqLine for Arc<FakeIrq> {
    fn enable(&self) {
        self.log.push("irq.enable");
        self.enabled.store(true, Ordering::Release);
    }

    fn disable(&self) {
        self.log.push("irq.disable");
        self.enabled.store(false, Ordering::Release);
    }
}

#[derive(Default)]
pub struct FakeVblank {
    pub refs: AtomicI32,
    pub fail_get: AtomicBool,
    pub handled: AtomicUsize,
    pub on: AtomicBool,
}

impl VblankHandler for FakeVblank {
    fn handle_vblank(&self, _pipe: usize) {
        self.handled.fetch_add(1, Ordering::AcqRel);
    }

    fn vblank_get(&self, _pipe: usize) -> Result<(), HalError> {
        if self.fail_get.load(Ordering::Acquire) {
            return Err(HalError::Busy);
        }
        self.refs.fetch_add(1, Ordering::AcqRel);
        Ok(())
    }

    fn vblank_put(&self, _pipe: usize) {
        self.refs.fetch_sub(1, Ordering::AcqRel);
    }

    fn vblank_on(&self, _pipe: usize) {
        self.on.store(true, Ordering::Release);
    }

    fn vblank_off(&self, _pipe: usize) {
        self.on.store(false, Ordering::Release);
    }
}

#[derive(Default)]
pub struct FakeDmc {
    pub paused: AtomicI32,
    pub client: Mutex<Option<Weak<dyn DmcClient>>>,
}

impl FakeDmc {
    pub fn client(&self) -> Option<Arc<dyn DmcClient>> {
        self.client.lock().unwrap().as_ref().and_then(|w| w.upgrade())
    }
}

impl DmcCoordinator for FakeDmc {
    fn register(&self, _pipe: usize, client: Weak<dyn DmcClient>) {
        *self.client.lock().unwrap() = Some(client);
    }

    fn unregister(&self, _pipe: usize) {
        *self.client.lock().unwrap() = None;
    }

    fn pause(&self) {
        self.paused.fetch_add(1, Ordering::AcqRel);
    }

    fn resume(&self) {
        self.paused.fetch_sub(1, Ordering::AcqRel);
    }
}

pub struct HostClock(Instant);

impl HostClock {
    pub fn new() -> Self {
        Self(Instant::now())
    }
}

impl Monotonic for HostClock {
    fn now_ns(&self) -> u64 {
        self.0.elapsed().as_nanos() as u64
    }
}

// ============================================================================
// RESERVA FALSA
// ============================================================================

/// Reserva com produtor controlado pelo teste.
#[derive(Default)]
pub struct FakeReservation {
    /// Produtor ainda escrevendo: callbacks ficam guardados.
    pub busy: AtomicBool,
    pub fail_reserve: AtomicBool,
    pub fail_callback: AtomicBool,
    pub reserved: AtomicI32,
    callbacks: Mutex<Vec<ReadyCallback>>,
    pub fences: Mutex<Vec<Arc<SwFence>>>,
}

impl FakeReservation {
    pub fn busy() -> Arc<Self> {
        let resv = Self::default();
        resv.busy.store(true, Ordering::Release);
        Arc::new(resv)
    }

    /// O produtor terminou: roda os callbacks registrados.
    pub fn signal(&self) {
        self.busy.store(false, Ordering::Release);
        let callbacks: Vec<ReadyCallback> = self.callbacks.lock().unwrap().drain(..).collect();
        for cb in callbacks {
            cb();
        }
    }

    pub fn pending_callbacks(&self) -> usize {
        self.callbacks.lock().unwrap().len()
    }
}

impl Reservation for FakeReservation {
    fn reserve_shared(&self) -> Result<(), FenceError> {
        if self.fail_reserve.load(Ordering::Acquire) {
            return Err(FenceError::NoSpace);
        }
        self.reserved.fetch_add(1, Ordering::AcqRel);
        Ok(())
    }

    fn release_shared(&self) {
        self.reserved.fetch_sub(1, Ordering::AcqRel);
    }

    fn add_callback(&self, cb: ReadyCallback) -> Result<(), FenceError> {
        if self.fail_callback.load(Ordering::Acquire) {
            return Err(FenceError::Invalid);
        }
        if self.busy.load(Ordering::Acquire) {
            self.callbacks.lock().unwrap().push(cb);
        } else {
            cb();
        }
        Ok(())
    }

    fn add_shared_fence(&self, fence: Arc<SwFence>) {
        self.fences.lock().unwrap().push(fence);
    }
}

// ============================================================================
// MODOS E BUFFERS
// ============================================================================

/// 640x480@60 (margem de vblank longa).
pub const MODE_VGA: DisplayMode = DisplayMode {
    clock_khz: 25_175,
    hdisplay: 640,
    hsync_start: 656,
    hsync_end: 752,
    htotal: 800,
    vdisplay: 480,
    vsync_start: 490,
    vsync_end: 492,
    vtotal: 525,
    flags: ModeFlags::NHSYNC.union(ModeFlags::NVSYNC),
};

/// 1920x1080@60 (margem de vblank curta).
pub const MODE_1080P: DisplayMode = DisplayMode {
    clock_khz: 148_500,
    hdisplay: 1920,
    hsync_start: 2008,
    hsync_end: 2052,
    htotal: 2200,
    vdisplay: 1080,
    vsync_start: 1084,
    vsync_end: 1089,
    vtotal: 1125,
    flags: ModeFlags::PHSYNC.union(ModeFlags::PVSYNC),
};

/// 4096x2160 (mais largo que o escalador).
pub const MODE_4K: DisplayMode = DisplayMode {
    clock_khz: 594_000,
    hdisplay: 4096,
    hsync_start: 4184,
    hsync_end: 4272,
    htotal: 4400,
    vdisplay: 2160,
    vsync_start: 2168,
    vsync_end: 2178,
    vtotal: 2250,
    flags: ModeFlags::PHSYNC.union(ModeFlags::PVSYNC),
};

/// Framebuffer RGB de um plano em `dma_addr`.
pub fn rgb_fb(id: u32, format: PixelFormat, w: u32, h: u32, dma_addr: u32) -> Arc<Framebuffer> {
    let pitch = w * format.cpp(0);
    let obj = Arc::new(BufferObject::new(dma_addr, (pitch * h) as usize));
    Framebuffer::single(id, format, w, h, pitch, obj).unwrap()
}

/// Framebuffer RGB cujo objeto tem reserva.
pub fn shared_fb(id: u32, w: u32, h: u32, dma_addr: u32, resv: Arc<FakeReservation>) -> Arc<Framebuffer> {
    let pitch = w * 4;
    let obj = Arc::new(BufferObject::with_reservation(dma_addr, (pitch * h) as usize, resv));
    Framebuffer::single(id, PixelFormat::Argb8888, w, h, pitch, obj).unwrap()
}

/// NV12 com luma e croma em objetos separados.
pub fn nv12_fb(id: u32, w: u32, h: u32, luma: u32, chroma: u32) -> Arc<Framebuffer> {
    let y = Arc::new(BufferObject::new(luma, (w * h) as usize));
    let uv = Arc::new(BufferObject::new(chroma, (w * h / 2) as usize));
    Framebuffer::new(id, PixelFormat::Nv12, w, h, [w, w], [0, 0], [Some(y), Some(uv)]).unwrap()
}

// ============================================================================
// RIG
// ============================================================================

pub const TEST_CONFIG: VopConfig = VopConfig {
    drain_timeout_ns: 20_000_000,
    standby_timeout_ns: 20_000_000,
    dmc: DmcThresholds {
        line_flag_timeout_ns: 20_000_000,
        ..DmcThresholds::DEFAULT
    },
};

/// Colaboradores falsos de um pipeline, antes do bind.
pub struct Parts {
    pub hw: Arc<FakeVop>,
    pub log: EventLog,
    pub hclk: Arc<FakeClock>,
    pub dclk: Arc<FakeClock>,
    pub aclk: Arc<FakeClock>,
    pub power: Arc<FakePower>,
    pub iommu: Arc<FakeIommu>,
    pub irq: Arc<FakeIrq>,
    pub vblank: Arc<FakeVblank>,
    pub dmc: Arc<FakeDmc>,
}

impl Parts {
    pub fn new() -> Self {
        let log = EventLog::default();
        Self {
            hw: FakeVop::new(RK3288_VOP.reg_len),
            hclk: FakeClock::new("hclk", &log),
            dclk: FakeClock::new("dclk", &log),
            aclk: FakeClock::new("aclk", &log),
            power: Arc::new(FakePower {
                log: log.clone(),
                fail: AtomicBool::new(false),
                refs: AtomicI32::new(0),
            }),
            iommu: Arc::new(FakeIommu {
                log: log.clone(),
                fail: AtomicBool::new(false),
                attached: AtomicBool::new(false),
            }),
            irq: Arc::new(FakeIrq {
                log: log.clone(),
                enabled: AtomicBool::new(false),
            }),
            vblank: Arc::new(FakeVblank::default()),
            dmc: Arc::new(FakeDmc::default()),
            log,
        }
    }

    fn platform(&self) -> VopPlatform {
        VopPlatform {
            hclk: Box::new(self.hclk.clone()),
            dclk: Box::new(self.dclk.clone()),
            aclk: Box::new(self.aclk.clone()),
            ahb_rst: Box::new(FakeReset {
                target: ResetTarget::Ahb,
                hw: self.hw.clone(),
                log: self.log.clone(),
            }),
            dclk_rst: Box::new(FakeReset {
                target: ResetTarget::Pixel,
                hw: self.hw.clone(),
                log: self.log.clone(),
            }),
            power: Box::new(self.power.clone()),
            iommu: Box::new(self.iommu.clone()),
            irq: Box::new(self.irq.clone()),
            clock: Arc::new(HostClock::new()),
            vblank: self.vblank.clone(),
            dmc: self.dmc.clone(),
        }
    }

    pub fn bind(&self) -> Result<Arc<Vop>, VopError> {
        Vop::bind(
            &RK3288_VOP,
            Box::new(FakeIo(self.hw.clone())),
            self.platform(),
            TEST_CONFIG,
            0,
        )
    }
}

/// Pipeline ligado a um `FakeVop` e colaboradores falsos.
pub struct Rig {
    pub vop: Arc<Vop>,
    parts: Parts,
}

impl Deref for Rig {
    type Target = Parts;

    fn deref(&self) -> &Parts {
        &self.parts
    }
}

impl Rig {
    /// Pipeline após bind, desligado.
    pub fn bound() -> Self {
        let parts = Parts::new();
        let vop = parts.bind().expect("bind");
        Self { vop, parts }
    }

    /// Pipeline ligado em `mode`, com a IRQ de vblank habilitada.
    pub fn enabled_with(mode: &DisplayMode) -> Self {
        let rig = Self::bound();
        rig.vop.enable().expect("enable");
        rig.vop.change_timing(mode, None).expect("timing");
        rig.vop.enable_vblank().expect("vblank");
        rig
    }

    pub fn enabled() -> Self {
        Self::enabled_with(&MODE_VGA)
    }

    /// Um frame: hardware, metade superior e, se pedida, a inferior.
    pub fn frame(&self) -> IrqReturn {
        self.hw.frame();
        let ret = self.vop.isr();
        if ret == IrqReturn::WakeThread {
            self.vop.irq_thread();
        }
        ret
    }

    /// Gera frames em outra thread até o `Pump` ser solto.
    pub fn pump(&self) -> Pump {
        let stop = Arc::new(AtomicBool::new(false));
        let hw = self.hw.clone();
        let vop = self.vop.clone();
        let flag = stop.clone();
        let handle = thread::spawn(move || {
            while !flag.load(Ordering::Acquire) {
                hw.frame();
                if vop.isr() == IrqReturn::WakeThread {
                    vop.irq_thread();
                }
                thread::sleep(Duration::from_micros(200));
            }
        });
        Pump {
            stop,
            handle: Some(handle),
        }
    }
}

/// Thread de frames.
pub struct Pump {
    stop: Arc<AtomicBool>,
    handle: Option<thread::JoinHandle<()>>,
}

impl Drop for Pump {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::Release);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}
