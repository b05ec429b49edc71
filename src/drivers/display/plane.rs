//! # Planos (Janelas do VOP)
//!
//! Máquina de estados de commit de um plano:
//!
//! ```text
//! IDLE ──request_update──▶ COMMIT_PENDING ──vblank confirmado──▶ IDLE
//!   ▲                                                              │
//!   └──────────────── (sem vblank: volta na hora) ─────────────────┘
//! ```
//!
//! Cada plano tem um gate binário (`Completion` nascido livre): quem passa
//! pelo `wait` é dono do commit até devolver o gate. Um commit que precisa
//! de vblank só devolve o gate quando a metade inferior da IRQ confirma que
//! o hardware latchou os registradores novos.
//!
//! Disable é um commit com buffer vazio.

use alloc::boxed::Box;
use alloc::sync::Arc;
use core::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use spin::Mutex;

use super::buffer::Framebuffer;
use super::crtc::Vop;
use super::error::VopError;
use super::fence::{self, FenceGate, ReadyCallback, SwFence};
use super::rect::{self, Rect, SCALE_ONE};
use super::regs::{DST_ALPHA_SRC_INVERSE, SRC_ALPHA_PER_PIXEL};
use super::scale::ScaleConfig;
use super::variant::{PlaneKind, WinData};
use crate::sync::Completion;

// ============================================================================
// ESTADO
// ============================================================================

/// Geometria e endereços produzidos por um pedido de atualização.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommitRecord {
    /// Origem em 16.16.
    pub src: Rect,
    /// Destino em pixels.
    pub dest: Rect,
    pub yrgb_mst: u32,
    /// Base do croma (apenas YUV).
    pub uv_mst: Option<u32>,
    /// Escala pré-calculada (apenas janelas com escalador).
    pub scale: Option<ScaleConfig>,
}

/// Estado mutável de um plano. Protegido por `Plane::state`.
#[derive(Default)]
pub(super) struct PlaneState {
    /// Buffer sendo lido pelo hardware.
    pub front: Option<Arc<Framebuffer>>,
    /// Buffer do commit em voo (`None` = disable).
    pub pending_fb: Option<Arc<Framebuffer>>,
    pub pending_yrgb_mst: u32,
    pub pending_event: Option<Arc<Completion>>,
    pub pending_needs_vblank: bool,
    pub record: Option<CommitRecord>,
    /// Fence que protege `front`.
    pub fence: Option<Arc<SwFence>>,
    /// Fence que protegerá `pending_fb`.
    pub pending_fence: Option<Arc<SwFence>>,
    /// Origem de scan-out do plano primário (`mode_set_base`).
    pub origin: (u32, u32),
}

/// Um plano do VOP.
pub struct Plane {
    pub(super) index: usize,
    pub(super) win: &'static WinData,
    pub(super) state: Mutex<PlaneState>,
    /// Commit escrito e ainda não confirmado no vblank.
    pub(super) pending: AtomicBool,
    /// Gate de commit em voo.
    pub(super) gate: Completion,
    attached: AtomicBool,
    fence_context: u64,
    fence_seqno: AtomicU32,
}

impl Plane {
    pub(super) fn new(index: usize, win: &'static WinData) -> Self {
        Self {
            index,
            win,
            state: Mutex::new(PlaneState::default()),
            pending: AtomicBool::new(false),
            gate: Completion::new_done(),
            attached: AtomicBool::new(true),
            fence_context: fence::alloc_context(),
            fence_seqno: AtomicU32::new(0),
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn kind(&self) -> PlaneKind {
        self.win.kind
    }

    pub fn is_attached(&self) -> bool {
        self.attached.load(Ordering::Acquire)
    }

    pub(super) fn detach(&self) {
        self.attached.store(false, Ordering::Release);
    }

    fn next_fence(&self) -> Arc<SwFence> {
        let seqno = self.fence_seqno.fetch_add(1, Ordering::Relaxed) + 1;
        Arc::new(SwFence::new(self.fence_context, seqno))
    }
}

/// Pedido de atualização de um plano.
pub struct PlaneUpdate {
    pub fb: Arc<Framebuffer>,
    pub crtc_x: i32,
    pub crtc_y: i32,
    pub crtc_w: u32,
    pub crtc_h: u32,
    /// Origem em 16.16.
    pub src_x: u32,
    pub src_y: u32,
    pub src_w: u32,
    pub src_h: u32,
    /// Sinalizada quando o buffer novo estiver na tela.
    pub event: Option<Arc<Completion>>,
}

/// Troca `front` por `pending_fb`: dispara o evento, sinaliza a fence do
/// buffer que sai e solta a referência dele.
fn promote(st: &mut PlaneState) {
    if let Some(event) = st.pending_event.take() {
        event.complete();
    }

    let next = st.pending_fb.take();
    let changed = match (&st.front, &next) {
        (Some(a), Some(b)) => !Arc::ptr_eq(a, b),
        (None, None) => false,
        _ => true,
    };

    if st.pending_fence.is_some() || changed {
        if let Some(old) = st.fence.take() {
            old.signal();
        }
        st.fence = st.pending_fence.take();
    }

    st.front = next;
}

// ============================================================================
// OPERAÇÕES
// ============================================================================

impl Vop {
    fn plane(&self, idx: usize) -> Result<&Plane, VopError> {
        self.planes.get(idx).ok_or(VopError::InvalidPlane)
    }

    /// Índice do plano primário.
    pub fn primary_index(&self) -> Option<usize> {
        self.planes.iter().position(|p| p.win.kind == PlaneKind::Primary)
    }

    /// Buffer atualmente em scan-out no plano.
    pub fn front_buffer(&self, idx: usize) -> Option<Arc<Framebuffer>> {
        self.planes.get(idx)?.state.lock().front.clone()
    }

    /// Há commit aguardando confirmação?
    pub fn is_pending(&self, idx: usize) -> bool {
        self.planes
            .get(idx)
            .is_some_and(|p| p.pending.load(Ordering::Acquire))
    }

    /// Fence que protege o buffer em scan-out.
    pub fn front_fence(&self, idx: usize) -> Option<Arc<SwFence>> {
        self.planes.get(idx)?.state.lock().fence.clone()
    }

    /// Pede a atualização de um plano.
    ///
    /// Valida tudo antes de tocar em estado: um erro aqui não muda a sombra
    /// nem segura referência ao buffer. Bloqueia enquanto o commit anterior
    /// do mesmo plano está em voo.
    pub fn request_update(self: &Arc<Self>, idx: usize, upd: PlaneUpdate) -> Result<(), VopError> {
        let plane = self.plane(idx)?;
        if !plane.is_attached() {
            return Err(VopError::PlaneDetached);
        }
        if !self.is_enabled() {
            return Err(VopError::NotEnabled);
        }

        let fb = upd.fb;
        let win = plane.win;
        if !win.phy.supports(fb.format) {
            crate::kdebug!("(VOP) Formato não suportado pela janela ", idx);
            return Err(VopError::UnsupportedFormat);
        }

        let src_x2 = upd.src_x as u64 + upd.src_w as u64;
        let src_y2 = upd.src_y as u64 + upd.src_h as u64;
        if src_x2 > (fb.width as u64) << 16 || src_y2 > (fb.height as u64) << 16 {
            crate::kdebug!("(VOP) Origem fora do framebuffer, plano=", idx);
            return Err(VopError::InvalidGeometry);
        }

        let fixed = |v: u64| i32::try_from(v).map_err(|_| VopError::InvalidGeometry);
        let mut src = Rect::new(
            fixed(upd.src_x as u64)?,
            fixed(upd.src_y as u64)?,
            fixed(src_x2)?,
            fixed(src_y2)?,
        );
        let mut dest = Rect::from_size(upd.crtc_x, upd.crtc_y, upd.crtc_w, upd.crtc_h)
            .ok_or_else(|| {
                crate::kdebug!("(VOP) Destino fora do alcance de i32, plano=", idx);
                VopError::InvalidGeometry
            })?;

        let mode = self.mode();
        let clip = Rect::new(0, 0, mode.hdisplay as i32, mode.vdisplay as i32);

        let (min_scale, max_scale) = if win.phy.scl.is_some() {
            (self.data.scaler.min_scale as i32, self.data.scaler.max_scale as i32)
        } else {
            (SCALE_ONE, SCALE_ONE)
        };
        let can_position = win.kind != PlaneKind::Primary;

        let visible = rect::check_update(&mut src, &mut dest, &clip, min_scale, max_scale, can_position)?;
        if !visible {
            if let Some(event) = upd.event {
                event.complete();
            }
            return Ok(());
        }

        let format = fb.format;
        if format.is_yuv() {
            // Início do plano YUV alinhado a 2 pixels
            let odd = (src.x1 >> 16) % 2;
            src.x1 += odd << 16;
            src.x2 = src.x2.checked_add(odd << 16).ok_or(VopError::InvalidGeometry)?;
        }

        let x = (src.x1 >> 16) as u32;
        let y = (src.y1 >> 16) as u32;
        let yrgb_mst = fb.luma_addr(x, y).ok_or(VopError::MissingObject)?;
        let uv_mst = if format.is_yuv() {
            Some(fb.chroma_addr(x, y).ok_or(VopError::MissingObject)?)
        } else {
            None
        };

        let scale = match win.phy.scl {
            Some(_) => Some(ScaleConfig::compute(
                &self.data.scaler,
                format,
                (src.width() >> 16) as u32,
                (src.height() >> 16) as u32,
                dest.width() as u32,
                dest.height() as u32,
            )?),
            None => None,
        };

        let record = CommitRecord {
            src,
            dest,
            yrgb_mst,
            uv_mst,
            scale,
        };

        self.wait_gate(idx);

        let mut st = plane.state.lock();
        let needs_vblank =
            upd.event.is_some() || st.front.as_ref().is_some_and(|f| !Arc::ptr_eq(f, &fb));

        if needs_vblank && self.platform.vblank.vblank_get(self.pipe).is_err() {
            crate::kerror!("(VOP) Falha ao obter vblank, plano=", idx);
            drop(st);
            plane.gate.complete();
            return Err(VopError::VblankUnavailable);
        }

        let gate = FenceGate::for_update(st.front.as_ref(), &fb);

        st.pending_fb = Some(fb);
        st.pending_event = upd.event;
        st.pending_yrgb_mst = yrgb_mst;
        st.pending_needs_vblank = needs_vblank;
        st.record = Some(record);

        let resv = match gate {
            FenceGate::PassThrough => {
                drop(st);
                self.commit_plane(idx);
                return Ok(());
            }
            FenceGate::Deferred(resv) => resv,
        };

        let fence = plane.next_fence();
        st.pending_fence = Some(fence.clone());
        drop(st);

        // O callback pode rodar dentro de `arm`: o lock do estado já foi solto
        let weak = Arc::downgrade(self);
        let cb: ReadyCallback = Box::new(move || {
            if let Some(vop) = weak.upgrade() {
                vop.commit_plane(idx);
            }
        });

        if let Err(e) = fence::arm(&resv, fence, cb) {
            crate::kerror!("(VOP) Falha ao armar reserva, plano=", idx);
            let mut st = plane.state.lock();
            st.pending_fb = None;
            st.pending_event = None;
            st.pending_fence = None;
            st.pending_needs_vblank = false;
            st.record = None;
            drop(st);
            if needs_vblank {
                self.platform.vblank.vblank_put(self.pipe);
            }
            plane.gate.complete();
            return Err(VopError::Fence(e));
        }

        self.stats.inc_deferred_commits();
        Ok(())
    }

    /// Escreve o commit pendente do plano nos registradores.
    ///
    /// Chamado com o gate em posse do commit, direto ou pela reserva.
    pub(super) fn commit_plane(&self, idx: usize) {
        let plane = &self.planes[idx];
        let mut st = plane.state.lock();

        let (Some(fb), Some(rec)) = (st.pending_fb.clone(), st.record) else {
            crate::kerror!("(VOP) Commit sem buffer pendente, plano=", idx);
            drop(st);
            plane.gate.complete();
            return;
        };

        let needs_vblank = st.pending_needs_vblank;
        st.pending_needs_vblank = false;

        if needs_vblank {
            plane.pending.store(true, Ordering::Release);
        } else {
            promote(&mut st);
        }

        let mode = self.mode();
        let src = rec.src;
        let dest = rec.dest;
        let actual_w = (src.width() >> 16) as u32;
        let actual_h = (src.height() >> 16) as u32;
        let act_info = (actual_h.saturating_sub(1) << 16) | (actual_w.saturating_sub(1) & 0xffff);
        let dsp_info = ((dest.height() as u32 - 1) << 16) | ((dest.width() as u32 - 1) & 0xffff);
        let dsp_stx = dest.x1 as u32 + mode.htotal as u32 - mode.hsync_start as u32;
        let dsp_sty = dest.y1 as u32 + mode.vtotal as u32 - mode.vsync_start as u32;
        let dsp_st = (dsp_sty << 16) | (dsp_stx & 0xffff);

        let base = plane.win.base;
        let phy = plane.win.phy;
        let format = fb.format;

        {
            let _guard = self.reg_lock.lock();
            let regs = &self.regs;

            regs.set(base, phy.format, format.vop_format() as u32);
            regs.set(base, phy.yrgb_vir, fb.pitches[0] >> 2);
            regs.set(base, phy.yrgb_mst, rec.yrgb_mst);
            if let Some(uv_mst) = rec.uv_mst {
                regs.set(base, phy.uv_vir, fb.pitches[1] >> 2);
                regs.set(base, phy.uv_mst, uv_mst);
            }
            if let (Some(scl), Some(scale)) = (phy.scl, rec.scale) {
                scale.program(regs, base, scl);
            }

            regs.set(base, phy.act_info, act_info);
            regs.set(base, phy.dsp_info, dsp_info);
            regs.set(base, phy.dsp_st, dsp_st);
            regs.set(base, phy.rb_swap, format.rb_swap() as u32);

            if format.has_alpha() {
                regs.set(base, phy.dst_alpha_ctl, DST_ALPHA_SRC_INVERSE);
                regs.set(base, phy.src_alpha_ctl, SRC_ALPHA_PER_PIXEL);
            } else {
                regs.set(base, phy.src_alpha_ctl, 0);
            }

            regs.set(base, phy.enable, 1);
            regs.cfg_done();
        }

        drop(st);

        if !needs_vblank {
            plane.gate.complete();
        }

        self.stats.inc_commits();
        crate::ktrace!("(VOP) Commit escrito, yrgb_mst=", rec.yrgb_mst);
    }

    /// O hardware já latchou o commit pendente?
    fn pending_is_complete(&self, plane: &Plane, st: &PlaneState) -> bool {
        let base = plane.win.base;
        if st.pending_fb.is_some() {
            self.regs.get_live(base, plane.win.phy.yrgb_mst) == st.pending_yrgb_mst
        } else {
            self.regs.get_live(base, plane.win.phy.enable) == 0
        }
    }

    /// Confirma o commit pendente do plano, se o hardware já o aplicou.
    ///
    /// Roda na metade inferior da IRQ.
    pub(super) fn process_pending(&self, idx: usize) {
        let plane = &self.planes[idx];
        if !plane.pending.load(Ordering::Acquire) {
            return;
        }

        let mut st = plane.state.lock();
        if !plane.pending.load(Ordering::Acquire) || !self.pending_is_complete(plane, &st) {
            return;
        }

        self.platform.vblank.vblank_put(self.pipe);
        promote(&mut st);
        plane.pending.store(false, Ordering::Release);
        drop(st);

        plane.gate.complete();
        self.stats.inc_confirmations();
        crate::ktrace!("(VOP) Commit confirmado, plano=", idx);
    }

    /// Conclui o commit pendente sem esperar o hardware.
    ///
    /// Retorna `false` se não havia commit pendente.
    pub(super) fn force_complete(&self, idx: usize) -> bool {
        let plane = &self.planes[idx];
        let mut st = plane.state.lock();
        if !plane.pending.load(Ordering::Acquire) {
            return false;
        }

        self.platform.vblank.vblank_put(self.pipe);
        promote(&mut st);
        plane.pending.store(false, Ordering::Release);
        drop(st);

        plane.gate.complete();
        self.stats.inc_forced_completions();
        crate::kwarn!("(VOP) Commit concluído à força, plano=", idx);
        true
    }

    /// Toma o gate do plano, esperando o commit anterior.
    ///
    /// A espera não tem limite: um display parado segura o chamador. Passado
    /// `drain_timeout_ns` o travamento é registrado uma vez por espera.
    pub(super) fn wait_gate(&self, idx: usize) {
        let gate = &self.planes[idx].gate;
        if gate.wait_timeout(self.platform.clock.as_ref(), self.config.drain_timeout_ns) {
            return;
        }

        self.stats.inc_stalled_commits();
        crate::kerror!("(VOP) Commit anterior sem confirmação, display parado? plano=", idx);
        gate.wait();
    }

    /// Desliga um plano.
    ///
    /// O buffer em scan-out só é solto quando o hardware confirmar o
    /// desligamento (ou na hora, com o pipeline desligado).
    pub fn disable_plane(&self, idx: usize) -> Result<(), VopError> {
        let plane = self.plane(idx)?;
        if !plane.is_attached() {
            return Ok(());
        }

        self.wait_gate(idx);
        self.disable_plane_gated(idx)
    }

    /// `disable_plane` com o gate já em posse do chamador.
    pub(super) fn disable_plane_gated(&self, idx: usize) -> Result<(), VopError> {
        let plane = &self.planes[idx];
        let mut st = plane.state.lock();

        st.pending_yrgb_mst = 0;
        st.pending_fb = None;
        st.record = None;

        let deferred = self.is_enabled() && st.front.is_some();
        if deferred {
            if self.platform.vblank.vblank_get(self.pipe).is_err() {
                crate::kerror!("(VOP) Falha ao obter vblank no disable, plano=", idx);
                drop(st);
                plane.gate.complete();
                return Err(VopError::VblankUnavailable);
            }
            plane.pending.store(true, Ordering::Release);
        } else {
            promote(&mut st);
        }

        // Seguro mesmo com o pipeline desligado: vai só para a sombra
        {
            let _guard = self.reg_lock.lock();
            self.regs.set(plane.win.base, plane.win.phy.enable, 0);
            self.regs.cfg_done();
        }

        drop(st);
        if !deferred {
            plane.gate.complete();
        }

        crate::kdebug!("(VOP) Plano desligado ", idx);
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Plano primário
    // ------------------------------------------------------------------------

    /// Aponta o plano primário para `fb` a partir da origem `(x, y)`,
    /// cobrindo a tela a partir do canto superior esquerdo.
    pub fn mode_set_base(self: &Arc<Self>, fb: Arc<Framebuffer>, x: u32, y: u32) -> Result<(), VopError> {
        self.update_primary(fb, x, y, None)
    }

    /// Troca o buffer do plano primário na origem atual.
    ///
    /// `event` dispara quando o buffer novo estiver na tela.
    pub fn page_flip(
        self: &Arc<Self>,
        fb: Arc<Framebuffer>,
        event: Option<Arc<Completion>>,
    ) -> Result<(), VopError> {
        if !self.is_enabled() {
            crate::kdebug!("(VOP) Page flip rejeitado: pipeline desligado");
            return Err(VopError::NotEnabled);
        }

        let idx = self.primary_index().ok_or(VopError::InvalidPlane)?;
        let (x, y) = self.planes[idx].state.lock().origin;
        self.update_primary(fb, x, y, event)
    }

    fn update_primary(
        self: &Arc<Self>,
        fb: Arc<Framebuffer>,
        x: u32,
        y: u32,
        event: Option<Arc<Completion>>,
    ) -> Result<(), VopError> {
        let idx = self.primary_index().ok_or(VopError::InvalidPlane)?;
        let w = fb.width.checked_sub(x).ok_or(VopError::InvalidGeometry)?;
        let h = fb.height.checked_sub(y).ok_or(VopError::InvalidGeometry)?;
        let fixed = |v: u32| v.checked_mul(1 << 16).ok_or(VopError::InvalidGeometry);

        self.request_update(
            idx,
            PlaneUpdate {
                fb,
                crtc_x: 0,
                crtc_y: 0,
                crtc_w: w,
                crtc_h: h,
                src_x: fixed(x)?,
                src_y: fixed(y)?,
                src_w: fixed(w)?,
                src_h: fixed(h)?,
                event,
            },
        )?;

        self.planes[idx].state.lock().origin = (x, y);
        Ok(())
    }
}
