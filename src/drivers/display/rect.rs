//! # Retângulos e Clipping
//!
//! Retângulos de origem (16.16) e destino (pixels) de um plano, com o
//! clipping proporcional contra a área visível do CRTC.

use super::error::VopError;

/// Razão 1:1 em 16.16.
pub const SCALE_ONE: i32 = 1 << 16;

/// Retângulo `[x1, x2) × [y1, y2)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rect {
    pub x1: i32,
    pub y1: i32,
    pub x2: i32,
    pub y2: i32,
}

impl Rect {
    pub const fn new(x1: i32, y1: i32, x2: i32, y2: i32) -> Self {
        Self { x1, y1, x2, y2 }
    }

    /// Retângulo a partir de origem e tamanho.
    ///
    /// `None` se a borda direita ou inferior não cabe em `i32`.
    pub fn from_size(x: i32, y: i32, w: u32, h: u32) -> Option<Self> {
        let x2 = x.checked_add(i32::try_from(w).ok()?)?;
        let y2 = y.checked_add(i32::try_from(h).ok()?)?;
        Some(Self::new(x, y, x2, y2))
    }

    pub const fn width(&self) -> i32 {
        self.x2 - self.x1
    }

    pub const fn height(&self) -> i32 {
        self.y2 - self.y1
    }

    pub const fn is_visible(&self) -> bool {
        self.width() > 0 && self.height() > 0
    }

    /// Intersecta com `clip`; retorna se sobrou área.
    pub fn intersect(&mut self, clip: &Rect) -> bool {
        self.x1 = self.x1.max(clip.x1);
        self.y1 = self.y1.max(clip.y1);
        self.x2 = self.x2.min(clip.x2);
        self.y2 = self.y2.min(clip.y2);
        self.is_visible()
    }
}

fn clamp_i32(v: i64) -> i32 {
    v.clamp(i32::MIN as i64, i32::MAX as i64) as i32
}

/// Razão origem/destino em 16.16, validada contra `[min, max]`.
///
/// Destino vazio resulta em 0 (o clipping marca o plano invisível).
pub fn calc_scale(src: i32, dst: i32, min: i32, max: i32) -> Result<i32, VopError> {
    if src < 0 || dst < 0 {
        return Err(VopError::InvalidGeometry);
    }
    if dst == 0 {
        return Ok(0);
    }
    let scale = src / dst;
    if scale < min || scale > max {
        return Err(VopError::ScaleOutOfRange);
    }
    Ok(scale)
}

/// Recorta `dst` contra `clip` e ajusta `src` na mesma proporção.
pub fn clip_scaled(src: &mut Rect, dst: &mut Rect, clip: &Rect, hscale: i32, vscale: i32) -> bool {
    let diff = clip.x1 as i64 - dst.x1 as i64;
    if diff > 0 {
        src.x1 = clamp_i32(src.x1 as i64 + diff * hscale as i64);
    }
    let diff = clip.y1 as i64 - dst.y1 as i64;
    if diff > 0 {
        src.y1 = clamp_i32(src.y1 as i64 + diff * vscale as i64);
    }
    let diff = dst.x2 as i64 - clip.x2 as i64;
    if diff > 0 {
        src.x2 = clamp_i32(src.x2 as i64 - diff * hscale as i64);
    }
    let diff = dst.y2 as i64 - clip.y2 as i64;
    if diff > 0 {
        src.y2 = clamp_i32(src.y2 as i64 - diff * vscale as i64);
    }

    dst.intersect(clip)
}

/// Valida e recorta uma atualização de plano.
///
/// Retorna `Ok(false)` se nada sobra visível. Planos que não podem ser
/// posicionados precisam cobrir `clip` inteiro.
pub fn check_update(
    src: &mut Rect,
    dst: &mut Rect,
    clip: &Rect,
    min_scale: i32,
    max_scale: i32,
    can_position: bool,
) -> Result<bool, VopError> {
    let hscale = calc_scale(src.width(), dst.width(), min_scale, max_scale)?;
    let vscale = calc_scale(src.height(), dst.height(), min_scale, max_scale)?;

    if !clip_scaled(src, dst, clip, hscale, vscale) {
        return Ok(false);
    }

    if !can_position && *dst != *clip {
        crate::kdebug!("(VOP) Plano primário deve cobrir o CRTC inteiro");
        return Err(VopError::InvalidGeometry);
    }

    Ok(true)
}
