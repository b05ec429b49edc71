//! # Calculadora de Escala
//!
//! Calcula, a partir das dimensões de origem e destino, o modo de escala
//! por eixo (luma e croma), o modo do line buffer, os fatores em ponto fixo
//! e o skip de linhas do down-scale vertical. O cálculo é puro: nenhum
//! registrador é tocado até [`ScaleConfig::program`], e um destino largo
//! demais falha antes disso.
//!
//! ## Fatores
//!
//! ```text
//! identidade      = 1 << 12
//! bilinear down   = ((2·src − 3) << 11) / (dst − 1)
//! bilinear up/bic = ((2·src − 3) << 15) / (dst − 1)
//! ```

use super::format::PixelFormat;
use super::shadow::RegisterBank;
use super::variant::ScaleRegs;

/// Bits de fração do fator identidade.
pub const SCL_FT_DEFAULT_FIXPOINT_SHIFT: u32 = 12;
/// Fator identidade (1.0).
pub const SCL_FT_IDENTITY: u16 = 1 << SCL_FT_DEFAULT_FIXPOINT_SHIFT;

const SCL_FT_BILI_DN_SHIFT: u32 = 12;
const SCL_FT_BILI_UP_SHIFT: u32 = 16;
const SCL_FT_BIC_SHIFT: u32 = 16;

// ============================================================================
// ERRORS
// ============================================================================

/// Canal afetado por uma restrição de escala.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScaleChannel {
    Luma,
    Chroma,
}

/// Erros da calculadora de escala.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScaleError {
    /// Largura de destino acima do suportado pelo line buffer.
    DestinationTooWide { width: u32, max: u32 },
    /// O modo de line buffer escolhido não admite escala vertical.
    VerticalScaleNotAllowed(ScaleChannel),
    /// Extensão de 0/1 pixel num eixo que precisa de escala.
    DegenerateExtent,
}

impl core::fmt::Display for ScaleError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            ScaleError::DestinationTooWide { width, max } => {
                write!(f, "largura de destino {} acima do limite {}", width, max)
            }
            ScaleError::VerticalScaleNotAllowed(ch) => {
                write!(f, "escala vertical não permitida ({:?})", ch)
            }
            ScaleError::DegenerateExtent => f.write_str("extensão degenerada"),
        }
    }
}

// ============================================================================
// MODOS
// ============================================================================

/// Modo de escala de um eixo.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum ScaleMode {
    None = 0,
    Up = 1,
    Down = 2,
}

impl ScaleMode {
    /// Compara origem e destino.
    pub fn between(src: u32, dst: u32) -> Self {
        if src < dst {
            ScaleMode::Up
        } else if src > dst {
            ScaleMode::Down
        } else {
            ScaleMode::None
        }
    }
}

/// Filtro do up-scale vertical.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum ScaleUpMode {
    Bilinear = 0,
    Bicubic = 1,
}

/// Filtro do down-scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum ScaleDownMode {
    Bilinear = 0,
    Average = 1,
}

/// Linhas puladas no down-scale vertical.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VSkip {
    None,
    Two,
    Four,
}

impl VSkip {
    /// Divisor de linhas (1, 2 ou 4).
    pub const fn lines(self) -> u32 {
        match self {
            VSkip::None => 1,
            VSkip::Two => 2,
            VSkip::Four => 4,
        }
    }

    const fn from_lines(lines: u32) -> Self {
        match lines {
            4 => VSkip::Four,
            2 => VSkip::Two,
            _ => VSkip::None,
        }
    }
}

/// Organização do line buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum LineBufferMode {
    Yuv3840x5 = 0,
    Yuv2560x8 = 1,
    Rgb3840x2 = 2,
    Rgb2560x4 = 3,
    Rgb1920x5 = 4,
    Rgb1280x8 = 5,
}

// ============================================================================
// LIMITES (TABELA POR VARIANTE)
// ============================================================================

/// Limites do escalador de uma variante do VOP.
#[derive(Debug, Clone, Copy)]
pub struct ScalerLimits {
    /// Largura máxima de destino.
    pub max_dst_width: u32,
    /// `(largura mínima exclusiva, modo)` para RGB, em ordem decrescente.
    pub rgb_line_buffers: &'static [(u32, LineBufferMode)],
    /// Modo RGB quando nenhum limiar casa.
    pub rgb_default: LineBufferMode,
    /// `(largura mínima exclusiva, modo)` para YUV, em ordem decrescente.
    pub yuv_line_buffers: &'static [(u32, LineBufferMode)],
    /// Modo YUV quando nenhum limiar casa.
    pub yuv_default: LineBufferMode,
    /// Modos sem escala vertical.
    pub no_vscale_modes: &'static [LineBufferMode],
    /// Modos que forçam up-scale vertical bilinear.
    pub bilinear_vsu_modes: &'static [LineBufferMode],
    /// Máximo de linhas puladas no down-scale vertical.
    pub max_vskip_lines: u32,
    /// Razão mínima que deve sobrar depois do skip.
    pub min_ratio_after_vskip: u32,
    /// Menor razão origem/destino aceita (16.16).
    pub min_scale: u32,
    /// Maior razão origem/destino aceita (16.16).
    pub max_scale: u32,
}

impl ScalerLimits {
    /// Escolhe o modo do line buffer para a largura efetiva.
    pub fn line_buffer_mode(&self, width: u32, yuv: bool) -> LineBufferMode {
        let (table, fallback) = if yuv {
            (self.yuv_line_buffers, self.yuv_default)
        } else {
            (self.rgb_line_buffers, self.rgb_default)
        };
        table
            .iter()
            .find(|(min, _)| width > *min)
            .map_or(fallback, |(_, mode)| *mode)
    }

    fn vskip_lines(&self, src: u32, dst: u32) -> VSkip {
        let mut lines = self.max_vskip_lines;
        while lines > 1 {
            if src as u64 >= lines as u64 * dst as u64 * self.min_ratio_after_vskip as u64 {
                break;
            }
            lines /= 2;
        }
        VSkip::from_lines(lines)
    }
}

// ============================================================================
// FÓRMULAS
// ============================================================================

fn cal_scale(src: u32, dst: u32, shift: u32) -> Result<u16, ScaleError> {
    if src < 2 || dst < 2 {
        return Err(ScaleError::DegenerateExtent);
    }
    let num = ((src as u64) * 2 - 3) << (shift - 1);
    Ok((num / (dst as u64 - 1)) as u16)
}

fn bili_dn(src: u32, dst: u32) -> Result<u16, ScaleError> {
    cal_scale(src, dst, SCL_FT_BILI_DN_SHIFT)
}

fn bili_up(src: u32, dst: u32) -> Result<u16, ScaleError> {
    cal_scale(src, dst, SCL_FT_BILI_UP_SHIFT)
}

fn bic(src: u32, dst: u32) -> Result<u16, ScaleError> {
    cal_scale(src, dst, SCL_FT_BIC_SHIFT)
}

fn bili_dn_vskip(src: u32, dst: u32, vskip: VSkip) -> Result<u16, ScaleError> {
    let lines = vskip.lines();
    let act = (src + lines - 1) / lines;
    if act == dst {
        Ok(bili_dn(src, dst)? / lines as u16)
    } else {
        bili_dn(act, dst)
    }
}

fn horizontal_factor(mode: ScaleMode, src: u32, dst: u32) -> Result<u16, ScaleError> {
    match mode {
        ScaleMode::None => Ok(SCL_FT_IDENTITY),
        ScaleMode::Up => bic(src, dst),
        ScaleMode::Down => bili_dn(src, dst),
    }
}

fn vertical_factor(
    limits: &ScalerLimits,
    mode: ScaleMode,
    src: u32,
    dst: u32,
    vsu: ScaleUpMode,
) -> Result<(u16, VSkip), ScaleError> {
    match mode {
        ScaleMode::None => Ok((SCL_FT_IDENTITY, VSkip::None)),
        ScaleMode::Up => {
            let factor = match vsu {
                ScaleUpMode::Bilinear => bili_up(src, dst)?,
                ScaleUpMode::Bicubic => bic(src, dst)?,
            };
            Ok((factor, VSkip::None))
        }
        ScaleMode::Down => {
            let vskip = limits.vskip_lines(src, dst);
            Ok((bili_dn_vskip(src, dst, vskip)?, vskip))
        }
    }
}

// ============================================================================
// CONFIGURAÇÃO
// ============================================================================

/// Escala de um canal (luma ou croma).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelScale {
    pub hor_mode: ScaleMode,
    pub ver_mode: ScaleMode,
    pub x_factor: u16,
    pub y_factor: u16,
    pub vskip: VSkip,
}

impl ChannelScale {
    fn compute(
        limits: &ScalerLimits,
        hor_mode: ScaleMode,
        ver_mode: ScaleMode,
        src: (u32, u32),
        dst: (u32, u32),
        vsu: ScaleUpMode,
    ) -> Result<Self, ScaleError> {
        let x_factor = horizontal_factor(hor_mode, src.0, dst.0)?;
        let (y_factor, vskip) = vertical_factor(limits, ver_mode, src.1, dst.1, vsu)?;
        Ok(Self {
            hor_mode,
            ver_mode,
            x_factor,
            y_factor,
            vskip,
        })
    }
}

/// Resultado completo do cálculo de escala de uma janela.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScaleConfig {
    pub lb_mode: LineBufferMode,
    pub vsu_mode: ScaleUpMode,
    pub luma: ChannelScale,
    /// Presente apenas para formatos YUV.
    pub chroma: Option<ChannelScale>,
}

impl ScaleConfig {
    /// Calcula a escala de `src` para `dst` (em pixels) no formato dado.
    pub fn compute(
        limits: &ScalerLimits,
        format: PixelFormat,
        src_w: u32,
        src_h: u32,
        dst_w: u32,
        dst_h: u32,
    ) -> Result<Self, ScaleError> {
        if dst_w > limits.max_dst_width {
            return Err(ScaleError::DestinationTooWide {
                width: dst_w,
                max: limits.max_dst_width,
            });
        }

        let yuv = format.is_yuv();
        let cbcr_src_w = src_w / format.hsub();
        let cbcr_src_h = src_h / format.vsub();

        let yrgb_hor = ScaleMode::between(src_w, dst_w);
        let yrgb_ver = ScaleMode::between(src_h, dst_h);
        let (cbcr_hor, cbcr_ver) = if yuv {
            (
                ScaleMode::between(cbcr_src_w, dst_w),
                ScaleMode::between(cbcr_src_h, dst_h),
            )
        } else {
            (ScaleMode::None, ScaleMode::None)
        };

        // O canal que mais ocupa o line buffer decide o modo
        let lb_width = if yuv {
            if cbcr_hor == ScaleMode::Down {
                dst_w
            } else {
                cbcr_src_w
            }
        } else if yrgb_hor == ScaleMode::Down {
            dst_w
        } else {
            src_w
        };
        let lb_mode = limits.line_buffer_mode(lb_width, yuv);

        if limits.no_vscale_modes.contains(&lb_mode) {
            if yrgb_ver != ScaleMode::None {
                return Err(ScaleError::VerticalScaleNotAllowed(ScaleChannel::Luma));
            }
            if cbcr_ver != ScaleMode::None {
                return Err(ScaleError::VerticalScaleNotAllowed(ScaleChannel::Chroma));
            }
        }

        let vsu_mode = if limits.no_vscale_modes.contains(&lb_mode)
            || limits.bilinear_vsu_modes.contains(&lb_mode)
        {
            ScaleUpMode::Bilinear
        } else {
            ScaleUpMode::Bicubic
        };

        let luma = ChannelScale::compute(
            limits,
            yrgb_hor,
            yrgb_ver,
            (src_w, src_h),
            (dst_w, dst_h),
            vsu_mode,
        )?;
        let chroma = if yuv {
            Some(ChannelScale::compute(
                limits,
                cbcr_hor,
                cbcr_ver,
                (cbcr_src_w, cbcr_src_h),
                (dst_w, dst_h),
                vsu_mode,
            )?)
        } else {
            None
        };

        Ok(Self {
            lb_mode,
            vsu_mode,
            luma,
            chroma,
        })
    }

    /// Escreve a configuração nos registradores de escala da janela.
    ///
    /// Deve ser chamado com o lock de commit.
    pub fn program(&self, bank: &RegisterBank, base: u32, scl: &ScaleRegs) {
        bank.set(base, scl.lb_mode, self.lb_mode as u32);

        let luma = &self.luma;
        bank.set(base, scl.scale_yrgb_x, luma.x_factor as u32);
        bank.set(base, scl.scale_yrgb_y, luma.y_factor as u32);
        bank.set(base, scl.vsd_yrgb_gt4, (luma.vskip == VSkip::Four) as u32);
        bank.set(base, scl.vsd_yrgb_gt2, (luma.vskip == VSkip::Two) as u32);
        bank.set(base, scl.yrgb_hor_scl_mode, luma.hor_mode as u32);
        bank.set(base, scl.yrgb_ver_scl_mode, luma.ver_mode as u32);
        bank.set(base, scl.yrgb_hsd_mode, ScaleDownMode::Bilinear as u32);
        bank.set(base, scl.yrgb_vsd_mode, ScaleDownMode::Bilinear as u32);
        bank.set(base, scl.yrgb_vsu_mode, self.vsu_mode as u32);

        if let Some(chroma) = &self.chroma {
            bank.set(base, scl.scale_cbcr_x, chroma.x_factor as u32);
            bank.set(base, scl.scale_cbcr_y, chroma.y_factor as u32);
            bank.set(base, scl.vsd_cbcr_gt4, (chroma.vskip == VSkip::Four) as u32);
            bank.set(base, scl.vsd_cbcr_gt2, (chroma.vskip == VSkip::Two) as u32);
            bank.set(base, scl.cbcr_hor_scl_mode, chroma.hor_mode as u32);
            bank.set(base, scl.cbcr_ver_scl_mode, chroma.ver_mode as u32);
            bank.set(base, scl.cbcr_hsd_mode, ScaleDownMode::Bilinear as u32);
            bank.set(base, scl.cbcr_vsd_mode, ScaleDownMode::Bilinear as u32);
            bank.set(base, scl.cbcr_vsu_mode, self.vsu_mode as u32);
        }
    }
}
