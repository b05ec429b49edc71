//! # Tabelas de Variante
//!
//! Descrição declarativa de uma geração do VOP: layout dos registradores
//! de controle e de janela, lista de janelas, tabela de init e limites do
//! escalador. O driver só conhece o hardware através destas tabelas.

use super::format::{PixelFormat, FORMATS_WIN01, FORMATS_WIN23};
use super::regs::*;
use super::scale::{LineBufferMode, ScalerLimits};

/// Papel de uma janela no pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaneKind {
    /// Janela de fundo, sempre cobre a tela inteira.
    Primary,
    Overlay,
    Cursor,
}

/// Campos do escalador de uma janela.
#[derive(Debug, Clone, Copy)]
pub struct ScaleRegs {
    pub cbcr_vsd_mode: VopReg,
    pub cbcr_vsu_mode: VopReg,
    pub cbcr_hsd_mode: VopReg,
    pub cbcr_ver_scl_mode: VopReg,
    pub cbcr_hor_scl_mode: VopReg,
    pub yrgb_vsd_mode: VopReg,
    pub yrgb_vsu_mode: VopReg,
    pub yrgb_hsd_mode: VopReg,
    pub yrgb_ver_scl_mode: VopReg,
    pub yrgb_hor_scl_mode: VopReg,
    pub vsd_cbcr_gt2: VopReg,
    pub vsd_cbcr_gt4: VopReg,
    pub vsd_yrgb_gt2: VopReg,
    pub vsd_yrgb_gt4: VopReg,
    pub lb_mode: VopReg,
    pub scale_yrgb_x: VopReg,
    pub scale_yrgb_y: VopReg,
    pub scale_cbcr_x: VopReg,
    pub scale_cbcr_y: VopReg,
}

/// Layout físico de uma janela (relativo à base da janela).
#[derive(Debug, Clone, Copy)]
pub struct WinPhy {
    /// `None` para janelas sem escalador.
    pub scl: Option<&'static ScaleRegs>,
    pub formats: &'static [PixelFormat],
    pub enable: VopReg,
    pub format: VopReg,
    pub rb_swap: VopReg,
    pub act_info: VopReg,
    pub dsp_info: VopReg,
    pub dsp_st: VopReg,
    pub yrgb_mst: VopReg,
    pub uv_mst: VopReg,
    pub yrgb_vir: VopReg,
    pub uv_vir: VopReg,
    pub src_alpha_ctl: VopReg,
    pub dst_alpha_ctl: VopReg,
}

impl WinPhy {
    /// A janela aceita o formato?
    pub fn supports(&self, format: PixelFormat) -> bool {
        self.formats.contains(&format)
    }
}

/// Janela concreta: layout + base + papel.
#[derive(Debug, Clone, Copy)]
pub struct WinData {
    pub base: u32,
    pub phy: &'static WinPhy,
    pub kind: PlaneKind,
}

/// Campos de controle global.
#[derive(Debug, Clone, Copy)]
pub struct CtrlRegs {
    pub standby: VopReg,
    pub rgb_en: VopReg,
    pub edp_en: VopReg,
    pub hdmi_en: VopReg,
    pub mipi_en: VopReg,
    pub out_mode: VopReg,
    pub pin_pol: VopReg,
    pub htotal_pw: VopReg,
    pub hact_st_end: VopReg,
    pub vtotal_pw: VopReg,
    pub vact_st_end: VopReg,
    pub hpost_st_end: VopReg,
    pub vpost_st_end: VopReg,
}

/// Descrição completa de uma variante.
#[derive(Debug, Clone, Copy)]
pub struct VopData {
    pub name: &'static str,
    /// `(offset, valor)` escritos no bind, após o reset.
    pub init_table: &'static [(u32, u32)],
    pub ctrl: &'static CtrlRegs,
    pub win: &'static [WinData],
    pub scaler: ScalerLimits,
    /// Tamanho do banco de registradores (bytes).
    pub reg_len: usize,
}

// ============================================================================
// RK3288
// ============================================================================

static RK3288_WIN_SCL: ScaleRegs = ScaleRegs {
    cbcr_vsd_mode: VopReg::new(WIN0_CTRL1, 0x1, 31),
    cbcr_vsu_mode: VopReg::new(WIN0_CTRL1, 0x1, 30),
    cbcr_hsd_mode: VopReg::new(WIN0_CTRL1, 0x3, 28),
    cbcr_ver_scl_mode: VopReg::new(WIN0_CTRL1, 0x3, 26),
    cbcr_hor_scl_mode: VopReg::new(WIN0_CTRL1, 0x3, 24),
    yrgb_vsd_mode: VopReg::new(WIN0_CTRL1, 0x1, 23),
    yrgb_vsu_mode: VopReg::new(WIN0_CTRL1, 0x1, 22),
    yrgb_hsd_mode: VopReg::new(WIN0_CTRL1, 0x3, 20),
    yrgb_ver_scl_mode: VopReg::new(WIN0_CTRL1, 0x3, 18),
    yrgb_hor_scl_mode: VopReg::new(WIN0_CTRL1, 0x3, 16),
    vsd_cbcr_gt2: VopReg::new(WIN0_CTRL1, 0x1, 7),
    vsd_cbcr_gt4: VopReg::new(WIN0_CTRL1, 0x1, 6),
    vsd_yrgb_gt2: VopReg::new(WIN0_CTRL1, 0x1, 5),
    vsd_yrgb_gt4: VopReg::new(WIN0_CTRL1, 0x1, 4),
    lb_mode: VopReg::new(WIN0_CTRL0, 0x7, 5),
    scale_yrgb_x: VopReg::new(WIN0_SCL_FACTOR_YRGB, 0xffff, 0),
    scale_yrgb_y: VopReg::new(WIN0_SCL_FACTOR_YRGB, 0xffff, 16),
    scale_cbcr_x: VopReg::new(WIN0_SCL_FACTOR_CBR, 0xffff, 0),
    scale_cbcr_y: VopReg::new(WIN0_SCL_FACTOR_CBR, 0xffff, 16),
};

static RK3288_WIN01: WinPhy = WinPhy {
    scl: Some(&RK3288_WIN_SCL),
    formats: FORMATS_WIN01,
    enable: VopReg::new(WIN0_CTRL0, 0x1, 0),
    format: VopReg::new(WIN0_CTRL0, 0x7, 1),
    rb_swap: VopReg::new(WIN0_CTRL0, 0x1, 12),
    act_info: VopReg::new(WIN0_ACT_INFO, 0x1fff_1fff, 0),
    dsp_info: VopReg::new(WIN0_DSP_INFO, 0x0fff_0fff, 0),
    dsp_st: VopReg::new(WIN0_DSP_ST, 0x1fff_1fff, 0),
    yrgb_mst: VopReg::new(WIN0_YRGB_MST, 0xffff_ffff, 0),
    uv_mst: VopReg::new(WIN0_CBR_MST, 0xffff_ffff, 0),
    yrgb_vir: VopReg::new(WIN0_VIR, 0x3fff, 0),
    uv_vir: VopReg::new(WIN0_VIR, 0x3fff, 16),
    src_alpha_ctl: VopReg::new(WIN0_SRC_ALPHA_CTRL, 0xff, 0),
    dst_alpha_ctl: VopReg::new(WIN0_DST_ALPHA_CTRL, 0xff, 0),
};

static RK3288_WIN23: WinPhy = WinPhy {
    scl: None,
    formats: FORMATS_WIN23,
    enable: VopReg::new(WIN2_CTRL0, 0x1, 0),
    format: VopReg::new(WIN2_CTRL0, 0x7, 1),
    rb_swap: VopReg::new(WIN2_CTRL0, 0x1, 12),
    act_info: VopReg::NONE,
    dsp_info: VopReg::new(WIN2_DSP_INFO0, 0x0fff_0fff, 0),
    dsp_st: VopReg::new(WIN2_DSP_ST0, 0x1fff_1fff, 0),
    yrgb_mst: VopReg::new(WIN2_MST0, 0xffff_ffff, 0),
    uv_mst: VopReg::NONE,
    yrgb_vir: VopReg::new(WIN2_VIR0_1, 0x1fff, 0),
    uv_vir: VopReg::NONE,
    src_alpha_ctl: VopReg::new(WIN2_SRC_ALPHA_CTRL, 0xff, 0),
    dst_alpha_ctl: VopReg::new(WIN2_DST_ALPHA_CTRL, 0xff, 0),
};

static RK3288_CTRL: CtrlRegs = CtrlRegs {
    standby: VopReg::new(SYS_CTRL, 0x1, 22),
    rgb_en: VopReg::new(SYS_CTRL, 0x1, 12),
    hdmi_en: VopReg::new(SYS_CTRL, 0x1, 13),
    edp_en: VopReg::new(SYS_CTRL, 0x1, 14),
    mipi_en: VopReg::new(SYS_CTRL, 0x1, 15),
    out_mode: VopReg::new(DSP_CTRL0, 0xf, 0),
    pin_pol: VopReg::new(DSP_CTRL0, 0xf, 4),
    htotal_pw: VopReg::new(DSP_HTOTAL_HS_END, 0x1fff_1fff, 0),
    hact_st_end: VopReg::new(DSP_HACT_ST_END, 0x1fff_1fff, 0),
    vtotal_pw: VopReg::new(DSP_VTOTAL_VS_END, 0x1fff_1fff, 0),
    vact_st_end: VopReg::new(DSP_VACT_ST_END, 0x1fff_1fff, 0),
    hpost_st_end: VopReg::new(POST_DSP_HACT_INFO, 0x1fff_1fff, 0),
    vpost_st_end: VopReg::new(POST_DSP_VACT_INFO, 0x1fff_1fff, 0),
};

const WIN1_CTRL0: u32 = WIN0_CTRL0 + 0x40;
const WIN3_CTRL0: u32 = WIN2_CTRL0 + 0x50;

static RK3288_INIT_TABLE: [(u32, u32); 6] = [
    (SYS_CTRL, 0x00c0_0000),
    (DSP_CTRL0, 0x0000_0000),
    (WIN0_CTRL0, 0x0000_0080),
    (WIN1_CTRL0, 0x0000_0080),
    (WIN2_CTRL0, 0x0000_0010),
    (WIN3_CTRL0, 0x0000_0010),
];

static RK3288_WINS: [WinData; 4] = [
    WinData {
        base: 0x00,
        phy: &RK3288_WIN01,
        kind: PlaneKind::Primary,
    },
    WinData {
        base: 0x40,
        phy: &RK3288_WIN01,
        kind: PlaneKind::Overlay,
    },
    WinData {
        base: 0x00,
        phy: &RK3288_WIN23,
        kind: PlaneKind::Overlay,
    },
    WinData {
        base: 0x50,
        phy: &RK3288_WIN23,
        kind: PlaneKind::Cursor,
    },
];

/// Limites do escalador do RK3288.
pub const RK3288_SCALER: ScalerLimits = ScalerLimits {
    max_dst_width: 3840,
    rgb_line_buffers: &[
        (2560, LineBufferMode::Rgb3840x2),
        (1920, LineBufferMode::Rgb2560x4),
    ],
    rgb_default: LineBufferMode::Rgb1920x5,
    yuv_line_buffers: &[(1280, LineBufferMode::Yuv3840x5)],
    yuv_default: LineBufferMode::Yuv2560x8,
    no_vscale_modes: &[LineBufferMode::Rgb3840x2],
    bilinear_vsu_modes: &[LineBufferMode::Rgb2560x4],
    max_vskip_lines: 4,
    min_ratio_after_vskip: 1,
    min_scale: (1 << 16) / 8,
    max_scale: 8 << 16,
};

/// VOP "big" do RK3288.
pub static RK3288_VOP: VopData = VopData {
    name: "rk3288-vop",
    init_table: &RK3288_INIT_TABLE,
    ctrl: &RK3288_CTRL,
    win: &RK3288_WINS,
    scaler: RK3288_SCALER,
    reg_len: RK3288_REG_LEN,
};
