//! # Registradores do VOP (RK3288)
//!
//! Offsets em bytes dentro do banco MMIO, descritor de campo [`VopReg`] e
//! bits da interrupção `INTR_CTRL0`.

use bitflags::bitflags;

// ============================================================================
// DESCRITOR DE CAMPO
// ============================================================================

/// Campo de registrador: `(valor >> shift) & mask` no offset dado.
///
/// `mask == 0` significa "campo ausente nesta janela": escritas viram no-op
/// e leituras retornam 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VopReg {
    pub offset: u32,
    pub mask: u32,
    pub shift: u32,
}

impl VopReg {
    /// Campo ausente.
    pub const NONE: VopReg = VopReg::new(0, 0, 0);

    pub const fn new(offset: u32, mask: u32, shift: u32) -> Self {
        Self {
            offset,
            mask,
            shift,
        }
    }

    /// Campo existe nesta janela?
    #[inline]
    pub const fn is_present(&self) -> bool {
        self.mask != 0
    }

    /// Máscara já deslocada para a posição do campo.
    #[inline]
    pub const fn field_mask(&self) -> u32 {
        self.mask << self.shift
    }

    /// Valor truncado à largura do campo e deslocado.
    #[inline]
    pub const fn encode(&self, value: u32) -> u32 {
        (value & self.mask) << self.shift
    }
}

// ============================================================================
// OFFSETS
// ============================================================================

pub const REG_CFG_DONE: u32 = 0x0000;
pub const VERSION_INFO: u32 = 0x0004;
pub const SYS_CTRL: u32 = 0x0008;
pub const SYS_CTRL1: u32 = 0x000c;
pub const DSP_CTRL0: u32 = 0x0010;
pub const DSP_CTRL1: u32 = 0x0014;
pub const DSP_BG: u32 = 0x0018;
pub const MCU_CTRL: u32 = 0x001c;
pub const INTR_CTRL0: u32 = 0x0020;
pub const INTR_CTRL1: u32 = 0x0024;

// Janela 0 (janela 1 = +0x40)
pub const WIN0_CTRL0: u32 = 0x0030;
pub const WIN0_CTRL1: u32 = 0x0034;
pub const WIN0_COLOR_KEY: u32 = 0x0038;
pub const WIN0_VIR: u32 = 0x003c;
pub const WIN0_YRGB_MST: u32 = 0x0040;
pub const WIN0_CBR_MST: u32 = 0x0044;
pub const WIN0_ACT_INFO: u32 = 0x0048;
pub const WIN0_DSP_INFO: u32 = 0x004c;
pub const WIN0_DSP_ST: u32 = 0x0050;
pub const WIN0_SCL_FACTOR_YRGB: u32 = 0x0054;
pub const WIN0_SCL_FACTOR_CBR: u32 = 0x0058;
pub const WIN0_SCL_OFFSET: u32 = 0x005c;
pub const WIN0_SRC_ALPHA_CTRL: u32 = 0x0060;
pub const WIN0_DST_ALPHA_CTRL: u32 = 0x0064;

// Janela 2 (janela 3 = +0x50)
pub const WIN2_CTRL0: u32 = 0x00b0;
pub const WIN2_CTRL1: u32 = 0x00b4;
pub const WIN2_VIR0_1: u32 = 0x00b8;
pub const WIN2_VIR2_3: u32 = 0x00bc;
pub const WIN2_MST0: u32 = 0x00c0;
pub const WIN2_DSP_INFO0: u32 = 0x00c4;
pub const WIN2_DSP_ST0: u32 = 0x00c8;
pub const WIN2_COLOR_KEY: u32 = 0x00cc;
pub const WIN2_SRC_ALPHA_CTRL: u32 = 0x00dc;
pub const WIN2_DST_ALPHA_CTRL: u32 = 0x00ec;

// Timing
pub const POST_DSP_HACT_INFO: u32 = 0x0170;
pub const POST_DSP_VACT_INFO: u32 = 0x0174;
pub const DSP_HTOTAL_HS_END: u32 = 0x0188;
pub const DSP_HACT_ST_END: u32 = 0x018c;
pub const DSP_VTOTAL_VS_END: u32 = 0x0190;
pub const DSP_VACT_ST_END: u32 = 0x0194;

/// Tamanho do banco de registradores (bytes).
pub const RK3288_REG_LEN: usize = 0x0200;

// ============================================================================
// INTERRUPÇÕES (INTR_CTRL0)
// ============================================================================

bitflags! {
    /// Bits de status de `INTR_CTRL0`.
    ///
    /// Habilitação em `status << INTR_EN_SHIFT`, clear (W1C) em
    /// `status << INTR_CLR_SHIFT`.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct IntrStatus: u32 {
        /// Standby efetivado (DSP hold).
        const DSP_HOLD_VALID = 1 << 0;
        /// Início de frame (vblank).
        const FS = 1 << 1;
        /// Linha programada alcançada.
        const LINE_FLAG = 1 << 2;
        /// Erro de barramento.
        const BUS_ERROR = 1 << 3;
    }
}

/// Todos os bits de status.
pub const INTR_MASK: u32 = 0xf;
pub const INTR_EN_SHIFT: u32 = 4;
pub const INTR_CLR_SHIFT: u32 = 8;

/// Campo da linha do LINE_FLAG em `INTR_CTRL0`.
pub const DSP_LINE_NUM: VopReg = VopReg::new(INTR_CTRL0, 0x1fff, 12);

impl IntrStatus {
    /// Campo de habilitação da causa.
    ///
    /// Uma causa por vez: o campo tem um bit.
    pub const fn enable_field(self) -> VopReg {
        VopReg::new(INTR_CTRL0, 0x1, INTR_EN_SHIFT + self.bits().trailing_zeros())
    }
}

// ============================================================================
// ALPHA
// ============================================================================

pub const SRC_ALPHA_EN: u32 = 1 << 0;
pub const SRC_ALPHA_M0_STRAIGHT: u32 = 0 << 1;
pub const SRC_BLEND_M0_PER_PIX: u32 = 1 << 2;
pub const SRC_ALPHA_CAL_M0_NO_SAT: u32 = 1 << 4;
pub const SRC_COLOR_M0_PRE_MUL: u32 = 0 << 5;
pub const SRC_FACTOR_M0_ONE: u32 = 1 << 6;
pub const DST_FACTOR_M0_SRC_INVERSE: u32 = 3 << 6;

/// Alpha por pixel, pré-multiplicado, fator 1 na origem.
pub const SRC_ALPHA_PER_PIXEL: u32 = SRC_ALPHA_EN
    | SRC_COLOR_M0_PRE_MUL
    | SRC_ALPHA_M0_STRAIGHT
    | SRC_BLEND_M0_PER_PIX
    | SRC_ALPHA_CAL_M0_NO_SAT
    | SRC_FACTOR_M0_ONE;

/// Destino atenuado por (1 - alpha da origem).
pub const DST_ALPHA_SRC_INVERSE: u32 = DST_FACTOR_M0_SRC_INVERSE;
