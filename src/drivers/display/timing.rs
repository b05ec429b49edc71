//! # Timing de Saída
//!
//! Modo de vídeo negociado pelo subsistema de timing, tipo de conector e
//! derivação da margem de vblank usada pelo coordenador de DMC.

use bitflags::bitflags;

bitflags! {
    /// Flags de um modo de vídeo.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct ModeFlags: u32 {
        const PHSYNC = 1 << 0;
        const NHSYNC = 1 << 1;
        const PVSYNC = 1 << 2;
        const NVSYNC = 1 << 3;
        const INTERLACE = 1 << 4;
    }
}

/// Tipo de conector ligado à saída do VOP.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectorType {
    Lvds,
    Edp,
    Hdmi,
    Dsi,
}

/// Modo de saída de pixel (`out_mode`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum OutputMode {
    P888 = 0,
    P666 = 1,
    P565 = 2,
    Aaaa = 15,
}

/// Conector e formato de saída configurados para o pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputConfig {
    pub connector: ConnectorType,
    pub out_mode: OutputMode,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            connector: ConnectorType::Lvds,
            out_mode: OutputMode::P888,
        }
    }
}

/// Modo de vídeo (timings em pixels/linhas, clock em kHz).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DisplayMode {
    pub clock_khz: u32,
    pub hdisplay: u16,
    pub hsync_start: u16,
    pub hsync_end: u16,
    pub htotal: u16,
    pub vdisplay: u16,
    pub vsync_start: u16,
    pub vsync_end: u16,
    pub vtotal: u16,
    pub flags: ModeFlags,
}

impl DisplayMode {
    /// O VOP consegue gerar este modo?
    pub fn is_valid(&self) -> bool {
        self.htotal != 0 && self.vtotal != 0 && !self.flags.contains(ModeFlags::INTERLACE)
    }

    /// Início da área ativa horizontal (contado a partir do hsync).
    pub fn hact_start(&self) -> u32 {
        self.htotal as u32 - self.hsync_start as u32
    }

    /// Início da área ativa vertical (contado a partir do vsync).
    pub fn vact_start(&self) -> u32 {
        self.vtotal as u32 - self.vsync_start as u32
    }

    /// Fim da área ativa vertical; linha usada pelo LINE_FLAG.
    pub fn vact_end(&self) -> u32 {
        self.vact_start() + self.vdisplay as u32
    }

    /// Margem de vblank em ns para o pixel clock efetivo `pixclk_hz`.
    pub fn vblank_time_ns(&self, pixclk_hz: u64) -> u64 {
        if pixclk_hz == 0 {
            return 0;
        }
        let lines = (self.vtotal as u64).saturating_sub(self.vdisplay as u64);
        lines * 1_000_000_000 * self.htotal as u64 / pixclk_hz
    }

    /// Polaridade dos pinos de sync (`pin_pol`).
    pub fn pin_polarity(&self) -> u32 {
        let mut pol = 0x8;
        if !self.flags.contains(ModeFlags::NHSYNC) {
            pol |= 1 << 0;
        }
        if !self.flags.contains(ModeFlags::NVSYNC) {
            pol |= 1 << 1;
        }
        pol
    }
}
