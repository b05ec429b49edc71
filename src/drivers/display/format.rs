//! # Formatos de Pixel
//!
//! Formatos aceitos pelas janelas do VOP, identificados por fourcc, e o
//! mapeamento para o campo `format` do hardware.

/// Monta um código fourcc little-endian.
pub const fn fourcc(a: u8, b: u8, c: u8, d: u8) -> u32 {
    (a as u32) | ((b as u32) << 8) | ((c as u32) << 16) | ((d as u32) << 24)
}

/// Formato de pixel de um framebuffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelFormat {
    Xrgb8888,
    Argb8888,
    Xbgr8888,
    Abgr8888,
    Rgb888,
    Bgr888,
    Rgb565,
    Bgr565,
    /// Y + CbCr intercalado, 4:2:0.
    Nv12,
    /// Y + CbCr intercalado, 4:2:2.
    Nv16,
    /// Y + CbCr intercalado, 4:4:4.
    Nv24,
}

/// Valor do campo `format` em `WINx_CTRL0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum VopFormat {
    Argb8888 = 0,
    Rgb888 = 1,
    Rgb565 = 2,
    Yuv420sp = 4,
    Yuv422sp = 5,
    Yuv444sp = 6,
}

impl PixelFormat {
    /// Código fourcc do formato.
    pub const fn fourcc(self) -> u32 {
        match self {
            PixelFormat::Xrgb8888 => fourcc(b'X', b'R', b'2', b'4'),
            PixelFormat::Argb8888 => fourcc(b'A', b'R', b'2', b'4'),
            PixelFormat::Xbgr8888 => fourcc(b'X', b'B', b'2', b'4'),
            PixelFormat::Abgr8888 => fourcc(b'A', b'B', b'2', b'4'),
            PixelFormat::Rgb888 => fourcc(b'R', b'G', b'2', b'4'),
            PixelFormat::Bgr888 => fourcc(b'B', b'G', b'2', b'4'),
            PixelFormat::Rgb565 => fourcc(b'R', b'G', b'1', b'6'),
            PixelFormat::Bgr565 => fourcc(b'B', b'G', b'1', b'6'),
            PixelFormat::Nv12 => fourcc(b'N', b'V', b'1', b'2'),
            PixelFormat::Nv16 => fourcc(b'N', b'V', b'1', b'6'),
            PixelFormat::Nv24 => fourcc(b'N', b'V', b'2', b'4'),
        }
    }

    /// Resolve um fourcc.
    pub fn from_fourcc(code: u32) -> Option<Self> {
        ALL_FORMATS.iter().copied().find(|f| f.fourcc() == code)
    }

    /// Formato equivalente no hardware.
    pub const fn vop_format(self) -> VopFormat {
        match self {
            PixelFormat::Xrgb8888
            | PixelFormat::Argb8888
            | PixelFormat::Xbgr8888
            | PixelFormat::Abgr8888 => VopFormat::Argb8888,
            PixelFormat::Rgb888 | PixelFormat::Bgr888 => VopFormat::Rgb888,
            PixelFormat::Rgb565 | PixelFormat::Bgr565 => VopFormat::Rgb565,
            PixelFormat::Nv12 => VopFormat::Yuv420sp,
            PixelFormat::Nv16 => VopFormat::Yuv422sp,
            PixelFormat::Nv24 => VopFormat::Yuv444sp,
        }
    }

    /// Precisa trocar R e B no hardware?
    pub const fn rb_swap(self) -> bool {
        matches!(
            self,
            PixelFormat::Xbgr8888 | PixelFormat::Abgr8888 | PixelFormat::Bgr888 | PixelFormat::Bgr565
        )
    }

    /// Formato YUV semi-planar (dois planos)?
    pub const fn is_yuv(self) -> bool {
        matches!(self, PixelFormat::Nv12 | PixelFormat::Nv16 | PixelFormat::Nv24)
    }

    /// Tem canal alpha?
    pub const fn has_alpha(self) -> bool {
        matches!(self, PixelFormat::Argb8888 | PixelFormat::Abgr8888)
    }

    /// Número de planos de memória.
    pub const fn num_planes(self) -> usize {
        if self.is_yuv() {
            2
        } else {
            1
        }
    }

    /// Bytes por pixel no plano `plane`.
    pub const fn cpp(self, plane: usize) -> u32 {
        match self {
            PixelFormat::Xrgb8888
            | PixelFormat::Argb8888
            | PixelFormat::Xbgr8888
            | PixelFormat::Abgr8888 => 4,
            PixelFormat::Rgb888 | PixelFormat::Bgr888 => 3,
            PixelFormat::Rgb565 | PixelFormat::Bgr565 => 2,
            PixelFormat::Nv12 | PixelFormat::Nv16 | PixelFormat::Nv24 => {
                if plane == 0 {
                    1
                } else {
                    2
                }
            }
        }
    }

    /// Subamostragem horizontal do croma.
    pub const fn hsub(self) -> u32 {
        match self {
            PixelFormat::Nv12 | PixelFormat::Nv16 => 2,
            _ => 1,
        }
    }

    /// Subamostragem vertical do croma.
    pub const fn vsub(self) -> u32 {
        match self {
            PixelFormat::Nv12 => 2,
            _ => 1,
        }
    }
}

/// Todos os formatos conhecidos.
pub const ALL_FORMATS: &[PixelFormat] = &[
    PixelFormat::Xrgb8888,
    PixelFormat::Argb8888,
    PixelFormat::Xbgr8888,
    PixelFormat::Abgr8888,
    PixelFormat::Rgb888,
    PixelFormat::Bgr888,
    PixelFormat::Rgb565,
    PixelFormat::Bgr565,
    PixelFormat::Nv12,
    PixelFormat::Nv16,
    PixelFormat::Nv24,
];

/// Formatos das janelas 0/1 (RGB + YUV).
pub const FORMATS_WIN01: &[PixelFormat] = ALL_FORMATS;

/// Formatos das janelas 2/3 (apenas RGB).
pub const FORMATS_WIN23: &[PixelFormat] = &[
    PixelFormat::Xrgb8888,
    PixelFormat::Argb8888,
    PixelFormat::Xbgr8888,
    PixelFormat::Abgr8888,
    PixelFormat::Rgb888,
    PixelFormat::Bgr888,
    PixelFormat::Rgb565,
    PixelFormat::Bgr565,
];
