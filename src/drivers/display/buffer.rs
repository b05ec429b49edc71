//! # Framebuffers
//!
//! Buffers de scan-out entregues pelo alocador externo. O driver nunca
//! aloca memória de pixel: recebe `Arc<Framebuffer>` e segura a referência
//! enquanto o hardware pode ler o buffer. `clone` é "adquirir", `drop` é
//! "liberar".

use alloc::sync::Arc;

use super::fence::Reservation;
use super::format::PixelFormat;

// ============================================================================
// ERRORS
// ============================================================================

/// Erros de construção de framebuffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferError {
    /// Falta o objeto de memória de um plano do formato.
    MissingObject,
    /// Pitch menor que uma linha de pixels.
    InvalidPitch,
    /// Dimensões zeradas.
    InvalidSize,
}

impl core::fmt::Display for BufferError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let msg = match self {
            BufferError::MissingObject => "objeto de memória ausente",
            BufferError::InvalidPitch => "pitch inválido",
            BufferError::InvalidSize => "dimensões inválidas",
        };
        f.write_str(msg)
    }
}

// ============================================================================
// BUFFER OBJECT
// ============================================================================

/// Objeto de memória com endereço de barramento já mapeado.
pub struct BufferObject {
    /// Endereço visto pelo VOP (após IOMMU).
    pub dma_addr: u32,
    /// Tamanho em bytes.
    pub size: usize,
    /// Reserva de sincronização, se o objeto é compartilhado.
    pub reservation: Option<Arc<dyn Reservation>>,
}

impl BufferObject {
    /// Objeto sem reserva (scan-out direto).
    pub fn new(dma_addr: u32, size: usize) -> Self {
        Self {
            dma_addr,
            size,
            reservation: None,
        }
    }

    /// Objeto com reserva de sincronização.
    pub fn with_reservation(dma_addr: u32, size: usize, resv: Arc<dyn Reservation>) -> Self {
        Self {
            dma_addr,
            size,
            reservation: Some(resv),
        }
    }
}

// ============================================================================
// FRAMEBUFFER
// ============================================================================

/// Framebuffer de até dois planos de memória.
pub struct Framebuffer {
    pub id: u32,
    pub format: PixelFormat,
    pub width: u32,
    pub height: u32,
    pub pitches: [u32; 2],
    pub offsets: [u32; 2],
    objects: [Option<Arc<BufferObject>>; 2],
}

impl Framebuffer {
    /// Cria framebuffer validando planos e pitches do formato.
    pub fn new(
        id: u32,
        format: PixelFormat,
        width: u32,
        height: u32,
        pitches: [u32; 2],
        offsets: [u32; 2],
        objects: [Option<Arc<BufferObject>>; 2],
    ) -> Result<Arc<Self>, BufferError> {
        if width == 0 || height == 0 {
            return Err(BufferError::InvalidSize);
        }
        for plane in 0..format.num_planes() {
            if objects[plane].is_none() {
                return Err(BufferError::MissingObject);
            }
            let hsub = if plane == 0 { 1 } else { format.hsub() };
            if pitches[plane] < width / hsub * format.cpp(plane) {
                return Err(BufferError::InvalidPitch);
            }
        }

        Ok(Arc::new(Self {
            id,
            format,
            width,
            height,
            pitches,
            offsets,
            objects,
        }))
    }

    /// Framebuffer RGB de um plano (atalho comum).
    pub fn single(
        id: u32,
        format: PixelFormat,
        width: u32,
        height: u32,
        pitch: u32,
        obj: Arc<BufferObject>,
    ) -> Result<Arc<Self>, BufferError> {
        Self::new(id, format, width, height, [pitch, 0], [0, 0], [Some(obj), None])
    }

    /// Objeto de memória do plano `plane`.
    pub fn object(&self, plane: usize) -> Option<&Arc<BufferObject>> {
        self.objects.get(plane).and_then(|o| o.as_ref())
    }

    /// Reserva do objeto principal (luma/RGB).
    pub fn reservation(&self) -> Option<&Arc<dyn Reservation>> {
        self.object(0).and_then(|o| o.reservation.as_ref())
    }

    /// Endereço de scan-out do pixel `(x, y)` no plano de luma/RGB.
    pub fn luma_addr(&self, x: u32, y: u32) -> Option<u32> {
        let obj = self.object(0)?;
        let offset = x * self.format.cpp(0) + y * self.pitches[0] + self.offsets[0];
        Some(obj.dma_addr.wrapping_add(offset))
    }

    /// Endereço de scan-out do croma correspondente ao pixel `(x, y)`.
    pub fn chroma_addr(&self, x: u32, y: u32) -> Option<u32> {
        if !self.format.is_yuv() {
            return None;
        }
        let obj = self.object(1)?;
        let offset = x * self.format.cpp(1) / self.format.hsub()
            + y * self.pitches[1] / self.format.vsub()
            + self.offsets[1];
        Some(obj.dma_addr.wrapping_add(offset))
    }
}

impl core::fmt::Debug for Framebuffer {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Framebuffer")
            .field("id", &self.id)
            .field("format", &self.format)
            .field("width", &self.width)
            .field("height", &self.height)
            .finish()
    }
}
