//! # Erros do VOP

use super::fence::FenceError;
use super::scale::ScaleError;
use crate::hal::HalError;

/// Erros do pipeline de display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VopError {
    /// Pipeline desligado.
    NotEnabled,
    /// Pipe não registrado.
    InvalidPipe,
    /// Índice de plano inexistente.
    InvalidPlane,
    /// Plano já destruído (unbind).
    PlaneDetached,
    /// Formato não aceito pela janela.
    UnsupportedFormat,
    /// Retângulos de origem/destino inválidos.
    InvalidGeometry,
    /// Razão de escala fora dos limites da janela.
    ScaleOutOfRange,
    /// Modo de vídeo que o VOP não gera.
    InvalidMode,
    /// Framebuffer sem objeto de memória.
    MissingObject,
    /// Referência de vblank negada.
    VblankUnavailable,
    /// Hardware não respondeu a tempo.
    Timeout,
    /// Falha no escalador.
    Scale(ScaleError),
    /// Falha na reserva de sincronização.
    Fence(FenceError),
    /// Falha em clock.
    Clock(HalError),
    /// Falha em linha de reset.
    Reset(HalError),
    /// Falha no domínio de energia.
    Power(HalError),
    /// Falha ao anexar o IOMMU.
    DmaAttach(HalError),
}

impl From<ScaleError> for VopError {
    fn from(e: ScaleError) -> Self {
        VopError::Scale(e)
    }
}

impl From<FenceError> for VopError {
    fn from(e: FenceError) -> Self {
        VopError::Fence(e)
    }
}

impl core::fmt::Display for VopError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            VopError::NotEnabled => f.write_str("pipeline desligado"),
            VopError::InvalidPipe => f.write_str("pipe inexistente"),
            VopError::InvalidPlane => f.write_str("plano inexistente"),
            VopError::PlaneDetached => f.write_str("plano destruído"),
            VopError::UnsupportedFormat => f.write_str("formato não suportado"),
            VopError::InvalidGeometry => f.write_str("geometria inválida"),
            VopError::ScaleOutOfRange => f.write_str("escala fora dos limites"),
            VopError::InvalidMode => f.write_str("modo de vídeo inválido"),
            VopError::MissingObject => f.write_str("framebuffer sem objeto"),
            VopError::VblankUnavailable => f.write_str("vblank indisponível"),
            VopError::Timeout => f.write_str("timeout de hardware"),
            VopError::Scale(e) => write!(f, "escala: {}", e),
            VopError::Fence(e) => write!(f, "fence: {}", e),
            VopError::Clock(e) => write!(f, "clock: {}", e),
            VopError::Reset(e) => write!(f, "reset: {}", e),
            VopError::Power(e) => write!(f, "energia: {}", e),
            VopError::DmaAttach(e) => write!(f, "iommu: {}", e),
        }
    }
}
