//! Hardware Abstraction Layer (HAL)
//!
//! Abstração do hardware ao redor do VOP: clocks, resets, domínio de
//! energia, IOMMU, linha de IRQ, relógio monotônico e o banco MMIO.
//!
//! O driver só conversa com a plataforma através destes traits. A
//! implementação real do banco de registradores é [`MmioRegion`].

pub mod mmio;
pub mod traits;

pub use mmio::MmioRegion;
pub use traits::*;


// ============================================================================
// ERRORS
// ============================================================================

/// Erro reportado por um recurso de plataforma.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HalError {
    /// Recurso não suportado nesta plataforma.
    NotSupported,
    /// Recurso ocupado por outro consumidor.
    Busy,
    /// Recurso não respondeu a tempo.
    Timeout,
    /// Falha genérica de I/O.
    IoError,
}

impl core::fmt::Display for HalError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let msg = match self {
            HalError::NotSupported => "recurso não suportado",
            HalError::Busy => "recurso ocupado",
            HalError::Timeout => "timeout",
            HalError::IoError => "erro de I/O",
        };
        f.write_str(msg)
    }
}
