//! Traits de energia e IOMMU

use crate::hal::HalError;

/// Domínio de energia (runtime PM).
pub trait PowerDomain: Send + Sync {
    /// Adquire uma referência ao domínio (liga se necessário).
    fn get(&self) -> Result<(), HalError>;

    /// Libera a referência.
    fn put(&self);
}

/// Mapeamento DMA do dispositivo (IOMMU).
pub trait DmaMapping: Send + Sync {
    /// Anexa o dispositivo ao domínio de tradução.
    fn attach(&self) -> Result<(), HalError>;

    /// Desanexa o dispositivo.
    fn detach(&self);
}
