//! Trait de Clock e Reset

use crate::hal::HalError;

/// Gate de clock (hclk, dclk, aclk).
///
/// `prepare`/`unprepare` podem dormir; `enable`/`disable` não.
pub trait ClockGate: Send + Sync {
    /// Prepara o clock (fora de contexto atômico).
    fn prepare(&self) -> Result<(), HalError>;

    /// Desfaz `prepare`.
    fn unprepare(&self);

    /// Liga o clock.
    fn enable(&self) -> Result<(), HalError>;

    /// Desliga o clock.
    fn disable(&self);

    /// Arredonda uma frequência (Hz) para a mais próxima suportada.
    fn round_rate(&self, hz: u64) -> u64;

    /// Programa a frequência (Hz).
    fn set_rate(&self, hz: u64) -> Result<(), HalError>;
}

/// Linha de reset de um domínio de clock.
pub trait ResetLine: Send + Sync {
    /// Coloca o domínio em reset.
    fn assert(&self) -> Result<(), HalError>;

    /// Tira o domínio do reset.
    fn deassert(&self) -> Result<(), HalError>;
}
