//! Trait de IRQ

/// Linha de interrupção do VOP.
pub trait IrqLine: Send + Sync {
    /// Habilita a entrega da interrupção.
    fn enable(&self);

    /// Desabilita a entrega da interrupção.
    fn disable(&self);
}

/// Resultado da metade superior de um handler de IRQ.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IrqReturn {
    /// Nenhuma causa ativa (linha compartilhada).
    None,
    /// Tratado por completo na metade superior.
    Handled,
    /// Tratado; a metade inferior deve rodar.
    WakeThread,
}
