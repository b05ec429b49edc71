//! # Synchronization Primitives
//!
//! Primitivas de sincronização usadas pelo pipeline do VOP.
//!
//! ## Hierarquia de Uso
//!
//! ```text
//! spin::Mutex → Seções críticas curtas (lock de commit, lock de IRQ)
//! Completion  → Espera por evento (gate de commit, standby, line flag)
//! IrqWork     → Agendamento da metade inferior da IRQ
//! ```
//!
//! ## Regras
//!
//! - **Ordem de Lock**: estado do plano → lock de commit. O lock de IRQ
//!   nunca é aninhado com os outros.
//! - A metade superior da IRQ nunca espera em `Completion`.

/// Completion (evento de contagem, estilo kernel)
pub mod completion;

/// Flag de agendamento da metade inferior
pub mod irq_work;

pub use completion::Completion;
pub use irq_work::IrqWork;

#[cfg(test)]
mod test;
