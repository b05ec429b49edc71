//! Traits do HAL
//!
//! Define as interfaces abstratas para o hardware que cerca o VOP.

pub mod clock;
pub mod irq;
pub mod power;
pub mod regs;
pub mod timer;

pub use clock::*;
pub use irq::*;
pub use power::*;
pub use regs::*;
pub use timer::*;
