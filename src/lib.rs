//! Forge VOP - Driver do Video Output Processor Rockchip.
//!
//! Pipeline de commit de planos do VOP: sombra de registradores, cálculo de
//! escala, máquina de estados de commit por plano, gate de fences,
//! despacho de IRQ com confirmação no vblank e ciclo de vida do pipeline.
//!
//! O crate é `no_std` + `alloc`. A plataforma (clocks, resets, energia,
//! IOMMU, IRQ, relógio) entra pelos traits de [`hal`].

#![cfg_attr(not(test), no_std)]

// Habilitar alocação dinâmica (necessário para Vec/Box/Arc)
extern crate alloc;

// --- Infraestrutura ---
pub mod logging; // Macros kerror!/kwarn!/kinfo!/kdebug!/ktrace!
pub mod stats; // Contadores de diagnóstico

// --- Abstrações ---
pub mod hal; // Clocks, resets, energia, IOMMU, IRQ, MMIO
pub mod sync; // Completion e trabalho diferido de IRQ

// --- Drivers ---
pub mod drivers;

pub use drivers::display::{Vop, VopConfig, VopError, VopPlatform, VopRegistry};
