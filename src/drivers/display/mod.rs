//! # Display Driver Module
//!
//! Driver do VOP (Video Output Processor) no modelo DRM/KMS.
//!
//! ## Arquitetura
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │                  Vop (crtc.rs)                      │
//! │   bind / enable / disable / change_timing / dmc     │
//! ├──────────────┬──────────────┬───────────────────────┤
//! │   Planos     │    IRQ       │   Fence Gate          │
//! │  (plane.rs)  │  (irq.rs)    │   (fence.rs)          │
//! ├──────────────┴──────────────┴───────────────────────┤
//! │   Escala (scale.rs)  ·  Geometria (rect.rs)         │
//! ├─────────────────────────────────────────────────────┤
//! │   Sombra de registradores (shadow.rs) → hal::mmio   │
//! └─────────────────────────────────────────────────────┘
//! ```
//!
//! As diferenças entre gerações do VOP ficam nas tabelas de `variant.rs`.

pub mod buffer;
pub mod crtc;
pub mod dmc;
pub mod error;
pub mod fence;
pub mod format;
pub mod irq;
pub mod plane;
pub mod rect;
pub mod regs;
pub mod scale;
pub mod shadow;
pub mod timing;
pub mod variant;

#[cfg(test)]
mod test;

use alloc::sync::Arc;
use alloc::vec::Vec;

use spin::RwLock;

pub use buffer::{BufferError, BufferObject, Framebuffer};
pub use crtc::{ScanoutBase, VblankHandler, Vop, VopConfig, VopPlatform};
pub use dmc::{DmcClient, DmcCoordinator, DmcThresholds};
pub use error::VopError;
pub use fence::{FenceError, Reservation, SwFence};
pub use format::PixelFormat;
pub use irq::IrqCause;
pub use plane::{CommitRecord, PlaneUpdate};
pub use timing::{ConnectorType, DisplayMode, ModeFlags, OutputConfig, OutputMode};
pub use variant::{PlaneKind, VopData, RK3288_VOP};

/// Pipelines registrados, indexados pelo número do pipe.
pub struct VopRegistry {
    pipes: RwLock<Vec<Arc<Vop>>>,
}

impl VopRegistry {
    pub const fn new() -> Self {
        Self {
            pipes: RwLock::new(Vec::new()),
        }
    }

    /// Registra um pipeline. Substitui um anterior com o mesmo pipe.
    pub fn register(&self, vop: Arc<Vop>) {
        let mut pipes = self.pipes.write();
        pipes.retain(|v| v.pipe() != vop.pipe());
        crate::kinfo!("(Display) Pipeline registrado: ", vop.pipe());
        pipes.push(vop);
    }

    /// Remove um pipeline do registro.
    pub fn unregister(&self, pipe: usize) -> Option<Arc<Vop>> {
        let mut pipes = self.pipes.write();
        let pos = pipes.iter().position(|v| v.pipe() == pipe)?;
        Some(pipes.remove(pos))
    }

    pub fn get(&self, pipe: usize) -> Option<Arc<Vop>> {
        self.pipes.read().iter().find(|v| v.pipe() == pipe).cloned()
    }

    /// Liga a IRQ de vblank do pipe.
    pub fn enable_vblank(&self, pipe: usize) -> Result<(), VopError> {
        let vop = self.get(pipe).ok_or(VopError::InvalidPipe)?;
        vop.enable_vblank()
    }

    /// Desliga a IRQ de vblank do pipe.
    pub fn disable_vblank(&self, pipe: usize) {
        if let Some(vop) = self.get(pipe) {
            vop.disable_vblank();
        }
    }
}

impl Default for VopRegistry {
    fn default() -> Self {
        Self::new()
    }
}
