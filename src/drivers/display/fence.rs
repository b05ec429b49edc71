//! # Fence Gate
//!
//! Um buffer compartilhado pode ainda estar sendo escrito por outro
//! dispositivo (GPU, decoder). Antes de apontar o scan-out para ele, o
//! commit espera o produtor através da reserva do objeto:
//!
//! ```text
//! reserve_shared → add_callback(commit) → add_shared_fence(fence do plano)
//! ```
//!
//! O callback roda quando as fences exclusivas da reserva sinalizam (ou na
//! hora, se já sinalizaram). A fence do plano é sinalizada quando o VOP
//! para de ler o buffer, liberando produtores futuros.

use alloc::boxed::Box;
use alloc::sync::Arc;
use core::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use super::buffer::Framebuffer;

// ============================================================================
// ERRORS
// ============================================================================

/// Erros da reserva de sincronização.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FenceError {
    /// Sem memória para mais um slot compartilhado.
    NoSpace,
    /// Reserva em estado inválido (objeto destruído, deadlock evitado).
    Invalid,
}

impl core::fmt::Display for FenceError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let msg = match self {
            FenceError::NoSpace => "sem espaço na reserva",
            FenceError::Invalid => "reserva inválida",
        };
        f.write_str(msg)
    }
}

/// Callback executado quando o buffer está pronto para scan-out.
pub type ReadyCallback = Box<dyn FnOnce() + Send>;

/// Reserva de sincronização de um objeto de memória (sistema externo).
///
/// Cada método faz o próprio locking interno.
pub trait Reservation: Send + Sync {
    /// Garante espaço para mais uma fence compartilhada.
    fn reserve_shared(&self) -> Result<(), FenceError>;

    /// Desfaz um `reserve_shared` não usado.
    fn release_shared(&self) {}

    /// Registra `cb` para quando as fences exclusivas sinalizarem.
    ///
    /// Pode chamar `cb` antes de retornar.
    fn add_callback(&self, cb: ReadyCallback) -> Result<(), FenceError>;

    /// Publica `fence` como leitor do objeto.
    fn add_shared_fence(&self, fence: Arc<SwFence>);
}

// ============================================================================
// SOFTWARE FENCE
// ============================================================================

/// Fence de software emitida por um plano.
#[derive(Debug)]
pub struct SwFence {
    pub context: u64,
    pub seqno: u32,
    signaled: AtomicBool,
}

impl SwFence {
    pub fn new(context: u64, seqno: u32) -> Self {
        Self {
            context,
            seqno,
            signaled: AtomicBool::new(false),
        }
    }

    /// Sinaliza a fence. Idempotente.
    pub fn signal(&self) {
        self.signaled.store(true, Ordering::Release);
    }

    pub fn is_signaled(&self) -> bool {
        self.signaled.load(Ordering::Acquire)
    }
}

// ============================================================================
// GATE
// ============================================================================

/// Decisão do gate para um pedido de atualização.
pub enum FenceGate {
    /// Commit imediato.
    PassThrough,
    /// Commit adiado até a reserva liberar.
    Deferred(Arc<dyn Reservation>),
}

impl FenceGate {
    /// Decide entre commit imediato e adiado.
    ///
    /// Só espera quando o buffer muda e o objeto tem reserva.
    pub fn for_update(front: Option<&Arc<Framebuffer>>, fb: &Arc<Framebuffer>) -> Self {
        if front.is_some_and(|f| Arc::ptr_eq(f, fb)) {
            return FenceGate::PassThrough;
        }
        match fb.reservation() {
            Some(resv) => FenceGate::Deferred(resv.clone()),
            None => FenceGate::PassThrough,
        }
    }
}

/// Arma a reserva: slot compartilhado, callback, fence do plano.
///
/// Em erro, o slot é devolvido e nada fica registrado.
pub fn arm(
    resv: &Arc<dyn Reservation>,
    fence: Arc<SwFence>,
    cb: ReadyCallback,
) -> Result<(), FenceError> {
    resv.reserve_shared()?;
    if let Err(e) = resv.add_callback(cb) {
        resv.release_shared();
        return Err(e);
    }
    resv.add_shared_fence(fence);
    Ok(())
}

// ============================================================================
// CONTEXTOS
// ============================================================================

static NEXT_CONTEXT: AtomicU64 = AtomicU64::new(1);

/// Aloca um contexto de fence novo (um por plano).
pub fn alloc_context() -> u64 {
    NEXT_CONTEXT.fetch_add(1, Ordering::Relaxed)
}
