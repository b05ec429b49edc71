//! Completion
//!
//! Contador de eventos com espera ativa. `complete` incrementa,
//! `wait` consome um evento. Um `Completion` criado com
//! [`Completion::new_done`] funciona como gate binário: quem passa pelo
//! `wait` é dono do gate até chamar `complete`.

use core::sync::atomic::{AtomicU32, Ordering};

use crate::hal::Monotonic;

/// Valor que marca `complete_all`: nenhum `wait` consome.
const COMPLETE_ALL: u32 = u32::MAX;

/// Completion de contagem.
pub struct Completion {
    done: AtomicU32,
}

impl Completion {
    /// Cria completion sem eventos.
    pub const fn new() -> Self {
        Self {
            done: AtomicU32::new(0),
        }
    }

    /// Cria completion com um evento pendente (gate livre).
    pub const fn new_done() -> Self {
        Self {
            done: AtomicU32::new(1),
        }
    }

    /// Sinaliza um evento.
    pub fn complete(&self) {
        let _ = self
            .done
            .fetch_update(Ordering::Release, Ordering::Relaxed, |count| {
                if count == COMPLETE_ALL {
                    None
                } else {
                    Some(count + 1)
                }
            });
    }

    /// Libera todos os waiters, atuais e futuros, até `reinit`.
    pub fn complete_all(&self) {
        self.done.store(COMPLETE_ALL, Ordering::Release);
    }

    /// Descarta eventos pendentes.
    pub fn reinit(&self) {
        self.done.store(0, Ordering::Release);
    }

    /// Há pelo menos um evento não consumido?
    pub fn is_done(&self) -> bool {
        self.done.load(Ordering::Acquire) != 0
    }

    /// Tenta consumir um evento sem bloquear.
    pub fn try_wait(&self) -> bool {
        loop {
            let count = self.done.load(Ordering::Acquire);
            if count == 0 {
                return false;
            }
            if count == COMPLETE_ALL {
                return true;
            }

            if self
                .done
                .compare_exchange_weak(count, count - 1, Ordering::AcqRel, Ordering::Relaxed)
                .is_ok()
            {
                return true;
            }
        }
    }

    /// Espera (spin) até consumir um evento.
    pub fn wait(&self) {
        while !self.try_wait() {
            core::hint::spin_loop();
        }
    }

    /// Espera até consumir um evento ou estourar `timeout_ns`.
    ///
    /// Retorna `false` em timeout.
    pub fn wait_timeout(&self, clock: &dyn Monotonic, timeout_ns: u64) -> bool {
        let deadline = clock.now_ns().saturating_add(timeout_ns);
        loop {
            if self.try_wait() {
                return true;
            }
            if clock.now_ns() >= deadline {
                // Última chance: o evento pode ter chegado junto com o prazo
                return self.try_wait();
            }
            core::hint::spin_loop();
        }
    }
}

impl Default for Completion {
    fn default() -> Self {
        Self::new()
    }
}
