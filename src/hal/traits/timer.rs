//! Trait de tempo

/// Relógio monotônico em nanossegundos.
pub trait Monotonic: Send + Sync {
    /// Tempo atual em nanossegundos.
    fn now_ns(&self) -> u64;

    /// Espera ativa de `us` microssegundos.
    fn delay_us(&self, us: u64) {
        let deadline = self.now_ns().saturating_add(us.saturating_mul(1_000));
        while self.now_ns() < deadline {
            core::hint::spin_loop();
        }
    }
}
