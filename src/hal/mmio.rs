//! Região MMIO
//!
//! Banco de registradores mapeado em memória, acessado com `volatile`.

use core::ptr::NonNull;

use volatile::VolatilePtr;

use super::RegisterIo;

/// Janela MMIO de registradores de 32 bits.
pub struct MmioRegion {
    base: NonNull<u32>,
    len: usize,
}

// SAFETY: o acesso é volátil e não há estado interno além do ponteiro.
unsafe impl Send for MmioRegion {}
unsafe impl Sync for MmioRegion {}

impl MmioRegion {
    /// Cria a região a partir do endereço virtual já mapeado.
    ///
    /// # Safety
    ///
    /// `base` deve apontar para `len` bytes de MMIO mapeados como
    /// device memory, alinhados a 4, válidos pelo tempo de vida da região.
    pub unsafe fn new(base: NonNull<u32>, len: usize) -> Self {
        Self { base, len }
    }

    fn reg(&self, offset: u32) -> Option<VolatilePtr<'_, u32>> {
        let offset = offset as usize;
        if offset % 4 != 0 || offset + 4 > self.len {
            return None;
        }
        // SAFETY: offset validado contra o tamanho da janela.
        unsafe {
            let ptr = NonNull::new_unchecked(self.base.as_ptr().add(offset / 4));
            Some(VolatilePtr::new(ptr))
        }
    }
}

impl RegisterIo for MmioRegion {
    fn read(&self, offset: u32) -> u32 {
        match self.reg(offset) {
            Some(reg) => reg.read(),
            None => {
                crate::kerror!("(MMIO) Leitura fora da janela: ", offset);
                0
            }
        }
    }

    fn write(&self, offset: u32, value: u32) {
        match self.reg(offset) {
            Some(reg) => reg.write(value),
            None => crate::kerror!("(MMIO) Escrita fora da janela: ", offset),
        }
    }

    fn len(&self) -> usize {
        self.len
    }
}
