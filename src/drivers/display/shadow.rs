//! # Banco de Registradores com Sombra
//!
//! Todo registrador do VOP tem uma cópia em memória (a "sombra"). Escritas
//! vão para a sombra e, com o pipeline ligado, para o hardware. Leituras de
//! campo vêm da sombra: o hardware só reflete o valor novo depois do latch
//! no vblank, e com os clocks desligados nem pode ser lido.
//!
//! Enquanto o banco não está "vivo" (pipeline desligado), só a sombra muda;
//! [`RegisterBank::flush`] copia a sombra inteira para o hardware no enable.
//!
//! A serialização do read-modify-write é do chamador: o lock de commit
//! protege os registradores de janela/controle, o lock de IRQ protege
//! `INTR_CTRL0`.

use alloc::boxed::Box;
use alloc::vec::Vec;
use core::sync::atomic::{fence, AtomicBool, AtomicU32, Ordering};

use super::regs::{VopReg, REG_CFG_DONE};
use crate::hal::RegisterIo;

/// Banco de registradores do VOP com cópia sombra.
pub struct RegisterBank {
    io: Box<dyn RegisterIo>,
    shadow: Box<[AtomicU32]>,
    live: AtomicBool,
}

impl RegisterBank {
    /// Cria o banco com a sombra zerada e o hardware desligado.
    pub fn new(io: Box<dyn RegisterIo>) -> Self {
        let words = io.len() / 4;
        let shadow = (0..words).map(|_| AtomicU32::new(0)).collect::<Vec<_>>();
        Self {
            io,
            shadow: shadow.into_boxed_slice(),
            live: AtomicBool::new(false),
        }
    }

    #[inline]
    fn slot(&self, offset: u32) -> Option<&AtomicU32> {
        self.shadow.get((offset >> 2) as usize)
    }

    /// Hardware acessível?
    pub fn is_live(&self) -> bool {
        self.live.load(Ordering::Acquire)
    }

    /// Liga/desliga o repasse das escritas para o hardware.
    pub fn set_live(&self, live: bool) {
        self.live.store(live, Ordering::Release);
    }

    /// Escreve registrador inteiro (sombra + hardware).
    pub fn write(&self, offset: u32, value: u32) {
        let Some(slot) = self.slot(offset) else {
            crate::kerror!("(VOP) Registrador fora do banco: ", offset);
            return;
        };
        slot.store(value, Ordering::Relaxed);
        if self.is_live() {
            self.io.write(offset, value);
        }
    }

    /// Read-modify-write a partir da sombra. No-op se `mask == 0`.
    pub fn mask_write(&self, offset: u32, mask: u32, value: u32) {
        if mask == 0 {
            return;
        }
        let Some(slot) = self.slot(offset) else {
            crate::kerror!("(VOP) Registrador fora do banco: ", offset);
            return;
        };
        let cached = slot.load(Ordering::Relaxed);
        let value = (cached & !mask) | value;
        slot.store(value, Ordering::Relaxed);
        if self.is_live() {
            self.io.write(offset, value);
        }
    }

    /// Lê um campo da sombra.
    pub fn read_field(&self, offset: u32, mask: u32, shift: u32) -> u32 {
        self.read_shadow(offset)
            .checked_shr(shift)
            .map_or(0, |v| v & mask)
    }

    /// Lê registrador inteiro da sombra.
    pub fn read_shadow(&self, offset: u32) -> u32 {
        self.slot(offset).map_or(0, |s| s.load(Ordering::Relaxed))
    }

    /// Lê o hardware (cai na sombra se o banco não está vivo).
    pub fn read_live(&self, offset: u32) -> u32 {
        if self.is_live() {
            self.io.read(offset)
        } else {
            self.read_shadow(offset)
        }
    }

    /// Escreve só no hardware (W1C de IRQ, pulso de CFG_DONE).
    pub fn write_live(&self, offset: u32, value: u32) {
        if self.is_live() {
            self.io.write(offset, value);
        }
    }

    /// Escreve um campo de uma janela com base `base`.
    pub fn set(&self, base: u32, reg: VopReg, value: u32) {
        self.mask_write(base + reg.offset, reg.field_mask(), reg.encode(value));
    }

    /// Lê um campo (sombra) de uma janela com base `base`.
    pub fn get(&self, base: u32, reg: VopReg) -> u32 {
        if !reg.is_present() {
            return 0;
        }
        self.read_field(base + reg.offset, reg.mask, reg.shift)
    }

    /// Lê um campo direto do hardware.
    pub fn get_live(&self, base: u32, reg: VopReg) -> u32 {
        if !reg.is_present() {
            return 0;
        }
        (self.read_live(base + reg.offset) >> reg.shift) & reg.mask
    }

    /// Pulso de "aplicar": o hardware latcha no próximo frame.
    pub fn cfg_done(&self) {
        fence(Ordering::Release);
        self.write_live(REG_CFG_DONE, 0x01);
    }

    /// Copia o hardware para a sombra (após reset, no bind).
    pub fn snapshot(&self) {
        for (i, slot) in self.shadow.iter().enumerate() {
            slot.store(self.io.read((i * 4) as u32), Ordering::Relaxed);
        }
    }

    /// Copia a sombra inteira para o hardware (enable).
    pub fn flush(&self) {
        for (i, slot) in self.shadow.iter().enumerate() {
            self.io.write((i * 4) as u32, slot.load(Ordering::Relaxed));
        }
        fence(Ordering::Release);
    }

    /// Cópia da sombra (diagnóstico).
    pub fn shadow_image(&self) -> Vec<u32> {
        self.shadow.iter().map(|s| s.load(Ordering::Relaxed)).collect()
    }
}
