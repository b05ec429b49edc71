//! Trait de banco de registradores

/// Acesso de 32 bits a um banco de registradores.
///
/// Offsets em bytes, sempre alinhados a 4. Métodos recebem `&self`:
/// o acesso é volátil e a serialização é responsabilidade do chamador.
pub trait RegisterIo: Send + Sync {
    /// Lê o registrador em `offset`.
    fn read(&self, offset: u32) -> u32;

    /// Escreve `value` no registrador em `offset`.
    fn write(&self, offset: u32, value: u32);

    /// Tamanho do banco em bytes.
    fn len(&self) -> usize;
}
