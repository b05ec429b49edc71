//! # Display Tests
//!
//! Testes do pipeline VOP contra um `FakeVop` que latcha registradores no
//! frame, como o hardware.

mod fake;
