//! tests/mod.rs
//! Pruebas del pipeline de despacho y del historial.

pub mod dispatch_tests;
