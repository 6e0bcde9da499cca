//! config/mod.rs
//! Configuración global del servicio.

pub mod sms_config;
