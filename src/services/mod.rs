//! services/mod.rs
//! Módulo que agrupa distintos "servicios" o "capas de negocio" de la app.

pub mod directory_service;
pub mod dispatch_service;
pub mod message_service;
pub mod twilio_service;
