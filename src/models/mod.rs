//! models/mod.rs
//! Módulo raíz para modelos/estructuras compartidas.

pub mod group_model;
pub mod message_model;
pub mod recipient_model;
