//! handlers/mod.rs
pub mod group_handler;
pub mod message_handler;
pub mod sms_handler;
pub mod version_handler;
