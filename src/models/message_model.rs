//! models/message_model.rs

use serde::{Deserialize, Serialize};

use crate::models::recipient_model::SpreadsheetRow;

/// POST /api/sms/send: números separados por coma o punto y coma.
#[derive(Debug, Clone, Deserialize)]
pub struct SendSmsRequest {
    pub phone_numbers: String,
    pub message: String,
    pub from_name: Option<String>,
}

/// POST /api/sms/bulk: filas ya parseadas de la planilla.
#[derive(Debug, Clone, Deserialize)]
pub struct BulkSmsRequest {
    pub rows: Vec<SpreadsheetRow>,
}

/// POST /api/azure-ad/send-sms
#[derive(Debug, Clone, Deserialize)]
pub struct GroupSmsRequest {
    pub group_ids: Vec<String>,
    pub message: String,
    pub from_name: Option<String>,
}

/// Registro del historial tal como se persiste en la tabla `messages`.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct MessageRecord {
    pub id: String,
    pub phone_number: String,
    pub message: String,
    pub status: String, // "sent" | "failed"
    pub message_id: Option<String>,
    pub error_message: Option<String>,
    pub name: Option<String>,
    pub from_name: Option<String>,
    pub created_at: String,
}

/// Datos de un intento de envío listos para insertar (id y timestamp
/// los pone el servicio de historial).
#[derive(Debug, Clone)]
pub struct NewMessage {
    pub phone_number: String,
    pub message: String,
    pub status: String,
    pub message_id: Option<String>,
    pub error_message: Option<String>,
    pub name: Option<String>,
    pub from_name: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MessageStats {
    pub total: i64,
    pub sent: i64,
    pub failed: i64,
}
