//! models/recipient_model.rs
//! Estructuras transitorias del pipeline de despacho:
//! lote → destinatarios resueltos → resultados por destinatario.

use serde::{Deserialize, Serialize};

/// Destinatario ya resuelto. Se produce por lote y no se persiste.
#[derive(Debug, Clone)]
pub struct Recipient {
    pub phone_number: String,
    pub display_name: Option<String>,
    /// Sender ID por fila; None => se usa el del lote (o el número por defecto).
    pub sender_id: Option<String>,
    /// Cuerpo por fila (lotes de planilla); None => cuerpo compartido del lote.
    pub message: Option<String>,
}

/// Fila ya parseada de una planilla. El parseo del archivo es un
/// colaborador externo; este servicio recibe las filas como JSON.
/// Los alias corresponden a los encabezados de columna de la plantilla.
#[derive(Debug, Clone, Deserialize)]
pub struct SpreadsheetRow {
    #[serde(default, alias = "Phone Number")]
    pub phone_number: Option<String>,
    #[serde(default, alias = "Message")]
    pub message: Option<String>,
    #[serde(default, alias = "Name")]
    pub name: Option<String>,
    #[serde(default, alias = "Sender ID")]
    pub sender_id: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DispatchStatus {
    Sent,
    Failed,
}

/// Resultado de un destinatario dentro de un lote. Inmutable una vez creado.
#[derive(Debug, Clone, Serialize)]
pub struct DispatchOutcome {
    pub phone_number: String,
    pub display_name: Option<String>,
    pub status: DispatchStatus,
    /// Identificador emitido por el proveedor (solo en envíos exitosos).
    pub message_id: Option<String>,
    pub error: Option<String>,
    /// Id del registro persistido en el historial.
    pub stored_id: Option<String>,
}

/// Invariante: sent + failed == total == destinatarios que pasaron validación.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct BatchSummary {
    pub total: usize,
    pub sent: usize,
    pub failed: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    pub results: Vec<DispatchOutcome>,
    /// Rechazos de validación y fallos del proveedor, en el mismo listado.
    pub errors: Vec<DispatchOutcome>,
    pub summary: BatchSummary,
}
