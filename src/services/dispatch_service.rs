//! services/dispatch_service.rs
//! Núcleo del servicio: resolver destinatarios, validarlos uno a uno,
//! despachar en secuencia y agregar los resultados parciales.
//! Ningún fallo individual corta el lote; los rechazos de validación
//! van al mismo listado de errores que los fallos del proveedor.

use anyhow::{anyhow, Result};
use regex::Regex;
use std::sync::LazyLock;

use crate::config::sms_config::SmsGlobalConfig;
use crate::models::group_model::GroupMember;
use crate::models::message_model::NewMessage;
use crate::models::recipient_model::{
    BatchReport, BatchSummary, DispatchOutcome, DispatchStatus, Recipient, SpreadsheetRow,
};
use crate::services::message_service::MessageService;
use crate::services::twilio_service::{ProviderMessage, TwilioService};

static SENDER_ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9\s+\-_&]+$").expect("regex de sender ID inválida"));

/// Seam del proveedor de SMS: un envío por destinatario. `TwilioService`
/// la implementa contra la API HTTP real; los tests usan un doble.
pub trait SmsSender {
    async fn send_sms(&self, to: &str, from: &str, body: &str) -> Result<ProviderMessage>;
}

/// Parámetros compartidos por todos los destinatarios de un lote.
#[derive(Debug, Clone)]
pub struct BatchOptions {
    /// Cuerpo compartido; las filas de planilla pueden traer el suyo.
    pub message: Option<String>,
    /// Sender ID compartido; las filas pueden traer el suyo.
    pub from_name: Option<String>,
    /// Número del proveedor cuando no hay sender ID.
    pub default_sender: String,
    pub max_message_len: usize,
    pub max_sender_id_len: usize,
}

// ------------------------------------------------------------------
// Resolver (4.1)
// ------------------------------------------------------------------

/// (a) String crudo separado por comas o punto y coma.
pub fn resolve_delimited(raw: &str) -> Vec<Recipient> {
    raw.split([',', ';'])
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .map(|n| Recipient {
            phone_number: n.to_string(),
            display_name: None,
            sender_id: None,
            message: None,
        })
        .collect()
}

/// (b) Filas ya parseadas de planilla, con cuerpo y sender ID por fila.
pub fn resolve_rows(rows: &[SpreadsheetRow]) -> Vec<Recipient> {
    rows.iter()
        .map(|row| Recipient {
            phone_number: trimmed(&row.phone_number).unwrap_or_default(),
            display_name: trimmed(&row.name),
            sender_id: trimmed(&row.sender_id),
            message: trimmed(&row.message),
        })
        .collect()
}

/// (c) Miembros de directorio ya deduplicados; solo los que tienen teléfono.
pub fn resolve_members(members: &[GroupMember]) -> Vec<Recipient> {
    members
        .iter()
        .filter(|m| m.has_phone_number)
        .map(|m| Recipient {
            phone_number: m.phone_number.clone().unwrap_or_default(),
            display_name: Some(m.user.display_name.clone()),
            sender_id: None,
            message: None,
        })
        .collect()
}

fn trimmed(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

// ------------------------------------------------------------------
// Validador por destinatario (4.2)
// ------------------------------------------------------------------

/// Aplica las reglas por destinatario; Some(motivo) si se rechaza.
/// Un rechazo excluye al destinatario del despacho pero no corta el lote.
pub fn validate_recipient(recipient: &Recipient, batch: &BatchOptions) -> Option<String> {
    let phone = recipient.phone_number.trim();
    if phone.is_empty() {
        return Some("Phone number is required".to_string());
    }
    if !phone.starts_with('+') {
        return Some(format!(
            "Phone number \"{}\" must include country code (e.g., +1234567890)",
            phone
        ));
    }

    let body = effective_body(recipient, batch);
    if body.trim().is_empty() {
        return Some("Message is required".to_string());
    }
    if body.chars().count() > batch.max_message_len {
        return Some(format!(
            "Message is too long (max {} characters)",
            batch.max_message_len
        ));
    }

    if let Some(sender_id) = recipient
        .sender_id
        .as_deref()
        .or(batch.from_name.as_deref())
    {
        if let Some(reason) = validate_sender_id(sender_id, batch.max_sender_id_len) {
            return Some(reason);
        }
    }

    None
}

/// Reglas del sender ID alfanumérico: largo máximo, charset permitido
/// y al menos una letra.
pub fn validate_sender_id(sender_id: &str, max_len: usize) -> Option<String> {
    if sender_id.chars().count() > max_len {
        return Some(format!("Sender ID must be {} characters or less", max_len));
    }
    if !SENDER_ID_RE.is_match(sender_id) {
        return Some(
            "Sender ID can only contain letters, numbers, spaces, +, -, _, and &".to_string(),
        );
    }
    if !sender_id.chars().any(|c| c.is_ascii_alphabetic()) {
        return Some("Sender ID must contain at least one letter".to_string());
    }
    None
}

fn effective_body<'a>(recipient: &'a Recipient, batch: &'a BatchOptions) -> &'a str {
    recipient
        .message
        .as_deref()
        .or(batch.message.as_deref())
        .unwrap_or("")
}

fn effective_sender(recipient: &Recipient, batch: &BatchOptions) -> String {
    recipient
        .sender_id
        .clone()
        .or_else(|| batch.from_name.clone())
        .unwrap_or_else(|| batch.default_sender.clone())
}

// ------------------------------------------------------------------
// Loop de despacho + agregación (4.3 / 4.4)
// ------------------------------------------------------------------

/// Procesa un lote completo: valida cada destinatario, envía en secuencia
/// por el proveedor y acumula resultados parciales. Todos los resultados
/// (incluidos los rechazos de validación) se persisten en el historial
/// antes de devolver el reporte.
///
/// El summary cuenta solo destinatarios que pasaron validación:
/// sent + failed == total.
pub async fn run_batch<S: SmsSender>(
    sender: &S,
    store: &MessageService,
    recipients: &[Recipient],
    batch: &BatchOptions,
) -> Result<BatchReport> {
    log::info!(
        "(run_batch) Iniciando lote con {} destinatarios resueltos...",
        recipients.len()
    );

    let mut results = Vec::new();
    let mut errors = Vec::new();
    let mut summary = BatchSummary {
        total: 0,
        sent: 0,
        failed: 0,
    };

    for recipient in recipients {
        let body = effective_body(recipient, batch).trim().to_string();
        let from_name = recipient
            .sender_id
            .clone()
            .or_else(|| batch.from_name.clone());

        // 1) Validación independiente; el rechazo no llega al proveedor
        //    ni cuenta en el summary, pero queda en errores e historial.
        if let Some(reason) = validate_recipient(recipient, batch) {
            log::warn!(
                "(run_batch) Destinatario '{}' rechazado en validación: {}",
                recipient.phone_number,
                reason
            );
            let stored = store
                .add_message(&NewMessage {
                    phone_number: recipient.phone_number.clone(),
                    message: body,
                    status: "failed".to_string(),
                    message_id: None,
                    error_message: Some(reason.clone()),
                    name: recipient.display_name.clone(),
                    from_name,
                })
                .await?;
            errors.push(DispatchOutcome {
                phone_number: recipient.phone_number.clone(),
                display_name: recipient.display_name.clone(),
                status: DispatchStatus::Failed,
                message_id: None,
                error: Some(reason),
                stored_id: Some(stored.id),
            });
            continue;
        }

        summary.total += 1;
        let from = effective_sender(recipient, batch);

        // 2) Un envío por destinatario; el error de uno no bloquea al resto.
        match sender.send_sms(&recipient.phone_number, &from, &body).await {
            Ok(provider_msg) => {
                log::info!(
                    "(run_batch) SMS enviado a '{}' (sid={})",
                    recipient.phone_number,
                    provider_msg.sid
                );
                let stored = store
                    .add_message(&NewMessage {
                        phone_number: recipient.phone_number.clone(),
                        message: body,
                        status: "sent".to_string(),
                        message_id: Some(provider_msg.sid.clone()),
                        error_message: None,
                        name: recipient.display_name.clone(),
                        from_name,
                    })
                    .await?;
                summary.sent += 1;
                results.push(DispatchOutcome {
                    phone_number: recipient.phone_number.clone(),
                    display_name: recipient.display_name.clone(),
                    status: DispatchStatus::Sent,
                    message_id: Some(provider_msg.sid),
                    error: None,
                    stored_id: Some(stored.id),
                });
            }
            Err(e) => {
                let error_text = e.to_string();
                log::error!(
                    "(run_batch) Error enviando SMS a '{}': {}",
                    recipient.phone_number,
                    error_text
                );
                let stored = store
                    .add_message(&NewMessage {
                        phone_number: recipient.phone_number.clone(),
                        message: body,
                        status: "failed".to_string(),
                        message_id: None,
                        error_message: Some(error_text.clone()),
                        name: recipient.display_name.clone(),
                        from_name,
                    })
                    .await?;
                summary.failed += 1;
                errors.push(DispatchOutcome {
                    phone_number: recipient.phone_number.clone(),
                    display_name: recipient.display_name.clone(),
                    status: DispatchStatus::Failed,
                    message_id: None,
                    error: Some(error_text),
                    stored_id: Some(stored.id),
                });
            }
        }
    }

    log::info!(
        "(run_batch) Lote finalizado: total={}, sent={}, failed={}, rechazados={}",
        summary.total,
        summary.sent,
        summary.failed,
        errors.len() - summary.failed
    );

    Ok(BatchReport {
        results,
        errors,
        summary,
    })
}

// ------------------------------------------------------------------
// Servicio expuesto a los handlers
// ------------------------------------------------------------------

#[derive(Clone)]
pub struct DispatchService {
    twilio_service: TwilioService,
    message_service: MessageService,
    config: SmsGlobalConfig,
}

impl DispatchService {
    pub fn new(
        twilio_service: TwilioService,
        message_service: MessageService,
        config: SmsGlobalConfig,
    ) -> Self {
        Self {
            twilio_service,
            message_service,
            config,
        }
    }

    pub fn provider_configured(&self) -> bool {
        self.config.provider_configured()
    }

    /// Envío simple: string crudo de números + cuerpo compartido.
    pub async fn send_to_numbers(
        &self,
        raw_numbers: &str,
        message: &str,
        from_name: Option<String>,
    ) -> Result<BatchReport> {
        let recipients = resolve_delimited(raw_numbers);
        let batch = self.batch_options(
            Some(message.to_string()),
            from_name,
            self.config.max_message_len,
        )?;
        run_batch(
            &self.twilio_service,
            &self.message_service,
            &recipients,
            &batch,
        )
        .await
    }

    /// Lote de planilla: cada fila trae su propio cuerpo y sender ID.
    pub async fn send_rows(&self, rows: &[SpreadsheetRow]) -> Result<BatchReport> {
        let recipients = resolve_rows(rows);
        let batch = self.batch_options(None, None, self.config.bulk_max_message_len)?;
        run_batch(
            &self.twilio_service,
            &self.message_service,
            &recipients,
            &batch,
        )
        .await
    }

    /// Miembros de grupos del directorio (ya deduplicados por usuario).
    pub async fn send_to_members(
        &self,
        members: &[GroupMember],
        message: &str,
        from_name: Option<String>,
    ) -> Result<BatchReport> {
        let recipients = resolve_members(members);
        let batch = self.batch_options(
            Some(message.to_string()),
            from_name,
            self.config.max_message_len,
        )?;
        run_batch(
            &self.twilio_service,
            &self.message_service,
            &recipients,
            &batch,
        )
        .await
    }

    fn batch_options(
        &self,
        message: Option<String>,
        from_name: Option<String>,
        max_message_len: usize,
    ) -> Result<BatchOptions> {
        // Error fatal a nivel de lote: sin credenciales no se despacha nada.
        let default_sender = self.config.default_sender.clone().ok_or_else(|| {
            anyhow!("Twilio credentials not configured. Please check your environment variables.")
        })?;
        Ok(BatchOptions {
            message,
            from_name: trimmed(&from_name),
            default_sender,
            max_message_len,
            max_sender_id_len: self.config.max_sender_id_len,
        })
    }
}
