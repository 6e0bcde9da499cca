//! handlers/sms_handler.rs
use actix_web::{web, HttpResponse};
use serde_json::json;

use crate::config::sms_config::SmsGlobalConfig;
use crate::models::message_model::{BulkSmsRequest, SendSmsRequest};
use crate::services::dispatch_service::{self, DispatchService};

/// POST /api/sms/send
pub async fn send_sms_endpoint(
    dispatch_service: web::Data<DispatchService>,
    config: web::Data<SmsGlobalConfig>,
    body: web::Json<SendSmsRequest>,
) -> HttpResponse {
    let req = body.into_inner();

    // Validaciones fatales a nivel de lote: nada se despacha si fallan.
    if req.phone_numbers.trim().is_empty() || req.message.trim().is_empty() {
        return HttpResponse::BadRequest().json(json!({
            "success": false,
            "error": "Phone numbers and message are required"
        }));
    }

    let resolved = dispatch_service::resolve_delimited(&req.phone_numbers);
    if resolved.is_empty() {
        return HttpResponse::BadRequest().json(json!({
            "success": false,
            "error": "At least one valid phone number is required"
        }));
    }

    if req.message.trim().chars().count() > config.max_message_len {
        return HttpResponse::BadRequest().json(json!({
            "success": false,
            "error": format!("Message is too long (max {} characters)", config.max_message_len)
        }));
    }

    if let Some(from_name) = req
        .from_name
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
    {
        if let Some(reason) =
            dispatch_service::validate_sender_id(from_name, config.max_sender_id_len)
        {
            return HttpResponse::BadRequest().json(json!({
                "success": false,
                "error": reason
            }));
        }
    }

    if !dispatch_service.provider_configured() {
        return HttpResponse::InternalServerError().json(json!({
            "success": false,
            "error": "Twilio credentials not configured. Please check your environment variables."
        }));
    }

    match dispatch_service
        .send_to_numbers(&req.phone_numbers, req.message.trim(), req.from_name.clone())
        .await
    {
        Ok(report) => HttpResponse::Ok().json(json!({
            "success": true,
            "message": format!("Processed {} phone numbers", resolved.len()),
            "results": report.results,
            "errors": report.errors,
            "summary": report.summary,
        })),
        Err(e) => {
            log::error!("(send_sms_endpoint) Error despachando lote: {:?}", e);
            HttpResponse::InternalServerError().json(json!({
                "success": false,
                "error": e.to_string()
            }))
        }
    }
}

/// POST /api/sms/bulk
/// Filas ya parseadas de la planilla; los problemas por fila no cortan
/// el lote, van al listado de errores del reporte.
pub async fn bulk_sms_endpoint(
    dispatch_service: web::Data<DispatchService>,
    body: web::Json<BulkSmsRequest>,
) -> HttpResponse {
    let req = body.into_inner();

    if req.rows.is_empty() {
        return HttpResponse::BadRequest().json(json!({
            "success": false,
            "error": "No rows provided"
        }));
    }

    if !dispatch_service.provider_configured() {
        return HttpResponse::InternalServerError().json(json!({
            "success": false,
            "error": "Twilio credentials not configured. Please check your environment variables."
        }));
    }

    match dispatch_service.send_rows(&req.rows).await {
        Ok(report) => HttpResponse::Ok().json(json!({
            "success": true,
            "message": format!("Processed {} SMS messages", report.summary.total),
            "results": report.results,
            "errors": report.errors,
            "summary": report.summary,
        })),
        Err(e) => {
            log::error!("(bulk_sms_endpoint) Error despachando lote masivo: {:?}", e);
            HttpResponse::InternalServerError().json(json!({
                "success": false,
                "error": e.to_string()
            }))
        }
    }
}

/// GET /api/sms/template
/// Plantilla CSV con las columnas que acepta el lote masivo.
pub async fn download_template_endpoint() -> HttpResponse {
    let csv = "Phone Number,Message,Sender ID\n\
               +1234567890,Hello! This is a sample message.,COMPANY\n\
               +1987654321,Another sample message here.,ALERTS\n";

    HttpResponse::Ok()
        .content_type("text/csv; charset=utf-8")
        .insert_header((
            "Content-Disposition",
            "attachment; filename=\"sms-template.csv\"",
        ))
        .body(csv)
}
