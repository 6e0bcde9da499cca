//! handlers/message_handler.rs
use actix_web::{web, HttpRequest, HttpResponse};
use serde::Deserialize;
use serde_json::json;

use crate::config::sms_config::SmsGlobalConfig;
use crate::handlers::group_handler::bearer_token;
use crate::services::message_service::MessageService;

#[derive(Debug, Deserialize)]
pub struct MessagesQuery {
    pub phone_number: Option<String>,
    pub limit: Option<i64>,
}

/// GET /api/messages?phone_number=&limit=
pub async fn list_messages_endpoint(
    message_service: web::Data<MessageService>,
    query: web::Query<MessagesQuery>,
) -> HttpResponse {
    let result = match query.phone_number.as_deref().filter(|p| !p.is_empty()) {
        Some(phone) => message_service.messages_by_phone(phone).await,
        None => message_service.recent_messages(query.limit.unwrap_or(50)).await,
    };

    match result {
        Ok(messages) => HttpResponse::Ok().json(json!({
            "success": true,
            "count": messages.len(),
            "messages": messages,
        })),
        Err(e) => {
            log::error!("(list_messages_endpoint) Error consultando historial: {:?}", e);
            HttpResponse::InternalServerError().json(json!({
                "success": false,
                "error": "Failed to fetch messages"
            }))
        }
    }
}

/// GET /api/messages/stats
pub async fn message_stats_endpoint(
    message_service: web::Data<MessageService>,
) -> HttpResponse {
    match message_service.message_stats().await {
        Ok(stats) => HttpResponse::Ok().json(json!({
            "success": true,
            "stats": stats,
        })),
        Err(e) => {
            log::error!("(message_stats_endpoint) Error calculando stats: {:?}", e);
            HttpResponse::InternalServerError().json(json!({
                "success": false,
                "error": "Failed to fetch message stats"
            }))
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct DeleteQuery {
    pub id: Option<String>,
}

/// DELETE /api/messages/delete?id=
pub async fn delete_message_endpoint(
    message_service: web::Data<MessageService>,
    query: web::Query<DeleteQuery>,
) -> HttpResponse {
    let Some(id) = query.id.as_deref().filter(|id| !id.is_empty()) else {
        return HttpResponse::BadRequest().json(json!({
            "success": false,
            "error": "Message ID is required"
        }));
    };

    match message_service.delete_message(id).await {
        Ok(true) => HttpResponse::Ok().json(json!({
            "success": true,
            "message": "Message deleted successfully"
        })),
        Ok(false) => HttpResponse::NotFound().json(json!({
            "success": false,
            "error": "Message not found"
        })),
        Err(e) => {
            log::error!("(delete_message_endpoint) Error borrando '{}': {:?}", id, e);
            HttpResponse::InternalServerError().json(json!({
                "success": false,
                "error": "Internal server error"
            }))
        }
    }
}

/// DELETE /api/messages/delete-all
pub async fn delete_all_messages_endpoint(
    message_service: web::Data<MessageService>,
) -> HttpResponse {
    match message_service.delete_all_messages().await {
        Ok(deleted) => HttpResponse::Ok().json(json!({
            "success": true,
            "message": "All messages deleted successfully",
            "deleted": deleted,
        })),
        Err(e) => {
            log::error!("(delete_all_messages_endpoint) Error vaciando historial: {:?}", e);
            HttpResponse::InternalServerError().json(json!({
                "success": false,
                "error": "Internal server error"
            }))
        }
    }
}

/// POST /api/messages/purge
/// Purga de retención, protegida con `Authorization: Bearer CRON_SECRET`
/// (la dispara un cron externo, no un usuario).
pub async fn purge_messages_endpoint(
    message_service: web::Data<MessageService>,
    config: web::Data<SmsGlobalConfig>,
    req: HttpRequest,
) -> HttpResponse {
    let authorized = match (&config.cron_secret, bearer_token(&req)) {
        (Some(secret), Some(token)) => token == *secret,
        _ => false,
    };
    if !authorized {
        return HttpResponse::Unauthorized().json(json!({
            "success": false,
            "error": "Unauthorized"
        }));
    }

    let hours = config.retention_hours;
    match message_service.purge_older_than(hours).await {
        Ok(deleted) => HttpResponse::Ok().json(json!({
            "success": true,
            "message": format!(
                "Successfully deleted {} messages older than {} hours",
                deleted, hours
            ),
            "deleted": deleted,
            "timestamp": chrono::Utc::now().to_rfc3339(),
        })),
        Err(e) => {
            log::error!("(purge_messages_endpoint) Error en purga: {:?}", e);
            HttpResponse::InternalServerError().json(json!({
                "success": false,
                "error": e.to_string(),
                "timestamp": chrono::Utc::now().to_rfc3339(),
            }))
        }
    }
}
