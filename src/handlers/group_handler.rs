//! handlers/group_handler.rs
//! Endpoints respaldados por el directorio (Azure AD vía Graph).
//! Todos requieren el bearer token del caller; sin token no se
//! resuelve ni despacha nada (error fatal a nivel de request).

use actix_web::{web, HttpRequest, HttpResponse};
use serde::Deserialize;
use serde_json::json;

use crate::config::sms_config::SmsGlobalConfig;
use crate::models::message_model::GroupSmsRequest;
use crate::services::directory_service::DirectoryService;
use crate::services::dispatch_service::{self, DispatchService};

/// Extrae el bearer token del header Authorization.
pub(crate) fn bearer_token(req: &HttpRequest) -> Option<String> {
    let header = req
        .headers()
        .get(actix_web::http::header::AUTHORIZATION)?
        .to_str()
        .ok()?;
    header
        .strip_prefix("Bearer ")
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
}

#[derive(Debug, Deserialize)]
pub struct GroupsQuery {
    pub search: Option<String>,
    #[serde(rename = "type")]
    pub group_type: Option<String>,
}

/// GET /api/azure-ad/groups?search=&type=all|security|distribution
pub async fn list_groups_endpoint(
    directory_service: web::Data<DirectoryService>,
    query: web::Query<GroupsQuery>,
    req: HttpRequest,
) -> HttpResponse {
    let Some(token) = bearer_token(&req) else {
        return HttpResponse::Unauthorized().json(json!({
            "success": false,
            "error": "Authentication required"
        }));
    };

    let group_type = query.group_type.as_deref().unwrap_or("all");
    match directory_service
        .list_groups(&token, group_type, query.search.as_deref())
        .await
    {
        Ok(groups) => HttpResponse::Ok().json(json!({
            "success": true,
            "total": groups.len(),
            "groups": groups,
        })),
        Err(e) => {
            log::error!("(list_groups_endpoint) Error consultando grupos: {:?}", e);
            HttpResponse::InternalServerError().json(json!({
                "success": false,
                "error": e.to_string(),
                "groups": [],
                "total": 0,
            }))
        }
    }
}

/// GET /api/azure-ad/groups/{group_id}/members
pub async fn group_members_endpoint(
    directory_service: web::Data<DirectoryService>,
    path: web::Path<String>,
    req: HttpRequest,
) -> HttpResponse {
    let Some(token) = bearer_token(&req) else {
        return HttpResponse::Unauthorized().json(json!({
            "success": false,
            "error": "Authentication required"
        }));
    };

    let group_id = path.into_inner();
    match directory_service.get_group_members(&token, &group_id).await {
        Ok(members) => {
            let with_phone = members.iter().filter(|m| m.has_phone_number).count();
            HttpResponse::Ok().json(json!({
                "success": true,
                "total": members.len(),
                "with_phone": with_phone,
                "members": members,
            }))
        }
        Err(e) => {
            log::error!(
                "(group_members_endpoint) Error con miembros de '{}': {:?}",
                group_id,
                e
            );
            HttpResponse::InternalServerError().json(json!({
                "success": false,
                "error": e.to_string()
            }))
        }
    }
}

/// POST /api/azure-ad/send-sms
pub async fn group_send_sms_endpoint(
    directory_service: web::Data<DirectoryService>,
    dispatch_service: web::Data<DispatchService>,
    config: web::Data<SmsGlobalConfig>,
    body: web::Json<GroupSmsRequest>,
    req: HttpRequest,
) -> HttpResponse {
    let Some(token) = bearer_token(&req) else {
        return HttpResponse::Unauthorized().json(json!({
            "success": false,
            "error": "Authentication required"
        }));
    };

    let payload = body.into_inner();

    if payload.group_ids.is_empty() {
        return HttpResponse::BadRequest().json(json!({
            "success": false,
            "error": "Group IDs are required"
        }));
    }
    if payload.message.trim().is_empty() {
        return HttpResponse::BadRequest().json(json!({
            "success": false,
            "error": "Message is required"
        }));
    }
    if payload.message.trim().chars().count() > config.max_message_len {
        return HttpResponse::BadRequest().json(json!({
            "success": false,
            "error": format!("Message is too long (max {} characters)", config.max_message_len)
        }));
    }
    if let Some(from_name) = payload
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

    // Resolver miembros antes de despachar; directorio caído => fatal.
    let members = match directory_service
        .get_multiple_group_members(&token, &payload.group_ids)
        .await
    {
        Ok(members) => members,
        Err(e) => {
            log::error!("(group_send_sms_endpoint) Error resolviendo grupos: {:?}", e);
            return HttpResponse::InternalServerError().json(json!({
                "success": false,
                "error": e.to_string()
            }));
        }
    };

    let with_phone = members.iter().filter(|m| m.has_phone_number).count();
    if with_phone == 0 {
        return HttpResponse::BadRequest().json(json!({
            "success": false,
            "error": "No members with phone numbers found in the selected groups",
            "total": members.len(),
            "with_phone": 0,
        }));
    }

    match dispatch_service
        .send_to_members(&members, payload.message.trim(), payload.from_name.clone())
        .await
    {
        Ok(report) => HttpResponse::Ok().json(json!({
            "success": true,
            "message": format!("Processed {} members with phone numbers", with_phone),
            "results": report.results,
            "errors": report.errors,
            "summary": {
                "total": report.summary.total,
                "sent": report.summary.sent,
                "failed": report.summary.failed,
                "total_members": members.len(),
                "with_phone": with_phone,
                "without_phone": members.len() - with_phone,
            },
        })),
        Err(e) => {
            log::error!("(group_send_sms_endpoint) Error despachando a grupos: {:?}", e);
            HttpResponse::InternalServerError().json(json!({
                "success": false,
                "error": e.to_string()
            }))
        }
    }
}
