//! handlers/version_handler.rs
use actix_web::{web, HttpResponse};
use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use serde_json::json;

use crate::config::sms_config::SmsGlobalConfig;

#[derive(Debug, Deserialize)]
struct GitHubRelease {
    tag_name: String,
    name: Option<String>,
    published_at: Option<String>,
    html_url: Option<String>,
}

/// GET /api/version
/// Versión local del binario; si hay GITHUB_REPO configurado, agrega
/// el último release publicado.
pub async fn version_endpoint(config: web::Data<SmsGlobalConfig>) -> HttpResponse {
    let mut payload = json!({
        "success": true,
        "version": env!("CARGO_PKG_VERSION"),
    });

    if let Some(repo) = &config.github_repo {
        match fetch_latest_release(repo).await {
            Ok(release) => {
                payload["latest_release"] = json!({
                    "tag": release.tag_name,
                    "name": release.name,
                    "published_at": release.published_at,
                    "url": release.html_url,
                });
            }
            Err(e) => {
                // La versión local se devuelve igual aunque GitHub no responda.
                log::warn!("(version_endpoint) No se pudo consultar GitHub: {:?}", e);
            }
        }
    }

    HttpResponse::Ok().json(payload)
}

async fn fetch_latest_release(repo: &str) -> Result<GitHubRelease> {
    let url = format!("https://api.github.com/repos/{}/releases/latest", repo);
    let resp = reqwest::Client::new()
        .get(&url)
        .header(reqwest::header::USER_AGENT, "sms_service")
        .send()
        .await
        .context("Fallo al llamar a GitHub")?;

    if !resp.status().is_success() {
        return Err(anyhow!("GitHub respondió {}", resp.status()));
    }
    resp.json::<GitHubRelease>()
        .await
        .context("Respuesta de GitHub no es JSON válido")
}
