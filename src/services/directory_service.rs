//! services/directory_service.rs
//! Cliente de Microsoft Graph para grupos y miembros del directorio.
//! El bearer token viene del header Authorization de cada request
//! entrante; este servicio no maneja sesiones ni refresh.

use std::collections::HashSet;

use anyhow::{anyhow, Context, Result};
use reqwest::Client;
use serde::de::DeserializeOwned;

use crate::config::sms_config::SmsGlobalConfig;
use crate::models::group_model::{
    DirectoryGroup, DirectoryUser, GraphGroup, GraphList, GraphMember, GroupMember,
};

#[derive(Clone)]
pub struct DirectoryService {
    config: SmsGlobalConfig,
    http_client: Client,
}

impl DirectoryService {
    pub fn new(config: SmsGlobalConfig) -> Self {
        Self {
            config,
            http_client: Client::new(),
        }
    }

    async fn graph_get<T: DeserializeOwned>(&self, access_token: &str, endpoint: &str) -> Result<T> {
        let url = format!("{}{}", self.config.graph_base_url, endpoint);
        log::info!("(graph_get) GET {}", url);

        let resp = self
            .http_client
            .get(&url)
            .bearer_auth(access_token)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .send()
            .await
            .context("Fallo al llamar a Graph API")?;

        let status = resp.status();
        if !status.is_success() {
            let body_txt = resp.text().await.unwrap_or_default();
            log::error!("(graph_get) Graph API respondió {}: {}", status, body_txt);
            return Err(anyhow!("Graph API error: {}", status));
        }

        resp.json::<T>()
            .await
            .context("Respuesta de Graph API no es JSON válido")
    }

    /// Lista/busca grupos. `group_type`: "all" | "security" | "distribution".
    /// Si hay término de búsqueda (mínimo 3 caracteres) se filtra por
    /// prefijo del nombre y se ignora el tipo, igual que el filtro de la UI.
    pub async fn list_groups(
        &self,
        access_token: &str,
        group_type: &str,
        search: Option<&str>,
    ) -> Result<Vec<DirectoryGroup>> {
        let mut endpoint =
            String::from("/groups?$select=id,displayName,description,mail,securityEnabled");

        let search = search.map(str::trim).filter(|s| s.len() >= 3);
        if let Some(term) = search {
            endpoint.push_str(&format!(
                "&$filter=startswith(displayName,'{}')",
                urlencoding::encode(term)
            ));
        } else {
            match group_type {
                "security" => endpoint.push_str("&$filter=securityEnabled eq true"),
                "distribution" => endpoint.push_str("&$filter=securityEnabled eq false"),
                _ => {}
            }
        }

        let data: GraphList<GraphGroup> = self.graph_get(access_token, &endpoint).await?;
        Ok(data.value.into_iter().map(DirectoryGroup::from).collect())
    }

    /// Miembros de un grupo con su teléfono ya resuelto
    /// (mobilePhone, o el primer businessPhones si no hay móvil).
    pub async fn get_group_members(
        &self,
        access_token: &str,
        group_id: &str,
    ) -> Result<Vec<GroupMember>> {
        let endpoint = format!(
            "/groups/{}/members?$select=id,displayName,mail,mobilePhone,businessPhones,userPrincipalName",
            group_id
        );
        let data: GraphList<GraphMember> = self.graph_get(access_token, &endpoint).await?;

        let mut members = Vec::new();
        for m in data.value {
            // Se descartan objetos que no son usuarios (service principals, etc.)
            let (Some(id), Some(display_name), Some(user_principal_name)) =
                (m.id, m.display_name, m.user_principal_name)
            else {
                continue;
            };

            let phone_number = m
                .mobile_phone
                .filter(|p| !p.trim().is_empty())
                .or_else(|| {
                    m.business_phones
                        .unwrap_or_default()
                        .into_iter()
                        .find(|p| !p.trim().is_empty())
                });
            let has_phone_number = phone_number.is_some();

            members.push(GroupMember {
                user: DirectoryUser {
                    id,
                    display_name,
                    mail: m.mail,
                    user_principal_name,
                },
                phone_number,
                has_phone_number,
            });
        }

        log::info!(
            "(get_group_members) Grupo '{}': {} usuarios, {} con teléfono",
            group_id,
            members.len(),
            members.iter().filter(|m| m.has_phone_number).count()
        );
        Ok(members)
    }

    /// Miembros de varios grupos. Un grupo que falla se loguea y se
    /// saltea; los demás siguen. La deduplicación es por id de usuario.
    pub async fn get_multiple_group_members(
        &self,
        access_token: &str,
        group_ids: &[String],
    ) -> Result<Vec<GroupMember>> {
        let mut per_group = Vec::new();
        for group_id in group_ids {
            match self.get_group_members(access_token, group_id).await {
                Ok(members) => per_group.push(members),
                Err(e) => {
                    log::error!(
                        "(get_multiple_group_members) Error con grupo '{}': {:?}",
                        group_id,
                        e
                    );
                }
            }
        }
        Ok(merge_group_members(per_group))
    }
}

/// Junta miembros de varios grupos deduplicando por id de usuario;
/// gana la primera aparición y se conserva el orden de inserción.
pub fn merge_group_members(per_group: Vec<Vec<GroupMember>>) -> Vec<GroupMember> {
    let mut seen_user_ids = HashSet::new();
    let mut merged = Vec::new();
    for members in per_group {
        for member in members {
            if seen_user_ids.insert(member.user.id.clone()) {
                merged.push(member);
            }
        }
    }
    merged
}
