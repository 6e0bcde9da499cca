//! services/twilio_service.rs
//! Cliente HTTP del proveedor de SMS (API compatible con Twilio).

use anyhow::{anyhow, Context, Result};
use reqwest::Client;
use serde::Deserialize;

use crate::config::sms_config::SmsGlobalConfig;
use crate::services::dispatch_service::SmsSender;

/// Respuesta mínima del proveedor al crear un mensaje.
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderMessage {
    pub sid: String,
    pub status: Option<String>,
}

/// Cuerpo de error del proveedor ({"message": ..., "code": ...}).
#[derive(Debug, Deserialize)]
struct ProviderError {
    message: Option<String>,
    code: Option<i64>,
}

#[derive(Clone)]
pub struct TwilioService {
    config: SmsGlobalConfig,
    http_client: Client,
}

impl TwilioService {
    pub fn new(config: SmsGlobalConfig) -> Self {
        Self {
            config,
            http_client: Client::new(),
        }
    }
}

impl SmsSender for TwilioService {
    async fn send_sms(&self, to: &str, from: &str, body: &str) -> Result<ProviderMessage> {
        let account_sid = self
            .config
            .twilio_account_sid
            .as_deref()
            .ok_or_else(|| anyhow!("TWILIO_ACCOUNT_SID no configurado"))?;
        let auth_token = self
            .config
            .twilio_auth_token
            .as_deref()
            .ok_or_else(|| anyhow!("TWILIO_AUTH_TOKEN no configurado"))?;

        let url = format!(
            "{}/2010-04-01/Accounts/{}/Messages.json",
            self.config.twilio_base_url, account_sid
        );
        let params = [("To", to), ("From", from), ("Body", body)];

        log::info!("(send_sms) POST al proveedor para '{}' (from='{}')", to, from);
        let resp = self
            .http_client
            .post(&url)
            .basic_auth(account_sid, Some(auth_token))
            .form(&params)
            .send()
            .await
            .context("Fallo al hacer POST al proveedor SMS")?;

        let status = resp.status();
        if !status.is_success() {
            let body_txt = resp.text().await.unwrap_or_default();
            let (message, code) = match serde_json::from_str::<ProviderError>(&body_txt) {
                Ok(e) => (e.message.unwrap_or_else(|| body_txt.clone()), e.code),
                Err(_) => (body_txt.clone(), None),
            };
            log::error!(
                "(send_sms) Proveedor respondió {} para '{}' (code={:?}): {}",
                status,
                to,
                code,
                message
            );
            let message = if message.trim().is_empty() {
                format!("Provider returned {}", status)
            } else {
                message
            };
            return Err(anyhow!("{}", message));
        }

        let provider_msg = resp
            .json::<ProviderMessage>()
            .await
            .context("Respuesta del proveedor no es JSON válido")?;
        log::info!(
            "(send_sms) Mensaje aceptado por el proveedor: sid={}, status={:?}",
            provider_msg.sid,
            provider_msg.status
        );
        Ok(provider_msg)
    }
}
