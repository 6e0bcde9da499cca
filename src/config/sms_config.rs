//! config/sms_config.rs
//! Configuración global del servicio SMS (credenciales del proveedor,
//! límites de validación, retención del historial).

/// Configuración cargada una vez al inicio desde el entorno (.env).
/// Las credenciales son opcionales a propósito: su ausencia se reporta
/// como error fatal recién al intentar despachar un lote.
#[derive(Debug, Clone)]
pub struct SmsGlobalConfig {
    pub twilio_account_sid: Option<String>,
    pub twilio_auth_token: Option<String>,
    /// Número del proveedor usado como remitente cuando no hay sender ID.
    pub default_sender: Option<String>,
    pub twilio_base_url: String,
    pub graph_base_url: String,
    /// Límite del cuerpo para envío simple y a grupos.
    pub max_message_len: usize,
    /// Límite mayor para lotes de planilla (mensajes concatenados).
    pub bulk_max_message_len: usize,
    pub max_sender_id_len: usize,
    /// Ventana de retención del historial, en horas.
    pub retention_hours: i64,
    /// Credencial que protege el endpoint de purga.
    pub cron_secret: Option<String>,
    /// "owner/repo" para consultar el último release publicado.
    pub github_repo: Option<String>,
}

impl SmsGlobalConfig {
    pub fn from_env() -> Self {
        SmsGlobalConfig {
            twilio_account_sid: env_opt("TWILIO_ACCOUNT_SID"),
            twilio_auth_token: env_opt("TWILIO_AUTH_TOKEN"),
            default_sender: env_opt("TWILIO_PHONE_NUMBER"),
            twilio_base_url: std::env::var("TWILIO_BASE_URL")
                .unwrap_or_else(|_| "https://api.twilio.com".to_string()),
            graph_base_url: std::env::var("GRAPH_BASE_URL")
                .unwrap_or_else(|_| "https://graph.microsoft.com/v1.0".to_string()),
            max_message_len: env_usize("SMS_MAX_MESSAGE_LEN", 160),
            bulk_max_message_len: env_usize("SMS_BULK_MAX_MESSAGE_LEN", 1600),
            max_sender_id_len: 11,
            retention_hours: env_usize("SMS_RETENTION_HOURS", 48) as i64,
            cron_secret: env_opt("CRON_SECRET"),
            github_repo: env_opt("GITHUB_REPO"),
        }
    }

    /// true si hay credenciales completas para despachar por el proveedor.
    pub fn provider_configured(&self) -> bool {
        self.twilio_account_sid.is_some()
            && self.twilio_auth_token.is_some()
            && self.default_sender.is_some()
    }
}

impl Default for SmsGlobalConfig {
    fn default() -> Self {
        SmsGlobalConfig {
            twilio_account_sid: None,
            twilio_auth_token: None,
            default_sender: None,
            twilio_base_url: "https://api.twilio.com".to_string(),
            graph_base_url: "https://graph.microsoft.com/v1.0".to_string(),
            max_message_len: 160,
            bulk_max_message_len: 1600,
            max_sender_id_len: 11,
            retention_hours: 48,
            cron_secret: None,
            github_repo: None,
        }
    }
}

fn env_opt(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn env_usize(key: &str, default: usize) -> usize {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
