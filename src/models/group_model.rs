//! models/group_model.rs
//! Estructuras del directorio (Azure AD vía Microsoft Graph), tanto las
//! expuestas por la API propia como las del wire de Graph.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DirectoryUser {
    pub id: String,
    pub display_name: String,
    pub mail: Option<String>,
    pub user_principal_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DirectoryGroup {
    pub id: String,
    pub display_name: String,
    pub description: Option<String>,
    pub mail: Option<String>,
    pub security_enabled: bool,
}

/// Miembro de grupo con su teléfono ya extraído (mobile o primer business).
#[derive(Debug, Clone, Serialize)]
pub struct GroupMember {
    pub user: DirectoryUser,
    pub phone_number: Option<String>,
    pub has_phone_number: bool,
}

// ------------------------------------------------------------------
// Wire de Graph API (camelCase). Solo para deserializar respuestas.
// ------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct GraphList<T> {
    #[serde(default = "Vec::new")]
    pub value: Vec<T>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphGroup {
    pub id: String,
    pub display_name: String,
    pub description: Option<String>,
    pub mail: Option<String>,
    pub security_enabled: Option<bool>,
}

/// Los grupos pueden contener objetos que no son usuarios (service
/// principals, dispositivos); por eso todos los campos son opcionales.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphMember {
    pub id: Option<String>,
    pub display_name: Option<String>,
    pub mail: Option<String>,
    pub mobile_phone: Option<String>,
    pub business_phones: Option<Vec<String>>,
    pub user_principal_name: Option<String>,
}

impl From<GraphGroup> for DirectoryGroup {
    fn from(g: GraphGroup) -> Self {
        DirectoryGroup {
            id: g.id,
            display_name: g.display_name,
            description: g.description,
            mail: g.mail,
            security_enabled: g.security_enabled.unwrap_or(false),
        }
    }
}
