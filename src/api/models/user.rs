use serde::{Deserialize, Serialize};

use super::common::lenient_id;

/// Account role as reported by the server
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Role {
    Etudiant,
    Enseignant,
    Other(String),
}

impl From<String> for Role {
    fn from(value: String) -> Self {
        match value.as_str() {
            "etudiant" => Role::Etudiant,
            "enseignant" => Role::Enseignant,
            _ => Role::Other(value),
        }
    }
}

impl From<Role> for String {
    fn from(role: Role) -> Self {
        role.as_str().to_string()
    }
}

impl Role {
    pub fn as_str(&self) -> &str {
        match self {
            Role::Etudiant => "etudiant",
            Role::Enseignant => "enseignant",
            Role::Other(other) => other,
        }
    }

    pub fn is_teacher(&self) -> bool {
        matches!(self, Role::Enseignant)
    }
}

#[derive(Debug, Serialize)]
pub struct LoginRequest<'a> {
    pub email: &'a str,
    pub mot_de_passe: &'a str,
}

#[derive(Debug, Default, Deserialize)]
pub struct LoginResponse {
    #[serde(default)]
    pub success: Option<bool>,
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub utilisateur: Option<LoginUser>,
}

/// Success message the login endpoint sends back
pub const LOGIN_OK_MESSAGE: &str = "Connexion réussie !";

impl LoginResponse {
    /// True when the body itself confirms the credentials.
    pub fn confirms_credentials(&self) -> bool {
        self.success == Some(true)
            || self.token.as_deref().is_some_and(|t| !t.is_empty())
            || self.message.as_deref() == Some(LOGIN_OK_MESSAGE)
    }
}

/// Partial profile embedded in the login answer
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginUser {
    #[serde(default, deserialize_with = "lenient_id::deserialize")]
    pub id_utilisateur: Option<i64>,
    #[serde(default)]
    pub nom: Option<String>,
    #[serde(default)]
    pub prenom: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub role: Option<Role>,
    #[serde(default)]
    pub type_utilisateur: Option<String>,
}

/// Full profile from `GET /profile`
#[derive(Debug, Clone, Deserialize)]
pub struct Profile {
    #[serde(default, deserialize_with = "lenient_id::deserialize")]
    pub id_utilisateur: Option<i64>,
    #[serde(default)]
    pub nom: String,
    #[serde(default)]
    pub prenom: String,
    #[serde(default)]
    pub email: String,
    pub role: Role,
    #[serde(default)]
    pub type_utilisateur: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct NotificationKeyRequest<'a> {
    pub cle_notification: &'a str,
}
