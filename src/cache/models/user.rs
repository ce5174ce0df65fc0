use serde::{Deserialize, Serialize};

use crate::api::models::{LoginUser, Profile, Role};

/// Profile cached on the device as JSON under `userInfo`
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct CachedUser {
    pub id_utilisateur: Option<i64>,
    pub nom: String,
    pub prenom: String,
    pub email: String,
    pub role: Role,
    pub type_utilisateur: Option<String>,
}

impl From<Profile> for CachedUser {
    fn from(profile: Profile) -> Self {
        Self {
            id_utilisateur: profile.id_utilisateur,
            nom: profile.nom,
            prenom: profile.prenom,
            email: profile.email,
            role: profile.role,
            type_utilisateur: profile.type_utilisateur,
        }
    }
}

impl From<LoginUser> for CachedUser {
    fn from(user: LoginUser) -> Self {
        Self {
            id_utilisateur: user.id_utilisateur,
            nom: user.nom.unwrap_or_default(),
            prenom: user.prenom.unwrap_or_default(),
            email: user.email.unwrap_or_default(),
            role: user.role.unwrap_or(Role::Etudiant),
            type_utilisateur: user.type_utilisateur,
        }
    }
}

impl CachedUser {
    pub fn display_name(&self) -> String {
        format!("{} {}", self.prenom, self.nom).trim().to_string()
    }

    pub fn is_teacher(&self) -> bool {
        self.role.is_teacher()
    }
}
