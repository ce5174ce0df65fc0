use serde::{Deserialize, Serialize};

use super::common::lenient_id;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Student {
    #[serde(default, deserialize_with = "lenient_id::deserialize")]
    pub id_utilisateur: Option<i64>,
    #[serde(default)]
    pub nom: String,
    #[serde(default)]
    pub prenom: String,
    #[serde(default)]
    pub formation_intitule: Option<String>,
}

impl Student {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.prenom, self.nom).trim().to_string()
    }

    pub fn formation(&self) -> &str {
        self.formation_intitule
            .as_deref()
            .filter(|f| !f.is_empty())
            .unwrap_or("Classe inconnue")
    }
}
