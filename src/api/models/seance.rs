use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::common::{lenient_id, lenient_text};
use crate::utils::{format_time, parse_day};

/// A scheduled class session, exactly as `/seances` returns it and as the
/// `calendar` table stores it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Seance {
    #[serde(deserialize_with = "lenient_id::required")]
    pub id_seance: i64,
    #[serde(default, deserialize_with = "lenient_text::or_empty")]
    pub date: String,
    #[serde(default, deserialize_with = "lenient_text::or_empty")]
    pub heure_debut: String,
    #[serde(default, deserialize_with = "lenient_text::or_empty")]
    pub heure_fin: String,
    #[serde(default, deserialize_with = "lenient_text::deserialize")]
    pub statut: Option<String>,
    #[serde(default, deserialize_with = "lenient_text::deserialize")]
    pub est_figee: Option<String>,
    #[serde(default, deserialize_with = "lenient_id::deserialize")]
    pub id_cours: Option<i64>,
    #[serde(default)]
    pub cours_nom: Option<String>,
    #[serde(default, deserialize_with = "lenient_text::deserialize")]
    pub cours_description: Option<String>,
    #[serde(default, deserialize_with = "lenient_text::deserialize")]
    pub cours_modules: Option<String>,
    #[serde(default, deserialize_with = "lenient_id::deserialize")]
    pub enseignant_id: Option<i64>,
    #[serde(default)]
    pub enseignant_nom: Option<String>,
    #[serde(default)]
    pub enseignant_prenom: Option<String>,
    #[serde(default)]
    pub enseignant_email: Option<String>,
    #[serde(default, deserialize_with = "lenient_text::deserialize")]
    pub matricule_enseignant: Option<String>,
    #[serde(default, deserialize_with = "lenient_text::deserialize")]
    pub matiere_principale: Option<String>,
    #[serde(default, deserialize_with = "lenient_text::deserialize")]
    pub role_dans_le_cours: Option<String>,
}

/// `/seances` answers either `{data: [...]}` or a bare array.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum SeancesBody {
    Wrapped { data: Vec<Seance> },
    Bare(Vec<Seance>),
}

impl SeancesBody {
    pub fn into_seances(self) -> Vec<Seance> {
        match self {
            SeancesBody::Wrapped { data } => data,
            SeancesBody::Bare(seances) => seances,
        }
    }
}

impl Seance {
    /// Calendar day of the session; the server sends midnight UTC timestamps.
    pub fn day(&self) -> Option<NaiveDate> {
        parse_day(&self.date)
    }

    pub fn course_name(&self) -> &str {
        self.cours_nom
            .as_deref()
            .filter(|name| !name.is_empty())
            .unwrap_or("Cours")
    }

    pub fn teacher_name(&self) -> String {
        let prenom = self.enseignant_prenom.as_deref().unwrap_or_default();
        let nom = self.enseignant_nom.as_deref().unwrap_or_default();
        format!("{} {}", prenom, nom).trim().to_string()
    }

    pub fn start_time(&self) -> &str {
        format_time(&self.heure_debut)
    }

    pub fn end_time(&self) -> &str {
        format_time(&self.heure_fin)
    }

    pub fn is_taught_by(&self, teacher_id: i64) -> bool {
        self.enseignant_id == Some(teacher_id)
    }
}
