use serde::{Deserialize, Serialize};

use super::common::{lenient_id, lenient_text};

/// Attendance status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Etat {
    Present,
    Absent,
    Retard,
}

impl Etat {
    pub fn as_str(self) -> &'static str {
        match self {
            Etat::Present => "present",
            Etat::Absent => "absent",
            Etat::Retard => "retard",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Etat::Present => "PRÉSENT",
            Etat::Absent => "ABSENT",
            Etat::Retard => "RETARD",
        }
    }
}

/// Body of `POST /presences`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PresenceRequest {
    pub id_utilisateur: i64,
    pub id_plage: i64,
    pub etat: Etat,
    pub mode_emargement: String,
    pub etablie_par_enseignant: bool,
    pub full_seance_mode: bool,
}

impl PresenceRequest {
    /// Self-declared presence recorded by scanning a QR code.
    pub fn qr_present(user_id: i64, plage_id: i64, full_seance_mode: bool) -> Self {
        Self {
            id_utilisateur: user_id,
            id_plage: plage_id,
            etat: Etat::Present,
            mode_emargement: "qr".to_string(),
            etablie_par_enseignant: false,
            full_seance_mode,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct PresenceAck {
    #[serde(default)]
    pub success: Option<bool>,
    #[serde(default)]
    pub message: Option<String>,
}

/// One row of a user's attendance history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PresenceEntry {
    #[serde(default, deserialize_with = "lenient_id::deserialize")]
    pub id_utilisateur: Option<i64>,
    #[serde(default, deserialize_with = "lenient_id::deserialize")]
    pub id_plage: Option<i64>,
    pub etat: Etat,
    #[serde(default, deserialize_with = "lenient_text::or_empty")]
    pub mode_emargement: String,
    #[serde(default, deserialize_with = "lenient_text::or_empty")]
    pub heure_debut: String,
    #[serde(default, deserialize_with = "lenient_text::or_empty")]
    pub heure_fin: String,
    #[serde(default, deserialize_with = "lenient_text::or_empty")]
    pub date: String,
    #[serde(default, deserialize_with = "lenient_text::or_empty")]
    pub cours_nom: String,
}

/// Presence row as listed per seance for the teacher roster
#[derive(Debug, Clone, Deserialize)]
pub struct SeancePresence {
    #[serde(default, deserialize_with = "lenient_id::deserialize")]
    pub id_utilisateur: Option<i64>,
    #[serde(default)]
    pub etat: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SeancePresences {
    #[serde(default)]
    pub presences: Vec<SeancePresence>,
}
