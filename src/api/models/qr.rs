use serde::{Deserialize, Serialize};

use super::common::lenient_id;

/// Body of `POST /qr/generate`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QrGenerateRequest {
    pub id_seance: i64,
    /// Validity such as `15m`
    pub expires_in: String,
    pub full_seance_mode: bool,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub id_plage: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct QrGenerateData {
    #[serde(default)]
    pub qr_codes: Vec<QrCode>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct QrCode {
    pub qr_data: String,
}

/// Hour slot of a seance
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Plage {
    #[serde(deserialize_with = "lenient_id::required")]
    pub id_plage: i64,
    #[serde(default)]
    pub heure_debut: String,
    #[serde(default)]
    pub heure_fin: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct SessionPlagesData {
    #[serde(default)]
    pub plages_horaires: Vec<Plage>,
}
