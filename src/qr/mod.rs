// Teacher-side QR issuance

use std::sync::Arc;

use chrono::{DateTime, Duration, NaiveDate, Utc};

use crate::api::ApiClient;
use crate::api::models::{Plage, QrGenerateRequest, Seance};
use crate::cache::CachedUser;
use crate::error::{AppError, AppResult};
use crate::schedule::ScheduleCache;
use crate::schedule::week::seances_for_date;
use crate::session::SessionStore;
use crate::utils::format_time_range;

pub const DURATION_OPTIONS: [u32; 5] = [10, 15, 20, 25, 30];
pub const DEFAULT_DURATION: u32 = 15;
pub const TEACHER_ONLY_MESSAGE: &str = "Accès réservé aux enseignants";

/// Which part of the seance the code records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlageSelection {
    Full,
    /// 1-based position in the seance's plage list
    Plage(usize),
}

#[derive(Debug, Clone, PartialEq)]
pub struct NumberedPlage {
    pub number: usize,
    pub plage: Plage,
}

impl NumberedPlage {
    pub fn time_range(&self) -> String {
        format_time_range(&self.plage.heure_debut, &self.plage.heure_fin)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedQr {
    pub qr_data: String,
    pub seance_id: i64,
    pub selection: PlageSelection,
    pub duration_mins: u32,
    pub expires_at: DateTime<Utc>,
}

impl GeneratedQr {
    /// Seconds left before expiry, never negative.
    pub fn remaining_secs(&self, now: DateTime<Utc>) -> i64 {
        (self.expires_at - now).num_seconds().max(0)
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.remaining_secs(now) == 0
    }

    /// `Valide : 14:05`, or `Expiré`.
    pub fn countdown_label(&self, now: DateTime<Utc>) -> String {
        let remaining = self.remaining_secs(now);
        if remaining == 0 {
            "Expiré".to_string()
        } else {
            format!("Valide : {}:{:02}", remaining / 60, remaining % 60)
        }
    }
}

pub fn validate_duration(minutes: u32) -> AppResult<u32> {
    if DURATION_OPTIONS.contains(&minutes) {
        Ok(minutes)
    } else {
        Err(AppError::Validation(format!(
            "Durée invalide: {} min (choix possibles: 10, 15, 20, 25 ou 30)",
            minutes
        )))
    }
}

pub struct QrGenerator {
    api: ApiClient,
    session: Arc<SessionStore>,
    schedule: Arc<ScheduleCache>,
}

impl QrGenerator {
    pub fn new(api: ApiClient, session: Arc<SessionStore>, schedule: Arc<ScheduleCache>) -> Self {
        Self {
            api,
            session,
            schedule,
        }
    }

    async fn teacher(&self) -> AppResult<(String, CachedUser)> {
        let (token, user) = self.session.require().await?;
        if !user.is_teacher() {
            return Err(AppError::Forbidden(TEACHER_ONLY_MESSAGE.to_string()));
        }
        Ok((token, user))
    }

    /// The signed-in teacher's seances on `day`, by start time.
    pub async fn teacher_sessions(&self, day: NaiveDate) -> AppResult<Vec<Seance>> {
        let (_, user) = self.teacher().await?;
        let teacher_id = user.id_utilisateur.ok_or(AppError::NotSignedIn)?;
        let seances = self.schedule.seances().await;
        let mut mine: Vec<Seance> = seances_for_date(&seances, day)
            .into_iter()
            .filter(|s| s.is_taught_by(teacher_id))
            .collect();
        mine.sort_by(|a, b| a.date.cmp(&b.date).then(a.heure_debut.cmp(&b.heure_debut)));
        tracing::debug!("{} seances for teacher {} on {}", mine.len(), teacher_id, day);
        Ok(mine)
    }

    pub async fn plages(&self, seance_id: i64) -> AppResult<Vec<NumberedPlage>> {
        let (token, _) = self.teacher().await?;
        let plages = self.api.session_plages(&token, seance_id).await?;
        Ok(plages
            .into_iter()
            .enumerate()
            .map(|(i, plage)| NumberedPlage {
                number: i + 1,
                plage,
            })
            .collect())
    }

    pub async fn generate(
        &self,
        seance_id: i64,
        selection: PlageSelection,
        duration_mins: u32,
    ) -> AppResult<GeneratedQr> {
        let duration_mins = validate_duration(duration_mins)?;
        let (token, _) = self.teacher().await?;

        let id_plage = match selection {
            PlageSelection::Full => None,
            PlageSelection::Plage(number) => {
                let plages = self.plages(seance_id).await?;
                let found = plages
                    .iter()
                    .find(|p| p.number == number)
                    .ok_or_else(|| {
                        AppError::Validation(format!(
                            "Plage {} introuvable pour la séance {}",
                            number, seance_id
                        ))
                    })?;
                Some(found.plage.id_plage)
            }
        };

        let request = QrGenerateRequest {
            id_seance: seance_id,
            expires_in: format!("{}m", duration_mins),
            full_seance_mode: selection == PlageSelection::Full,
            id_plage,
        };
        let qr_data = self.api.generate_qr(&token, &request).await?;
        tracing::info!(
            "QR generated for seance {} ({:?}, {} min)",
            seance_id,
            selection,
            duration_mins
        );

        Ok(GeneratedQr {
            qr_data,
            seance_id,
            selection,
            duration_mins,
            expires_at: Utc::now() + Duration::minutes(duration_mins as i64),
        })
    }
}
