use std::sync::Arc;

use chrono::Timelike;

use crate::api::ApiClient;
use crate::api::models::{PresenceRequest, Seance};
use crate::error::{AppError, AppResult};
use crate::scan::biometric::{BIOMETRIC_PROMPT, BiometricAuthenticator, BiometricOutcome};
use crate::scan::machine::{Confirmation, ScanFlow, ScanState};
use crate::scan::payload::QrPayload;
use crate::scan::{
    BIOMETRIC_FAILED_MESSAGE, EMPTY_PASSWORD_MESSAGE, INVALID_USER_MESSAGE,
    MISSING_CONTEXT_MESSAGE, PRESENCE_OK_MESSAGE, SUBMISSION_FAILED_MESSAGE,
};
use crate::schedule::ScheduleCache;
use crate::session::SessionStore;
use crate::utils::{format_time, format_time_range, hour_label};

/// Proof of presence offered on the confirmation route.
pub enum StepUp<'a> {
    Password(&'a str),
    Biometric(&'a dyn BiometricAuthenticator),
}

/// What the confirmation route shows about the scanned slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CourseDetails {
    pub course_name: String,
    pub date: String,
    pub heure_debut: String,
    pub heure_fin: String,
    pub plage_number: usize,
    pub total_plages: usize,
    pub time_slot: String,
}

impl CourseDetails {
    /// `2ème heure (2/4)`
    pub fn plage_label(&self) -> String {
        let label = hour_label(self.plage_number);
        if self.total_plages > 1 {
            format!("{} ({}/{})", label, self.plage_number, self.total_plages)
        } else {
            label
        }
    }
}

/// Drives step-up authentication and the single presence submission.
pub struct PresenceConfirmer {
    api: ApiClient,
    session: Arc<SessionStore>,
    schedule: Arc<ScheduleCache>,
}

impl PresenceConfirmer {
    pub fn new(api: ApiClient, session: Arc<SessionStore>, schedule: Arc<ScheduleCache>) -> Self {
        Self {
            api,
            session,
            schedule,
        }
    }

    /// Course name, slot number and time range for a payload.
    ///
    /// Looks in the local schedule first, then `/seances`; slot data comes from the
    /// seance's plage list. Lookup failures only degrade the labels.
    pub async fn course_details(&self, payload: &QrPayload) -> CourseDetails {
        let token = self.session.token().await;
        let seance = self.find_seance(payload.seance, token.as_deref()).await;

        let plages = match token.as_deref() {
            Some(token) => self
                .api
                .session_plages(token, payload.seance)
                .await
                .unwrap_or_else(|e| {
                    tracing::warn!("plages of seance {} unavailable: {}", payload.seance, e);
                    Vec::new()
                }),
            None => Vec::new(),
        };
        let position = plages.iter().position(|p| p.id_plage == payload.plage);

        let (heure_debut, heure_fin) = seance
            .as_ref()
            .map(|s| (s.heure_debut.clone(), s.heure_fin.clone()))
            .unwrap_or_default();
        let (plage_number, total_plages, time_slot) = match position {
            Some(index) => {
                let plage = &plages[index];
                (
                    index + 1,
                    plages.len(),
                    format_time_range(&plage.heure_debut, &plage.heure_fin),
                )
            }
            None => (1, plages.len().max(1), hourly_slot(1, &heure_debut)),
        };

        CourseDetails {
            course_name: seance
                .as_ref()
                .map(|s| s.course_name().to_string())
                .unwrap_or_else(|| "Cours".to_string()),
            date: seance.as_ref().map(|s| s.date.clone()).unwrap_or_default(),
            heure_debut,
            heure_fin,
            plage_number,
            total_plages,
            time_slot,
        }
    }

    async fn find_seance(&self, seance_id: i64, token: Option<&str>) -> Option<Seance> {
        match self.schedule.cached(seance_id).await {
            Ok(Some(seance)) => return Some(seance),
            Ok(None) => {}
            Err(e) => tracing::warn!("local schedule lookup failed: {}", e),
        }
        match self.api.seances(token).await {
            Ok(seances) => seances.into_iter().find(|s| s.id_seance == seance_id),
            Err(e) => {
                tracing::warn!("seance {} details unavailable: {}", seance_id, e);
                None
            }
        }
    }

    /// Step-up then submission.
    ///
    /// Step-up refusals and local checks leave the flow in `Authenticating`. Once the
    /// request is issued the flow always ends terminal, and it is never retried.
    pub async fn confirm(
        &self,
        flow: &mut ScanFlow,
        step_up: StepUp<'_>,
        details: &CourseDetails,
    ) -> AppResult<Confirmation> {
        if flow.state() != &ScanState::Authenticating {
            return Err(AppError::Validation(MISSING_CONTEXT_MESSAGE.to_string()));
        }
        let payload = flow
            .route()
            .map(|route| route.payload.clone())
            .ok_or_else(|| AppError::Validation(MISSING_CONTEXT_MESSAGE.to_string()))?;

        self.step_up(step_up).await?;

        let session = self.session.current().await;
        let (token, user) = match (session.auth_token, session.user) {
            (Some(token), Some(user)) => (token, user),
            _ => return Err(AppError::Validation(MISSING_CONTEXT_MESSAGE.to_string())),
        };
        let user_id = match user.id_utilisateur {
            Some(id) if id > 0 => id,
            _ => return Err(AppError::Validation(INVALID_USER_MESSAGE.to_string())),
        };

        let request = PresenceRequest::qr_present(user_id, payload.plage, payload.mode.is_full());
        flow.begin_submission()?;
        tracing::info!(
            "submitting presence for user {} on plage {}",
            user_id,
            payload.plage
        );

        let ack = match self.api.submit_presence(&token, &request).await {
            Ok(ack) => ack,
            Err(AppError::InvalidResponse(status)) => {
                tracing::warn!("presence answer unreadable (status {})", status);
                flow.fail(SUBMISSION_FAILED_MESSAGE);
                return Err(AppError::Submission(SUBMISSION_FAILED_MESSAGE.to_string()));
            }
            Err(e) => {
                flow.fail(&e.to_string());
                return Err(e);
            }
        };

        if ack.success != Some(true) {
            let message = ack
                .message
                .filter(|m| !m.is_empty())
                .unwrap_or_else(|| SUBMISSION_FAILED_MESSAGE.to_string());
            tracing::info!("presence refused: {}", message);
            flow.fail(&message);
            return Err(AppError::Submission(message));
        }

        let confirmation = Confirmation {
            course_name: details.course_name.clone(),
            time_slot: details.time_slot.clone(),
            message: ack
                .message
                .filter(|m| !m.is_empty())
                .unwrap_or_else(|| PRESENCE_OK_MESSAGE.to_string()),
            plage_number: details.plage_number,
            total_plages: details.total_plages,
        };
        flow.succeed(confirmation.clone());
        Ok(confirmation)
    }

    async fn step_up(&self, step_up: StepUp<'_>) -> AppResult<()> {
        match step_up {
            StepUp::Password(password) => {
                if password.trim().is_empty() {
                    return Err(AppError::StepUp(EMPTY_PASSWORD_MESSAGE.to_string()));
                }
                let email = self
                    .session
                    .user()
                    .await
                    .map(|u| u.email)
                    .ok_or_else(|| AppError::Validation(MISSING_CONTEXT_MESSAGE.to_string()))?;
                self.api.verify_password(&email, password).await
            }
            StepUp::Biometric(authenticator) => {
                if !authenticator.is_available().await {
                    return Err(AppError::StepUp(BIOMETRIC_FAILED_MESSAGE.to_string()));
                }
                match authenticator.authenticate(BIOMETRIC_PROMPT).await {
                    BiometricOutcome::Success => Ok(()),
                    BiometricOutcome::Cancelled => {
                        tracing::debug!("biometric prompt dismissed");
                        Err(AppError::StepUpCancelled)
                    }
                    BiometricOutcome::Failed(reason) => {
                        tracing::info!("biometric step-up failed: {}", reason);
                        Err(AppError::StepUp(BIOMETRIC_FAILED_MESSAGE.to_string()))
                    }
                }
            }
        }
    }
}

/// `HH:00 – HH:00` for the n-th hour of a seance starting at `heure_debut`.
fn hourly_slot(plage_number: usize, heure_debut: &str) -> String {
    let start_hour = chrono::NaiveTime::parse_from_str(format_time(heure_debut), "%H:%M")
        .map(|t| t.hour() as usize)
        .unwrap_or(8);
    let from = start_hour + plage_number.saturating_sub(1);
    format!("{:02}:00 – {:02}:00", from, from + 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hourly_slots_follow_the_start_time() {
        assert_eq!(hourly_slot(1, "1970-01-01T08:00:00.000Z"), "08:00 – 09:00");
        assert_eq!(hourly_slot(3, "1970-01-01T14:00:00.000Z"), "16:00 – 17:00");
        assert_eq!(hourly_slot(1, ""), "08:00 – 09:00");
    }

    #[test]
    fn plage_labels() {
        let mut details = CourseDetails {
            course_name: "PROJ DEV".into(),
            date: String::new(),
            heure_debut: String::new(),
            heure_fin: String::new(),
            plage_number: 2,
            total_plages: 4,
            time_slot: String::new(),
        };
        assert_eq!(details.plage_label(), "2ème heure (2/4)");
        details.plage_number = 1;
        details.total_plages = 1;
        assert_eq!(details.plage_label(), "1ère heure");
    }
}
