// Teacher roster: students of the day's seances and whether they signed in

use std::collections::HashSet;
use std::sync::Arc;

use chrono::NaiveDate;
use futures_util::future::join_all;

use crate::api::ApiClient;
use crate::api::models::{Seance, Student};
use crate::error::AppResult;
use crate::qr::QrGenerator;
use crate::session::SessionStore;

#[derive(Debug, Clone, PartialEq)]
pub struct RosterEntry {
    pub student: Student,
    pub emarge: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SeanceRoster {
    pub seance: Seance,
    pub entries: Vec<RosterEntry>,
}

impl SeanceRoster {
    pub fn present_count(&self) -> usize {
        self.entries.iter().filter(|e| e.emarge).count()
    }
}

pub struct RosterService {
    api: ApiClient,
    session: Arc<SessionStore>,
    generator: Arc<QrGenerator>,
}

impl RosterService {
    pub fn new(api: ApiClient, session: Arc<SessionStore>, generator: Arc<QrGenerator>) -> Self {
        Self {
            api,
            session,
            generator,
        }
    }

    /// One roster per seance the teacher gives on `day`.
    ///
    /// Presence lists are fetched concurrently; a failed fetch counts as nobody signed in.
    pub async fn for_day(&self, day: NaiveDate) -> AppResult<Vec<SeanceRoster>> {
        let seances = self.generator.teacher_sessions(day).await?;
        let (token, _) = self.session.require().await?;
        let students = self.api.students(&token).await?;

        let fetches = seances.iter().map(|seance| {
            let token = token.as_str();
            async move {
                match self.api.seance_presences(token, seance.id_seance).await {
                    Ok(presences) => presences
                        .into_iter()
                        .filter(|p| p.etat.as_deref() == Some("present"))
                        .filter_map(|p| p.id_utilisateur)
                        .collect::<HashSet<i64>>(),
                    Err(e) => {
                        tracing::warn!("presences of seance {} unavailable: {}", seance.id_seance, e);
                        HashSet::new()
                    }
                }
            }
        });
        let present_sets = join_all(fetches).await;

        Ok(seances
            .into_iter()
            .zip(present_sets)
            .map(|(seance, present)| SeanceRoster {
                entries: students
                    .iter()
                    .map(|student| RosterEntry {
                        emarge: student
                            .id_utilisateur
                            .is_some_and(|id| present.contains(&id)),
                        student: student.clone(),
                    })
                    .collect(),
                seance,
            })
            .collect())
    }
}
