// Attendance report: deduplicated history rendered to HTML, printed, then shared

pub mod export;
pub mod html;

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Local;

use crate::api::ApiClient;
use crate::api::models::{Etat, PresenceEntry};
use crate::cache::CachedUser;
use crate::error::{AppError, AppResult};
use crate::session::SessionStore;

pub use export::{CommandPrinter, DirectoryShare, HtmlPrinter, PrintToFile, ShareTarget};
pub use html::ReportPage;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportView {
    /// One section per course, used for teachers
    ByCourse,
    /// Single dated list, used for students
    Chronological,
}

impl ReportView {
    pub fn for_user(user: &CachedUser) -> Self {
        if user.is_teacher() {
            ReportView::ByCourse
        } else {
            ReportView::Chronological
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Counts {
    pub total: usize,
    pub present: usize,
    pub absent: usize,
    pub retard: usize,
}

impl Counts {
    pub fn of(records: &[PresenceEntry]) -> Self {
        let mut counts = Counts::default();
        for record in records {
            counts.add(record.etat);
        }
        counts
    }

    fn add(&mut self, etat: Etat) {
        self.total += 1;
        match etat {
            Etat::Present => self.present += 1,
            Etat::Absent => self.absent += 1,
            Etat::Retard => self.retard += 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CourseSummary {
    pub cours_nom: String,
    pub presences: Vec<PresenceEntry>,
    pub counts: Counts,
}

impl CourseSummary {
    /// Groups records by course name, courses in order of first appearance.
    pub fn group(records: &[PresenceEntry]) -> Vec<CourseSummary> {
        let mut courses: Vec<CourseSummary> = Vec::new();
        for record in records {
            let index = match courses.iter().position(|c| c.cours_nom == record.cours_nom) {
                Some(index) => index,
                None => {
                    courses.push(CourseSummary {
                        cours_nom: record.cours_nom.clone(),
                        presences: Vec::new(),
                        counts: Counts::default(),
                    });
                    courses.len() - 1
                }
            };
            let course = &mut courses[index];
            course.presences.push(record.clone());
            course.counts.add(record.etat);
        }
        courses
    }
}

/// Keeps the first record of every (plage, date) pair.
pub fn dedup(records: &[PresenceEntry]) -> Vec<PresenceEntry> {
    let mut seen = HashSet::new();
    records
        .iter()
        .filter(|r| seen.insert((r.id_plage, r.date.clone())))
        .cloned()
        .collect()
}

pub fn chronological(records: &[PresenceEntry]) -> Vec<PresenceEntry> {
    let mut ordered = records.to_vec();
    ordered.sort_by(|a, b| a.date.cmp(&b.date).then(a.heure_debut.cmp(&b.heure_debut)));
    ordered
}

pub struct ReportGenerator {
    api: ApiClient,
    session: Arc<SessionStore>,
    printer: Box<dyn PrintToFile>,
    share: Box<dyn ShareTarget>,
    output_dir: PathBuf,
}

impl ReportGenerator {
    pub fn new(
        api: ApiClient,
        session: Arc<SessionStore>,
        printer: Box<dyn PrintToFile>,
        share: Box<dyn ShareTarget>,
        output_dir: PathBuf,
    ) -> Self {
        Self {
            api,
            session,
            printer,
            share,
            output_dir,
        }
    }

    /// Attendance history of the signed-in user.
    pub async fn fetch_records(&self) -> AppResult<Vec<PresenceEntry>> {
        let (token, user) = self.session.require().await?;
        let user_id = user.id_utilisateur.ok_or(AppError::NotSignedIn)?;
        self.api.user_presences(&token, user_id).await
    }

    /// Renders, prints and shares the report; returns the shared file.
    ///
    /// The printed file never outlives a failed print or share.
    pub async fn generate_report(&self, records: &[PresenceEntry]) -> AppResult<PathBuf> {
        let user = self.session.user().await.ok_or(AppError::NotSignedIn)?;
        let view = ReportView::for_user(&user);
        let unique = dedup(records);
        tracing::info!(
            "building {:?} report from {} records ({} after dedup)",
            view,
            records.len(),
            unique.len()
        );

        let generated_on = Local::now().date_naive().format("%d/%m/%Y").to_string();
        let html = ReportPage::new(&user, view, &unique, generated_on)
            .to_html()
            .map_err(|e| AppError::Report(e.to_string()))?;

        tokio::fs::create_dir_all(&self.output_dir)
            .await
            .map_err(|e| AppError::Report(e.to_string()))?;
        let file = self.output_dir.join(format!(
            "releve-presence-{}.{}",
            uuid::Uuid::new_v4(),
            self.printer.extension()
        ));

        if let Err(e) = self.printer.print(&html, &file).await {
            discard(&file).await;
            return Err(as_report_error(e));
        }
        if !self.share.is_available().await {
            discard(&file).await;
            return Err(AppError::Report("partage indisponible".to_string()));
        }
        match self.share.share(&file).await {
            Ok(shared) => {
                tracing::info!("report shared to {}", shared.display());
                Ok(shared)
            }
            Err(e) => {
                discard(&file).await;
                Err(as_report_error(e))
            }
        }
    }
}

fn as_report_error(e: AppError) -> AppError {
    match e {
        AppError::Report(_) => e,
        other => AppError::Report(other.to_string()),
    }
}

async fn discard(file: &Path) {
    match tokio::fs::remove_file(file).await {
        Ok(()) => tracing::debug!("removed {}", file.display()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => tracing::warn!("could not remove {}: {}", file.display(), e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(plage: i64, date: &str, course: &str, etat: Etat) -> PresenceEntry {
        PresenceEntry {
            id_utilisateur: Some(42),
            id_plage: Some(plage),
            etat,
            mode_emargement: "qr".into(),
            heure_debut: "08:00:00".into(),
            heure_fin: "09:00:00".into(),
            date: date.into(),
            cours_nom: course.into(),
        }
    }

    #[test]
    fn duplicates_on_plage_and_date_are_dropped() {
        let records = vec![
            entry(702, "2025-07-04", "PROJ DEV", Etat::Present),
            entry(702, "2025-07-04", "PROJ DEV", Etat::Absent),
            entry(702, "2025-07-05", "PROJ DEV", Etat::Retard),
            entry(703, "2025-07-04", "PROJ DEV", Etat::Present),
        ];
        let unique = dedup(&records);
        assert_eq!(unique.len(), 3);
        assert_eq!(unique[0].etat, Etat::Present);
    }

    #[test]
    fn courses_are_grouped_with_counts() {
        let records = vec![
            entry(1, "2025-07-04", "ANGLAIS", Etat::Present),
            entry(2, "2025-07-04", "MATHS", Etat::Absent),
            entry(3, "2025-07-05", "ANGLAIS", Etat::Retard),
        ];
        let courses = CourseSummary::group(&records);
        assert_eq!(courses.len(), 2);
        assert_eq!(courses[0].cours_nom, "ANGLAIS");
        assert_eq!(
            courses[0].counts,
            Counts {
                total: 2,
                present: 1,
                absent: 0,
                retard: 1
            }
        );
        assert_eq!(courses[1].counts.absent, 1);
    }

    #[test]
    fn chronological_orders_by_date_then_time() {
        let mut late = entry(1, "2025-07-05", "A", Etat::Present);
        late.heure_debut = "07:00:00".into();
        let records = vec![late, entry(2, "2025-07-04", "B", Etat::Present)];
        let ordered = chronological(&records);
        assert_eq!(ordered[0].cours_nom, "B");
    }

    #[test]
    fn rendered_page_escapes_and_labels() {
        let user = CachedUser {
            id_utilisateur: Some(42),
            nom: "Durand".into(),
            prenom: "Alice".into(),
            email: "alice@example.org".into(),
            role: crate::api::models::Role::Etudiant,
            type_utilisateur: None,
        };
        let records = vec![entry(1, "2025-07-04T00:00:00.000Z", "<b>X</b>", Etat::Retard)];
        let html = ReportPage::new(&user, ReportView::Chronological, &records, "04/07/2025".into())
            .to_html()
            .unwrap();
        assert!(html.contains("Relevé de Présence - Alice Durand"));
        assert!(html.contains("RETARD"));
        assert!(html.contains("&lt;b&gt;X"));
        assert!(!html.contains("<b>X</b>"));
    }
}
