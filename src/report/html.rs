use askama::Template;

use crate::api::models::PresenceEntry;
use crate::cache::CachedUser;
use crate::report::{CourseSummary, Counts, ReportView};
use crate::utils::{format_date_numeric, format_time_range, parse_day};

/// Attendance record rendered through `templates/report.html`.
#[derive(Template)]
#[template(path = "report.html")]
pub struct ReportPage {
    pub full_name: String,
    pub email: String,
    pub generated_on: String,
    pub sections: Vec<ReportSection>,
}

pub struct ReportSection {
    pub title: String,
    pub show_course: bool,
    pub total: usize,
    pub present: usize,
    pub absent: usize,
    pub retard: usize,
    pub rows: Vec<ReportRow>,
}

pub struct ReportRow {
    pub date: String,
    pub course: String,
    pub time_range: String,
    pub etat_class: &'static str,
    pub etat_label: &'static str,
    pub mode: String,
}

impl ReportRow {
    fn from_entry(entry: &PresenceEntry) -> Self {
        Self {
            date: parse_day(&entry.date)
                .map(format_date_numeric)
                .unwrap_or_else(|| entry.date.clone()),
            course: entry.cours_nom.clone(),
            time_range: format_time_range(&entry.heure_debut, &entry.heure_fin),
            etat_class: entry.etat.as_str(),
            etat_label: entry.etat.label(),
            mode: entry.mode_emargement.clone(),
        }
    }
}

fn section(title: String, show_course: bool, counts: Counts, entries: &[PresenceEntry]) -> ReportSection {
    ReportSection {
        title,
        show_course,
        total: counts.total,
        present: counts.present,
        absent: counts.absent,
        retard: counts.retard,
        rows: entries.iter().map(ReportRow::from_entry).collect(),
    }
}

impl ReportPage {
    pub fn new(user: &CachedUser, view: ReportView, records: &[PresenceEntry], generated_on: String) -> Self {
        let sections = match view {
            ReportView::ByCourse => CourseSummary::group(records)
                .into_iter()
                .map(|course| section(course.cours_nom, false, course.counts, &course.presences))
                .collect(),
            ReportView::Chronological => {
                let ordered = crate::report::chronological(records);
                vec![section(String::new(), true, Counts::of(&ordered), &ordered)]
            }
        };
        Self {
            full_name: user.display_name(),
            email: user.email.clone(),
            generated_on,
            sections,
        }
    }

    pub fn to_html(&self) -> Result<String, askama::Error> {
        self.render()
    }
}
