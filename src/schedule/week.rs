use chrono::{Datelike, Duration, NaiveDate};

use crate::api::models::Seance;
use crate::error::{AppError, AppResult};
use crate::utils::{date_label, day_name_short};

/// One column of the week strip.
#[derive(Debug, Clone, PartialEq)]
pub struct WeekDay {
    pub date: NaiveDate,
    pub day_name: &'static str,
    pub label: String,
    pub seance_count: usize,
}

pub fn week_start(date: NaiveDate) -> NaiveDate {
    date - Duration::days(date.weekday().num_days_from_monday() as i64)
}

/// Monday to Sunday of the week containing `date`.
pub fn week_days(date: NaiveDate) -> [NaiveDate; 7] {
    let monday = week_start(date);
    std::array::from_fn(|i| monday + Duration::days(i as i64))
}

/// `date` moved by `weeks`, refused when the week around the result leaves chrono's range.
pub fn shift_week(date: NaiveDate, weeks: i64) -> AppResult<NaiveDate> {
    let shifted = Duration::try_weeks(weeks)
        .and_then(|delta| date.checked_add_signed(delta))
        .filter(|day| {
            day.checked_sub_signed(Duration::days(6)).is_some()
                && day.checked_add_signed(Duration::days(6)).is_some()
        });
    shifted.ok_or_else(|| {
        AppError::Validation(format!("Décalage de {} semaines hors limites", weeks))
    })
}

/// Seances of one day, ordered by start time.
pub fn seances_for_date(seances: &[Seance], date: NaiveDate) -> Vec<Seance> {
    let mut matching: Vec<Seance> = seances
        .iter()
        .filter(|s| s.day() == Some(date))
        .cloned()
        .collect();
    matching.sort_by(|a, b| a.heure_debut.cmp(&b.heure_debut));
    matching
}

pub fn week_with_data(seances: &[Seance], date: NaiveDate, today: NaiveDate) -> Vec<WeekDay> {
    week_days(date)
        .into_iter()
        .map(|day| WeekDay {
            date: day,
            day_name: day_name_short(day),
            label: date_label(day, today),
            seance_count: seances.iter().filter(|s| s.day() == Some(day)).count(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schedule::placeholder;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn weeks_start_on_monday() {
        // 2025-01-22 is a Wednesday
        let days = week_days(ymd(2025, 1, 22));
        assert_eq!(days[0], ymd(2025, 1, 20));
        assert_eq!(days[6], ymd(2025, 1, 26));
        assert_eq!(week_start(ymd(2025, 1, 26)), ymd(2025, 1, 20));
        assert_eq!(shift_week(ymd(2025, 1, 20), -1).unwrap(), ymd(2025, 1, 13));
    }

    #[test]
    fn out_of_range_shift_is_refused() {
        for weeks in [i64::MAX, i64::MIN, 100_000_000] {
            assert!(matches!(
                shift_week(ymd(2025, 1, 20), weeks),
                Err(AppError::Validation(_))
            ));
        }
        assert!(shift_week(NaiveDate::MAX, 0).is_err());
        assert_eq!(shift_week(ymd(2025, 1, 20), 52).unwrap(), ymd(2026, 1, 19));
    }

    #[test]
    fn days_are_filtered_and_counted() {
        let seances = placeholder();
        let monday = seances_for_date(&seances, ymd(2025, 1, 20));
        assert_eq!(monday.len(), 2);
        assert_eq!(monday[0].id_seance, 1344);

        let week = week_with_data(&seances, ymd(2025, 1, 21), ymd(2025, 1, 21));
        assert_eq!(week[0].seance_count, 2);
        assert_eq!(week[1].seance_count, 1);
        assert_eq!(week[1].label, "Aujourd'hui");
        assert_eq!(week[0].label, "20/01");
        assert_eq!(week[0].day_name, "lun.");
    }
}
