// Display helpers shared by the schedule, QR and report views

use chrono::{Datelike, NaiveDate, Weekday};

const DAY_NAMES: [&str; 7] = [
    "lundi", "mardi", "mercredi", "jeudi", "vendredi", "samedi", "dimanche",
];
const DAY_SHORT: [&str; 7] = ["lun.", "mar.", "mer.", "jeu.", "ven.", "sam.", "dim."];
const MONTH_NAMES: [&str; 12] = [
    "janvier", "février", "mars", "avril", "mai", "juin", "juillet", "août", "septembre",
    "octobre", "novembre", "décembre",
];
const MONTH_SHORT: [&str; 12] = [
    "janv.", "févr.", "mars", "avr.", "mai", "juin", "juil.", "août", "sept.", "oct.", "nov.",
    "déc.",
];

/// `HH:MM` out of a server time such as `1970-01-01T08:00:00.000Z`.
///
/// Values that are already short (`08:00`, `08:00:00`) are cut to five characters.
pub fn format_time(value: &str) -> &str {
    if let Some(time) = value.get(11..16) {
        return time;
    }
    value.get(..5).unwrap_or(value)
}

pub fn format_time_range(start: &str, end: &str) -> String {
    if start.is_empty() || end.is_empty() {
        return String::new();
    }
    format!("{} – {}", format_time(start), format_time(end))
}

/// Calendar day from a server date (`2025-07-04T00:00:00.000Z` or `2025-07-04`).
pub fn parse_day(value: &str) -> Option<NaiveDate> {
    value
        .get(..10)
        .and_then(|ymd| NaiveDate::parse_from_str(ymd, "%Y-%m-%d").ok())
}

fn weekday_index(day: Weekday) -> usize {
    day.num_days_from_monday() as usize
}

/// `vendredi 4 juillet 2025`
pub fn format_date_long(date: NaiveDate) -> String {
    format!(
        "{} {} {} {}",
        DAY_NAMES[weekday_index(date.weekday())],
        date.day(),
        MONTH_NAMES[date.month0() as usize],
        date.year()
    )
}

/// `ven. 4 juil.`
pub fn format_date_short(date: NaiveDate) -> String {
    format!(
        "{} {} {}",
        DAY_SHORT[weekday_index(date.weekday())],
        date.day(),
        MONTH_SHORT[date.month0() as usize]
    )
}

/// `04/07/2025`
pub fn format_date_numeric(date: NaiveDate) -> String {
    date.format("%d/%m/%Y").to_string()
}

pub fn day_name_short(date: NaiveDate) -> &'static str {
    DAY_SHORT[weekday_index(date.weekday())]
}

/// "Aujourd'hui" for today, `dd/MM` otherwise.
pub fn date_label(date: NaiveDate, today: NaiveDate) -> String {
    if date == today {
        "Aujourd'hui".to_string()
    } else {
        date.format("%d/%m").to_string()
    }
}

/// French ordinal hour label: `1ère heure`, `2ème heure`, ...
pub fn hour_label(number: usize) -> String {
    if number == 1 {
        "1ère heure".to_string()
    } else {
        format!("{}ème heure", number)
    }
}
