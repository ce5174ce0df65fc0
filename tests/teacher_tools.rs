mod common;

use chrono::{NaiveDate, Utc};
use common::{MockApi, SEANCE_ID, STUDENT_EMAIL, TEACHER_EMAIL};
use presences::AppState;
use presences::error::AppError;
use presences::qr::{PlageSelection, TEACHER_ONLY_MESSAGE};
use presences::scan::QrPayload;
use serde_json::json;
use tempfile::TempDir;

fn day() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 7, 4).unwrap()
}

async fn teacher(mock: &MockApi) -> (AppState, TempDir) {
    let (state, dir) = common::signed_in(mock, TEACHER_EMAIL).await;
    let token = state.session.token().await;
    assert!(state.schedule.refresh(token.as_deref()).await.unwrap());
    (state, dir)
}

#[tokio::test]
async fn teacher_sessions_are_filtered_by_teacher_and_day() {
    let mock = MockApi::start().await;
    let (state, _dir) = teacher(&mock).await;

    let ids: Vec<i64> = state
        .qr_generator()
        .teacher_sessions(day())
        .await
        .unwrap()
        .iter()
        .map(|s| s.id_seance)
        .collect();
    assert_eq!(ids, vec![SEANCE_ID, 1349]);

    let monday = NaiveDate::from_ymd_opt(2025, 7, 7).unwrap();
    let ids: Vec<i64> = state
        .qr_generator()
        .teacher_sessions(monday)
        .await
        .unwrap()
        .iter()
        .map(|s| s.id_seance)
        .collect();
    assert_eq!(ids, vec![1351]);
}

#[tokio::test]
async fn plages_are_numbered_in_server_order() {
    let mock = MockApi::start().await;
    let (state, _dir) = teacher(&mock).await;

    let plages = state.qr_generator().plages(SEANCE_ID).await.unwrap();
    let numbered: Vec<(usize, i64)> = plages.iter().map(|p| (p.number, p.plage.id_plage)).collect();
    assert_eq!(numbered, vec![(1, 702), (2, 703), (3, 704), (4, 705)]);
    assert_eq!(plages[1].time_range(), "09:00 – 10:00");
}

#[tokio::test]
async fn single_slot_code_targets_the_selected_plage() {
    let mock = MockApi::start().await;
    let (state, _dir) = teacher(&mock).await;

    let before = Utc::now();
    let qr = state
        .qr_generator()
        .generate(SEANCE_ID, PlageSelection::Plage(2), 20)
        .await
        .unwrap();
    assert_eq!(
        mock.state().qr_requests,
        vec![json!({
            "id_seance": 1348,
            "expires_in": "20m",
            "full_seance_mode": false,
            "id_plage": 703
        })]
    );
    let remaining = qr.remaining_secs(before);
    assert!((1195..=1200).contains(&remaining), "remaining {remaining}");
    assert!(!qr.is_expired(Utc::now()));

    // the issued code is what a student's scanner accepts
    let payload = QrPayload::parse(&qr.qr_data).unwrap();
    assert_eq!(payload.seance, SEANCE_ID);
    assert_eq!(payload.plage, 703);
}

#[tokio::test]
async fn full_seance_code_sends_no_plage() {
    let mock = MockApi::start().await;
    let (state, _dir) = teacher(&mock).await;

    let qr = state
        .qr_generator()
        .generate(SEANCE_ID, PlageSelection::Full, 15)
        .await
        .unwrap();
    assert_eq!(qr.selection, PlageSelection::Full);
    let requests = mock.state().qr_requests.clone();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0]["full_seance_mode"], json!(true));
    assert_eq!(requests[0]["expires_in"], json!("15m"));
    assert!(requests[0].get("id_plage").is_none());
}

#[tokio::test]
async fn unknown_plage_or_duration_is_refused_locally() {
    let mock = MockApi::start().await;
    let (state, _dir) = teacher(&mock).await;
    let generator = state.qr_generator();

    let err = generator
        .generate(SEANCE_ID, PlageSelection::Plage(9), 15)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    let err = generator
        .generate(SEANCE_ID, PlageSelection::Full, 12)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
    assert!(mock.state().qr_requests.is_empty());
}

#[tokio::test]
async fn students_cannot_use_teacher_tools() {
    let mock = MockApi::start().await;
    let (state, _dir) = common::signed_in(&mock, STUDENT_EMAIL).await;

    let err = state
        .qr_generator()
        .generate(SEANCE_ID, PlageSelection::Full, 15)
        .await
        .unwrap_err();
    assert!(matches!(&err, AppError::Forbidden(m) if m == TEACHER_ONLY_MESSAGE));
    assert!(state.roster().for_day(day()).await.is_err());
    assert!(mock.state().qr_requests.is_empty());
}

#[tokio::test]
async fn roster_marks_students_present_per_seance() {
    let mock = MockApi::start().await;
    let (state, _dir) = teacher(&mock).await;

    let rosters = state.roster().for_day(day()).await.unwrap();
    assert_eq!(rosters.len(), 2);

    let first = &rosters[0];
    assert_eq!(first.seance.id_seance, SEANCE_ID);
    let marks: Vec<(String, bool)> = first
        .entries
        .iter()
        .map(|e| (e.student.full_name(), e.emarge))
        .collect();
    assert_eq!(
        marks,
        vec![("Alice Durand".to_string(), true), ("Bruno Martin".to_string(), false)]
    );
    assert_eq!(first.present_count(), 1);
    assert_eq!(rosters[1].present_count(), 0);
}

#[tokio::test]
async fn failing_presence_list_shows_nobody_signed_in() {
    let mock = MockApi::start().await;
    mock.state().failing_seance_presences.insert(SEANCE_ID);
    let (state, _dir) = teacher(&mock).await;

    let rosters = state.roster().for_day(day()).await.unwrap();
    assert_eq!(rosters.len(), 2);
    assert_eq!(rosters[0].entries.len(), 2);
    assert!(rosters[0].entries.iter().all(|e| !e.emarge));
}
