#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, patch, post};
use axum::{Json, Router};
use presences::AppState;
use presences::config::Config;
use serde_json::{Value, json};
use tempfile::TempDir;

pub const PASSWORD: &str = "secret";
pub const STUDENT_EMAIL: &str = "alice@example.org";
pub const TEACHER_EMAIL: &str = "marcin@example.org";
pub const NO_ID_EMAIL: &str = "ghost@example.org";
pub const SEANCE_ID: i64 = 1348;
pub const SEANCE_DAY: &str = "2025-07-04";

/// Knobs and recordings of the mock API.
pub struct MockState {
    pub seances: Vec<Value>,
    pub seances_fail: bool,
    pub seances_hits: usize,
    pub profile_fail: bool,
    pub login_hits: usize,
    pub plages: Vec<Value>,
    pub students: Vec<Value>,
    pub seance_presences: HashMap<i64, Vec<Value>>,
    pub failing_seance_presences: HashSet<i64>,
    pub user_presences: Vec<Value>,
    pub presence_answer: Value,
    pub presence_posts: Vec<Value>,
    pub presence_drop_connection: bool,
    pub presence_non_json: bool,
    pub qr_requests: Vec<Value>,
    pub notification_keys: Vec<(i64, Value)>,
    pub notification_non_json: bool,
}

impl Default for MockState {
    fn default() -> Self {
        Self {
            seances: vec![
                seance(SEANCE_ID, SEANCE_DAY, "08:00", "12:00", "PROJ DEV", 165),
                seance(1349, SEANCE_DAY, "14:00", "16:00", "ANGLAIS", 165),
                seance(1350, SEANCE_DAY, "09:00", "10:00", "MATHS", 166),
                seance(1351, "2025-07-07", "08:00", "10:00", "PROJ DEV", 165),
            ],
            seances_fail: false,
            seances_hits: 0,
            profile_fail: false,
            login_hits: 0,
            plages: vec![
                plage(702, "08:00", "09:00"),
                plage(703, "09:00", "10:00"),
                plage(704, "10:00", "11:00"),
                plage(705, "11:00", "12:00"),
            ],
            students: vec![
                json!({"id_utilisateur": 42, "nom": "Durand", "prenom": "Alice", "formation_intitule": "M1 MIAGE"}),
                json!({"id_utilisateur": "43", "nom": "Martin", "prenom": "Bruno"}),
            ],
            seance_presences: HashMap::from([(
                SEANCE_ID,
                vec![
                    json!({"id_utilisateur": 42, "etat": "present"}),
                    json!({"id_utilisateur": 43, "etat": "absent"}),
                ],
            )]),
            failing_seance_presences: HashSet::new(),
            user_presences: vec![
                presence_entry(702, "2025-07-04T00:00:00.000Z", "PROJ DEV", "present"),
                presence_entry(702, "2025-07-04T00:00:00.000Z", "PROJ DEV", "present"),
                presence_entry(703, "2025-07-04T00:00:00.000Z", "PROJ DEV", "retard"),
                presence_entry(801, "2025-07-03T00:00:00.000Z", "ANGLAIS", "absent"),
            ],
            presence_answer: json!({"success": true, "message": "Présence enregistrée"}),
            presence_posts: Vec::new(),
            presence_drop_connection: false,
            presence_non_json: false,
            qr_requests: Vec::new(),
            notification_keys: Vec::new(),
            notification_non_json: false,
        }
    }
}

pub fn seance(id: i64, day: &str, start: &str, end: &str, course: &str, teacher: i64) -> Value {
    json!({
        "id_seance": id,
        "date": format!("{}T00:00:00.000Z", day),
        "heure_debut": format!("1970-01-01T{}:00.000Z", start),
        "heure_fin": format!("1970-01-01T{}:00.000Z", end),
        "statut": null,
        "est_figee": false,
        "id_cours": 140,
        "cours_nom": course,
        "cours_description": null,
        "cours_modules": ["M1"],
        "enseignant_id": teacher,
        "enseignant_nom": "C",
        "enseignant_prenom": "Marcin",
        "enseignant_email": format!("enseignant_{}@gmail.com", teacher),
        "matricule_enseignant": null,
        "matiere_principale": "Informatique",
        "role_dans_le_cours": "responsable"
    })
}

pub fn plage(id: i64, start: &str, end: &str) -> Value {
    json!({"id_plage": id, "heure_debut": format!("{}:00", start), "heure_fin": format!("{}:00", end)})
}

pub fn presence_entry(plage: i64, date: &str, course: &str, etat: &str) -> Value {
    json!({
        "id_utilisateur": 42,
        "id_plage": plage,
        "etat": etat,
        "mode_emargement": "qr",
        "heure_debut": "08:00:00",
        "heure_fin": "09:00:00",
        "date": date,
        "cours_nom": course
    })
}

type Shared = Arc<Mutex<MockState>>;

/// In-process stand-in for the remote attendance API.
pub struct MockApi {
    pub base_url: String,
    state: Shared,
}

impl MockApi {
    pub async fn start() -> Self {
        let state: Shared = Arc::new(Mutex::new(MockState::default()));
        let app = Router::new()
            .route("/api/login", post(login))
            .route("/api/profile", get(profile))
            .route("/api/notifications/user/{id}/key", patch(notification_key))
            .route("/api/seances", get(seances))
            .route("/api/etudiants", get(students))
            .route("/api/presences", post(submit_presence))
            .route("/api/presences/seance/{id}", get(seance_presences))
            .route("/api/presences/user/{id}", get(user_presences))
            .route("/api/qr/generate", post(generate_qr))
            .route("/api/qr/session/{id}", get(session_plages))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url: format!("http://{}/api", addr),
            state,
        }
    }

    pub fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap()
    }
}

/// Base URL of a port nothing listens on.
pub async fn unreachable_url() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}/api", addr)
}

pub fn config(base_url: &str, data_dir: &std::path::Path) -> Config {
    let vars = HashMap::from([
        ("PRESENCES_API_URL".to_string(), base_url.to_string()),
        ("PRESENCES_DATA_DIR".to_string(), data_dir.to_string_lossy().into_owned()),
        ("PRESENCES_HTTP_TIMEOUT".to_string(), "5".to_string()),
        ("PRESENCES_SCAN_COOLDOWN_MS".to_string(), "50".to_string()),
    ]);
    Config::from_lookup(|key| vars.get(key).cloned()).unwrap()
}

pub async fn app(base_url: &str) -> (AppState, TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let state = AppState::init(config(base_url, dir.path())).await.unwrap();
    (state, dir)
}

pub async fn signed_in(mock: &MockApi, email: &str) -> (AppState, TempDir) {
    let (state, dir) = app(&mock.base_url).await;
    state.session.sign_in(email, PASSWORD).await.unwrap();
    (state, dir)
}

fn bearer(headers: &HeaderMap) -> Option<String> {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::to_string)
}

fn user_for(email: &str) -> Option<Value> {
    match email {
        STUDENT_EMAIL => Some(json!({
            "id_utilisateur": 42, "nom": "Durand", "prenom": "Alice",
            "email": STUDENT_EMAIL, "role": "etudiant", "type_utilisateur": "etudiant"
        })),
        TEACHER_EMAIL => Some(json!({
            "id_utilisateur": "165", "nom": "C", "prenom": "Marcin",
            "email": TEACHER_EMAIL, "role": "enseignant", "type_utilisateur": "enseignant"
        })),
        NO_ID_EMAIL => Some(json!({
            "id_utilisateur": 0, "nom": "Ghost", "prenom": "G",
            "email": NO_ID_EMAIL, "role": "etudiant"
        })),
        _ => None,
    }
}

async fn login(State(state): State<Shared>, Json(body): Json<Value>) -> Response {
    state.lock().unwrap().login_hits += 1;
    let email = body["email"].as_str().unwrap_or_default();
    let password = body["mot_de_passe"].as_str().unwrap_or_default();
    match user_for(email) {
        Some(user) if password == PASSWORD => Json(json!({
            "success": true,
            "message": "Connexion réussie !",
            "token": format!("token:{}", email),
            // the embedded profile is partial
            "utilisateur": {"id_utilisateur": user["id_utilisateur"], "email": email, "role": user["role"]}
        }))
        .into_response(),
        _ => (
            StatusCode::UNAUTHORIZED,
            Json(json!({"success": false, "message": "Email ou mot de passe incorrect"})),
        )
            .into_response(),
    }
}

async fn profile(State(state): State<Shared>, headers: HeaderMap) -> Response {
    if state.lock().unwrap().profile_fail {
        return (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({"message": "boom"}))).into_response();
    }
    let user = bearer(&headers)
        .and_then(|t| t.strip_prefix("token:").map(str::to_string))
        .and_then(|email| user_for(&email));
    match user {
        Some(user) => Json(user).into_response(),
        None => (StatusCode::UNAUTHORIZED, Json(json!({"message": "Token invalide"}))).into_response(),
    }
}

async fn notification_key(
    State(state): State<Shared>,
    Path(id): Path<i64>,
    Json(body): Json<Value>,
) -> Response {
    let mut state = state.lock().unwrap();
    if state.notification_non_json {
        return (StatusCode::BAD_GATEWAY, "<html>Bad Gateway</html>").into_response();
    }
    state.notification_keys.push((id, body));
    Json(json!({"message": "Clé mise à jour"})).into_response()
}

async fn seances(State(state): State<Shared>) -> Response {
    let mut state = state.lock().unwrap();
    state.seances_hits += 1;
    if state.seances_fail {
        return (StatusCode::SERVICE_UNAVAILABLE, Json(json!({"message": "maintenance"}))).into_response();
    }
    Json(json!({"data": state.seances})).into_response()
}

async fn students(State(state): State<Shared>) -> Json<Value> {
    Json(json!({"data": state.lock().unwrap().students}))
}

async fn seance_presences(State(state): State<Shared>, Path(id): Path<i64>) -> Response {
    let state = state.lock().unwrap();
    if state.failing_seance_presences.contains(&id) {
        return (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({"message": "erreur"}))).into_response();
    }
    let presences = state.seance_presences.get(&id).cloned().unwrap_or_default();
    Json(json!({"presences": presences})).into_response()
}

async fn user_presences(State(state): State<Shared>, Path(_id): Path<i64>) -> Json<Value> {
    Json(json!({"success": true, "data": state.lock().unwrap().user_presences}))
}

async fn generate_qr(State(state): State<Shared>, Json(body): Json<Value>) -> Json<Value> {
    let qr_data = json!({
        "token": "qr-token",
        "seance": body["id_seance"],
        "plage": body.get("id_plage").cloned().unwrap_or(Value::Null),
        "mode": if body["full_seance_mode"] == json!(true) { "full" } else { "standard" }
    })
    .to_string();
    state.lock().unwrap().qr_requests.push(body);
    Json(json!({"success": true, "data": {"qr_codes": [{"qr_data": qr_data}]}}))
}

async fn session_plages(State(state): State<Shared>, Path(id): Path<i64>) -> Json<Value> {
    if id != SEANCE_ID {
        return Json(json!({"success": false, "message": "Séance introuvable"}));
    }
    Json(json!({"success": true, "data": {"plages_horaires": state.lock().unwrap().plages}}))
}

async fn submit_presence(State(state): State<Shared>, Json(body): Json<Value>) -> Response {
    let (drop_connection, non_json, answer) = {
        let mut state = state.lock().unwrap();
        state.presence_posts.push(body);
        (
            state.presence_drop_connection,
            state.presence_non_json,
            state.presence_answer.clone(),
        )
    };
    if drop_connection {
        // unwinds the connection task, so the client sees the socket close mid-request
        std::panic::resume_unwind(Box::new("connection dropped"));
    }
    if non_json {
        return (StatusCode::OK, "<html><body>Proxy error</body></html>").into_response();
    }
    Json(answer).into_response()
}
