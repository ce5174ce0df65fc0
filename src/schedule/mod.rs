// Schedule cache: remote seances mirrored in the `calendar` table

pub mod sync;
pub mod week;

use chrono::{Local, NaiveDate, Utc};
use tokio::sync::RwLock;

use crate::api::ApiClient;
use crate::api::models::Seance;
use crate::cache::keys::TODAY_KEY;
use crate::cache::{CalendarOperations, LocalStore, SettingsOperations};
use crate::error::AppResult;

pub use sync::{SyncHandle, SyncScheduler, run_background_sync};

/// Where the schedule currently shown came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduleSource {
    Remote,
    Cache,
    Placeholder,
}

pub struct ScheduleCache {
    api: ApiClient,
    store: LocalStore,
    state: RwLock<(Vec<Seance>, ScheduleSource)>,
}

impl ScheduleCache {
    pub fn new(api: ApiClient, store: LocalStore) -> Self {
        Self {
            api,
            store,
            state: RwLock::new((Vec::new(), ScheduleSource::Cache)),
        }
    }

    /// Fetches `/seances` and replaces the cache wholesale.
    ///
    /// Returns `false` when the fetch failed; the view then holds the previous
    /// cache, or the placeholder set when the cache is empty. Storage errors
    /// still propagate.
    pub async fn refresh(&self, token: Option<&str>) -> AppResult<bool> {
        match self.api.seances(token).await {
            Ok(seances) => {
                store_fetched(&self.store, &seances, Local::now().date_naive()).await?;
                tracing::info!("schedule synced: {} seances", seances.len());
                *self.state.write().await = (seances, ScheduleSource::Remote);
                Ok(true)
            }
            Err(e) => {
                tracing::warn!("schedule refresh failed, keeping local data: {}", e);
                self.load().await?;
                Ok(false)
            }
        }
    }

    /// Loads the cached rows, falling back to the placeholder set.
    pub async fn load(&self) -> AppResult<ScheduleSource> {
        let cached = CalendarOperations::load_all(self.store.pool()).await?;
        let next = if cached.is_empty() {
            tracing::info!("local schedule empty, showing placeholder seances");
            (placeholder(), ScheduleSource::Placeholder)
        } else {
            (cached, ScheduleSource::Cache)
        };
        let source = next.1;
        *self.state.write().await = next;
        Ok(source)
    }

    pub async fn seances(&self) -> Vec<Seance> {
        self.state.read().await.0.clone()
    }

    pub async fn source(&self) -> ScheduleSource {
        self.state.read().await.1
    }

    pub async fn last_sync(&self) -> AppResult<Option<String>> {
        Ok(CalendarOperations::last_sync(self.store.pool()).await?)
    }

    /// Cached row for one seance, without touching the network.
    pub async fn cached(&self, seance_id: i64) -> AppResult<Option<Seance>> {
        Ok(CalendarOperations::find(self.store.pool(), seance_id).await?)
    }

    /// Seances of `today` as last stored for the home widget.
    pub async fn today_snapshot(&self) -> AppResult<Vec<Seance>> {
        match SettingsOperations::get(self.store.pool(), TODAY_KEY).await? {
            Some(json) => Ok(serde_json::from_str(&json)?),
            None => Ok(Vec::new()),
        }
    }
}

/// Stores a successful fetch: calendar rows, `lastSync` and the `today` snapshot together.
pub(crate) async fn store_fetched(
    store: &LocalStore,
    seances: &[Seance],
    today: NaiveDate,
) -> AppResult<()> {
    let todays = week::seances_for_date(seances, today);
    let snapshot = serde_json::to_string(&todays)?;
    let synced_at = Utc::now().to_rfc3339();
    CalendarOperations::replace_all(store.pool(), seances, &synced_at, &snapshot).await?;
    Ok(())
}

fn placeholder_seance(
    id: i64,
    date: &str,
    (start, end): (&str, &str),
    course: (i64, &str),
    teacher: (i64, &str, &str),
) -> Seance {
    Seance {
        id_seance: id,
        date: format!("{}T00:00:00.000Z", date),
        heure_debut: format!("1970-01-01T{}:00.000Z", start),
        heure_fin: format!("1970-01-01T{}:00.000Z", end),
        statut: None,
        est_figee: None,
        id_cours: Some(course.0),
        cours_nom: Some(course.1.to_string()),
        cours_description: None,
        cours_modules: None,
        enseignant_id: Some(teacher.0),
        enseignant_nom: Some(teacher.1.to_string()),
        enseignant_prenom: Some(teacher.2.to_string()),
        enseignant_email: Some(format!("enseignant_{}@gmail.com", teacher.0)),
        matricule_enseignant: None,
        matiere_principale: None,
        role_dans_le_cours: None,
    }
}

/// Built-in seances shown when neither the server nor the cache has anything.
pub fn placeholder() -> Vec<Seance> {
    vec![
        placeholder_seance(
            1344,
            "2025-01-20",
            ("08:00", "12:00"),
            (137, "ANGLAIS"),
            (165, "C", "Marcin"),
        ),
        placeholder_seance(
            1345,
            "2025-01-20",
            ("14:00", "18:00"),
            (138, "MATHÉMATIQUES"),
            (166, "D", "Sophie"),
        ),
        placeholder_seance(
            1346,
            "2025-01-21",
            ("09:00", "11:00"),
            (139, "INFORMATIQUE"),
            (167, "E", "Pierre"),
        ),
    ]
}
