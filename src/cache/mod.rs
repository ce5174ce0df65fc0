// On-device store
// One SQLite file holding the session fields, the cached schedule and sync settings

pub mod keys;
pub mod models;
pub mod operations;

use std::path::Path;

use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};

use crate::error::AppResult;

pub use models::{CachedSession, CachedUser};
pub use operations::{CalendarOperations, SessionCacheOperations, SettingsOperations};

const SCHEMA: [&str; 3] = [
    r#"
    CREATE TABLE IF NOT EXISTS kv (
        key TEXT PRIMARY KEY,
        value TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS calendar (
        id_seance INTEGER PRIMARY KEY,
        date TEXT NOT NULL,
        heure_debut TEXT NOT NULL,
        heure_fin TEXT NOT NULL,
        statut TEXT,
        est_figee TEXT,
        id_cours INTEGER,
        cours_nom TEXT,
        cours_description TEXT,
        cours_modules TEXT,
        enseignant_id INTEGER,
        enseignant_nom TEXT,
        enseignant_prenom TEXT,
        enseignant_email TEXT,
        matricule_enseignant TEXT,
        matiere_principale TEXT,
        role_dans_le_cours TEXT
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS settings (
        key TEXT PRIMARY KEY,
        value TEXT NOT NULL
    )
    "#,
];

/// Handle on the local database; cheap to clone.
#[derive(Debug, Clone)]
pub struct LocalStore {
    pool: SqlitePool,
}

impl LocalStore {
    pub async fn open(path: &Path) -> AppResult<Self> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(4)
            .connect_with(options)
            .await?;
        tracing::info!("local store opened at {}", path.display());
        Self::bootstrap(pool).await
    }

    /// Private in-memory database. A single connection that never expires keeps it alive.
    pub async fn in_memory() -> AppResult<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None::<std::time::Duration>)
            .max_lifetime(None::<std::time::Duration>)
            .connect("sqlite::memory:")
            .await?;
        Self::bootstrap(pool).await
    }

    async fn bootstrap(pool: SqlitePool) -> AppResult<Self> {
        for statement in SCHEMA {
            sqlx::query(statement).execute(&pool).await?;
        }
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}
