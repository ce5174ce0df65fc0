use sqlx::SqlitePool;

use crate::api::models::Seance;
use crate::cache::keys::{LAST_SYNC_KEY, TODAY_KEY};
use crate::cache::operations::settings::SettingsOperations;

const INSERT_SEANCE: &str = r#"
    INSERT OR REPLACE INTO calendar (
        id_seance, date, heure_debut, heure_fin, statut, est_figee, id_cours, cours_nom,
        cours_description, cours_modules, enseignant_id, enseignant_nom, enseignant_prenom,
        enseignant_email, matricule_enseignant, matiere_principale, role_dans_le_cours
    ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
"#;

/// Operations on the cached schedule (`calendar` table)
pub struct CalendarOperations;

impl CalendarOperations {
    /// Replaces every cached seance, the sync time and the serialized `today`
    /// snapshot in one transaction.
    ///
    /// Either all of them are visible or the previous cache is left untouched.
    pub async fn replace_all(
        pool: &SqlitePool,
        seances: &[Seance],
        synced_at: &str,
        today_snapshot: &str,
    ) -> Result<(), sqlx::Error> {
        let mut tx = pool.begin().await?;

        sqlx::query("DELETE FROM calendar").execute(&mut *tx).await?;
        for seance in seances {
            sqlx::query(INSERT_SEANCE)
                .bind(seance.id_seance)
                .bind(&seance.date)
                .bind(&seance.heure_debut)
                .bind(&seance.heure_fin)
                .bind(&seance.statut)
                .bind(&seance.est_figee)
                .bind(seance.id_cours)
                .bind(&seance.cours_nom)
                .bind(&seance.cours_description)
                .bind(&seance.cours_modules)
                .bind(seance.enseignant_id)
                .bind(&seance.enseignant_nom)
                .bind(&seance.enseignant_prenom)
                .bind(&seance.enseignant_email)
                .bind(&seance.matricule_enseignant)
                .bind(&seance.matiere_principale)
                .bind(&seance.role_dans_le_cours)
                .execute(&mut *tx)
                .await?;
        }
        SettingsOperations::set(&mut *tx, LAST_SYNC_KEY, synced_at).await?;
        SettingsOperations::set(&mut *tx, TODAY_KEY, today_snapshot).await?;

        tx.commit().await?;
        tracing::debug!("calendar replaced with {} seances", seances.len());
        Ok(())
    }

    pub async fn load_all(pool: &SqlitePool) -> Result<Vec<Seance>, sqlx::Error> {
        sqlx::query_as::<_, Seance>(
            "SELECT * FROM calendar ORDER BY date, heure_debut, id_seance",
        )
        .fetch_all(pool)
        .await
    }

    pub async fn find(pool: &SqlitePool, seance_id: i64) -> Result<Option<Seance>, sqlx::Error> {
        sqlx::query_as::<_, Seance>("SELECT * FROM calendar WHERE id_seance = ?")
            .bind(seance_id)
            .fetch_optional(pool)
            .await
    }

    pub async fn last_sync(pool: &SqlitePool) -> Result<Option<String>, sqlx::Error> {
        SettingsOperations::get(pool, LAST_SYNC_KEY).await
    }
}
