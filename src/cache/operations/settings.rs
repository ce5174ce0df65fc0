use sqlx::{Executor, Sqlite};

/// Operations on the `settings` table (sync bookkeeping)
pub struct SettingsOperations;

impl SettingsOperations {
    pub async fn get<'e, E>(executor: E, key: &str) -> Result<Option<String>, sqlx::Error>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query_scalar::<_, String>("SELECT value FROM settings WHERE key = ?")
            .bind(key)
            .fetch_optional(executor)
            .await
    }

    pub async fn set<'e, E>(executor: E, key: &str, value: &str) -> Result<(), sqlx::Error>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query("INSERT OR REPLACE INTO settings (key, value) VALUES (?, ?)")
            .bind(key)
            .bind(value)
            .execute(executor)
            .await?;
        Ok(())
    }
}
