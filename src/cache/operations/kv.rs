use sqlx::{Executor, Sqlite};

/// Key-value operations on the `kv` table (session fields and preferences)
pub struct KeyValueOperations;

impl KeyValueOperations {
    pub async fn get<'e, E>(executor: E, key: &str) -> Result<Option<String>, sqlx::Error>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query_scalar::<_, String>("SELECT value FROM kv WHERE key = ?")
            .bind(key)
            .fetch_optional(executor)
            .await
    }

    pub async fn set<'e, E>(executor: E, key: &str, value: &str) -> Result<(), sqlx::Error>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query(
            "INSERT INTO kv (key, value) VALUES (?, ?) \
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
        )
        .bind(key)
        .bind(value)
        .execute(executor)
        .await?;
        Ok(())
    }

    pub async fn remove<'e, E>(executor: E, key: &str) -> Result<(), sqlx::Error>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query("DELETE FROM kv WHERE key = ?")
            .bind(key)
            .execute(executor)
            .await?;
        Ok(())
    }
}
