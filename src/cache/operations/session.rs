use sqlx::SqlitePool;

use crate::cache::keys::{
    AUTH_TOKEN_KEY, BIOMETRIC_ENABLED_KEY, SESSION_KEY, SESSION_KEYS, USER_INFO_KEY,
};
use crate::cache::models::{CachedSession, CachedUser};
use crate::cache::operations::kv::KeyValueOperations;
use crate::error::AppResult;

/// Persistence of the session fields
pub struct SessionCacheOperations;

impl SessionCacheOperations {
    /// Reads the persisted session. An unreadable `userInfo` is treated as absent.
    pub async fn load(pool: &SqlitePool) -> AppResult<CachedSession> {
        let auth_token = KeyValueOperations::get(pool, AUTH_TOKEN_KEY).await?;
        let signed_in = KeyValueOperations::get(pool, SESSION_KEY).await?.is_some();
        let user = match KeyValueOperations::get(pool, USER_INFO_KEY).await? {
            Some(json) => match serde_json::from_str::<CachedUser>(&json) {
                Ok(user) => Some(user),
                Err(e) => {
                    tracing::warn!("ignoring unreadable cached profile: {}", e);
                    None
                }
            },
            None => None,
        };

        Ok(CachedSession {
            auth_token,
            signed_in,
            user,
        })
    }

    /// Stores token, profile and session flag together.
    pub async fn persist_sign_in(
        pool: &SqlitePool,
        token: &str,
        user: Option<&CachedUser>,
    ) -> AppResult<()> {
        let mut tx = pool.begin().await?;
        KeyValueOperations::set(&mut *tx, AUTH_TOKEN_KEY, token).await?;
        match user {
            Some(user) => {
                let json = serde_json::to_string(user)?;
                KeyValueOperations::set(&mut *tx, USER_INFO_KEY, &json).await?;
            }
            None => KeyValueOperations::remove(&mut *tx, USER_INFO_KEY).await?,
        }
        KeyValueOperations::set(&mut *tx, SESSION_KEY, "true").await?;
        tx.commit().await?;
        Ok(())
    }

    /// Removes every session field; preferences survive.
    pub async fn clear(pool: &SqlitePool) -> AppResult<()> {
        let mut tx = pool.begin().await?;
        for key in SESSION_KEYS {
            KeyValueOperations::remove(&mut *tx, key).await?;
        }
        tx.commit().await?;
        Ok(())
    }

    pub async fn biometric_enabled(pool: &SqlitePool) -> AppResult<bool> {
        let value = KeyValueOperations::get(pool, BIOMETRIC_ENABLED_KEY).await?;
        Ok(value.as_deref() == Some("true"))
    }

    pub async fn set_biometric_enabled(pool: &SqlitePool, enabled: bool) -> AppResult<()> {
        let value = if enabled { "true" } else { "false" };
        KeyValueOperations::set(pool, BIOMETRIC_ENABLED_KEY, value).await?;
        Ok(())
    }
}
