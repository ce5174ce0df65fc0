// Session store: token, signed-in flag and cached profile, backed by the local store

use tokio::sync::RwLock;

use crate::api::ApiClient;
use crate::cache::{CachedSession, CachedUser, LocalStore, SessionCacheOperations};
use crate::error::{AppError, AppResult};

pub struct SessionStore {
    api: ApiClient,
    store: LocalStore,
    state: RwLock<CachedSession>,
}

impl SessionStore {
    pub fn new(api: ApiClient, store: LocalStore) -> Self {
        Self {
            api,
            store,
            state: RwLock::new(CachedSession::default()),
        }
    }

    /// Loads whatever session survived the last run.
    pub async fn restore(&self) -> AppResult<CachedSession> {
        let session = SessionCacheOperations::load(self.store.pool()).await?;
        tracing::debug!(
            "session restored (signed_in: {}, profile: {})",
            session.signed_in,
            session.user.is_some()
        );
        *self.state.write().await = session.clone();
        Ok(session)
    }

    /// Authenticates, then caches the full profile when `/profile` answers and the
    /// partial one from the login body otherwise.
    pub async fn sign_in(&self, email: &str, password: &str) -> AppResult<CachedSession> {
        let response = self.api.login(email, password).await?;
        let token = response
            .token
            .clone()
            .filter(|t| !t.is_empty())
            .ok_or_else(|| {
                AppError::Auth(
                    response
                        .message
                        .clone()
                        .unwrap_or_else(|| "Erreur inconnue".to_string()),
                )
            })?;

        let user = match self.api.profile(&token).await {
            Ok(profile) => Some(CachedUser::from(profile)),
            Err(e) => {
                tracing::warn!("profile fetch failed after login, using login payload: {}", e);
                response.utilisateur.map(CachedUser::from)
            }
        };

        SessionCacheOperations::persist_sign_in(self.store.pool(), &token, user.as_ref()).await?;
        let session = CachedSession {
            auth_token: Some(token),
            signed_in: true,
            user,
        };
        *self.state.write().await = session.clone();
        tracing::info!("signed in as {}", email);
        Ok(session)
    }

    /// Local only; the server is not told.
    pub async fn sign_out(&self) -> AppResult<()> {
        SessionCacheOperations::clear(self.store.pool()).await?;
        *self.state.write().await = CachedSession::default();
        tracing::info!("signed out");
        Ok(())
    }

    pub async fn update_notification_key(&self, key: &str) -> AppResult<()> {
        let session = self.state.read().await.clone();
        let user_id = session
            .user
            .as_ref()
            .and_then(|u| u.id_utilisateur)
            .ok_or(AppError::NotSignedIn)?;
        let token = session.auth_token.ok_or(AppError::MissingToken)?;
        self.api.update_notification_key(&token, user_id, key).await?;
        tracing::info!("notification key updated for user {}", user_id);
        Ok(())
    }

    pub async fn current(&self) -> CachedSession {
        self.state.read().await.clone()
    }

    pub async fn token(&self) -> Option<String> {
        self.state.read().await.auth_token.clone()
    }

    pub async fn user(&self) -> Option<CachedUser> {
        self.state.read().await.user.clone()
    }

    pub async fn is_signed_in(&self) -> bool {
        let state = self.state.read().await;
        state.signed_in && state.auth_token.is_some()
    }

    /// Token and profile of the active session, or `NotSignedIn`.
    pub async fn require(&self) -> AppResult<(String, CachedUser)> {
        let state = self.state.read().await;
        match (&state.auth_token, &state.user) {
            (Some(token), Some(user)) if state.signed_in => Ok((token.clone(), user.clone())),
            _ => Err(AppError::NotSignedIn),
        }
    }

    pub async fn biometric_enabled(&self) -> AppResult<bool> {
        SessionCacheOperations::biometric_enabled(self.store.pool()).await
    }

    pub async fn set_biometric_enabled(&self, enabled: bool) -> AppResult<()> {
        SessionCacheOperations::set_biometric_enabled(self.store.pool(), enabled).await
    }
}
