use reqwest::{Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;

use crate::api::models::presence::SeancePresences;
use crate::api::models::qr::{QrGenerateData, SessionPlagesData};
use crate::api::models::seance::SeancesBody;
use crate::api::models::user::{LoginRequest, NotificationKeyRequest};
use crate::api::models::{
    ApiEnvelope, LoginResponse, MessageBody, Plage, PresenceAck, PresenceEntry, PresenceRequest,
    Profile, QrGenerateRequest, Seance, SeancePresence, Student,
};
use crate::config::Config;
use crate::error::{AppError, AppResult, NETWORK_LOGIN_MESSAGE};

/// Typed client for the remote attendance API.
///
/// The underlying `reqwest::Client` and the base URL are injectable so tests can
/// point the whole application at an in-process mock server.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(config: &Config) -> AppResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.http_timeout())
            .user_agent(concat!("presences/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| AppError::Config(format!("client HTTP: {}", e)))?;
        Ok(Self::with_client(http, &config.api_base_url))
    }

    pub fn with_client(http: reqwest::Client, base_url: &str) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, method: Method, path: &str, token: Option<&str>) -> RequestBuilder {
        let builder = self
            .http
            .request(method, format!("{}{}", self.base_url, path))
            .header("Content-Type", "application/json");
        match token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn send(
        &self,
        request: RequestBuilder,
        network_message: &str,
    ) -> AppResult<(StatusCode, String)> {
        let response = request
            .send()
            .await
            .map_err(|e| AppError::network(network_message, e))?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| AppError::network(network_message, e))?;
        tracing::debug!("API answered {} ({} bytes)", status, body.len());
        Ok((status, body))
    }

    /// `POST /login`. Non-2xx answers become `AppError::Auth` carrying the server message.
    pub async fn login(&self, email: &str, password: &str) -> AppResult<LoginResponse> {
        let request = self
            .request(Method::POST, "/login", None)
            .json(&LoginRequest {
                email,
                mot_de_passe: password,
            });
        let (status, body) = self.send(request, NETWORK_LOGIN_MESSAGE).await?;
        if !status.is_success() {
            let message =
                error_message(&body).unwrap_or_else(|| "Erreur inconnue".to_string());
            tracing::info!("login refused with status {}", status);
            return Err(AppError::Auth(message));
        }
        parse(status, &body)
    }

    /// Step-up check: re-posts the credentials without touching the session.
    ///
    /// Refusals become `AppError::StepUp` with the server message or "Mot de passe incorrect".
    pub async fn verify_password(&self, email: &str, password: &str) -> AppResult<()> {
        let request = self
            .request(Method::POST, "/login", None)
            .json(&LoginRequest {
                email,
                mot_de_passe: password,
            });
        let (status, body) = self
            .send(request, "Erreur réseau lors de la vérification du mot de passe")
            .await?;
        let response: LoginResponse = serde_json::from_str(&body).unwrap_or_default();
        if status.is_success() && response.confirms_credentials() {
            return Ok(());
        }
        tracing::info!("step-up password refused (status {})", status);
        Err(AppError::StepUp(
            response
                .message
                .filter(|m| !m.is_empty())
                .unwrap_or_else(|| "Mot de passe incorrect".to_string()),
        ))
    }

    pub async fn profile(&self, token: &str) -> AppResult<Profile> {
        let request = self.request(Method::GET, "/profile", Some(token));
        let (status, body) = self
            .send(request, "Erreur réseau lors de la récupération du profil")
            .await?;
        if !status.is_success() {
            return Err(http_error(status, &body, "Erreur lors de la récupération du profil"));
        }
        parse(status, &body)
    }

    pub async fn update_notification_key(
        &self,
        token: &str,
        user_id: i64,
        key: &str,
    ) -> AppResult<()> {
        let request = self
            .request(
                Method::PATCH,
                &format!("/notifications/user/{}/key", user_id),
                Some(token),
            )
            .json(&NotificationKeyRequest {
                cle_notification: key,
            });
        let response = request
            .send()
            .await
            .map_err(|e| AppError::network(format!("Erreur réseau: {}", e), e))?;
        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| AppError::network(format!("Erreur réseau: {}", e), e))?;
        tracing::debug!("notification key update answered {}", status);

        let body: MessageBody =
            serde_json::from_str(&text).map_err(|_| AppError::InvalidResponse(status.as_u16()))?;
        if !status.is_success() {
            let message = body.message.unwrap_or_else(|| {
                format!(
                    "Erreur {}: {}",
                    status.as_u16(),
                    status.canonical_reason().unwrap_or_default()
                )
            });
            return Err(AppError::Http {
                status: status.as_u16(),
                message,
            });
        }
        Ok(())
    }

    pub async fn seances(&self, token: Option<&str>) -> AppResult<Vec<Seance>> {
        let request = self.request(Method::GET, "/seances", token);
        let (status, body) = self
            .send(request, "Erreur réseau lors de la récupération des sessions")
            .await?;
        if !status.is_success() {
            return Err(http_error(status, &body, "Erreur lors de la récupération des sessions"));
        }
        let seances: SeancesBody = parse(status, &body)?;
        Ok(seances.into_seances())
    }

    pub async fn students(&self, token: &str) -> AppResult<Vec<Student>> {
        let request = self.request(Method::GET, "/etudiants", Some(token));
        let (status, body) = self
            .send(request, "Erreur réseau lors de la récupération des données")
            .await?;
        if !status.is_success() {
            return Err(http_error(status, &body, "Erreur lors de la récupération des étudiants"));
        }
        let envelope: ApiEnvelope<Vec<Student>> = parse(status, &body)?;
        Ok(envelope.data.unwrap_or_default())
    }

    pub async fn seance_presences(
        &self,
        token: &str,
        seance_id: i64,
    ) -> AppResult<Vec<SeancePresence>> {
        let request = self.request(
            Method::GET,
            &format!("/presences/seance/{}", seance_id),
            Some(token),
        );
        let (status, body) = self
            .send(request, "Erreur réseau lors de la récupération des présences")
            .await?;
        if !status.is_success() {
            return Err(http_error(status, &body, "Erreur lors de la récupération des présences"));
        }
        let presences: SeancePresences = parse(status, &body)?;
        Ok(presences.presences)
    }

    /// Attendance history of one user; an unsuccessful envelope reads as an empty history.
    pub async fn user_presences(&self, token: &str, user_id: i64) -> AppResult<Vec<PresenceEntry>> {
        let request = self
            .request(
                Method::GET,
                &format!("/presences/user/{}", user_id),
                Some(token),
            )
            .query(&[("limit", "1000")]);
        let (status, body) = self
            .send(request, "Impossible de charger les données de présence")
            .await?;
        if !status.is_success() {
            return Err(http_error(status, &body, "Impossible de charger les données de présence"));
        }
        let envelope: ApiEnvelope<Vec<PresenceEntry>> = parse(status, &body)?;
        if !envelope.is_success() {
            return Ok(Vec::new());
        }
        Ok(envelope.data.unwrap_or_default())
    }

    /// Returns the content of the first generated QR code.
    pub async fn generate_qr(&self, token: &str, request: &QrGenerateRequest) -> AppResult<String> {
        let builder = self
            .request(Method::POST, "/qr/generate", Some(token))
            .json(request);
        let (status, body) = self
            .send(builder, "Erreur réseau lors de la génération du QR code")
            .await?;
        let envelope: ApiEnvelope<QrGenerateData> = match serde_json::from_str(&body) {
            Ok(envelope) => envelope,
            Err(_) => return Err(AppError::InvalidResponse(status.as_u16())),
        };
        let success = envelope.is_success();
        let first = envelope
            .data
            .and_then(|data| data.qr_codes.into_iter().next());
        match first {
            Some(code) if success => Ok(code.qr_data),
            _ => Err(AppError::Http {
                status: status.as_u16(),
                message: envelope
                    .message
                    .unwrap_or_else(|| "Erreur lors de la génération du QR code".to_string()),
            }),
        }
    }

    /// Hour slots of a seance; any unsuccessful answer reads as "no plages".
    pub async fn session_plages(&self, token: &str, seance_id: i64) -> AppResult<Vec<Plage>> {
        let request = self.request(
            Method::GET,
            &format!("/qr/session/{}", seance_id),
            Some(token),
        );
        let (status, body) = self
            .send(request, "Erreur réseau lors de la récupération des plages")
            .await?;
        if !status.is_success() {
            return Ok(Vec::new());
        }
        let envelope: ApiEnvelope<SessionPlagesData> = match serde_json::from_str(&body) {
            Ok(envelope) => envelope,
            Err(e) => {
                tracing::warn!("unreadable plage list for seance {}: {}", seance_id, e);
                return Ok(Vec::new());
            }
        };
        if !envelope.is_success() {
            return Ok(Vec::new());
        }
        Ok(envelope
            .data
            .map(|data| data.plages_horaires)
            .unwrap_or_default())
    }

    /// Single attempt, never retried. The caller inspects the acknowledgement flag.
    pub async fn submit_presence(&self, token: &str, request: &PresenceRequest) -> AppResult<PresenceAck> {
        let builder = self
            .request(Method::POST, "/presences", Some(token))
            .json(request);
        let (status, body) = self
            .send(builder, "Erreur réseau lors de la confirmation de présence")
            .await?;
        parse(status, &body)
    }
}

fn parse<T: DeserializeOwned>(status: StatusCode, body: &str) -> AppResult<T> {
    serde_json::from_str(body).map_err(|e| {
        tracing::warn!("unexpected body (status {}): {}", status, e);
        AppError::InvalidResponse(status.as_u16())
    })
}

fn error_message(body: &str) -> Option<String> {
    serde_json::from_str::<MessageBody>(body)
        .ok()
        .and_then(|b| b.message)
        .filter(|m| !m.is_empty())
}

fn http_error(status: StatusCode, body: &str, fallback: &str) -> AppError {
    AppError::Http {
        status: status.as_u16(),
        message: error_message(body).unwrap_or_else(|| fallback.to_string()),
    }
}
