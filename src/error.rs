use thiserror::Error;

pub const NETWORK_LOGIN_MESSAGE: &str =
    "Impossible de se connecter au serveur. Veuillez réessayer plus tard.";
pub const MALFORMED_QR_MESSAGE: &str = "QR Code invalide. Veuillez scanner le bon QR code.";

/// Error classes surfaced to the user; every one of them returns control to an interactive state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Network,
    Auth,
    MalformedPayload,
    StepUp,
    Submission,
    Local,
}

#[derive(Debug, Error)]
pub enum AppError {
    /// No usable response from the server
    #[error("{message}")]
    Network {
        message: String,
        #[source]
        source: reqwest::Error,
    },
    /// Non-2xx answer from an endpoint, message taken from the body
    #[error("{0}")]
    Auth(String),
    #[error("Erreur serveur: réponse non-JSON reçue (Status: {0}). Vérifiez l'URL de l'API.")]
    InvalidResponse(u16),
    #[error("{message}")]
    Http { status: u16, message: String },
    #[error("{}", MALFORMED_QR_MESSAGE)]
    MalformedPayload,
    #[error("{0}")]
    StepUp(String),
    /// The user dismissed the biometric prompt
    #[error("authentification annulée")]
    StepUpCancelled,
    #[error("{0}")]
    Submission(String),
    #[error("Utilisateur non connecté")]
    NotSignedIn,
    #[error("Token d'authentification manquant")]
    MissingToken,
    #[error("{0}")]
    Forbidden(String),
    #[error("{0}")]
    Validation(String),
    #[error("Impossible de générer le PDF: {0}")]
    Report(String),
    #[error("configuration invalide: {0}")]
    Config(String),
    #[error("stockage local: {0}")]
    Storage(#[from] sqlx::Error),
    #[error("données locales illisibles: {0}")]
    Serde(#[from] serde_json::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    pub fn network(message: impl Into<String>, source: reqwest::Error) -> Self {
        tracing::warn!("network failure: {}", source);
        AppError::Network {
            message: message.into(),
            source,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            AppError::Network { .. } => ErrorKind::Network,
            AppError::Auth(_) | AppError::InvalidResponse(_) | AppError::Http { .. } => {
                ErrorKind::Auth
            }
            AppError::MalformedPayload => ErrorKind::MalformedPayload,
            AppError::StepUp(_) | AppError::StepUpCancelled => ErrorKind::StepUp,
            AppError::Submission(_) => ErrorKind::Submission,
            AppError::NotSignedIn
            | AppError::MissingToken
            | AppError::Forbidden(_)
            | AppError::Validation(_)
            | AppError::Report(_)
            | AppError::Config(_)
            | AppError::Storage(_)
            | AppError::Serde(_)
            | AppError::Io(_) => ErrorKind::Local,
        }
    }

    /// Exit status used by the command-line front end.
    pub fn exit_code(&self) -> i32 {
        match self.kind() {
            ErrorKind::Network => 2,
            ErrorKind::Auth => 3,
            ErrorKind::MalformedPayload => 4,
            ErrorKind::StepUp => 5,
            ErrorKind::Submission => 6,
            ErrorKind::Local => 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_are_user_facing() {
        assert_eq!(AppError::MalformedPayload.to_string(), MALFORMED_QR_MESSAGE);
        assert_eq!(AppError::NotSignedIn.to_string(), "Utilisateur non connecté");
        assert_eq!(
            AppError::InvalidResponse(502).to_string(),
            "Erreur serveur: réponse non-JSON reçue (Status: 502). Vérifiez l'URL de l'API."
        );
        assert_eq!(AppError::Auth("Identifiants invalides".into()).to_string(), "Identifiants invalides");
    }

    #[test]
    fn kinds_follow_the_taxonomy() {
        assert_eq!(AppError::MalformedPayload.kind(), ErrorKind::MalformedPayload);
        assert_eq!(AppError::StepUpCancelled.kind(), ErrorKind::StepUp);
        assert_eq!(AppError::Submission("x".into()).kind(), ErrorKind::Submission);
        assert_eq!(AppError::MissingToken.kind(), ErrorKind::Local);
        assert_eq!(AppError::Submission("x".into()).exit_code(), 6);
    }
}
