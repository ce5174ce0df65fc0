use async_trait::async_trait;

pub const BIOMETRIC_PROMPT: &str = "Confirmez votre identité pour valider votre présence";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BiometricOutcome {
    Success,
    Cancelled,
    Failed(String),
}

/// Device biometric facility.
#[async_trait]
pub trait BiometricAuthenticator: Send + Sync {
    /// Hardware present and at least one identity enrolled.
    async fn is_available(&self) -> bool;

    async fn authenticate(&self, prompt: &str) -> BiometricOutcome;
}

/// Used where no biometric hardware exists, such as a terminal.
pub struct NoBiometric;

#[async_trait]
impl BiometricAuthenticator for NoBiometric {
    async fn is_available(&self) -> bool {
        false
    }

    async fn authenticate(&self, _prompt: &str) -> BiometricOutcome {
        BiometricOutcome::Failed("not_available".to_string())
    }
}
