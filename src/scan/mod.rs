// QR scan-and-confirm flow: capture, payload validation, step-up, submission

pub mod biometric;
pub mod confirm;
pub mod machine;
pub mod payload;

pub use biometric::{BiometricAuthenticator, BiometricOutcome, NoBiometric};
pub use confirm::{CourseDetails, PresenceConfirmer, StepUp};
pub use machine::{ConfirmRoute, Confirmation, ScanEvent, ScanFlow, ScanState};
pub use payload::{QrPayload, ScanMode};

pub const EMPTY_PASSWORD_MESSAGE: &str = "Veuillez saisir votre mot de passe.";
pub const BIOMETRIC_FAILED_MESSAGE: &str =
    "Authentification biométrique échouée. Veuillez utiliser votre mot de passe.";
pub const MISSING_CONTEXT_MESSAGE: &str =
    "Informations de session, utilisateur ou QR code manquantes";
pub const INVALID_USER_MESSAGE: &str = "ID utilisateur invalide";
pub const PRESENCE_OK_MESSAGE: &str = "Présence enregistrée avec succès";
pub const SUBMISSION_FAILED_MESSAGE: &str = "Erreur lors de la confirmation de présence";
