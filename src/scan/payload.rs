use serde::{Deserialize, Serialize};

use crate::api::models::common::{lenient_id, lenient_text};
use crate::error::{AppError, AppResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ScanMode {
    #[default]
    Standard,
    Full,
}

impl ScanMode {
    pub fn is_full(self) -> bool {
        matches!(self, ScanMode::Full)
    }
}

/// Decoded content of an attendance QR code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QrPayload {
    pub token: String,
    pub seance: i64,
    pub plage: i64,
    pub mode: ScanMode,
}

#[derive(Deserialize)]
struct RawPayload {
    #[serde(default, deserialize_with = "lenient_text::deserialize")]
    token: Option<String>,
    #[serde(default, deserialize_with = "lenient_id::deserialize")]
    seance: Option<i64>,
    #[serde(default, deserialize_with = "lenient_id::deserialize")]
    plage: Option<i64>,
    #[serde(default, deserialize_with = "lenient_text::deserialize")]
    mode: Option<String>,
}

impl QrPayload {
    /// Parses scanned text. Anything that is not a JSON object carrying token,
    /// seance and plage is `AppError::MalformedPayload`.
    pub fn parse(raw: &str) -> AppResult<Self> {
        let parsed: RawPayload = serde_json::from_str(raw.trim()).map_err(|e| {
            tracing::debug!("scanned text is not a QR payload: {}", e);
            AppError::MalformedPayload
        })?;

        let token = parsed
            .token
            .filter(|t| !t.is_empty())
            .ok_or(AppError::MalformedPayload)?;
        let seance = parsed.seance.ok_or(AppError::MalformedPayload)?;
        let plage = parsed.plage.ok_or(AppError::MalformedPayload)?;
        let mode = match parsed.mode.as_deref() {
            Some("full") => ScanMode::Full,
            _ => ScanMode::Standard,
        };

        Ok(Self {
            token,
            seance,
            plage,
            mode,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_the_generated_shape() {
        let payload = QrPayload::parse(r#"{"token":"t1","seance":1348,"plage":702}"#).unwrap();
        assert_eq!(payload.token, "t1");
        assert_eq!(payload.seance, 1348);
        assert_eq!(payload.plage, 702);
        assert_eq!(payload.mode, ScanMode::Standard);

        let full = QrPayload::parse(r#"{"token":"t","seance":"12","plage":"3","mode":"full"}"#)
            .unwrap();
        assert!(full.mode.is_full());
        assert_eq!(full.seance, 12);
    }

    #[test]
    fn unknown_mode_reads_as_standard() {
        let payload =
            QrPayload::parse(r#"{"token":"t","seance":1,"plage":2,"mode":"weird"}"#).unwrap();
        assert_eq!(payload.mode, ScanMode::Standard);
    }

    #[test]
    fn rejects_incomplete_or_foreign_payloads() {
        for raw in [
            "12",
            "https://example.org",
            "",
            r#"{"seance":1,"plage":2}"#,
            r#"{"token":"t","plage":2}"#,
            r#"{"token":"t","seance":1}"#,
            r#"{"token":"","seance":1,"plage":2}"#,
            r#"{"token":"t","seance":"abc","plage":2}"#,
            r#"[1,2,3]"#,
        ] {
            assert!(
                matches!(QrPayload::parse(raw), Err(AppError::MalformedPayload)),
                "{raw} should be rejected"
            );
        }
    }
}
