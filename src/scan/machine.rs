use std::time::{Duration, Instant};

use crate::error::{AppError, AppResult};
use crate::scan::payload::QrPayload;

/// Parameters handed from the camera to the confirmation route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfirmRoute {
    pub payload: QrPayload,
    pub original: String,
}

/// Parameters of the success route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Confirmation {
    pub course_name: String,
    pub time_slot: String,
    pub message: String,
    pub plage_number: usize,
    pub total_plages: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanState {
    Idle,
    Scanning,
    PayloadValidated,
    Authenticating,
    Submitting,
    Succeeded(Confirmation),
    /// `retry_at` is set for recoverable scan errors; terminal failures have none.
    Failed {
        message: String,
        retry_at: Option<Instant>,
    },
}

/// What a captured frame led to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanEvent {
    /// Dropped by the reentrancy guard.
    Ignored,
    Accepted(ConfirmRoute),
    Rejected(String),
}

/// Scan-and-confirm pipeline for one camera session.
#[derive(Debug)]
pub struct ScanFlow {
    state: ScanState,
    cooldown: Duration,
    last_capture: Option<String>,
    navigated: bool,
    route: Option<ConfirmRoute>,
}

impl ScanFlow {
    pub fn new(cooldown: Duration) -> Self {
        Self {
            state: ScanState::Idle,
            cooldown,
            last_capture: None,
            navigated: false,
            route: None,
        }
    }

    pub fn state(&self) -> &ScanState {
        &self.state
    }

    pub fn route(&self) -> Option<&ConfirmRoute> {
        self.route.as_ref()
    }

    pub fn open_camera(&mut self) {
        if self.state == ScanState::Idle {
            self.state = ScanState::Scanning;
        }
    }

    /// Handles one decoded frame.
    ///
    /// A frame is processed only while scanning, when it differs from the previous
    /// capture and when this camera session has not navigated yet.
    pub fn on_barcode(&mut self, data: &str, now: Instant) -> ScanEvent {
        self.tick(now);
        if self.state != ScanState::Scanning
            || self.navigated
            || self.last_capture.as_deref() == Some(data)
        {
            return ScanEvent::Ignored;
        }
        self.last_capture = Some(data.to_string());

        match QrPayload::parse(data) {
            Ok(payload) => {
                let route = ConfirmRoute {
                    payload,
                    original: data.to_string(),
                };
                tracing::info!(
                    "QR accepted for seance {} plage {}",
                    route.payload.seance,
                    route.payload.plage
                );
                self.navigated = true;
                self.route = Some(route.clone());
                self.state = ScanState::PayloadValidated;
                ScanEvent::Accepted(route)
            }
            Err(e) => {
                let message = e.to_string();
                self.state = ScanState::Failed {
                    message: message.clone(),
                    retry_at: Some(now + self.cooldown),
                };
                ScanEvent::Rejected(message)
            }
        }
    }

    /// End of the current cool-down, if a rejected frame is cooling down.
    pub fn retry_at(&self) -> Option<Instant> {
        match self.state {
            ScanState::Failed { retry_at, .. } => retry_at,
            _ => None,
        }
    }

    /// Returns to scanning once the cool-down of a rejected frame has elapsed.
    pub fn tick(&mut self, now: Instant) {
        if let ScanState::Failed {
            retry_at: Some(at), ..
        } = self.state
        {
            if now >= at {
                self.state = ScanState::Scanning;
            }
        }
    }

    /// Manual rescan: back to scanning at once, forgetting the previous capture.
    pub fn rescan(&mut self) {
        if matches!(
            self.state,
            ScanState::Scanning | ScanState::Failed { retry_at: Some(_), .. }
        ) {
            self.state = ScanState::Scanning;
            self.last_capture = None;
        }
    }

    /// The camera screen regained focus.
    pub fn reset_on_focus(&mut self) {
        if matches!(
            self.state,
            ScanState::Idle | ScanState::Scanning | ScanState::Failed { retry_at: Some(_), .. }
        ) {
            self.navigated = false;
            self.last_capture = None;
            self.state = ScanState::Scanning;
        }
    }

    pub fn begin_authentication(&mut self) -> AppResult<&ConfirmRoute> {
        if self.state != ScanState::PayloadValidated {
            return Err(AppError::Validation(
                "aucun QR code validé en attente de confirmation".to_string(),
            ));
        }
        self.state = ScanState::Authenticating;
        self.route
            .as_ref()
            .ok_or_else(|| AppError::Validation(crate::scan::MISSING_CONTEXT_MESSAGE.to_string()))
    }

    pub(crate) fn begin_submission(&mut self) -> AppResult<()> {
        if self.state != ScanState::Authenticating {
            return Err(AppError::Validation(
                "la présence ne peut être soumise qu'après authentification".to_string(),
            ));
        }
        self.state = ScanState::Submitting;
        Ok(())
    }

    pub(crate) fn succeed(&mut self, confirmation: Confirmation) {
        self.state = ScanState::Succeeded(confirmation);
    }

    pub(crate) fn fail(&mut self, message: &str) {
        self.state = ScanState::Failed {
            message: message.to_string(),
            retry_at: None,
        };
    }

    /// Closes the camera or confirmation route. Refused once the submission is issued.
    pub fn cancel(&mut self) -> bool {
        match self.state {
            ScanState::Submitting => false,
            _ => {
                self.state = ScanState::Idle;
                self.route = None;
                self.navigated = false;
                self.last_capture = None;
                true
            }
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self.state,
            ScanState::Succeeded(_) | ScanState::Failed { retry_at: None, .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MALFORMED_QR_MESSAGE;

    const VALID: &str = r#"{"token":"t1","seance":1348,"plage":702}"#;

    fn scanning() -> ScanFlow {
        let mut flow = ScanFlow::new(Duration::from_millis(2000));
        flow.open_camera();
        flow
    }

    #[test]
    fn duplicate_frames_navigate_once() {
        let mut flow = scanning();
        let now = Instant::now();
        assert!(matches!(flow.on_barcode(VALID, now), ScanEvent::Accepted(_)));
        assert_eq!(flow.on_barcode(VALID, now), ScanEvent::Ignored);
        assert_eq!(
            flow.on_barcode(r#"{"token":"t2","seance":1,"plage":2}"#, now),
            ScanEvent::Ignored
        );
        flow.begin_authentication().unwrap();
        assert_eq!(flow.on_barcode(VALID, now), ScanEvent::Ignored);
        assert!(flow.begin_authentication().is_err());
        assert_eq!(flow.state(), &ScanState::Authenticating);
    }

    #[test]
    fn malformed_frames_cool_down_before_scanning_again() {
        let mut flow = scanning();
        let now = Instant::now();
        assert_eq!(
            flow.on_barcode("12", now),
            ScanEvent::Rejected(MALFORMED_QR_MESSAGE.to_string())
        );
        assert_eq!(flow.on_barcode(VALID, now + Duration::from_millis(500)), ScanEvent::Ignored);

        let later = now + Duration::from_millis(2000);
        flow.tick(later);
        assert_eq!(flow.state(), &ScanState::Scanning);
        // same bad frame stays suppressed until something else is captured
        assert_eq!(flow.on_barcode("12", later), ScanEvent::Ignored);
        assert!(matches!(flow.on_barcode(VALID, later), ScanEvent::Accepted(_)));
    }

    #[test]
    fn waiting_out_the_cool_down_accepts_the_next_frame() {
        let mut flow = scanning();
        let now = Instant::now();
        assert_eq!(flow.retry_at(), None);
        flow.on_barcode("12", now);
        let at = flow.retry_at().unwrap();
        assert_eq!(at, now + flow.cooldown);

        flow.tick(at);
        assert_eq!(flow.retry_at(), None);
        assert!(matches!(flow.on_barcode(VALID, at), ScanEvent::Accepted(_)));
    }

    #[test]
    fn rescan_forgets_the_previous_capture() {
        let mut flow = scanning();
        let now = Instant::now();
        flow.on_barcode("nope", now);
        flow.rescan();
        assert_eq!(flow.state(), &ScanState::Scanning);
        assert!(matches!(flow.on_barcode("nope", now), ScanEvent::Rejected(_)));
    }

    #[test]
    fn frames_before_the_camera_opens_are_ignored() {
        let mut flow = ScanFlow::new(Duration::from_secs(2));
        assert_eq!(flow.on_barcode(VALID, Instant::now()), ScanEvent::Ignored);
    }

    #[test]
    fn cancel_is_refused_once_submitting() {
        let mut flow = scanning();
        flow.on_barcode(VALID, Instant::now());
        flow.begin_authentication().unwrap();
        flow.begin_submission().unwrap();
        assert!(!flow.cancel());
        assert_eq!(flow.state(), &ScanState::Submitting);

        let mut other = scanning();
        other.on_barcode(VALID, Instant::now());
        other.begin_authentication().unwrap();
        assert!(other.cancel());
        assert_eq!(other.state(), &ScanState::Idle);
        assert!(other.route().is_none());
    }

    #[test]
    fn focus_resets_the_navigation_guard() {
        let mut flow = scanning();
        flow.on_barcode(VALID, Instant::now());
        flow.cancel();
        flow.reset_on_focus();
        assert!(matches!(flow.on_barcode(VALID, Instant::now()), ScanEvent::Accepted(_)));
    }
}
