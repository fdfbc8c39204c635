pub mod driver;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::classifier::{resolve_from_predictions, resolve_from_text, should_offer_fallback};
use crate::model::{ClassificationResult, ImageRef, TagPrediction, TextPrediction};
use crate::transport::TransportError;

pub use driver::{ClassifyError, SessionDriver};

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Idle,
    Uploading,
    Resolved,
    Failed,
}

impl Default for SessionStatus {
    fn default() -> Self {
        SessionStatus::Idle
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum MediaRef {
    Image(ImageRef),
    Text(String),
}

/// Identifies one submission. Responses carrying an older id are stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AttemptId(u64);

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    #[error("description must not be empty")]
    EmptyDescription,

    #[error("a classification is already in progress")]
    Busy,

    #[error("no result dialog is open")]
    NoDialog,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    Applied,
    Stale,
}

/// One screen's classification attempt, from submission to dismissal.
///
/// `Uploading` doubles as the mutex: while it holds, every new submission is
/// rejected with [`SessionError::Busy`].
#[derive(Debug, Clone, Default, Serialize)]
pub struct ClassificationSession {
    attempt: u64,
    media: Option<MediaRef>,
    status: SessionStatus,
    result: Option<ClassificationResult>,
    fallback_offered: bool,
    dialog_visible: bool,
    last_error: Option<String>,
}

impl ClassificationSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn media(&self) -> Option<&MediaRef> {
        self.media.as_ref()
    }

    pub fn result(&self) -> Option<&ClassificationResult> {
        self.result.as_ref()
    }

    pub fn fallback_offered(&self) -> bool {
        self.fallback_offered
    }

    pub fn dialog_visible(&self) -> bool {
        self.dialog_visible
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn current_attempt(&self) -> AttemptId {
        AttemptId(self.attempt)
    }

    pub fn submit_image(&mut self, image: ImageRef) -> Result<AttemptId, SessionError> {
        self.ensure_not_uploading()?;
        let id = self.begin(MediaRef::Image(image));
        debug!("attempt {} started (image)", id.0);
        Ok(id)
    }

    pub fn submit_text(&mut self, description: &str) -> Result<AttemptId, SessionError> {
        let description = description.trim();
        if description.is_empty() {
            return Err(SessionError::EmptyDescription);
        }
        self.ensure_not_uploading()?;
        let id = self.begin(MediaRef::Text(description.to_string()));
        debug!("attempt {} started (text)", id.0);
        Ok(id)
    }

    pub fn complete_image(
        &mut self,
        attempt: AttemptId,
        outcome: Result<Vec<TagPrediction>, TransportError>,
    ) -> ApplyOutcome {
        if !self.accepts(attempt, |m| matches!(m, MediaRef::Image(_))) {
            return ApplyOutcome::Stale;
        }

        match outcome {
            Ok(predictions) => {
                self.status = SessionStatus::Resolved;
                match resolve_from_predictions(&predictions) {
                    Some(result) => {
                        let confidence = result.confidence.unwrap_or(0.0);
                        self.fallback_offered = should_offer_fallback(confidence);
                        info!(
                            "attempt {} resolved: {} → {} ({:.2}, fallback={})",
                            attempt.0, result.item, result.category, confidence, self.fallback_offered
                        );
                        self.result = Some(result);
                        self.dialog_visible = true;
                    }
                    None => {
                        info!("attempt {} resolved with no predictions", attempt.0);
                        self.result = None;
                        self.dialog_visible = false;
                    }
                }
            }
            Err(err) => self.fail(attempt, err),
        }
        ApplyOutcome::Applied
    }

    pub fn complete_text(
        &mut self,
        attempt: AttemptId,
        outcome: Result<TextPrediction, TransportError>,
    ) -> ApplyOutcome {
        if !self.accepts(attempt, |m| matches!(m, MediaRef::Text(_))) {
            return ApplyOutcome::Stale;
        }

        match outcome {
            Ok(reply) => {
                let result = resolve_from_text(reply.category, reply.item);
                info!(
                    "attempt {} resolved from text: {} → {}",
                    attempt.0, result.item, result.category
                );
                self.status = SessionStatus::Resolved;
                self.result = Some(result);
                self.fallback_offered = false;
                self.dialog_visible = true;
            }
            Err(err) => self.fail(attempt, err),
        }
        ApplyOutcome::Applied
    }

    /// Closes the modal. The result stays available for the summary view.
    pub fn dismiss_dialog(&mut self) -> Result<(), SessionError> {
        if self.status != SessionStatus::Resolved || !self.dialog_visible {
            return Err(SessionError::NoDialog);
        }
        self.dialog_visible = false;
        Ok(())
    }

    pub fn clear_failure(&mut self) {
        if self.status == SessionStatus::Failed {
            self.status = SessionStatus::Idle;
            self.last_error = None;
        }
    }

    /// Abandons whatever is current; an in-flight response will arrive stale.
    pub fn reset(&mut self) {
        let attempt = self.attempt + 1;
        *self = Self {
            attempt,
            ..Self::default()
        };
    }

    fn ensure_not_uploading(&self) -> Result<(), SessionError> {
        if self.status == SessionStatus::Uploading {
            warn!("rejected submission while attempt {} is uploading", self.attempt);
            return Err(SessionError::Busy);
        }
        Ok(())
    }

    fn begin(&mut self, media: MediaRef) -> AttemptId {
        self.attempt += 1;
        self.media = Some(media);
        self.status = SessionStatus::Uploading;
        self.result = None;
        self.fallback_offered = false;
        self.dialog_visible = false;
        self.last_error = None;
        AttemptId(self.attempt)
    }

    fn accepts(&self, attempt: AttemptId, media_matches: impl Fn(&MediaRef) -> bool) -> bool {
        let fresh = attempt.0 == self.attempt
            && self.status == SessionStatus::Uploading
            && self.media.as_ref().map(media_matches).unwrap_or(false);
        if !fresh {
            debug!(
                "discarding stale response for attempt {} (current {})",
                attempt.0, self.attempt
            );
        }
        fresh
    }

    fn fail(&mut self, attempt: AttemptId, err: TransportError) {
        warn!("attempt {} failed: {}", attempt.0, err);
        self.status = SessionStatus::Failed;
        self.result = None;
        self.fallback_offered = false;
        self.dialog_visible = false;
        self.last_error = Some(err.to_string());
    }
}
