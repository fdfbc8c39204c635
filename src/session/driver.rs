use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::debug;

use super::{ApplyOutcome, ClassificationSession, SessionError};
use crate::model::{ClassificationResult, ImageUpload};
use crate::transport::{PredictionTransport, TransportError};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ClassifyError {
    #[error(transparent)]
    Session(#[from] SessionError),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("response discarded: the attempt was superseded")]
    Superseded,
}

/// Runs submissions of one session against a prediction transport.
///
/// The session lock is never held across the network call, so a concurrent
/// submission sees `Uploading` and is turned away.
pub struct SessionDriver<T> {
    session: Arc<Mutex<ClassificationSession>>,
    transport: Arc<T>,
}

impl<T> Clone for SessionDriver<T> {
    fn clone(&self) -> Self {
        Self {
            session: self.session.clone(),
            transport: self.transport.clone(),
        }
    }
}

impl<T: PredictionTransport> SessionDriver<T> {
    pub fn new(transport: T) -> Self {
        Self::with_transport(Arc::new(transport))
    }

    pub fn with_transport(transport: Arc<T>) -> Self {
        Self {
            session: Arc::new(Mutex::new(ClassificationSession::new())),
            transport,
        }
    }

    pub async fn snapshot(&self) -> ClassificationSession {
        self.session.lock().await.clone()
    }

    /// `Ok(None)` means the service answered with nothing to show.
    pub async fn classify_image(
        &self,
        upload: ImageUpload,
    ) -> Result<Option<ClassificationResult>, ClassifyError> {
        let attempt = self.session.lock().await.submit_image(upload.handle())?;

        let outcome = self.transport.predict_image(&upload).await;
        let transport_err = outcome.as_ref().err().cloned();

        let mut session = self.session.lock().await;
        if session.complete_image(attempt, outcome) == ApplyOutcome::Stale {
            return Err(ClassifyError::Superseded);
        }
        match transport_err {
            Some(err) => Err(err.into()),
            None => Ok(session.result().cloned()),
        }
    }

    pub async fn classify_text(&self, description: &str) -> Result<ClassificationResult, ClassifyError> {
        let attempt = self.session.lock().await.submit_text(description)?;

        let outcome = self.transport.predict_text(description.trim()).await;
        let transport_err = outcome.as_ref().err().cloned();

        let mut session = self.session.lock().await;
        if session.complete_text(attempt, outcome) == ApplyOutcome::Stale {
            return Err(ClassifyError::Superseded);
        }
        if let Some(err) = transport_err {
            return Err(err.into());
        }
        session.result().cloned().ok_or(ClassifyError::Superseded)
    }

    pub async fn dismiss_dialog(&self) -> Result<(), SessionError> {
        self.session.lock().await.dismiss_dialog()
    }

    pub async fn clear_failure(&self) {
        self.session.lock().await.clear_failure();
    }

    pub async fn reset(&self) {
        debug!("session reset");
        self.session.lock().await.reset();
    }
}
