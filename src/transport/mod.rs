pub mod http;

use std::future::Future;

use crate::model::{HistoryRecord, ImageUpload, TagPrediction, TextPrediction};

pub use http::HttpTransport;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TransportError {
    #[error("network error: {0}")]
    Network(String),

    #[error("{message}")]
    Service { status: u16, message: String },

    #[error("invalid response: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        TransportError::Network(err.to_string())
    }
}

/// Prediction services a classification session talks to.
pub trait PredictionTransport: Send + Sync {
    fn predict_image(
        &self,
        upload: &ImageUpload,
    ) -> impl Future<Output = Result<Vec<TagPrediction>, TransportError>> + Send;

    fn predict_text(
        &self,
        description: &str,
    ) -> impl Future<Output = Result<TextPrediction, TransportError>> + Send;
}

/// Backend store of past classifications.
pub trait HistorySource: Send + Sync {
    fn fetch_history(&self) -> impl Future<Output = Result<Vec<HistoryRecord>, TransportError>> + Send;

    fn thumbnail_url(&self, record_id: i64) -> String;

    fn fetch_thumbnail(
        &self,
        record_id: i64,
    ) -> impl Future<Output = Result<Vec<u8>, TransportError>> + Send;
}
