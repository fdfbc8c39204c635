use anyhow::{Context, Result};
use reqwest::multipart::{Form, Part};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use super::{HistorySource, PredictionTransport, TransportError};
use crate::config::ClientConfig;
use crate::model::{HistoryRecord, ImageUpload, TagPrediction, TextPrediction};

#[derive(Debug, Deserialize)]
struct PredictionsBody {
    predictions: Vec<TagPrediction>,
}

#[derive(Debug, Serialize)]
struct TextRequest<'a> {
    description: &'a str,
}

/// reqwest-backed client for the prediction and history endpoints.
#[derive(Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    config: ClientConfig,
}

impl HttpTransport {
    pub fn new(config: ClientConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }
}

impl PredictionTransport for HttpTransport {
    async fn predict_image(&self, upload: &ImageUpload) -> Result<Vec<TagPrediction>, TransportError> {
        let part = Part::bytes(upload.bytes.clone())
            .file_name(upload.file_name.clone())
            .mime_str(&upload.mime_type)?;
        let form = Form::new().part("file", part);

        let url = self.config.endpoint("predict");
        debug!("POST {} ({} bytes)", url, upload.bytes.len());
        let response = self.client.post(url).multipart(form).send().await?;
        let body: PredictionsBody = read_json(response).await?;
        Ok(body.predictions)
    }

    async fn predict_text(&self, description: &str) -> Result<TextPrediction, TransportError> {
        let url = self.config.endpoint("predict-text");
        debug!("POST {}", url);
        let response = self
            .client
            .post(url)
            .json(&TextRequest { description })
            .send()
            .await?;
        read_json(response).await
    }
}

impl HistorySource for HttpTransport {
    async fn fetch_history(&self) -> Result<Vec<HistoryRecord>, TransportError> {
        let response = self.client.get(self.config.endpoint("history")).send().await?;
        read_json(response).await
    }

    fn thumbnail_url(&self, record_id: i64) -> String {
        self.config.endpoint(&format!("history/image/{record_id}"))
    }

    async fn fetch_thumbnail(&self, record_id: i64) -> Result<Vec<u8>, TransportError> {
        let response = self.client.get(self.thumbnail_url(record_id)).send().await?;
        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(service_error(status.as_u16(), &text));
        }
        Ok(response.bytes().await?.to_vec())
    }
}

async fn read_json<R: DeserializeOwned>(response: reqwest::Response) -> Result<R, TransportError> {
    let status = response.status();
    let text = response.text().await?;
    decode_body(status.as_u16(), &text)
}

/// Non-2xx statuses and bodies carrying an `error` field are service errors.
fn decode_body<R: DeserializeOwned>(status: u16, text: &str) -> Result<R, TransportError> {
    if !(200..300).contains(&status) {
        return Err(service_error(status, text));
    }

    let value: Value =
        serde_json::from_str(text).map_err(|e| TransportError::Decode(e.to_string()))?;
    if let Some(message) = value.get("error").and_then(Value::as_str) {
        return Err(TransportError::Service {
            status,
            message: message.to_string(),
        });
    }
    serde_json::from_value(value).map_err(|e| TransportError::Decode(e.to_string()))
}

fn service_error(status: u16, text: &str) -> TransportError {
    let message = serde_json::from_str::<Value>(text)
        .ok()
        .and_then(|v| v.get("error").and_then(Value::as_str).map(str::to_string))
        .filter(|m| !m.trim().is_empty())
        .unwrap_or_else(|| {
            let trimmed = text.trim();
            if trimmed.is_empty() {
                format!("HTTP {status}")
            } else {
                trimmed.to_string()
            }
        });
    TransportError::Service { status, message }
}
