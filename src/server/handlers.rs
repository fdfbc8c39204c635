use std::fmt::Display;

use axum::{
    body::Bytes,
    extract::{multipart::MultipartRejection, Multipart, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use super::ProxyState;

type ApiError = (StatusCode, Json<Value>);

pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// Forwards the uploaded `file` to the vision endpoint and relays its JSON.
pub async fn predict(
    State(state): State<ProxyState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<Value>, ApiError> {
    let mut multipart = multipart.map_err(|e| {
        debug!("rejected non-multipart predict request: {e}");
        bad_request("No file part in the request")
    })?;

    let mut upload: Option<(String, Bytes)> = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| bad_request(format!("Invalid multipart payload: {e}")))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let file_name = field.file_name().unwrap_or_default().to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| bad_request(format!("Failed to read field: {e}")))?;
        upload = Some((file_name, bytes));
        break;
    }

    let (file_name, bytes) = upload.ok_or_else(|| bad_request("No file part in the request"))?;
    if file_name.is_empty() {
        return Err(bad_request("No image selected for uploading"));
    }

    info!("forwarding '{}' ({} bytes) to prediction endpoint", file_name, bytes.len());
    let results = forward(&state, bytes).await?;
    log_predictions(&results);

    Ok(Json(results))
}

async fn forward(state: &ProxyState, bytes: Bytes) -> Result<Value, ApiError> {
    let response = state
        .client
        .post(&state.config.prediction_url)
        .header("Prediction-Key", &state.config.prediction_key)
        .header(reqwest::header::CONTENT_TYPE, "application/octet-stream")
        .body(bytes)
        .send()
        .await
        .map_err(unexpected)?;

    let status = response.status();
    if !status.is_success() {
        let details = response.text().await.unwrap_or_default();
        warn!("prediction endpoint returned {}: {}", status, details);
        return Err((
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({
                "error": format!("HTTP error: {}", status.as_u16()),
                "details": details,
            })),
        ));
    }

    response.json::<Value>().await.map_err(unexpected)
}

fn log_predictions(results: &Value) {
    let Some(predictions) = results.get("predictions").and_then(Value::as_array) else {
        return;
    };
    for prediction in predictions {
        let tag = prediction
            .get("tagName")
            .and_then(Value::as_str)
            .unwrap_or("?");
        let probability = prediction
            .get("probability")
            .and_then(Value::as_f64)
            .unwrap_or(0.0);
        info!("- Tag: {}, Probability: {:.2}%", tag, probability * 100.0);
    }
}

fn bad_request(message: impl Into<String>) -> ApiError {
    (
        StatusCode::BAD_REQUEST,
        Json(json!({ "error": message.into() })),
    )
}

fn unexpected(err: impl Display) -> ApiError {
    warn!("prediction proxy failure: {err}");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({
            "error": "An unexpected error occurred",
            "details": err.to_string(),
        })),
    )
}

#[cfg(test)]
mod tests {
    use crate::config::{ClientConfig, ProxyConfig};
    use crate::model::{Category, ImageUpload};
    use crate::server::{router, ProxyState};
    use crate::session::SessionDriver;
    use crate::transport::{HttpTransport, PredictionTransport, TransportError};
    use axum::{
        body::Bytes,
        http::{HeaderMap, StatusCode},
        routing::post,
        Json, Router,
    };
    use reqwest::multipart::{Form, Part};
    use serde_json::{json, Value};
    use std::net::SocketAddr;
    use tokio::net::TcpListener;

    async fn spawn(app: Router) -> SocketAddr {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        addr
    }

    async fn custom_vision(headers: HeaderMap, body: Bytes) -> (StatusCode, Json<Value>) {
        if headers.get("Prediction-Key").and_then(|v| v.to_str().ok()) != Some("secret") {
            return (
                StatusCode::UNAUTHORIZED,
                Json(json!({"code": "Unauthorized", "message": "Invalid key"})),
            );
        }
        assert_eq!(
            headers.get("content-type").and_then(|v| v.to_str().ok()),
            Some("application/octet-stream")
        );
        let tag = String::from_utf8_lossy(&body).to_string();
        (
            StatusCode::OK,
            Json(json!({
                "id": "run-1",
                "predictions": [
                    {"tagName": "leaf", "probability": 0.40},
                    {"tagName": tag, "probability": 0.92}
                ]
            })),
        )
    }

    async fn spawn_proxy(key: &str) -> SocketAddr {
        let upstream = spawn(Router::new().route("/classify", post(custom_vision))).await;
        let config = ProxyConfig {
            prediction_url: format!("http://{upstream}/classify"),
            prediction_key: key.to_string(),
            bind_addr: "127.0.0.1:0".into(),
            max_upload_bytes: 1024 * 1024,
        };
        spawn(router(ProxyState::new(config).unwrap())).await
    }

    #[tokio::test]
    async fn proxies_image_to_upstream_and_drives_session() {
        let proxy = spawn_proxy("secret").await;
        let transport = HttpTransport::new(ClientConfig::new(format!("http://{proxy}"))).unwrap();
        let driver = SessionDriver::new(transport);

        let upload = ImageUpload::new("box.jpg", b"cardboard".to_vec());
        let result = driver.classify_image(upload).await.unwrap().unwrap();
        assert_eq!(result.item, "cardboard");
        assert_eq!(result.category, Category::Recyclable);
        assert!(!driver.snapshot().await.fallback_offered());
    }

    #[tokio::test]
    async fn upstream_failure_maps_to_http_error() {
        let proxy = spawn_proxy("wrong").await;
        let transport = HttpTransport::new(ClientConfig::new(format!("http://{proxy}"))).unwrap();
        let err = transport
            .predict_image(&ImageUpload::new("a.png", vec![1]))
            .await
            .unwrap_err();
        assert_eq!(
            err,
            TransportError::Service {
                status: 500,
                message: "HTTP error: 401".into()
            }
        );
    }

    #[tokio::test]
    async fn missing_file_field_is_rejected() {
        let proxy = spawn_proxy("secret").await;
        let client = reqwest::Client::new();

        let form = Form::new().text("note", "no file here");
        let response = client
            .post(format!("http://{proxy}/predict"))
            .multipart(form)
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), reqwest::StatusCode::BAD_REQUEST);
        let body: Value = response.json().await.unwrap();
        assert_eq!(body["error"], "No file part in the request");

        let response = client
            .post(format!("http://{proxy}/predict"))
            .json(&json!({"file": "nope"}))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), reqwest::StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn unnamed_file_is_rejected() {
        let proxy = spawn_proxy("secret").await;
        let form = Form::new().part("file", Part::bytes(vec![1, 2, 3]).file_name(""));
        let response = reqwest::Client::new()
            .post(format!("http://{proxy}/predict"))
            .multipart(form)
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), reqwest::StatusCode::BAD_REQUEST);
        let body: Value = response.json().await.unwrap();
        assert_eq!(body["error"], "No image selected for uploading");
    }

    #[tokio::test]
    async fn health_reports_ok() {
        let proxy = spawn_proxy("secret").await;
        let body: Value = reqwest::get(format!("http://{proxy}/health"))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(body["status"], "ok");
    }
}
