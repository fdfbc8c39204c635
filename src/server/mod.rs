pub mod handlers;

use std::{sync::Arc, time::Duration};

use anyhow::{Context, Result};
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use crate::config::ProxyConfig;

const UPSTREAM_TIMEOUT_SECS: u64 = 60;

#[derive(Clone)]
pub struct ProxyState {
    pub client: reqwest::Client,
    pub config: Arc<ProxyConfig>,
}

impl ProxyState {
    pub fn new(config: ProxyConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(UPSTREAM_TIMEOUT_SECS))
            .build()
            .context("Failed to build upstream HTTP client")?;
        Ok(Self {
            client,
            config: Arc::new(config),
        })
    }
}

pub fn router(state: ProxyState) -> Router {
    let body_limit = state.config.max_upload_bytes;
    Router::new()
        .route("/predict", post(handlers::predict))
        .route("/health", get(handlers::health))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_headers(Any)
                .allow_methods(Any),
        )
        .with_state(state)
}

pub async fn serve(config: ProxyConfig) -> Result<()> {
    let addr = config.bind_addr.clone();
    let app = router(ProxyState::new(config)?);

    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!("prediction proxy listening on http://{addr}");

    axum::serve(listener, app.into_make_service()).await?;
    Ok(())
}
