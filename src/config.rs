use anyhow::{anyhow, Context, Result};
use std::time::Duration;

const DEFAULT_BACKEND_URL: &str = "http://127.0.0.1:5000";
const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_BIND_ADDR: &str = "0.0.0.0:5000";
const DEFAULT_MAX_UPLOAD_BYTES: usize = 16 * 1024 * 1024;

/// Where the client-side transport sends prediction and history requests.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: String,
    pub request_timeout: Duration,
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: normalize_base_url(base_url.into()),
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    pub fn from_env() -> Result<Self> {
        let base_url = pick_base_url(non_blank_var("BACKEND_URL"), non_blank_var("RENDER_BACKEND_URL"));
        let timeout_secs = parse_var("REQUEST_TIMEOUT_SECS", DEFAULT_TIMEOUT_SECS)?;

        Ok(Self {
            base_url,
            request_timeout: Duration::from_secs(timeout_secs),
        })
    }

    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }
}

/// Settings of the prediction proxy that fronts the vision service.
#[derive(Debug, Clone)]
pub struct ProxyConfig {
    pub prediction_url: String,
    pub prediction_key: String,
    pub bind_addr: String,
    pub max_upload_bytes: usize,
}

impl ProxyConfig {
    pub fn from_env() -> Result<Self> {
        let prediction_url = non_blank_var("PREDICTION_URL");
        let prediction_key = non_blank_var("PREDICTION_KEY");

        let (prediction_url, prediction_key) = match (prediction_url, prediction_key) {
            (Some(url), Some(key)) => (url, key),
            _ => {
                return Err(anyhow!(
                    "PREDICTION_URL and PREDICTION_KEY must be set in the environment or a .env file"
                ))
            }
        };

        Ok(Self {
            prediction_url,
            prediction_key,
            bind_addr: dotenvy::var("BIND_ADDR").unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string()),
            max_upload_bytes: parse_var("MAX_UPLOAD_BYTES", DEFAULT_MAX_UPLOAD_BYTES)?,
        })
    }
}

fn non_blank_var(name: &str) -> Option<String> {
    dotenvy::var(name).ok().filter(|v| !v.trim().is_empty())
}

/// Blank values count as unset, so an empty `BACKEND_URL` never yields a relative URL.
fn pick_base_url(primary: Option<String>, fallback: Option<String>) -> String {
    primary
        .or(fallback)
        .map(normalize_base_url)
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| DEFAULT_BACKEND_URL.to_string())
}

fn normalize_base_url(url: String) -> String {
    url.trim().trim_end_matches('/').to_string()
}

fn parse_var<T>(name: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match dotenvy::var(name) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("invalid value for {name}: '{raw}'")),
        _ => Ok(default),
    }
}
