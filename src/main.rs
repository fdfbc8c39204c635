use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use wastesort::{config::ProxyConfig, server};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // -----------------------------
    // Logging
    // -----------------------------
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // -----------------------------
    // Config
    // -----------------------------
    let config = ProxyConfig::from_env()?;

    println!("🚀 Starting prediction proxy...");
    println!("🛠 Forwarding POST /predict → {}", config.prediction_url);

    server::serve(config).await
}
