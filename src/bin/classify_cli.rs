use anyhow::{anyhow, Context, Result};
use std::{env, path::Path, sync::Arc};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use wastesort::{
    classifier::CONFIDENCE_THRESHOLD,
    config::ClientConfig,
    history::{FeedRefresh, HistoryFeed, Thumbnail},
    model::ImageUpload,
    session::SessionDriver,
    transport::HttpTransport,
};

const USAGE: &str = "usage: classify_cli (--image <path> | --text <description> | --history)";

enum Command {
    Image(String),
    Text(String),
    History,
}

fn parse_args(args: &[String]) -> Result<Command> {
    match args {
        [flag, path] if flag == "--image" => Ok(Command::Image(path.clone())),
        [flag, rest @ ..] if flag == "--text" && !rest.is_empty() => Ok(Command::Text(rest.join(" "))),
        [flag] if flag == "--history" => Ok(Command::History),
        _ => Err(anyhow!(USAGE)),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args: Vec<String> = env::args().skip(1).collect();
    let command = parse_args(&args)?;

    let config = ClientConfig::from_env()?;
    println!("🌐 Backend: {}", config.base_url);
    let transport = Arc::new(HttpTransport::new(config)?);

    match command {
        Command::Image(path) => classify_image(transport, &path).await,
        Command::Text(description) => classify_text(transport, &description).await,
        Command::History => print_history(transport).await,
    }
}

async fn classify_image(transport: Arc<HttpTransport>, path: &str) -> Result<()> {
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("The file '{path}' could not be read"))?;
    let file_name = Path::new(path)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("upload.jpg")
        .to_string();

    let driver = SessionDriver::with_transport(transport);
    match driver.classify_image(ImageUpload::new(file_name, bytes)).await? {
        Some(result) => {
            let confidence = result.confidence.unwrap_or_default();
            println!(
                "♻️  {} → {} ({:.2}%)",
                result.item,
                result.category,
                confidence * 100.0
            );
            if driver.snapshot().await.fallback_offered() {
                println!(
                    "🤔 Confidence below {:.0}%. Describe the item instead: classify_cli --text \"...\"",
                    CONFIDENCE_THRESHOLD * 100.0
                );
            }
        }
        None => println!("No predictions returned for this image."),
    }
    Ok(())
}

async fn classify_text(transport: Arc<HttpTransport>, description: &str) -> Result<()> {
    let driver = SessionDriver::with_transport(transport);
    let result = driver.classify_text(description).await?;
    println!("♻️  {} → {}", result.item, result.category);
    Ok(())
}

async fn print_history(transport: Arc<HttpTransport>) -> Result<()> {
    let feed = HistoryFeed::new(transport);
    let records = match feed.refresh().await? {
        FeedRefresh::Fetched(records) => records,
        FeedRefresh::Coalesced => feed.records().await,
    };

    if records.is_empty() {
        println!("No history yet.");
    }
    for record in &records {
        let thumb = match feed.thumbnail(record) {
            Thumbnail::Remote(url) => url,
            Thumbnail::Placeholder => "📝".to_string(),
        };
        println!(
            "{}  {}  {}",
            record.timestamp.format("%Y-%m-%d %H:%M"),
            record,
            thumb
        );
    }
    Ok(())
}
