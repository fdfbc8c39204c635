use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::model::HistoryRecord;
use crate::transport::{HistorySource, TransportError};

#[derive(Debug, Clone, PartialEq)]
pub enum FeedRefresh {
    /// Fresh server snapshot, in server order. Replaces the previous one.
    Fetched(Vec<HistoryRecord>),
    /// Another fetch was already running; no request was issued.
    Coalesced,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Thumbnail {
    Remote(String),
    /// Text-derived entries have no stored image.
    Placeholder,
}

/// Read replica of the backend history, refetched on every activation.
pub struct HistoryFeed<S> {
    source: Arc<S>,
    records: RwLock<Vec<HistoryRecord>>,
    last_error: RwLock<Option<String>>,
    in_flight: AtomicBool,
}

struct InFlight<'a>(&'a AtomicBool);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl<S: HistorySource> HistoryFeed<S> {
    pub fn new(source: Arc<S>) -> Self {
        Self {
            source,
            records: RwLock::new(Vec::new()),
            last_error: RwLock::new(None),
            in_flight: AtomicBool::new(false),
        }
    }

    /// Fetches the full history. Triggered on view activation and on
    /// pull-to-refresh; a call made while a fetch is running is coalesced.
    pub async fn refresh(&self) -> Result<FeedRefresh, TransportError> {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            debug!("history fetch already in flight, coalescing");
            return Ok(FeedRefresh::Coalesced);
        }
        let _guard = InFlight(&self.in_flight);

        match self.source.fetch_history().await {
            Ok(records) => {
                info!("history refreshed: {} records", records.len());
                *self.records.write().await = records.clone();
                *self.last_error.write().await = None;
                Ok(FeedRefresh::Fetched(records))
            }
            Err(err) => {
                warn!("history fetch failed: {}", err);
                *self.last_error.write().await = Some(err.to_string());
                Err(err)
            }
        }
    }

    pub fn is_refreshing(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    pub async fn records(&self) -> Vec<HistoryRecord> {
        self.records.read().await.clone()
    }

    pub async fn last_error(&self) -> Option<String> {
        self.last_error.read().await.clone()
    }

    pub fn thumbnail(&self, record: &HistoryRecord) -> Thumbnail {
        if record.is_text_based() {
            Thumbnail::Placeholder
        } else {
            Thumbnail::Remote(self.source.thumbnail_url(record.id))
        }
    }

    /// Image bytes for the record, or `None` when it should render a placeholder.
    pub async fn load_thumbnail(
        &self,
        record: &HistoryRecord,
    ) -> Result<Option<Vec<u8>>, TransportError> {
        if record.is_text_based() {
            return Ok(None);
        }
        self.source.fetch_thumbnail(record.id).await.map(Some)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use std::sync::atomic::AtomicUsize;
    use tokio::sync::{oneshot, Mutex};

    fn record(id: i64, tag: &str, probability: Option<f64>) -> HistoryRecord {
        HistoryRecord {
            id,
            predicted_tag: tag.into(),
            probability,
            timestamp: Utc.with_ymd_and_hms(2024, 5, 3, 12, 0, id as u32).unwrap(),
        }
    }

    struct FakeSource {
        calls: AtomicUsize,
        replies: Mutex<Vec<Result<Vec<HistoryRecord>, TransportError>>>,
        gate: Mutex<Option<oneshot::Receiver<()>>>,
    }

    impl FakeSource {
        fn new(replies: Vec<Result<Vec<HistoryRecord>, TransportError>>) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                replies: Mutex::new(replies),
                gate: Mutex::new(None),
            }
        }
    }

    impl HistorySource for FakeSource {
        async fn fetch_history(&self) -> Result<Vec<HistoryRecord>, TransportError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let gate = self.gate.lock().await.take();
            if let Some(gate) = gate {
                let _ = gate.await;
            }
            let mut replies = self.replies.lock().await;
            if replies.is_empty() {
                Ok(Vec::new())
            } else {
                replies.remove(0)
            }
        }

        fn thumbnail_url(&self, record_id: i64) -> String {
            format!("http://backend/history/image/{record_id}")
        }

        async fn fetch_thumbnail(&self, record_id: i64) -> Result<Vec<u8>, TransportError> {
            Ok(vec![record_id as u8])
        }
    }

    #[tokio::test]
    async fn refresh_replaces_snapshot_in_server_order() {
        let source = Arc::new(FakeSource::new(vec![
            Ok(vec![record(3, "glass", Some(0.9)), record(1, "paper", Some(0.7))]),
            Ok(vec![record(4, "leaf", Some(0.8))]),
        ]));
        let feed = HistoryFeed::new(source.clone());

        let first = feed.refresh().await.unwrap();
        assert_eq!(
            first,
            FeedRefresh::Fetched(vec![record(3, "glass", Some(0.9)), record(1, "paper", Some(0.7))])
        );

        feed.refresh().await.unwrap();
        let ids: Vec<i64> = feed.records().await.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![4]);
        assert_eq!(source.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn refresh_during_fetch_is_coalesced() {
        let (release, gate) = oneshot::channel();
        let source = Arc::new(FakeSource::new(vec![Ok(vec![record(1, "metal", Some(0.95))])]));
        *source.gate.lock().await = Some(gate);
        let feed = Arc::new(HistoryFeed::new(source.clone()));

        let first = tokio::spawn({
            let feed = feed.clone();
            async move { feed.refresh().await }
        });
        while !feed.is_refreshing() {
            tokio::task::yield_now().await;
        }

        assert_eq!(feed.refresh().await, Ok(FeedRefresh::Coalesced));
        release.send(()).unwrap();

        let fetched = first.await.unwrap().unwrap();
        assert!(matches!(fetched, FeedRefresh::Fetched(ref r) if r.len() == 1));
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
        assert!(!feed.is_refreshing());
    }

    #[tokio::test]
    async fn failed_refresh_keeps_previous_snapshot() {
        let source = Arc::new(FakeSource::new(vec![
            Ok(vec![record(1, "plastic", Some(0.88))]),
            Err(TransportError::Network("offline".into())),
            Ok(vec![]),
        ]));
        let feed = HistoryFeed::new(source);

        feed.refresh().await.unwrap();
        let err = feed.refresh().await.unwrap_err();
        assert_eq!(err, TransportError::Network("offline".into()));
        assert_eq!(feed.records().await.len(), 1);
        assert_eq!(feed.last_error().await.as_deref(), Some("network error: offline"));
        assert!(!feed.is_refreshing());

        feed.refresh().await.unwrap();
        assert!(feed.records().await.is_empty());
        assert!(feed.last_error().await.is_none());
    }

    #[tokio::test]
    async fn thumbnails_only_for_image_records() {
        let feed = HistoryFeed::new(Arc::new(FakeSource::new(Vec::new())));
        let image = record(9, "cardboard", Some(0.93));
        let text = record(10, "orange peel", None);

        assert_eq!(
            feed.thumbnail(&image),
            Thumbnail::Remote("http://backend/history/image/9".into())
        );
        assert_eq!(feed.thumbnail(&text), Thumbnail::Placeholder);
        assert_eq!(feed.load_thumbnail(&image).await, Ok(Some(vec![9])));
        assert_eq!(feed.load_thumbnail(&text).await, Ok(None));
    }
}
