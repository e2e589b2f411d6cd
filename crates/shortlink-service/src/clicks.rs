use shortlink_core::{Repository, ShortCode};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, trace, warn};

/// Fire-and-forget click accounting.
///
/// Hits are pushed onto an unbounded queue and applied to the durable store
/// by a single background task, so recording a hit never waits on the store.
/// Delivery is best effort: failed increments are logged and dropped.
#[derive(Debug, Clone)]
pub struct ClickRecorder {
    tx: mpsc::UnboundedSender<ShortCode>,
}

impl ClickRecorder {
    /// Starts the background worker on the current tokio runtime.
    ///
    /// The worker exits once every `ClickRecorder` clone has been dropped
    /// and the queue has drained.
    pub fn spawn<R: Repository>(repository: Arc<R>, timeout: Duration) -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel::<ShortCode>();

        tokio::spawn(async move {
            while let Some(code) = rx.recv().await {
                match tokio::time::timeout(timeout, repository.increment_clicks(&code)).await {
                    Ok(Ok(())) => trace!(code = %code, "Recorded click"),
                    Ok(Err(e)) => warn!(code = %code, error = %e, "Failed to record click"),
                    Err(_) => warn!(code = %code, ?timeout, "Timed out recording click"),
                }
            }
            debug!("click recorder stopped");
        });

        Self { tx }
    }

    /// Queues one hit for `code`. Never blocks.
    pub fn record_hit(&self, code: ShortCode) {
        if let Err(e) = self.tx.send(code) {
            warn!(code = %e.0, "Click recorder is closed, dropping hit");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use shortlink_core::repository::Result;
    use shortlink_core::{LinkRecord, NewLink, ReadRepository, StorageError};
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Counts increments and fails every one of them.
    #[derive(Default)]
    struct BrokenCounter {
        attempts: AtomicUsize,
    }

    #[async_trait]
    impl ReadRepository for BrokenCounter {
        async fn get(&self, _code: &ShortCode) -> Result<Option<LinkRecord>> {
            Ok(None)
        }

        async fn exists(&self, _code: &ShortCode) -> Result<bool> {
            Ok(false)
        }

        async fn live_codes(&self) -> Result<Vec<ShortCode>> {
            Ok(Vec::new())
        }
    }

    #[async_trait]
    impl Repository for BrokenCounter {
        async fn insert(&self, _link: NewLink) -> Result<()> {
            Ok(())
        }

        async fn increment_clicks(&self, _code: &ShortCode) -> Result<()> {
            self.attempts.fetch_add(1, Ordering::SeqCst);
            Err(StorageError::Unavailable("database is down".to_string()))
        }

        async fn delete(&self, _code: &ShortCode) -> Result<bool> {
            Ok(false)
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn failures_are_swallowed_and_the_worker_keeps_going() {
        let repo = Arc::new(BrokenCounter::default());
        let recorder = ClickRecorder::spawn(Arc::clone(&repo), Duration::from_secs(1));

        for _ in 0..3 {
            recorder.record_hit(ShortCode::new_unchecked("abc123"));
        }

        awaitility::at_most(Duration::from_secs(5))
            .poll_interval(Duration::from_millis(10))
            .until_async(|| async { repo.attempts.load(Ordering::SeqCst) == 3 })
            .await;
    }
}
