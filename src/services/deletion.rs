//! Background soft-delete queue
//!
//! Delete requests are accepted immediately and applied later by a single
//! worker task that owns its own lifetime, so a client disconnecting never
//! aborts a half-applied deletion. Each job is split into fixed-size chunks
//! that are applied one after another, each bounded by a timeout. Failed
//! chunks are logged and not retried.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::{debug, error, info, warn};

use crate::config::DeletionConfig;
use crate::errors::{Result, ShortenerError};
use crate::storage::StorageBackend;

struct DeletionJob {
    owner: String,
    codes: Vec<String>,
    done: oneshot::Sender<()>,
}

enum Message {
    Job(DeletionJob),
    Shutdown(oneshot::Sender<()>),
}

/// Completion signal for one accepted delete request
pub struct DeletionHandle {
    done: oneshot::Receiver<()>,
}

impl DeletionHandle {
    /// Wait until every chunk of the job has been attempted
    pub async fn wait(self) {
        let _ = self.done.await;
    }
}

#[derive(Clone)]
pub struct DeletionQueue {
    sender: mpsc::Sender<Message>,
    worker: Arc<Mutex<Option<JoinHandle<()>>>>,
}

impl DeletionQueue {
    /// Spawn the worker task; must be called from within a Tokio runtime
    pub fn spawn(storage: Arc<dyn StorageBackend>, config: &DeletionConfig) -> Self {
        let (sender, receiver) = mpsc::channel(config.queue_capacity.max(1));
        let worker = DeletionWorker {
            storage,
            batch_size: config.batch_size.max(1),
            chunk_timeout: Duration::from_secs(config.chunk_timeout_secs.max(1)),
        };
        let handle = tokio::spawn(worker.run(receiver));

        Self {
            sender,
            worker: Arc::new(Mutex::new(Some(handle))),
        }
    }

    /// Accept a soft-delete request for `owner`
    ///
    /// Never waits for the backend. Fails with `BackendUnavailable` when the
    /// queue is full or shut down.
    pub fn enqueue(&self, owner: &str, codes: Vec<String>) -> Result<DeletionHandle> {
        let (done_tx, done_rx) = oneshot::channel();
        let job = Message::Job(DeletionJob {
            owner: owner.to_string(),
            codes,
            done: done_tx,
        });

        match self.sender.try_send(job) {
            Ok(()) => Ok(DeletionHandle { done: done_rx }),
            Err(mpsc::error::TrySendError::Full(_)) => {
                warn!("Deletion queue full, rejecting job for {}", owner);
                Err(ShortenerError::backend_unavailable("deletion queue is full"))
            }
            Err(mpsc::error::TrySendError::Closed(_)) => Err(
                ShortenerError::backend_unavailable("deletion queue is shut down"),
            ),
        }
    }

    /// Stop accepting jobs, drain what is queued and wait for the worker
    ///
    /// Returns `false` if the drain did not finish within `limit`.
    pub async fn shutdown(&self, limit: Duration) -> bool {
        let (ack_tx, ack_rx) = oneshot::channel();

        let drained = timeout(limit, async {
            if self.sender.send(Message::Shutdown(ack_tx)).await.is_err() {
                // worker already gone
                return;
            }
            let _ = ack_rx.await;
        })
        .await
        .is_ok();

        let worker = self.worker.lock().take();
        if let Some(worker) = worker {
            if drained {
                let _ = worker.await;
            } else {
                worker.abort();
            }
        }

        if drained {
            info!("Deletion queue drained");
        } else {
            error!("Deletion queue did not drain within {:?}", limit);
        }
        drained
    }
}

struct DeletionWorker {
    storage: Arc<dyn StorageBackend>,
    batch_size: usize,
    chunk_timeout: Duration,
}

impl DeletionWorker {
    async fn run(self, mut receiver: mpsc::Receiver<Message>) {
        while let Some(message) = receiver.recv().await {
            match message {
                Message::Job(job) => self.process(job).await,
                Message::Shutdown(ack) => {
                    receiver.close();
                    while let Some(pending) = receiver.recv().await {
                        match pending {
                            Message::Job(job) => self.process(job).await,
                            Message::Shutdown(other) => {
                                let _ = other.send(());
                            }
                        }
                    }
                    let _ = ack.send(());
                    break;
                }
            }
        }
        debug!("Deletion worker stopped");
    }

    async fn process(&self, job: DeletionJob) {
        let codes = dedup_codes(job.codes);
        let chunks = codes.chunks(self.batch_size);
        let total = chunks.len();

        for (index, chunk) in chunks.enumerate() {
            match timeout(
                self.chunk_timeout,
                self.storage.mark_deleted(chunk, &job.owner),
            )
            .await
            {
                Ok(Ok(())) => debug!(
                    "Deletion chunk {}/{} applied ({} codes)",
                    index + 1,
                    total,
                    chunk.len()
                ),
                Ok(Err(e)) => error!(
                    "Deletion chunk {}/{} for owner {} failed: {}",
                    index + 1,
                    total,
                    job.owner,
                    e
                ),
                Err(_) => warn!(
                    "Deletion chunk {}/{} for owner {} timed out after {:?}",
                    index + 1,
                    total,
                    job.owner,
                    self.chunk_timeout
                ),
            }
        }

        let _ = job.done.send(());
    }
}

/// Drop blanks and duplicates, keeping first-seen order
fn dedup_codes(codes: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::with_capacity(codes.len());
    codes
        .into_iter()
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty() && seen.insert(c.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{MemoryStorage, StorageStats, UrlRecord};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Records the size of every mark_deleted call
    #[derive(Default)]
    struct RecordingBackend {
        calls: Mutex<Vec<usize>>,
        in_flight: AtomicUsize,
        max_in_flight: AtomicUsize,
    }

    #[async_trait]
    impl StorageBackend for RecordingBackend {
        async fn create(&self, _record: UrlRecord) -> Result<()> {
            Ok(())
        }
        async fn create_batch(&self, _records: Vec<UrlRecord>) -> Result<Vec<Option<String>>> {
            Ok(Vec::new())
        }
        async fn get(&self, _code: &str) -> Result<Option<UrlRecord>> {
            Ok(None)
        }
        async fn list_by_owner(&self, _owner: &str) -> Result<Vec<UrlRecord>> {
            Ok(Vec::new())
        }
        async fn mark_deleted(&self, codes: &[String], _owner: &str) -> Result<()> {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(2)).await;
            self.calls.lock().push(codes.len());
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            Ok(())
        }
        async fn ping(&self) -> Result<()> {
            Ok(())
        }
        async fn stats(&self) -> Result<Option<StorageStats>> {
            Ok(None)
        }
        fn backend_name(&self) -> &str {
            "recording"
        }
    }

    #[test]
    fn test_dedup_codes() {
        let codes = vec![
            "a".to_string(),
            " ".to_string(),
            "b".to_string(),
            "a".to_string(),
        ];
        assert_eq!(dedup_codes(codes), vec!["a".to_string(), "b".to_string()]);
    }

    #[tokio::test]
    async fn test_jobs_are_chunked_sequentially() {
        let backend = Arc::new(RecordingBackend::default());
        let queue = DeletionQueue::spawn(backend.clone(), &DeletionConfig::default());

        let codes: Vec<String> = (0..250).map(|i| format!("code{:03}", i)).collect();
        queue.enqueue("u1", codes).unwrap().wait().await;

        assert_eq!(*backend.calls.lock(), vec![100, 100, 50]);
        assert_eq!(backend.max_in_flight.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_shutdown_drains_pending_jobs() {
        let backend = Arc::new(RecordingBackend::default());
        let queue = DeletionQueue::spawn(backend.clone(), &DeletionConfig::default());

        for i in 0..5 {
            let _ = queue.enqueue("u1", vec![format!("code{:03}", i)]).unwrap();
        }
        assert!(queue.shutdown(Duration::from_secs(5)).await);
        assert_eq!(backend.calls.lock().len(), 5);

        assert!(queue.enqueue("u1", vec!["late00".to_string()]).is_err());
    }

    /// Blocks every mark_deleted call until released
    struct GatedBackend {
        gate: tokio::sync::Semaphore,
    }

    #[async_trait]
    impl StorageBackend for GatedBackend {
        async fn create(&self, _record: UrlRecord) -> Result<()> {
            Ok(())
        }
        async fn create_batch(&self, _records: Vec<UrlRecord>) -> Result<Vec<Option<String>>> {
            Ok(Vec::new())
        }
        async fn get(&self, _code: &str) -> Result<Option<UrlRecord>> {
            Ok(None)
        }
        async fn list_by_owner(&self, _owner: &str) -> Result<Vec<UrlRecord>> {
            Ok(Vec::new())
        }
        async fn mark_deleted(&self, _codes: &[String], _owner: &str) -> Result<()> {
            let _permit = self.gate.acquire().await;
            Ok(())
        }
        async fn ping(&self) -> Result<()> {
            Ok(())
        }
        async fn stats(&self) -> Result<Option<StorageStats>> {
            Ok(None)
        }
        fn backend_name(&self) -> &str {
            "gated"
        }
    }

    #[tokio::test]
    async fn test_full_queue_rejects_jobs() {
        let backend = Arc::new(GatedBackend {
            gate: tokio::sync::Semaphore::new(0),
        });
        let config = DeletionConfig {
            queue_capacity: 2,
            ..DeletionConfig::default()
        };
        let queue = DeletionQueue::spawn(backend.clone(), &config);

        // the worker takes the first job and blocks on the gate
        let first = queue.enqueue("u1", vec!["code00".to_string()]).unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;

        let mut handles = Vec::new();
        for i in 1..=2 {
            handles.push(queue.enqueue("u1", vec![format!("code{:02}", i)]).unwrap());
        }
        let err = queue
            .enqueue("u1", vec!["code03".to_string()])
            .err()
            .unwrap();
        assert!(matches!(err, ShortenerError::BackendUnavailable(_)));

        backend.gate.add_permits(16);
        first.wait().await;
        for handle in handles {
            handle.wait().await;
        }

        // room again once the worker caught up
        assert!(queue.enqueue("u1", vec!["code04".to_string()]).is_ok());
    }

    #[tokio::test]
    async fn test_completes_after_caller_is_gone() {
        let storage = Arc::new(MemoryStorage::new());
        storage
            .create(UrlRecord::new("code01", "https://a.com", "u1"))
            .await
            .unwrap();
        let queue = DeletionQueue::spawn(storage.clone(), &DeletionConfig::default());

        // the request task returns without waiting for the job
        let request = {
            let queue = queue.clone();
            tokio::spawn(async move {
                let _ = queue.enqueue("u1", vec!["code01".to_string()]);
            })
        };
        request.await.unwrap();

        assert!(queue.shutdown(Duration::from_secs(5)).await);
        assert!(storage.get("code01").await.unwrap().unwrap().deleted);
    }
}
