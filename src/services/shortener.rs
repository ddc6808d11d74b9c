//! Shortener service
//!
//! 业务逻辑层：校验输入、计算短码、在存储冲突时做幂等处理，
//! 并把删除请求交给后台队列。HTTP 层只做参数解析和状态码映射。

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::errors::{Result, ShortenerError};
use crate::shortcode::CodeGenerator;
use crate::storage::{StorageBackend, StorageStats, UrlRecord};
use crate::utils::validate_url;

use super::deletion::{DeletionHandle, DeletionQueue};

// ============ Request/Response DTOs ============

/// Result of a single shorten call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShortenOutcome {
    pub code: String,
    /// `false` when the origin was already stored
    pub created: bool,
}

#[derive(Debug, Clone)]
pub struct BatchItem {
    pub correlation_id: String,
    pub original_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchResult {
    pub correlation_id: String,
    pub code: String,
}

// ============ Service ============

pub struct ShortenerService {
    storage: Arc<dyn StorageBackend>,
    generator: CodeGenerator,
    deletions: DeletionQueue,
    base_url: String,
}

impl ShortenerService {
    pub fn new(
        storage: Arc<dyn StorageBackend>,
        deletions: DeletionQueue,
        base_url: impl Into<String>,
    ) -> Self {
        Self {
            storage,
            generator: CodeGenerator::new(),
            deletions,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Shorten `url` on behalf of `owner`
    ///
    /// Idempotent per origin: a second call returns the code that is already
    /// stored, even if it belongs to another owner or was deleted.
    pub async fn shorten(&self, owner: &str, url: &str) -> Result<ShortenOutcome> {
        let url = url.trim();
        validate_url(url).map_err(|e| ShortenerError::invalid_url(e.to_string()))?;

        let code = self.generator.generate(url);
        match self.storage.create(UrlRecord::new(&code, url, owner)).await {
            Ok(()) => {
                debug!("Shortened {} -> {}", url, code);
                Ok(ShortenOutcome {
                    code,
                    created: true,
                })
            }
            Err(ShortenerError::Conflict { existing_code }) => Ok(ShortenOutcome {
                code: existing_code,
                created: false,
            }),
            Err(e) => Err(e),
        }
    }

    /// Look up a code; deleted records are returned with `deleted = true`
    pub async fn resolve(&self, code: &str) -> Result<Option<UrlRecord>> {
        self.storage.get(code).await
    }

    /// Like [`resolve`](Self::resolve) but maps absence and deletion to errors
    pub async fn resolve_active(&self, code: &str) -> Result<UrlRecord> {
        match self.resolve(code).await? {
            Some(record) if record.is_live() => Ok(record),
            Some(_) => Err(ShortenerError::gone(format!("'{}' has been deleted", code))),
            None => Err(ShortenerError::not_found(format!("'{}' not found", code))),
        }
    }

    /// Shorten many URLs at once
    ///
    /// Items with an empty correlation id, an empty origin or an invalid URL
    /// are dropped; the rest are stored in one backend call. An origin that
    /// is already stored reports its stored code, and items the backend
    /// drops are left out. Results keep the input order of the kept items.
    pub async fn batch_shorten(
        &self,
        owner: &str,
        items: Vec<BatchItem>,
    ) -> Result<Vec<BatchResult>> {
        let mut correlation_ids = Vec::with_capacity(items.len());
        let mut records = Vec::with_capacity(items.len());

        for item in items {
            let origin = item.original_url.trim();
            if item.correlation_id.is_empty() || origin.is_empty() {
                debug!("Dropping batch item with empty fields");
                continue;
            }
            if let Err(e) = validate_url(origin) {
                debug!(
                    "Dropping batch item '{}': {}",
                    item.correlation_id, e
                );
                continue;
            }

            let code = self.generator.generate(origin);
            records.push(UrlRecord::new(&code, origin, owner));
            correlation_ids.push(item.correlation_id);
        }

        if records.is_empty() {
            return Ok(Vec::new());
        }

        let count = records.len();
        let codes = self.storage.create_batch(records).await?;
        let results: Vec<BatchResult> = correlation_ids
            .into_iter()
            .zip(codes)
            .filter_map(|(correlation_id, code)| {
                code.map(|code| BatchResult {
                    correlation_id,
                    code,
                })
            })
            .collect();

        info!(
            "Batch shortened {} of {} URLs for {}",
            results.len(),
            count,
            owner
        );
        Ok(results)
    }

    /// Live records of `owner`
    pub async fn list_for_owner(&self, owner: &str) -> Result<Vec<UrlRecord>> {
        self.storage.list_by_owner(owner).await
    }

    /// Queue a soft delete and return without waiting for the backend
    pub fn delete(&self, owner: &str, codes: Vec<String>) -> Result<DeletionHandle> {
        debug!("Queueing deletion of {} codes for {}", codes.len(), owner);
        self.deletions.enqueue(owner, codes)
    }

    /// Aggregate counters, zero for backends that do not keep them
    pub async fn stats(&self) -> Result<StorageStats> {
        Ok(self.storage.stats().await?.unwrap_or_default())
    }

    pub async fn ping(&self) -> Result<()> {
        self.storage.ping().await
    }

    /// Public short URL for `code`
    pub fn shorten_url(&self, code: &str) -> String {
        format!("{}/{}", self.base_url, code)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn backend_name(&self) -> &str {
        self.storage.backend_name()
    }

    /// Drain pending deletions, then let the backend flush and close
    pub async fn shutdown(&self, drain_limit: Duration) -> Result<()> {
        if !self.deletions.shutdown(drain_limit).await {
            warn!("Some queued deletions were not applied before shutdown");
        }
        self.storage.shutdown().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DeletionConfig;
    use crate::storage::MemoryStorage;

    fn service() -> ShortenerService {
        let storage: Arc<dyn StorageBackend> = Arc::new(MemoryStorage::new());
        let deletions = DeletionQueue::spawn(storage.clone(), &DeletionConfig::default());
        ShortenerService::new(storage, deletions, "http://localhost:8080/")
    }

    #[tokio::test]
    async fn test_short_url_joins_base() {
        let svc = service();
        assert_eq!(svc.shorten_url("abc123"), "http://localhost:8080/abc123");
        assert_eq!(svc.base_url(), "http://localhost:8080");
    }

    #[tokio::test]
    async fn test_shorten_is_idempotent() {
        let svc = service();
        let first = svc.shorten("u1", "https://example.com").await.unwrap();
        let second = svc.shorten("u2", "https://example.com").await.unwrap();

        assert!(first.created);
        assert!(!second.created);
        assert_eq!(first.code, second.code);
        assert_eq!(svc.list_for_owner("u2").await.unwrap().len(), 0);
    }

    #[tokio::test]
    async fn test_shorten_rejects_invalid_url() {
        let svc = service();
        let err = svc.shorten("u1", "not a url").await.unwrap_err();
        assert!(matches!(err, ShortenerError::InvalidUrl(_)));

        let err = svc.shorten("u1", "").await.unwrap_err();
        assert!(matches!(err, ShortenerError::InvalidUrl(_)));
    }

    #[tokio::test]
    async fn test_resolve_active() {
        let svc = service();
        let outcome = svc.shorten("u1", "https://example.com/a").await.unwrap();

        let record = svc.resolve_active(&outcome.code).await.unwrap();
        assert_eq!(record.origin, "https://example.com/a");

        svc.delete("u1", vec![outcome.code.clone()])
            .unwrap()
            .wait()
            .await;
        assert!(matches!(
            svc.resolve_active(&outcome.code).await,
            Err(ShortenerError::Gone(_))
        ));
        assert!(matches!(
            svc.resolve_active("missing").await,
            Err(ShortenerError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_batch_drops_bad_items() {
        let svc = service();
        let items = vec![
            BatchItem {
                correlation_id: "1".into(),
                original_url: "https://a.com".into(),
            },
            BatchItem {
                correlation_id: "".into(),
                original_url: "https://b.com".into(),
            },
            BatchItem {
                correlation_id: "3".into(),
                original_url: "".into(),
            },
            BatchItem {
                correlation_id: "4".into(),
                original_url: "https://d.com".into(),
            },
        ];

        let results = svc.batch_shorten("u1", items).await.unwrap();
        let ids: Vec<&str> = results.iter().map(|r| r.correlation_id.as_str()).collect();
        assert_eq!(ids, vec!["1", "4"]);
        assert_eq!(svc.list_for_owner("u1").await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_batch_reports_stored_code_for_known_origin() {
        let storage = Arc::new(MemoryStorage::new());
        storage
            .create(UrlRecord::new("legacy1", "https://x.com", "u0"))
            .await
            .unwrap();
        let deletions = DeletionQueue::spawn(storage.clone(), &DeletionConfig::default());
        let svc = ShortenerService::new(storage, deletions, "http://localhost:8080");

        let results = svc
            .batch_shorten(
                "u1",
                vec![BatchItem {
                    correlation_id: "c1".into(),
                    original_url: "https://x.com".into(),
                }],
            )
            .await
            .unwrap();

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].code, "legacy1");
        assert_eq!(svc.shorten("u1", "https://x.com").await.unwrap().code, "legacy1");
    }

    #[tokio::test]
    async fn test_batch_leaves_out_collided_items() {
        let svc = service();
        let generator = CodeGenerator::new();
        // occupy the code of y.com with a different origin
        svc.storage
            .create(UrlRecord::new(
                &generator.generate("https://y.com"),
                "https://other.com",
                "u0",
            ))
            .await
            .unwrap();

        let results = svc
            .batch_shorten(
                "u1",
                vec![
                    BatchItem {
                        correlation_id: "c1".into(),
                        original_url: "https://y.com".into(),
                    },
                    BatchItem {
                        correlation_id: "c2".into(),
                        original_url: "https://z.com".into(),
                    },
                ],
            )
            .await
            .unwrap();

        let ids: Vec<&str> = results.iter().map(|r| r.correlation_id.as_str()).collect();
        assert_eq!(ids, vec!["c2"]);
    }

    #[tokio::test]
    async fn test_delete_foreign_code_is_ignored() {
        let svc = service();
        let outcome = svc.shorten("u1", "https://a.com").await.unwrap();

        svc.delete("u2", vec![outcome.code.clone()])
            .unwrap()
            .wait()
            .await;
        svc.delete("u2", Vec::new()).unwrap().wait().await;

        assert!(svc.resolve_active(&outcome.code).await.is_ok());
    }

    #[tokio::test]
    async fn test_stats_default_to_zero() {
        let svc = service();
        svc.shorten("u1", "https://a.com").await.unwrap();
        assert_eq!(svc.stats().await.unwrap(), StorageStats::default());
    }
}
