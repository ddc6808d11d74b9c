use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use crate::config::{BackendKind, StaticConfig};
use crate::errors::Result;

pub mod backend;
pub mod file;
pub mod memory;
pub mod models;

pub use backend::SeaOrmStorage;
pub use file::FileStorage;
pub use memory::MemoryStorage;
pub use models::{JournalEntry, StorageStats, UrlRecord};

/// One contract over the memory, file-journaled and relational variants
///
/// `get` returns soft-deleted records too (with `deleted = true`); callers
/// decide whether that means "gone" or "not found".
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Fails with `Conflict(existing_code)` when the origin is already stored
    /// and with `CodeCollision` when the code maps to a different origin.
    async fn create(&self, record: UrlRecord) -> Result<()>;

    /// Relational: one transaction, any failure rolls back the whole batch.
    /// Memory/file: best-effort per item, collisions dropped.
    ///
    /// Returns the effective code of each input record in input order: the
    /// record's own code when inserted, the stored code when the origin was
    /// already known, `None` when the item was dropped.
    async fn create_batch(&self, records: Vec<UrlRecord>) -> Result<Vec<Option<String>>>;

    async fn get(&self, code: &str) -> Result<Option<UrlRecord>>;

    /// Live records of one owner
    async fn list_by_owner(&self, owner: &str) -> Result<Vec<UrlRecord>>;

    /// Soft-delete; codes owned by someone else are silently skipped
    async fn mark_deleted(&self, codes: &[String], owner: &str) -> Result<()>;

    async fn ping(&self) -> Result<()>;

    /// `None` when the backend does not keep statistics
    async fn stats(&self) -> Result<Option<StorageStats>>;

    fn backend_name(&self) -> &str;

    /// Called once on graceful shutdown
    async fn shutdown(&self) -> Result<()> {
        Ok(())
    }
}

pub struct StorageFactory;

impl StorageFactory {
    /// Build the backend selected by the configuration
    pub async fn create(config: &StaticConfig) -> Result<Arc<dyn StorageBackend>> {
        let storage: Arc<dyn StorageBackend> = match config.backend_kind() {
            BackendKind::Relational { database_url } => {
                let backend_type = backend::infer_backend_from_url(&database_url)?;
                Arc::new(SeaOrmStorage::new(&database_url, &backend_type, &config.storage).await?)
            }
            BackendKind::File { path } => Arc::new(FileStorage::open(path)?),
            BackendKind::Memory => Arc::new(MemoryStorage::new()),
        };

        info!("Using storage backend: {}", storage.backend_name());
        Ok(storage)
    }
}
