//! In-process storage backend
//!
//! A code → record map plus an origin → code index behind one
//! reader/writer lock. Nothing survives a restart.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{debug, error};

use super::{StorageBackend, StorageStats, UrlRecord};
use crate::errors::{Result, ShortenerError};

/// 记录表：code → record，以及 origin → code 索引
///
/// 软删除的记录仍然保留在两个索引里，code 在整个后端内唯一。
#[derive(Debug, Default)]
pub struct RecordTable {
    records: HashMap<String, UrlRecord>,
    by_origin: HashMap<String, String>,
}

impl RecordTable {
    /// Insert a new record, enforcing origin uniqueness and code uniqueness
    pub fn insert(&mut self, record: UrlRecord) -> Result<()> {
        if let Some(existing) = self.by_origin.get(&record.origin) {
            return Err(ShortenerError::conflict(existing.clone()));
        }

        if let Some(existing) = self.records.get(&record.code) {
            return Err(ShortenerError::code_collision(format!(
                "code '{}' already maps to '{}', refusing '{}'",
                record.code, existing.origin, record.origin
            )));
        }

        self.by_origin
            .insert(record.origin.clone(), record.code.clone());
        self.records.insert(record.code.clone(), record);
        Ok(())
    }

    /// Best-effort per item
    pub fn insert_batch(&mut self, records: Vec<UrlRecord>) -> BatchInsert {
        let mut batch = BatchInsert {
            inserted: Vec::with_capacity(records.len()),
            codes: Vec::with_capacity(records.len()),
        };
        for record in records {
            match self.insert(record.clone()) {
                Ok(()) => {
                    batch.codes.push(Some(record.code.clone()));
                    batch.inserted.push(record);
                }
                Err(ShortenerError::Conflict { existing_code }) => {
                    debug!(
                        "Batch item '{}' already stored as '{}'",
                        record.origin, existing_code
                    );
                    batch.codes.push(Some(existing_code));
                }
                Err(e) => {
                    error!("Batch item '{}' dropped: {}", record.origin, e);
                    batch.codes.push(None);
                }
            }
        }
        batch
    }

    /// Journal replay: the last line for a code wins
    pub fn replay(&mut self, record: UrlRecord) {
        if let Some(previous) = self.records.get(&record.code)
            && previous.origin != record.origin
            && self.by_origin.get(&previous.origin) == Some(&record.code)
        {
            self.by_origin.remove(&previous.origin);
        }

        self.by_origin
            .insert(record.origin.clone(), record.code.clone());
        self.records.insert(record.code.clone(), record);
    }

    pub fn get(&self, code: &str) -> Option<&UrlRecord> {
        self.records.get(code)
    }

    /// Live records of one owner, oldest first
    pub fn list_by_owner(&self, owner: &str) -> Vec<UrlRecord> {
        let mut records: Vec<UrlRecord> = self
            .records
            .values()
            .filter(|r| r.is_live() && r.owner == owner)
            .cloned()
            .collect();
        records.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.code.cmp(&b.code))
        });
        records
    }

    /// Flip `deleted` on the given codes owned by `owner`
    ///
    /// Returns the records that actually changed. Unknown codes, foreign
    /// codes and already-deleted codes are skipped.
    pub fn mark_deleted(&mut self, codes: &[String], owner: &str) -> Vec<UrlRecord> {
        let mut changed = Vec::new();
        for code in codes {
            match self.records.get_mut(code) {
                Some(record) if record.owner == owner && record.is_live() => {
                    record.deleted = true;
                    changed.push(record.clone());
                }
                Some(_) => debug!("Skipping delete of '{}': not owned or already deleted", code),
                None => debug!("Skipping delete of unknown code '{}'", code),
            }
        }
        changed
    }

    pub fn records(&self) -> impl Iterator<Item = &UrlRecord> {
        self.records.values()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Outcome of [`RecordTable::insert_batch`]
#[derive(Debug, Default)]
pub struct BatchInsert {
    /// Records newly written, for the journal
    pub inserted: Vec<UrlRecord>,
    /// Effective code per input record, `None` when dropped
    pub codes: Vec<Option<String>>,
}

#[derive(Debug, Default)]
pub struct MemoryStorage {
    table: RwLock<RecordTable>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_table(table: RecordTable) -> Self {
        Self {
            table: RwLock::new(table),
        }
    }

    pub fn read(&self) -> RwLockReadGuard<'_, RecordTable> {
        self.table.read()
    }

    pub fn write(&self) -> RwLockWriteGuard<'_, RecordTable> {
        self.table.write()
    }
}

#[async_trait]
impl StorageBackend for MemoryStorage {
    async fn create(&self, record: UrlRecord) -> Result<()> {
        let result = self.write().insert(record);
        if let Err(ShortenerError::CodeCollision(ref msg)) = result {
            error!("{}", msg);
        }
        result
    }

    async fn create_batch(&self, records: Vec<UrlRecord>) -> Result<Vec<Option<String>>> {
        let batch = self.write().insert_batch(records);
        debug!("Batch stored {} records", batch.inserted.len());
        Ok(batch.codes)
    }

    async fn get(&self, code: &str) -> Result<Option<UrlRecord>> {
        Ok(self.read().get(code).cloned())
    }

    async fn list_by_owner(&self, owner: &str) -> Result<Vec<UrlRecord>> {
        Ok(self.read().list_by_owner(owner))
    }

    async fn mark_deleted(&self, codes: &[String], owner: &str) -> Result<()> {
        let changed = self.write().mark_deleted(codes, owner);
        debug!("Soft-deleted {} of {} codes", changed.len(), codes.len());
        Ok(())
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }

    async fn stats(&self) -> Result<Option<StorageStats>> {
        Ok(None)
    }

    fn backend_name(&self) -> &str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(code: &str, origin: &str, owner: &str) -> UrlRecord {
        UrlRecord::new(code, origin, owner)
    }

    #[test]
    fn test_insert_conflict_returns_existing_code() {
        let mut table = RecordTable::default();
        table.insert(record("code01", "https://a.com", "u1")).unwrap();

        let err = table
            .insert(record("code02", "https://a.com", "u2"))
            .unwrap_err();
        assert_eq!(err, ShortenerError::conflict("code01"));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_insert_collision_keeps_original() {
        let mut table = RecordTable::default();
        table.insert(record("code01", "https://a.com", "u1")).unwrap();

        let err = table
            .insert(record("code01", "https://b.com", "u1"))
            .unwrap_err();
        assert!(matches!(err, ShortenerError::CodeCollision(_)));
        assert_eq!(table.get("code01").unwrap().origin, "https://a.com");
    }

    #[test]
    fn test_replay_last_write_wins() {
        let mut table = RecordTable::default();
        table.replay(record("code01", "https://a.com", "u1"));
        let mut deleted = record("code01", "https://a.com", "u1");
        deleted.deleted = true;
        table.replay(deleted);

        assert_eq!(table.len(), 1);
        assert!(table.get("code01").unwrap().deleted);
    }

    #[test]
    fn test_replay_moves_origin_index() {
        let mut table = RecordTable::default();
        table.replay(record("code01", "https://a.com", "u1"));
        table.replay(record("code01", "https://b.com", "u1"));

        // a.com is free again, b.com is taken
        assert!(table.insert(record("code02", "https://a.com", "u1")).is_ok());
        assert_eq!(
            table.insert(record("code03", "https://b.com", "u1")),
            Err(ShortenerError::conflict("code01"))
        );
    }

    #[test]
    fn test_mark_deleted_respects_owner() {
        let mut table = RecordTable::default();
        table.insert(record("code01", "https://a.com", "u1")).unwrap();
        table.insert(record("code02", "https://b.com", "u2")).unwrap();

        let changed = table.mark_deleted(
            &["code01".to_string(), "code02".to_string(), "nope00".to_string()],
            "u1",
        );
        assert_eq!(changed.len(), 1);
        assert!(table.get("code01").unwrap().deleted);
        assert!(!table.get("code02").unwrap().deleted);

        // second delete is a no-op
        assert!(table.mark_deleted(&["code01".to_string()], "u1").is_empty());
    }

    #[test]
    fn test_list_by_owner_excludes_deleted() {
        let mut table = RecordTable::default();
        table.insert(record("code01", "https://a.com", "u1")).unwrap();
        table.insert(record("code02", "https://b.com", "u1")).unwrap();
        table.insert(record("code03", "https://c.com", "u2")).unwrap();
        table.mark_deleted(&["code02".to_string()], "u1");

        let listed = table.list_by_owner("u1");
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].code, "code01");
    }

    #[tokio::test]
    async fn test_batch_is_best_effort() {
        let storage = MemoryStorage::new();
        storage
            .create(record("code01", "https://a.com", "u1"))
            .await
            .unwrap();

        let codes = storage
            .create_batch(vec![
                record("code09", "https://a.com", "u1"),
                record("code02", "https://b.com", "u1"),
                record("code02", "https://c.com", "u1"),
            ])
            .await
            .unwrap();

        // known origin keeps its stored code, the collision is dropped
        assert_eq!(
            codes,
            vec![Some("code01".to_string()), Some("code02".to_string()), None]
        );
        assert!(storage.get("code02").await.unwrap().is_some());
        assert_eq!(storage.read().len(), 2);
    }

    #[tokio::test]
    async fn test_stats_unsupported() {
        let storage = MemoryStorage::new();
        assert_eq!(storage.stats().await.unwrap(), None);
        assert!(storage.ping().await.is_ok());
    }
}
