//! File-journaled storage backend
//!
//! Keeps everything in a [`MemoryStorage`] and mirrors every successful
//! write to an append-only file of newline-delimited JSON records. The file
//! is replayed on open (last line per code wins) and rewritten as a compact
//! snapshot on clean shutdown.

use std::fs::{self, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::Utc;
use tracing::{debug, error, info, warn};

use super::memory::{MemoryStorage, RecordTable};
use super::models::JournalEntry;
use super::{StorageBackend, StorageStats, UrlRecord};
use crate::errors::{Result, ShortenerError};

pub struct FileStorage {
    memory: MemoryStorage,
    path: PathBuf,
}

impl FileStorage {
    /// Open (or create) the journal and replay it into memory
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            fs::create_dir_all(parent).map_err(|e| {
                ShortenerError::file_operation(format!(
                    "Failed to create journal directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        let table = load_journal(&path)?;
        info!(
            "File storage loaded {} records from {}",
            table.len(),
            path.display()
        );

        Ok(Self {
            memory: MemoryStorage::from_table(table),
            path,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Rewrite the journal as one line per record
    ///
    /// Written to a temporary file first and renamed over the journal, so a
    /// crash mid-compaction leaves the old journal intact.
    pub fn compact(&self) -> Result<()> {
        let table = self.memory.write();

        let mut tmp_name = self.path.as_os_str().to_owned();
        tmp_name.push(".compact");
        let tmp_path = PathBuf::from(tmp_name);

        {
            let mut file = fs::File::create(&tmp_path)?;
            let mut records: Vec<&UrlRecord> = table.records().collect();
            records.sort_by(|a, b| a.created_at.cmp(&b.created_at));
            for record in records {
                let line = serde_json::to_string(&JournalEntry::from(record))?;
                writeln!(file, "{}", line)?;
            }
            file.sync_all()?;
        }

        fs::rename(&tmp_path, &self.path)?;
        info!(
            "Compacted journal {} to {} records",
            self.path.display(),
            table.len()
        );
        Ok(())
    }

    /// Append records to the journal, one open per call
    ///
    /// Must be called while holding the table's write lock so that journal
    /// order matches mutation order.
    fn append(&self, records: &[UrlRecord]) {
        if records.is_empty() {
            return;
        }
        if let Err(e) = append_lines(&self.path, records) {
            error!(
                "Failed to append {} records to journal {}: {}",
                records.len(),
                self.path.display(),
                e
            );
        }
    }
}

fn append_lines(path: &Path, records: &[UrlRecord]) -> Result<()> {
    let mut buf = String::new();
    for record in records {
        buf.push_str(&serde_json::to_string(&JournalEntry::from(record))?);
        buf.push('\n');
    }

    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    file.write_all(buf.as_bytes())?;
    Ok(())
}

fn load_journal(path: &Path) -> Result<RecordTable> {
    let mut table = RecordTable::default();

    let file = match fs::File::open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            info!("Journal {} not found, starting empty", path.display());
            return Ok(table);
        }
        Err(e) => {
            return Err(ShortenerError::file_operation(format!(
                "Failed to open journal {}: {}",
                path.display(),
                e
            )));
        }
    };

    let loaded_at = Utc::now();
    let mut skipped = 0usize;
    for (index, line) in BufReader::new(file).lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<JournalEntry>(&line) {
            Ok(entry) => table.replay(entry.into_record(loaded_at)),
            Err(e) => {
                skipped += 1;
                warn!(
                    "Skipping malformed journal line {} in {}: {}",
                    index + 1,
                    path.display(),
                    e
                );
            }
        }
    }

    if skipped > 0 {
        warn!("{} malformed journal lines skipped", skipped);
    }
    Ok(table)
}

#[async_trait]
impl StorageBackend for FileStorage {
    async fn create(&self, record: UrlRecord) -> Result<()> {
        let mut table = self.memory.write();
        match table.insert(record.clone()) {
            Ok(()) => {
                self.append(std::slice::from_ref(&record));
                Ok(())
            }
            Err(e) => {
                if let ShortenerError::CodeCollision(ref msg) = e {
                    error!("{}", msg);
                }
                Err(e)
            }
        }
    }

    async fn create_batch(&self, records: Vec<UrlRecord>) -> Result<Vec<Option<String>>> {
        let mut table = self.memory.write();
        let batch = table.insert_batch(records);
        self.append(&batch.inserted);
        Ok(batch.codes)
    }

    async fn get(&self, code: &str) -> Result<Option<UrlRecord>> {
        self.memory.get(code).await
    }

    async fn list_by_owner(&self, owner: &str) -> Result<Vec<UrlRecord>> {
        self.memory.list_by_owner(owner).await
    }

    async fn mark_deleted(&self, codes: &[String], owner: &str) -> Result<()> {
        let mut table = self.memory.write();
        let changed = table.mark_deleted(codes, owner);
        self.append(&changed);
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
        "file"
    }

    async fn shutdown(&self) -> Result<()> {
        self.compact()
    }
}
