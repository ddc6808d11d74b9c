use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A stored code → origin mapping
///
/// `code`, `origin`, `owner` and `created_at` are write-once; only `deleted`
/// ever changes, and only from `false` to `true`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UrlRecord {
    pub code: String,
    pub origin: String,
    #[serde(default)]
    pub owner: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub deleted: bool,
}

impl UrlRecord {
    pub fn new(code: impl Into<String>, origin: impl Into<String>, owner: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            origin: origin.into(),
            owner: owner.into(),
            created_at: Utc::now(),
            deleted: false,
        }
    }

    /// Live records resolve and show up in listings
    pub fn is_live(&self) -> bool {
        !self.deleted
    }
}

/// 聚合统计（只有关系型后端支持）
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageStats {
    pub urls: u64,
    pub users: u64,
}

/// One line of the file backend's journal
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JournalEntry {
    pub short_url: String,
    pub original_url: String,
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub is_deleted: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl From<&UrlRecord> for JournalEntry {
    fn from(record: &UrlRecord) -> Self {
        Self {
            short_url: record.code.clone(),
            original_url: record.origin.clone(),
            user_id: record.owner.clone(),
            is_deleted: record.deleted,
            created_at: Some(record.created_at),
        }
    }
}

impl JournalEntry {
    /// Lines written without a timestamp replay with the load time
    pub fn into_record(self, loaded_at: DateTime<Utc>) -> UrlRecord {
        UrlRecord {
            code: self.short_url,
            origin: self.original_url,
            owner: self.user_id,
            created_at: self.created_at.unwrap_or(loaded_at),
            deleted: self.is_deleted,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_journal_line_without_timestamp() {
        let line = r#"{"short_url":"abc123","original_url":"https://example.com","user_id":"u1","is_deleted":false}"#;
        let entry: JournalEntry = serde_json::from_str(line).unwrap();
        let now = Utc::now();
        let record = entry.into_record(now);
        assert_eq!(record.code, "abc123");
        assert_eq!(record.owner, "u1");
        assert_eq!(record.created_at, now);
        assert!(record.is_live());
    }

    #[test]
    fn test_journal_entry_field_names() {
        let mut record = UrlRecord::new("abc123", "https://example.com", "u1");
        record.deleted = true;
        let value = serde_json::to_value(JournalEntry::from(&record)).unwrap();
        assert_eq!(value["short_url"], "abc123");
        assert_eq!(value["original_url"], "https://example.com");
        assert_eq!(value["user_id"], "u1");
        assert_eq!(value["is_deleted"], true);
    }
}
