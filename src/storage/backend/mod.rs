//! SeaORM storage backend
//!
//! Relational variant over SQLite, MySQL/MariaDB and PostgreSQL.
//! Each operation is one statement, batches are one transaction.

mod connection;
mod converters;
mod mutations;
mod query;

use async_trait::async_trait;
use sea_orm::{DatabaseConnection, DbErr};
use tracing::info;

use crate::config::StorageConfig;
use crate::errors::{Result, ShortenerError};
use crate::storage::{StorageBackend, StorageStats, UrlRecord};

pub use connection::{connect_generic, connect_sqlite, run_migrations, sqlite_url};
pub use converters::{model_to_record, record_to_active_model};

/// 从数据库 URL 推断数据库类型
pub fn infer_backend_from_url(database_url: &str) -> Result<String> {
    if database_url.starts_with("sqlite:")
        || database_url.ends_with(".db")
        || database_url.ends_with(".sqlite")
        || database_url == ":memory:"
    {
        Ok("sqlite".to_string())
    } else if database_url.starts_with("mysql://") || database_url.starts_with("mariadb://") {
        Ok("mysql".to_string())
    } else if database_url.starts_with("postgres://") || database_url.starts_with("postgresql://") {
        Ok("postgres".to_string())
    } else {
        Err(ShortenerError::database_config(format!(
            "Cannot infer database type from URL: {}. Supported: sqlite://, mysql://, mariadb://, postgres://",
            database_url
        )))
    }
}

/// 规范化 backend 名称
pub fn normalize_backend_name(backend: &str) -> String {
    match backend {
        "mariadb" => "mysql".to_string(),
        other => other.to_string(),
    }
}

/// 连接错误映射为 BackendUnavailable，其它为 DatabaseOperation
pub(crate) fn map_db_err(action: &str, err: DbErr) -> ShortenerError {
    match err {
        DbErr::Conn(_) | DbErr::ConnectionAcquire(_) => {
            ShortenerError::backend_unavailable(format!("{}: {}", action, err))
        }
        other => ShortenerError::database_operation(format!("{}: {}", action, other)),
    }
}

/// SeaORM-based storage backend
#[derive(Clone)]
pub struct SeaOrmStorage {
    db: DatabaseConnection,
    backend_name: String,
}

impl SeaOrmStorage {
    pub async fn new(
        database_url: &str,
        backend_name: &str,
        config: &StorageConfig,
    ) -> Result<Self> {
        if database_url.is_empty() {
            return Err(ShortenerError::database_config("database_url is not set"));
        }

        let backend_name = normalize_backend_name(backend_name);
        let db = if backend_name == "sqlite" {
            connect_sqlite(database_url).await?
        } else {
            connect_generic(database_url, &backend_name, config).await?
        };

        Self::from_connection(db, &backend_name).await
    }

    /// Wrap an existing connection, running migrations first
    pub async fn from_connection(db: DatabaseConnection, backend_name: &str) -> Result<Self> {
        run_migrations(&db).await?;

        info!("{} storage initialized", backend_name.to_uppercase());
        Ok(SeaOrmStorage {
            db,
            backend_name: backend_name.to_string(),
        })
    }
}

#[async_trait]
impl StorageBackend for SeaOrmStorage {
    async fn create(&self, record: UrlRecord) -> Result<()> {
        self.insert_record(record).await
    }

    async fn create_batch(&self, records: Vec<UrlRecord>) -> Result<Vec<Option<String>>> {
        self.insert_batch(records).await
    }

    async fn get(&self, code: &str) -> Result<Option<UrlRecord>> {
        self.find_by_code(code).await
    }

    async fn list_by_owner(&self, owner: &str) -> Result<Vec<UrlRecord>> {
        self.find_by_owner(owner).await
    }

    async fn mark_deleted(&self, codes: &[String], owner: &str) -> Result<()> {
        self.soft_delete(codes, owner).await
    }

    async fn ping(&self) -> Result<()> {
        self.db
            .ping()
            .await
            .map_err(|e| ShortenerError::backend_unavailable(format!("ping failed: {}", e)))
    }

    async fn stats(&self) -> Result<Option<StorageStats>> {
        self.aggregate_stats().await.map(Some)
    }

    fn backend_name(&self) -> &str {
        &self.backend_name
    }

    async fn shutdown(&self) -> Result<()> {
        self.db
            .clone()
            .close()
            .await
            .map_err(|e| map_db_err("close connection", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_infer_backend_from_url() {
        assert_eq!(infer_backend_from_url("sqlite://urls.db").unwrap(), "sqlite");
        assert_eq!(infer_backend_from_url("urls.db").unwrap(), "sqlite");
        assert_eq!(infer_backend_from_url(":memory:").unwrap(), "sqlite");
        assert_eq!(
            infer_backend_from_url("postgres://u:p@localhost/db").unwrap(),
            "postgres"
        );
        assert_eq!(
            infer_backend_from_url("mariadb://u:p@localhost/db").unwrap(),
            "mysql"
        );
        assert!(infer_backend_from_url("redis://localhost").is_err());
    }

    #[test]
    fn test_sqlite_url_normalization() {
        assert_eq!(sqlite_url("sqlite://a.db?mode=rwc"), "sqlite://a.db?mode=rwc");
        assert_eq!(sqlite_url("a.db"), "sqlite://a.db");
        assert_eq!(sqlite_url(":memory:"), "sqlite::memory:");
    }

    #[test]
    fn test_map_db_err_classifies_connection_failures() {
        let err = map_db_err(
            "get",
            DbErr::Conn(sea_orm::RuntimeErr::Internal("refused".into())),
        );
        assert!(matches!(err, ShortenerError::BackendUnavailable(_)));

        let err = map_db_err("get", DbErr::RecordNotFound("x".into()));
        assert!(matches!(err, ShortenerError::DatabaseOperation(_)));
    }
}
