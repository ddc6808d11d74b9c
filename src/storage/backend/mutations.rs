//! Mutation operations for SeaOrmStorage
//!
//! This module contains all write database operations.

use sea_orm::{
    ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, SqlErr, TransactionTrait,
    sea_query::{Expr, OnConflict},
};
use tracing::{debug, error, info};

use super::converters::record_to_active_model;
use super::{SeaOrmStorage, map_db_err};
use crate::errors::{Result, ShortenerError};
use crate::storage::UrlRecord;

use migration::entities::url_record;

/// INSERT ... ON CONFLICT (origin) DO NOTHING，返回影响行数
async fn insert_ignoring_origin<C: ConnectionTrait>(
    conn: &C,
    record: &UrlRecord,
) -> std::result::Result<u64, DbErr> {
    url_record::Entity::insert(record_to_active_model(record))
        .on_conflict(
            OnConflict::column(url_record::Column::Origin)
                .do_nothing()
                .to_owned(),
        )
        .exec_without_returning(conn)
        .await
}

/// 在同一连接/事务内按 origin 查已存储的 code
async fn stored_code_for_origin<C: ConnectionTrait>(
    conn: &C,
    origin: &str,
) -> std::result::Result<Option<String>, DbErr> {
    url_record::Entity::find()
        .filter(url_record::Column::Origin.eq(origin))
        .one(conn)
        .await
        .map(|m| m.map(|m| m.short_code))
}

impl SeaOrmStorage {
    pub async fn insert_record(&self, record: UrlRecord) -> Result<()> {
        match insert_ignoring_origin(&self.db, &record).await {
            Ok(0) => Err(self.resolve_insert_conflict(&record).await),
            Ok(_) => {
                debug!("Stored {} -> {}", record.code, record.origin);
                Ok(())
            }
            Err(e) if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
                Err(self.resolve_insert_conflict(&record).await)
            }
            Err(e @ (DbErr::Conn(_) | DbErr::ConnectionAcquire(_))) => {
                Err(map_db_err("insert", e))
            }
            // some drivers report key violations without a classifiable code
            Err(e) => match self.resolve_insert_conflict(&record).await {
                ShortenerError::DatabaseOperation(_) => Err(map_db_err("insert", e)),
                resolved => Err(resolved),
            },
        }
    }

    /// 插入未生效时查出原因：origin 已存在 → Conflict；code 被占用 → CodeCollision
    async fn resolve_insert_conflict(&self, record: &UrlRecord) -> ShortenerError {
        match self.find_by_origin(&record.origin).await {
            Ok(Some(existing)) => return ShortenerError::conflict(existing.code),
            Ok(None) => {}
            Err(e) => return e,
        }

        match self.find_by_code(&record.code).await {
            Ok(Some(existing)) => {
                let err = ShortenerError::code_collision(format!(
                    "code '{}' already maps to '{}', refusing '{}'",
                    record.code, existing.origin, record.origin
                ));
                error!("{}", err);
                err
            }
            Ok(None) => ShortenerError::database_operation(format!(
                "insert of '{}' was not applied and no conflicting row exists",
                record.code
            )),
            Err(e) => e,
        }
    }

    /// 批量插入（单事务，任意一条失败整体回滚；重复 origin 返回已有 code）
    pub async fn insert_batch(&self, records: Vec<UrlRecord>) -> Result<Vec<Option<String>>> {
        if records.is_empty() {
            return Ok(Vec::new());
        }

        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| map_db_err("begin transaction", e))?;

        let mut inserted = 0usize;
        let mut codes = Vec::with_capacity(records.len());
        for record in &records {
            let result = match insert_ignoring_origin(&txn, record).await {
                Ok(0) => stored_code_for_origin(&txn, &record.origin)
                    .await
                    .map(|existing| {
                        debug!("Batch item '{}' already stored", record.origin);
                        existing
                    }),
                Ok(_) => {
                    inserted += 1;
                    Ok(Some(record.code.clone()))
                }
                Err(e) => Err(e),
            };

            match result {
                Ok(code) => codes.push(code),
                Err(e) => {
                    error!(
                        "Batch insert of '{}' failed, rolling back {} items: {}",
                        record.code,
                        records.len(),
                        e
                    );
                    if let Err(rollback_err) = txn.rollback().await {
                        error!("Rollback failed: {}", rollback_err);
                    }
                    let err = match e.sql_err() {
                        Some(SqlErr::UniqueConstraintViolation(msg)) => {
                            ShortenerError::code_collision(format!(
                                "code '{}' already taken: {}",
                                record.code, msg
                            ))
                        }
                        _ => map_db_err("batch insert", e),
                    };
                    return Err(err);
                }
            }
        }

        txn.commit()
            .await
            .map_err(|e| map_db_err("commit transaction", e))?;

        info!("Batch inserted {} of {} urls", inserted, records.len());
        Ok(codes)
    }

    /// 软删除：只影响属于 owner 的记录
    pub async fn soft_delete(&self, codes: &[String], owner: &str) -> Result<()> {
        if codes.is_empty() {
            return Ok(());
        }

        let result = url_record::Entity::update_many()
            .col_expr(url_record::Column::IsDeleted, Expr::value(true))
            .filter(url_record::Column::ShortCode.is_in(codes.iter().cloned()))
            .filter(url_record::Column::Owner.eq(owner))
            .filter(url_record::Column::IsDeleted.eq(false))
            .exec(&self.db)
            .await
            .map_err(|e| map_db_err("soft delete", e))?;

        debug!(
            "Soft-deleted {} of {} codes",
            result.rows_affected,
            codes.len()
        );
        Ok(())
    }
}
