//! Query operations for SeaOrmStorage
//!
//! This module contains all read-only database operations.

use sea_orm::{
    ColumnTrait, EntityTrait, FromQueryResult, QueryFilter, QueryOrder, QuerySelect,
    sea_query::Expr,
};

use super::converters::model_to_record;
use super::{SeaOrmStorage, map_db_err};
use crate::errors::Result;
use crate::storage::{StorageStats, UrlRecord};

use migration::entities::url_record;

/// 统计查询结果（DSL 聚合查询）
#[derive(Debug, FromQueryResult)]
struct StatsResult {
    urls: i64,
    users: i64,
}

impl SeaOrmStorage {
    pub async fn find_by_code(&self, code: &str) -> Result<Option<UrlRecord>> {
        url_record::Entity::find_by_id(code.to_string())
            .one(&self.db)
            .await
            .map(|m| m.map(model_to_record))
            .map_err(|e| map_db_err("get", e))
    }

    pub async fn find_by_origin(&self, origin: &str) -> Result<Option<UrlRecord>> {
        url_record::Entity::find()
            .filter(url_record::Column::Origin.eq(origin))
            .one(&self.db)
            .await
            .map(|m| m.map(model_to_record))
            .map_err(|e| map_db_err("find by origin", e))
    }

    pub async fn find_by_owner(&self, owner: &str) -> Result<Vec<UrlRecord>> {
        let models = url_record::Entity::find()
            .filter(url_record::Column::Owner.eq(owner))
            .filter(url_record::Column::IsDeleted.eq(false))
            .order_by_asc(url_record::Column::CreatedAt)
            .order_by_asc(url_record::Column::ShortCode)
            .all(&self.db)
            .await
            .map_err(|e| map_db_err("list by owner", e))?;

        Ok(models.into_iter().map(model_to_record).collect())
    }

    /// 活跃记录数 + 活跃记录中非空 owner 的去重数
    pub async fn aggregate_stats(&self) -> Result<StorageStats> {
        let result = url_record::Entity::find()
            .select_only()
            .column_as(url_record::Column::ShortCode.count(), "urls")
            .column_as(
                Expr::cust("COUNT(DISTINCT CASE WHEN owner <> '' THEN owner END)"),
                "users",
            )
            .filter(url_record::Column::IsDeleted.eq(false))
            .into_model::<StatsResult>()
            .one(&self.db)
            .await
            .map_err(|e| map_db_err("stats", e))?;

        Ok(result
            .map(|s| StorageStats {
                urls: std::cmp::Ord::max(s.urls, 0) as u64,
                users: std::cmp::Ord::max(s.users, 0) as u64,
            })
            .unwrap_or_default())
    }
}
