use crate::storage::UrlRecord;
use migration::entities::url_record;

/// 将 Sea-ORM Model 转换为 UrlRecord
pub fn model_to_record(model: url_record::Model) -> UrlRecord {
    UrlRecord {
        code: model.short_code,
        origin: model.origin,
        owner: model.owner,
        created_at: model.created_at,
        deleted: model.is_deleted,
    }
}

/// 将 UrlRecord 转换为 ActiveModel（仅用于插入）
pub fn record_to_active_model(record: &UrlRecord) -> url_record::ActiveModel {
    use sea_orm::ActiveValue::Set;

    url_record::ActiveModel {
        short_code: Set(record.code.clone()),
        origin: Set(record.origin.clone()),
        owner: Set(record.owner.clone()),
        created_at: Set(record.created_at),
        is_deleted: Set(record.deleted),
    }
}
