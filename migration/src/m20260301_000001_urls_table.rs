use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // 创建 urls 表
        manager
            .create_table(
                Table::create()
                    .table(Urls::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Urls::ShortCode)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Urls::Origin).text().not_null())
                    .col(
                        ColumnDef::new(Urls::Owner)
                            .string_len(64)
                            .not_null()
                            .default(""),
                    )
                    .col(
                        ColumnDef::new(Urls::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Urls::IsDeleted)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .to_owned(),
            )
            .await?;

        // origin 唯一索引（ON CONFLICT 依赖它）
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_urls_origin")
                    .table(Urls::Table)
                    .col(Urls::Origin)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // owner 索引，用于按用户列出
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_urls_owner")
                    .table(Urls::Table)
                    .col(Urls::Owner)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(Index::drop().name("idx_urls_owner").to_owned())
            .await?;

        manager
            .drop_index(Index::drop().name("idx_urls_origin").to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Urls::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Urls {
    Table,
    ShortCode,
    Origin,
    Owner,
    CreatedAt,
    IsDeleted,
}
