use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // 创建 clicks 表
        manager
            .create_table(
                Table::create()
                    .table(Clicks::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Clicks::ClickId)
                            .string_len(64)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Clicks::Campaign).string_len(128).null())
                    .col(ColumnDef::new(Clicks::Source).string_len(128).null())
                    .col(ColumnDef::new(Clicks::PlayStoreUrl).text().null())
                    .col(ColumnDef::new(Clicks::AppStoreUrl).text().null())
                    .col(ColumnDef::new(Clicks::WebUrl).text().null())
                    .col(
                        ColumnDef::new(Clicks::TotalClicks)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Clicks::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        // 创建时间索引
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_clicks_created_at")
                    .table(Clicks::Table)
                    .col(Clicks::CreatedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(Index::drop().name("idx_clicks_created_at").to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Clicks::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Clicks {
    #[sea_orm(iden = "clicks")]
    Table,
    ClickId,
    Campaign,
    Source,
    PlayStoreUrl,
    AppStoreUrl,
    WebUrl,
    TotalClicks,
    CreatedAt,
}
