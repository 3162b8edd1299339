//! 点击认领表迁移
//!
//! click_claims.click_id 为主键：同一个 click_id 只能被一次指纹匹配认领。
//! 直接携带 click_id 的安装上报不写此表。

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ClickClaims::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ClickClaims::ClickId)
                            .string_len(64)
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(ClickClaims::InstallId)
                            .string_len(64)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ClickClaims::ClaimedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ClickClaims::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum ClickClaims {
    #[sea_orm(iden = "click_claims")]
    Table,
    ClickId,
    InstallId,
    ClaimedAt,
}
