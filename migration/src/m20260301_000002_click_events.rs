//! 点击事件表迁移
//!
//! 创建 click_events 表，保存每次跳转 / 落地页采集到的指纹：
//! - 网络来源 (ip_address)
//! - 语言、时区、设备型号、系统版本
//! - 屏幕尺寸、UA、referrer

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ClickEvents::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ClickEvents::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(ClickEvents::ClickId)
                            .string_len(64)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ClickEvents::Timestamp)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(ClickEvents::Platform).string_len(32).null())
                    .col(ColumnDef::new(ClickEvents::IpAddress).string_len(45).null())
                    .col(ColumnDef::new(ClickEvents::UserAgent).text().null())
                    .col(ColumnDef::new(ClickEvents::Language).string_len(64).null())
                    .col(ColumnDef::new(ClickEvents::ScreenWidth).integer().null())
                    .col(ColumnDef::new(ClickEvents::ScreenHeight).integer().null())
                    .col(
                        ColumnDef::new(ClickEvents::DeviceModel)
                            .string_len(128)
                            .null(),
                    )
                    .col(ColumnDef::new(ClickEvents::OsVersion).string_len(64).null())
                    .col(ColumnDef::new(ClickEvents::Timezone).string_len(64).null())
                    .col(ColumnDef::new(ClickEvents::Referrer).text().null())
                    .to_owned(),
            )
            .await?;

        // 候选查询：同一来源 + 时间窗口
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_click_events_ip_time")
                    .table(ClickEvents::Table)
                    .col(ClickEvents::IpAddress)
                    .col(ClickEvents::Timestamp)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_click_events_click_id")
                    .table(ClickEvents::Table)
                    .col(ClickEvents::ClickId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(Index::drop().name("idx_click_events_click_id").to_owned())
            .await?;

        manager
            .drop_index(Index::drop().name("idx_click_events_ip_time").to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(ClickEvents::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum ClickEvents {
    #[sea_orm(iden = "click_events")]
    Table,
    Id,
    ClickId,
    Timestamp,
    Platform,
    IpAddress,
    UserAgent,
    Language,
    ScreenWidth,
    ScreenHeight,
    DeviceModel,
    OsVersion,
    Timezone,
    Referrer,
}
