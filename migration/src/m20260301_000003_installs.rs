use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Installs::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Installs::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Installs::InstallId)
                            .string_len(64)
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Installs::ClickId).string_len(64).null())
                    .col(ColumnDef::new(Installs::Platform).string_len(32).null())
                    .col(ColumnDef::new(Installs::DeviceModel).string_len(128).null())
                    .col(ColumnDef::new(Installs::OsVersion).string_len(64).null())
                    .col(ColumnDef::new(Installs::Language).string_len(64).null())
                    .col(ColumnDef::new(Installs::Timezone).string_len(64).null())
                    .col(ColumnDef::new(Installs::IpAddress).string_len(45).null())
                    .col(
                        ColumnDef::new(Installs::AdvertisingId)
                            .string_len(64)
                            .null(),
                    )
                    .col(ColumnDef::new(Installs::PhoneNumber).string_len(32).null())
                    .col(ColumnDef::new(Installs::PushToken).text().null())
                    .col(
                        ColumnDef::new(Installs::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        // 反连接 (anti-join) 依赖 click_id 索引
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_installs_click_id")
                    .table(Installs::Table)
                    .col(Installs::ClickId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_installs_advertising_id")
                    .table(Installs::Table)
                    .col(Installs::AdvertisingId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_installs_phone_number")
                    .table(Installs::Table)
                    .col(Installs::PhoneNumber)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        for name in [
            "idx_installs_phone_number",
            "idx_installs_advertising_id",
            "idx_installs_click_id",
        ] {
            manager
                .drop_index(Index::drop().name(name).to_owned())
                .await?;
        }

        manager
            .drop_table(Table::drop().table(Installs::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Installs {
    #[sea_orm(iden = "installs")]
    Table,
    Id,
    InstallId,
    ClickId,
    Platform,
    DeviceModel,
    OsVersion,
    Language,
    Timezone,
    IpAddress,
    AdvertisingId,
    PhoneNumber,
    PushToken,
    CreatedAt,
}
