use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "clicks")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub click_id: String,
    pub campaign: Option<String>,
    pub source: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub play_store_url: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub app_store_url: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub web_url: Option<String>,
    pub total_clicks: i64,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
