//! Query operations for SeaOrmStorage
//!
//! This module contains the read-only lookups used by the HTTP services.

use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder};
use tracing::error;

use super::{SeaOrmStorage, retry};
use crate::errors::{ClickmatchError, Result};
use crate::storage::{Click, ClickEvent, Install};

use migration::entities::{click, click_event, install};

use super::converters::{model_to_click, model_to_click_event, model_to_install};

impl SeaOrmStorage {
    /// 按 token 查询链接
    pub async fn get_click(&self, token: &str) -> Result<Option<Click>> {
        let db = &self.db;
        let token_owned = token.to_string();

        let result = retry::with_retry(&format!("get_click({})", token), self.retry_config, || async {
            click::Entity::find_by_id(&token_owned).one(db).await
        })
        .await;

        match result {
            Ok(model) => Ok(model.map(model_to_click)),
            Err(e) => {
                error!("查询链接失败（重试后仍失败）: {}", e);
                Err(ClickmatchError::database_operation(format!(
                    "查询链接失败: {}",
                    e
                )))
            }
        }
    }

    pub async fn get_install(&self, install_id: &str) -> Result<Option<Install>> {
        let db = &self.db;
        let id_owned = install_id.to_string();

        let model = retry::with_retry(
            &format!("get_install({})", install_id),
            self.retry_config,
            || async {
                install::Entity::find()
                    .filter(install::Column::InstallId.eq(&id_owned))
                    .one(db)
                    .await
            },
        )
        .await?;

        Ok(model.map(model_to_install))
    }

    /// 某个链接下的全部点击事件（新的在前）
    pub async fn list_click_events(&self, token: &str) -> Result<Vec<ClickEvent>> {
        let models = click_event::Entity::find()
            .filter(click_event::Column::ClickId.eq(token))
            .order_by_desc(click_event::Column::Timestamp)
            .order_by_desc(click_event::Column::Id)
            .all(&self.db)
            .await?;

        Ok(models.into_iter().map(model_to_click_event).collect())
    }

    /// 健康检查：数据库连通性
    pub async fn ping(&self) -> Result<()> {
        self.db.ping().await.map_err(|e| {
            ClickmatchError::database_connection(format!("数据库不可用: {}", e))
        })
    }
}
