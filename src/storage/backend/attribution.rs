//! Fingerprint store for the attribution engine
//!
//! 候选查询与匹配提交都在这里落到数据库。

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::ActiveValue::Set;
use sea_orm::{
    ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, TransactionTrait,
    sea_query::Query,
};
use tracing::{debug, warn};

use super::converters::{install_to_active_model, model_to_click_event};
use super::{SeaOrmStorage, is_unique_violation};
use crate::errors::{ClickmatchError, Result};
use crate::matching::{AttributionLedger, CandidateSelector};
use crate::matching::selector::window_start;
use crate::storage::{ClickEvent, Install};

use migration::entities::{click_claim, click_event, install};

#[async_trait]
impl CandidateSelector for SeaOrmStorage {
    async fn select_candidates(
        &self,
        network_origin: &str,
        as_of: DateTime<Utc>,
        window: chrono::Duration,
    ) -> Result<Vec<ClickEvent>> {
        let start = window_start(network_origin, as_of, window)?;
        let origin = network_origin.trim();

        // 已被某个安装引用的 click_id
        let claimed = Query::select()
            .column(install::Column::ClickId)
            .from(install::Entity)
            .and_where(install::Column::ClickId.is_not_null())
            .to_owned();

        let models = click_event::Entity::find()
            .filter(click_event::Column::IpAddress.eq(origin))
            .filter(click_event::Column::Timestamp.gte(start))
            .filter(click_event::Column::Timestamp.lte(as_of))
            .filter(click_event::Column::ClickId.not_in_subquery(claimed))
            .order_by_desc(click_event::Column::Timestamp)
            .order_by_desc(click_event::Column::Id)
            .all(&self.db)
            .await
            .map_err(|e| {
                ClickmatchError::database_operation(format!("候选点击查询失败: {}", e))
            })?;

        debug!(
            "{} candidate click events for origin {} since {}",
            models.len(),
            origin,
            start
        );
        Ok(models.into_iter().map(model_to_click_event).collect())
    }
}

#[async_trait]
impl AttributionLedger for SeaOrmStorage {
    /// 先占 claim 行，再写安装记录，同一事务内完成
    ///
    /// claim 主键冲突或已有安装引用该 click_id 时返回 `Conflict`，事务回滚。
    async fn commit_match(&self, install: Install) -> Result<Install> {
        let token = install.click_token.clone().ok_or_else(|| {
            ClickmatchError::invalid_input("匹配提交缺少 click_id".to_string())
        })?;

        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| ClickmatchError::database_operation(format!("开始事务失败: {}", e)))?;

        let claim = click_claim::ActiveModel {
            click_id: Set(token.clone()),
            install_id: Set(install.install_id.clone()),
            claimed_at: Set(install.created_at),
        };

        if let Err(e) = click_claim::Entity::insert(claim)
            .exec_without_returning(&txn)
            .await
        {
            if is_unique_violation(&e) {
                warn!("Click {} already claimed by another install", token);
                return Err(ClickmatchError::conflict(format!(
                    "click_id 已被归因: {}",
                    token
                )));
            }
            return Err(ClickmatchError::database_operation(format!(
                "写入 claim 失败: {}",
                e
            )));
        }

        // 直接归因路径不写 claim，这里补查一次
        let existing = install::Entity::find()
            .filter(install::Column::ClickId.eq(&token))
            .count(&txn)
            .await?;
        if existing > 0 {
            warn!("Click {} already referenced by {} install(s)", token, existing);
            return Err(ClickmatchError::conflict(format!(
                "click_id 已被归因: {}",
                token
            )));
        }

        install::Entity::insert(install_to_active_model(&install))
            .exec_without_returning(&txn)
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    ClickmatchError::conflict(format!("install_id 已存在: {}", install.install_id))
                } else {
                    ClickmatchError::database_operation(format!("写入安装记录失败: {}", e))
                }
            })?;

        txn.commit()
            .await
            .map_err(|e| ClickmatchError::database_operation(format!("提交事务失败: {}", e)))?;

        Ok(install)
    }
}
