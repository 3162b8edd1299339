//! Write operations for SeaOrmStorage
//!
//! Link creation, click event recording and direct-path install writes.

use chrono::Utc;
use sea_orm::{
    ColumnTrait, DbErr, EntityTrait, ExprTrait, QueryFilter, TransactionTrait, sea_query::Expr,
};
use tracing::{debug, info, warn};

use super::converters::{
    install_to_active_model, new_click_to_active_model, new_event_to_active_model,
};
use super::{SeaOrmStorage, is_unique_violation, retry};
use crate::errors::{ClickmatchError, Result};
use crate::storage::{Click, ClickEvent, Install, NewClick, NewClickEvent};
use crate::utils::generate_random_code;

use migration::entities::{click, click_event, install};

impl SeaOrmStorage {
    /// 生成新链接
    ///
    /// token 随机生成，撞上已有主键就换一个；`max_attempts` 次都失败返回
    /// `TokenSpaceExhausted`，不会覆盖已有链接。
    pub async fn create_click(
        &self,
        link: &NewClick,
        token_length: usize,
        max_attempts: u32,
    ) -> Result<Click> {
        let now = Utc::now();

        for attempt in 1..=Ord::max(max_attempts, 1) {
            let token = generate_random_code(token_length);
            let model = new_click_to_active_model(&token, link, now);

            match click::Entity::insert(model)
                .exec_without_returning(&self.db)
                .await
            {
                Ok(_) => {
                    info!("Click link created: {} (attempt {})", token, attempt);
                    return self
                        .get_click(&token)
                        .await?
                        .ok_or_else(|| {
                            ClickmatchError::database_operation(format!(
                                "链接写入后无法读取: {}",
                                token
                            ))
                        });
                }
                Err(e) if is_unique_violation(&e) => {
                    debug!("Token collision on '{}', regenerating", token);
                }
                Err(e) => {
                    return Err(ClickmatchError::database_operation(format!(
                        "创建链接失败: {}",
                        e
                    )));
                }
            }
        }

        warn!(
            "Token space exhausted after {} attempts (length {})",
            max_attempts, token_length
        );
        Err(ClickmatchError::token_space_exhausted(format!(
            "{} 次尝试后仍无可用 token",
            max_attempts
        )))
    }

    /// 记录一次点击：事件写入与计数加一在同一事务内完成
    pub async fn record_click_event(&self, event: &NewClickEvent) -> Result<ClickEvent> {
        let db = &self.db;
        let timestamp = Utc::now();
        let token = event.click_token.clone();

        let result = retry::with_retry(
            &format!("record_click_event({})", token),
            self.retry_config,
            || async {
                let txn = db.begin().await?;

                let updated = click::Entity::update_many()
                    .col_expr(
                        click::Column::TotalClicks,
                        Expr::col(click::Column::TotalClicks).add(Expr::val(1i64)),
                    )
                    .filter(click::Column::ClickId.eq(&token))
                    .exec(&txn)
                    .await?;

                if updated.rows_affected == 0 {
                    return Err(DbErr::RecordNotFound(token.clone()));
                }

                let inserted = click_event::Entity::insert(new_event_to_active_model(
                    event, timestamp,
                ))
                .exec(&txn)
                .await?;

                txn.commit().await?;
                Ok(inserted.last_insert_id)
            },
        )
        .await;

        match result {
            Ok(id) => {
                debug!("Click event {} recorded for {}", id, token);
                Ok(ClickEvent {
                    id,
                    click_token: token,
                    timestamp,
                    platform: event.platform.clone(),
                    network_origin: event.network_origin.clone(),
                    user_agent: event.user_agent.clone(),
                    screen_width: event.screen_width,
                    screen_height: event.screen_height,
                    referrer: event.referrer.clone(),
                    fingerprint: event.fingerprint.clone(),
                })
            }
            Err(DbErr::RecordNotFound(_)) => Err(ClickmatchError::not_found(format!(
                "Invalid click_id: {}",
                token
            ))),
            Err(e) => Err(ClickmatchError::database_operation(format!(
                "记录点击失败: {}",
                e
            ))),
        }
    }

    /// 直接归因安装写入（客户端已携带 click_id，或完全无归因）
    pub async fn insert_install(&self, install: &Install) -> Result<Install> {
        let db = &self.db;
        let model = install_to_active_model(install);

        let result = retry::with_retry(
            &format!("insert_install({})", install.install_id),
            self.retry_config,
            || async {
                install::Entity::insert(model.clone())
                    .exec_without_returning(db)
                    .await
            },
        )
        .await;

        match result {
            Ok(_) => {
                info!(
                    "Install {} recorded (click: {})",
                    install.install_id,
                    install.click_token.as_deref().unwrap_or("-")
                );
                Ok(install.clone())
            }
            Err(e) if is_unique_violation(&e) => Err(ClickmatchError::conflict(format!(
                "install_id 已存在: {}",
                install.install_id
            ))),
            Err(e) => Err(ClickmatchError::database_operation(format!(
                "写入安装记录失败: {}",
                e
            ))),
        }
    }

    /// 为安装记录补充手机号
    pub async fn update_phone_number(&self, install_id: &str, phone_number: &str) -> Result<()> {
        let db = &self.db;
        let id_owned = install_id.to_string();
        let phone_owned = phone_number.to_string();

        let result = retry::with_retry(
            &format!("update_phone_number({})", install_id),
            self.retry_config,
            || async {
                install::Entity::update_many()
                    .col_expr(install::Column::PhoneNumber, Expr::val(phone_owned.clone()))
                    .filter(install::Column::InstallId.eq(&id_owned))
                    .exec(db)
                    .await
            },
        )
        .await?;

        if result.rows_affected == 0 {
            return Err(ClickmatchError::not_found(format!(
                "Invalid install_id: {}",
                install_id
            )));
        }

        info!("Phone number attached to install {}", install_id);
        Ok(())
    }
}
