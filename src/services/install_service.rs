//! Install reporting and attribution
//!
//! 直接归因（客户端带 click_id）不经过评分；指纹匹配交给 `AttributionEngine`。

use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::errors::{ClickmatchError, Result};
use crate::matching::{
    AttributionEngine, Fingerprint, InstallReport, MatchOutcome, MatchPolicy, NoMatchReason,
};
use crate::storage::{Click, Install, SeaOrmStorage};

/// Body of `/api/install` and `/api/match_install`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct InstallRequest {
    /// 仅直接归因路径使用（Android install referrer）
    pub click_id: Option<String>,
    pub platform: Option<String>,
    pub device_model: Option<String>,
    pub os_version: Option<String>,
    pub language: Option<String>,
    pub timezone: Option<String>,
    pub advertising_id: Option<String>,
    pub push_token: Option<String>,
}

impl InstallRequest {
    fn fingerprint(&self) -> Fingerprint {
        Fingerprint {
            os_version: self.os_version.clone(),
            language: self.language.clone(),
            timezone: self.timezone.clone(),
            device_model: self.device_model.clone(),
        }
    }

    fn direct_token(&self) -> Option<&str> {
        self.click_id
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
    }

    pub fn into_report(self, network_origin: Option<String>) -> InstallReport {
        InstallReport {
            fingerprint: self.fingerprint(),
            network_origin,
            platform: self.platform,
            advertising_id: self.advertising_id,
            push_token: self.push_token,
        }
    }
}

/// Campaign data handed to the app after attribution
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DeeplinkPayload {
    pub campaign: Option<String>,
    pub source: Option<String>,
}

/// Result of the fingerprint matching path
#[derive(Debug, Clone)]
pub enum MatchResult {
    Matched {
        install_id: String,
        matched_click_id: String,
        match_score: u8,
        deeplink_payload: DeeplinkPayload,
    },
    NoMatch(NoMatchReason),
}

pub struct InstallService {
    storage: Arc<SeaOrmStorage>,
    engine: AttributionEngine,
}

impl InstallService {
    pub fn new(storage: Arc<SeaOrmStorage>, policy: MatchPolicy) -> Self {
        let engine = AttributionEngine::new(storage.clone(), policy);
        Self { storage, engine }
    }

    /// 上报安装
    ///
    /// 携带 click_id 时直接记为该点击的归因（点击必须存在），否则只记录安装。
    pub async fn report_install(
        &self,
        request: InstallRequest,
        network_origin: Option<String>,
    ) -> Result<Install> {
        let click_token = match request.direct_token() {
            Some(token) => {
                let click = self.storage.get_click(token).await?.ok_or_else(|| {
                    ClickmatchError::not_found(format!("Invalid click_id: {}", token))
                })?;
                Some(click.token)
            }
            None => None,
        };

        let install = Install {
            install_id: Uuid::new_v4().to_string(),
            click_token,
            platform: request.platform.clone(),
            network_origin,
            advertising_id: request.advertising_id.clone(),
            phone_number: None,
            push_token: request.push_token.clone(),
            created_at: Utc::now(),
            fingerprint: request.fingerprint(),
        };

        self.storage.insert_install(&install).await
    }

    /// 指纹匹配
    pub async fn match_install(
        &self,
        request: InstallRequest,
        network_origin: Option<String>,
    ) -> Result<MatchResult> {
        if request.direct_token().is_some() {
            debug!("match_install ignores the click_id field; use /api/install for direct attribution");
        }

        let report = request.into_report(network_origin);
        match self.engine.attribute(&report).await? {
            MatchOutcome::Matched(attribution) => {
                // 归因已提交，payload 查询失败不能再把结果变成错误
                let deeplink_payload = payload_or_default(
                    &attribution.click_token,
                    self.storage.get_click(&attribution.click_token).await,
                );
                Ok(MatchResult::Matched {
                    install_id: attribution.install_id,
                    matched_click_id: attribution.click_token,
                    match_score: attribution.score,
                    deeplink_payload,
                })
            }
            MatchOutcome::NoMatch(reason) => Ok(MatchResult::NoMatch(reason)),
        }
    }

    /// 登录 / 注册后补充手机号
    pub async fn update_user(
        &self,
        install_id: Option<&str>,
        phone_number: Option<&str>,
    ) -> Result<()> {
        let install_id = install_id.map(str::trim).filter(|s| !s.is_empty());
        let phone_number = phone_number.map(str::trim).filter(|s| !s.is_empty());

        let (Some(install_id), Some(phone_number)) = (install_id, phone_number) else {
            return Err(ClickmatchError::invalid_input(
                "install_id and phone_number are required",
            ));
        };

        self.storage
            .update_phone_number(install_id, phone_number)
            .await?;
        info!("User data updated for install {}", install_id);
        Ok(())
    }

    /// 安装对应的活动数据；未归因的安装返回空 payload
    pub async fn deeplink(&self, install_id: Option<&str>) -> Result<DeeplinkPayload> {
        let install_id = install_id
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| ClickmatchError::invalid_input("install_id is required"))?;

        let install = self
            .storage
            .get_install(install_id)
            .await?
            .ok_or_else(|| ClickmatchError::not_found("Invalid install_id"))?;

        match install.click_token {
            Some(token) => self.payload_for_click(&token).await,
            None => Ok(DeeplinkPayload::default()),
        }
    }

    async fn payload_for_click(&self, token: &str) -> Result<DeeplinkPayload> {
        Ok(self
            .storage
            .get_click(token)
            .await?
            .map(DeeplinkPayload::from)
            .unwrap_or_default())
    }
}

impl From<Click> for DeeplinkPayload {
    fn from(click: Click) -> Self {
        Self {
            campaign: click.campaign,
            source: click.source,
        }
    }
}

fn payload_or_default(token: &str, lookup: Result<Option<Click>>) -> DeeplinkPayload {
    match lookup {
        Ok(click) => click.map(DeeplinkPayload::from).unwrap_or_default(),
        Err(e) => {
            warn!("Deeplink payload lookup for matched click {} failed: {}", token, e);
            DeeplinkPayload::default()
        }
    }
}
