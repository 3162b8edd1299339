//! Link generation and click recording
//!
//! HTTP handlers 只负责解析请求，业务逻辑都在这里。

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::get_config;
use crate::errors::{ClickmatchError, Result};
use crate::matching::Fingerprint;
use crate::storage::{Click, ClickEvent, NewClick, NewClickEvent, SeaOrmStorage};
use crate::utils::is_valid_click_token;
use crate::utils::user_agent::{Platform, detect_platform, parse_device_model, parse_os_version};

/// `POST /generate_link` response
#[derive(Debug, Clone, Serialize)]
pub struct GeneratedLink {
    pub link: String,
    pub click_id: String,
}

/// Landing page data posted back by the browser
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CollectRequest {
    pub platform: Option<String>,
    pub user_agent: Option<String>,
    pub language: Option<String>,
    pub timezone: Option<String>,
    pub screen_width: Option<i32>,
    pub screen_height: Option<i32>,
    pub device_model: Option<String>,
    pub os_version: Option<String>,
    pub referrer: Option<String>,
}

/// What the redirect endpoint should do for a visitor
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RedirectDecision {
    /// 302 到应用商店（点击已在服务端记录）
    Store { location: String },
    /// 渲染落地页，由浏览器回传指纹后再跳转
    Landing {
        platform: Platform,
        target: Option<String>,
    },
}

/// 给商店链接追加 install referrer
pub fn store_url_with_referrer(store_url: &str, token: &str) -> String {
    let separator = if store_url.contains('?') { '&' } else { '?' };
    let referrer = urlencoding::encode(&format!("click_id={}", token)).into_owned();
    format!("{}{}referrer={}", store_url, separator, referrer)
}

pub struct ClickService {
    storage: Arc<SeaOrmStorage>,
}

impl ClickService {
    pub fn new(storage: Arc<SeaOrmStorage>) -> Self {
        Self { storage }
    }

    /// 生成新链接；`request_base` 在未配置 `server.public_url` 时使用
    pub async fn generate_link(&self, link: NewClick, request_base: &str) -> Result<GeneratedLink> {
        let config = get_config();
        let click = self
            .storage
            .create_click(
                &link,
                config.links.token_length,
                config.links.max_token_attempts,
            )
            .await?;

        let base = config
            .server
            .public_url
            .as_deref()
            .filter(|u| !u.trim().is_empty())
            .unwrap_or(request_base);

        Ok(GeneratedLink {
            link: format!("{}/{}", base.trim_end_matches('/'), click.token),
            click_id: click.token,
        })
    }

    async fn require_click(&self, token: &str) -> Result<Click> {
        if !is_valid_click_token(token) {
            return Err(ClickmatchError::not_found(format!(
                "Invalid click_id: {}",
                token
            )));
        }
        self.storage
            .get_click(token)
            .await?
            .ok_or_else(|| ClickmatchError::not_found(format!("Invalid click_id: {}", token)))
    }

    /// 按 UA 分流
    ///
    /// Android 在服务端记录点击后直接跳商店，保住 install referrer；
    /// iOS 和其它平台走落地页采集指纹。
    pub async fn resolve_redirect(
        &self,
        token: &str,
        user_agent: Option<&str>,
        network_origin: Option<String>,
    ) -> Result<RedirectDecision> {
        let click = self.require_click(token).await?;
        let decision = decide_redirect(&click, detect_platform(user_agent));

        if let RedirectDecision::Store { .. } = decision {
            let ua = user_agent.unwrap_or_default();
            let event = NewClickEvent {
                click_token: click.token.clone(),
                platform: Some(Platform::Android.as_ref().to_string()),
                network_origin,
                user_agent: Some(ua.to_string()),
                fingerprint: Fingerprint {
                    os_version: parse_os_version(ua),
                    device_model: parse_device_model(ua),
                    ..Default::default()
                },
                ..Default::default()
            };
            self.storage.record_click_event(&event).await?;
            info!("Android click {} redirected to store", click.token);
        }

        Ok(decision)
    }

    /// 与 `resolve_redirect` 相同的分流结果，但不记录点击也不计数（HEAD 请求用）
    pub async fn peek_redirect(
        &self,
        token: &str,
        user_agent: Option<&str>,
    ) -> Result<RedirectDecision> {
        let click = self.require_click(token).await?;
        Ok(decide_redirect(&click, detect_platform(user_agent)))
    }

    /// 落地页回传的点击数据
    ///
    /// 客户端没给 OS 版本或机型时从 UA 补齐。
    pub async fn collect(
        &self,
        token: &str,
        data: CollectRequest,
        network_origin: Option<String>,
        request_user_agent: Option<&str>,
    ) -> Result<ClickEvent> {
        let click = self.require_click(token).await?;

        let user_agent = data
            .user_agent
            .or_else(|| request_user_agent.map(str::to_string));
        let ua = user_agent.as_deref().unwrap_or_default();
        let platform = data
            .platform
            .filter(|p| !p.trim().is_empty())
            .or_else(|| Some(detect_platform(user_agent.as_deref()).as_ref().to_string()));

        let event = NewClickEvent {
            click_token: click.token,
            platform,
            network_origin,
            screen_width: data.screen_width,
            screen_height: data.screen_height,
            referrer: data.referrer,
            fingerprint: Fingerprint {
                os_version: data.os_version.or_else(|| parse_os_version(ua)),
                language: data.language,
                timezone: data.timezone,
                device_model: data.device_model.or_else(|| parse_device_model(ua)),
            },
            user_agent,
        };

        self.storage.record_click_event(&event).await
    }
}

fn decide_redirect(click: &Click, platform: Platform) -> RedirectDecision {
    match platform {
        Platform::Android => match click.play_store_url.as_deref().filter(|u| !u.is_empty()) {
            Some(store_url) => RedirectDecision::Store {
                location: store_url_with_referrer(store_url, &click.token),
            },
            None => {
                debug!("Click {} has no play_store_url, using landing page", click.token);
                RedirectDecision::Landing {
                    platform,
                    target: click.web_url.clone(),
                }
            }
        },
        Platform::Ios => RedirectDecision::Landing {
            platform,
            target: click.app_store_url.clone(),
        },
        Platform::Web => RedirectDecision::Landing {
            platform,
            target: click.web_url.clone(),
        },
    }
}
