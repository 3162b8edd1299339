use chrono::{DateTime, Utc};
use sea_orm::ActiveValue::{NotSet, Set};

use crate::matching::Fingerprint;
use crate::storage::{Click, ClickEvent, Install, NewClick, NewClickEvent};
use migration::entities::{click, click_event, install};

/// 将 click Model 转换为 Click
pub fn model_to_click(model: click::Model) -> Click {
    Click {
        token: model.click_id,
        campaign: model.campaign,
        source: model.source,
        play_store_url: model.play_store_url,
        app_store_url: model.app_store_url,
        web_url: model.web_url,
        total_clicks: model.total_clicks.max(0) as u64,
        created_at: model.created_at,
    }
}

pub(super) fn new_click_to_active_model(
    token: &str,
    link: &NewClick,
    created_at: DateTime<Utc>,
) -> click::ActiveModel {
    click::ActiveModel {
        click_id: Set(token.to_string()),
        campaign: Set(link.campaign.clone()),
        source: Set(link.source.clone()),
        play_store_url: Set(link.play_store_url.clone()),
        app_store_url: Set(link.app_store_url.clone()),
        web_url: Set(link.web_url.clone()),
        total_clicks: Set(0),
        created_at: Set(created_at),
    }
}

pub fn model_to_click_event(model: click_event::Model) -> ClickEvent {
    ClickEvent {
        id: model.id,
        click_token: model.click_id,
        timestamp: model.timestamp,
        platform: model.platform,
        network_origin: model.ip_address,
        user_agent: model.user_agent,
        screen_width: model.screen_width,
        screen_height: model.screen_height,
        referrer: model.referrer,
        fingerprint: Fingerprint {
            os_version: model.os_version,
            language: model.language,
            timezone: model.timezone,
            device_model: model.device_model,
        },
    }
}

pub(super) fn new_event_to_active_model(
    event: &NewClickEvent,
    timestamp: DateTime<Utc>,
) -> click_event::ActiveModel {
    click_event::ActiveModel {
        id: NotSet,
        click_id: Set(event.click_token.clone()),
        timestamp: Set(timestamp),
        platform: Set(event.platform.clone()),
        ip_address: Set(event.network_origin.clone()),
        user_agent: Set(event.user_agent.clone()),
        language: Set(event.fingerprint.language.clone()),
        screen_width: Set(event.screen_width),
        screen_height: Set(event.screen_height),
        device_model: Set(event.fingerprint.device_model.clone()),
        os_version: Set(event.fingerprint.os_version.clone()),
        timezone: Set(event.fingerprint.timezone.clone()),
        referrer: Set(event.referrer.clone()),
    }
}

pub fn model_to_install(model: install::Model) -> Install {
    Install {
        install_id: model.install_id,
        click_token: model.click_id,
        platform: model.platform,
        network_origin: model.ip_address,
        advertising_id: model.advertising_id,
        phone_number: model.phone_number,
        push_token: model.push_token,
        created_at: model.created_at,
        fingerprint: Fingerprint {
            os_version: model.os_version,
            language: model.language,
            timezone: model.timezone,
            device_model: model.device_model,
        },
    }
}

/// 将 Install 转换为 ActiveModel（仅用于插入）
pub fn install_to_active_model(install: &Install) -> install::ActiveModel {
    install::ActiveModel {
        id: NotSet,
        install_id: Set(install.install_id.clone()),
        click_id: Set(install.click_token.clone()),
        platform: Set(install.platform.clone()),
        device_model: Set(install.fingerprint.device_model.clone()),
        os_version: Set(install.fingerprint.os_version.clone()),
        language: Set(install.fingerprint.language.clone()),
        timezone: Set(install.fingerprint.timezone.clone()),
        ip_address: Set(install.network_origin.clone()),
        advertising_id: Set(install.advertising_id.clone()),
        phone_number: Set(install.phone_number.clone()),
        push_token: Set(install.push_token.clone()),
        created_at: Set(install.created_at),
    }
}
