use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::matching::Fingerprint;

/// A campaign link
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Click {
    pub token: String,
    pub campaign: Option<String>,
    pub source: Option<String>,
    pub play_store_url: Option<String>,
    pub app_store_url: Option<String>,
    pub web_url: Option<String>,
    #[serde(default)]
    pub total_clicks: u64,
    pub created_at: DateTime<Utc>,
}

/// Fields supplied when generating a new link; the token is assigned by storage
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewClick {
    pub campaign: Option<String>,
    pub source: Option<String>,
    pub play_store_url: Option<String>,
    pub app_store_url: Option<String>,
    pub web_url: Option<String>,
}

/// One observed redirect / landing interaction
#[derive(Debug, Clone, Serialize)]
pub struct ClickEvent {
    pub id: i64,
    pub click_token: String,
    pub timestamp: DateTime<Utc>,
    pub platform: Option<String>,
    pub network_origin: Option<String>,
    pub user_agent: Option<String>,
    pub screen_width: Option<i32>,
    pub screen_height: Option<i32>,
    pub referrer: Option<String>,
    pub fingerprint: Fingerprint,
}

/// Click event before it is written (id and timestamp come from storage)
#[derive(Debug, Clone, Default)]
pub struct NewClickEvent {
    pub click_token: String,
    pub platform: Option<String>,
    pub network_origin: Option<String>,
    pub user_agent: Option<String>,
    pub screen_width: Option<i32>,
    pub screen_height: Option<i32>,
    pub referrer: Option<String>,
    pub fingerprint: Fingerprint,
}

/// One reported application install
#[derive(Debug, Clone, Serialize)]
pub struct Install {
    pub install_id: String,
    pub click_token: Option<String>,
    pub platform: Option<String>,
    pub network_origin: Option<String>,
    pub advertising_id: Option<String>,
    pub phone_number: Option<String>,
    pub push_token: Option<String>,
    pub created_at: DateTime<Utc>,
    pub fingerprint: Fingerprint,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct StorageConfig {
    pub storage_type: String,
}
