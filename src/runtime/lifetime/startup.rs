use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::config::get_config;
use crate::matching::MatchPolicy;
use crate::services::{ClickService, InstallService};
use crate::storage::{SeaOrmStorage, StorageFactory};

#[derive(Clone)]
pub struct StartupContext {
    pub storage: Arc<SeaOrmStorage>,
    pub click_service: Arc<ClickService>,
    pub install_service: Arc<InstallService>,
}

impl StartupContext {
    /// 基于已有存储组装 service（集成测试也走这里）
    pub fn from_storage(storage: Arc<SeaOrmStorage>, policy: MatchPolicy) -> Self {
        Self {
            click_service: Arc::new(ClickService::new(storage.clone())),
            install_service: Arc::new(InstallService::new(storage.clone(), policy)),
            storage,
        }
    }
}

/// 准备服务器启动的上下文：存储、迁移、service
pub async fn prepare_server_startup() -> Result<StartupContext> {
    let start_time = std::time::Instant::now();
    debug!("Starting pre-startup processing...");

    let storage = StorageFactory::create()
        .await
        .context("Failed to create storage backend")?;
    info!(
        "Using storage backend: {}",
        storage.get_backend_config().storage_type
    );

    let config = get_config();
    let policy = MatchPolicy::from(&config.matching);
    info!(
        "Matching policy: window {} min, min score {}, tie-break {}",
        policy.window.num_minutes(),
        policy.effective_min_score(),
        policy.tie_break
    );

    let context = StartupContext::from_storage(storage, policy);
    debug!("Pre-startup completed in {:?}", start_time.elapsed());
    Ok(context)
}
