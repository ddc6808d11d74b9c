use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::{debug, info};

use crate::config::StaticConfig;
use crate::identity::IdentityService;
use crate::services::{DeletionQueue, ShortenerService};
use crate::storage::{StorageBackend, StorageFactory};

pub struct StartupContext {
    pub shortener: Arc<ShortenerService>,
    pub identity: Arc<IdentityService>,
}

impl StartupContext {
    /// Wire services around an already-built backend
    ///
    /// Spawns the deletion worker, so it must run inside a Tokio runtime.
    pub fn from_storage(storage: Arc<dyn StorageBackend>, config: &StaticConfig) -> Result<Self> {
        let deletions = DeletionQueue::spawn(storage.clone(), &config.deletion);
        let shortener = Arc::new(ShortenerService::new(
            storage,
            deletions,
            config.server.base_url.clone(),
        ));

        let identity = IdentityService::new(config.auth.secret_key.as_bytes())
            .context("Failed to initialize identity service")?
            .with_secure_cookies(config.auth.cookie_secure);

        Ok(Self {
            shortener,
            identity: Arc::new(identity),
        })
    }
}

/// 准备服务器启动的上下文：存储后端、业务服务、身份服务
pub async fn prepare_server_startup(config: &StaticConfig) -> Result<StartupContext> {
    let start_time = std::time::Instant::now();
    debug!("Starting pre-startup processing...");

    let storage = StorageFactory::create(config)
        .await
        .context("Failed to create storage backend")?;

    let context = StartupContext::from_storage(storage, config)?;

    info!(
        "Pre-startup completed in {} ms (backend: {}, base URL: {})",
        start_time.elapsed().as_millis(),
        context.shortener.backend_name(),
        context.shortener.base_url()
    );
    Ok(context)
}
