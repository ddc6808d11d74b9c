use actix_web::dev::ServerHandle;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tokio::time::timeout;
use tracing::{error, info, warn};

use crate::services::ShortenerService;

/// 关闭超时时间（秒）
pub const SHUTDOWN_TIMEOUT_SECS: u64 = 30;

/// 单个任务超时时间（秒）
const TASK_TIMEOUT_SECS: u64 = 10;

/// Resolve once Ctrl+C is received
pub async fn wait_for_signal() {
    match signal::ctrl_c().await {
        Ok(()) => {
            info!("Shutdown signal received, stopping server...");
        }
        Err(e) => {
            warn!(
                "Failed to listen for Ctrl+C: {}. Proceeding with shutdown anyway.",
                e
            );
        }
    }
}

/// Stop accepting requests, then run the shutdown tasks, all within
/// [`SHUTDOWN_TIMEOUT_SECS`]
pub async fn graceful_shutdown(handle: ServerHandle, service: Arc<ShortenerService>) {
    let result = timeout(Duration::from_secs(SHUTDOWN_TIMEOUT_SECS), async {
        match timeout(Duration::from_secs(TASK_TIMEOUT_SECS), handle.stop(true)).await {
            Ok(()) => info!("HTTP server stopped"),
            Err(_) => warn!(
                "HTTP server did not stop within {} seconds",
                TASK_TIMEOUT_SECS
            ),
        }
        perform_shutdown_tasks(&service).await;
    })
    .await;

    match result {
        Ok(()) => {
            info!("All shutdown tasks completed successfully");
        }
        Err(_) => {
            error!(
                "Shutdown tasks timed out after {} seconds! Forcing exit.",
                SHUTDOWN_TIMEOUT_SECS
            );
            std::process::exit(1);
        }
    }
}

/// 排空删除队列，然后让存储后端收尾（文件后端在此压缩 journal）
pub async fn perform_shutdown_tasks(service: &ShortenerService) {
    let drain_limit = Duration::from_secs(SHUTDOWN_TIMEOUT_SECS - TASK_TIMEOUT_SECS);
    match service.shutdown(drain_limit).await {
        Ok(()) => {
            info!("Storage backend '{}' shut down", service.backend_name());
        }
        Err(e) => {
            error!("Storage shutdown failed: {}", e);
        }
    }
}
