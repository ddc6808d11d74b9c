//! Server mode
//!
//! Builds the services, starts the HTTP server and waits for Ctrl+C.

use actix_web::{
    App, HttpServer,
    middleware::{Compress, DefaultHeaders},
    web,
};
use anyhow::{Context, Result};
use tracing::{error, warn};

use crate::api::configure_routes;
use crate::api::middleware::RequestLogMiddleware;
use crate::config::StaticConfig;
use crate::runtime::lifetime;

/// Run the HTTP server until Ctrl+C or until it exits on its own
///
/// **Note**: logging must be initialized before calling this function
pub async fn run_server(config: &StaticConfig) -> Result<()> {
    let startup = lifetime::startup::prepare_server_startup(config)
        .await
        .map_err(|e| {
            error!("Server startup failed: {}", e);
            e
        })?;

    let shortener = startup.shortener.clone();
    let identity = startup.identity.clone();
    let trusted_subnet = config.server.trusted_subnet.clone();

    if trusted_subnet.is_none() {
        warn!("No trusted subnet configured, /api/internal/stats will reject every request");
    }

    let cpu_count = config.server.cpu_count.clamp(1, 32);
    warn!("Using {} CPU cores for the server", cpu_count);

    let app_shortener = shortener.clone();
    let server = HttpServer::new(move || {
        let trusted_subnet = trusted_subnet.clone();
        App::new()
            .wrap(RequestLogMiddleware)
            .wrap(Compress::default())
            .wrap(DefaultHeaders::new().add(("Cache-Control", "no-cache, no-store, must-revalidate")))
            .app_data(web::Data::new(app_shortener.clone()))
            .app_data(web::Data::new(identity.clone()))
            .app_data(web::PayloadConfig::new(1024 * 1024))
            .configure(|cfg| configure_routes(cfg, trusted_subnet))
    })
    .keep_alive(std::time::Duration::from_secs(30))
    .client_request_timeout(std::time::Duration::from_millis(5000))
    .workers(cpu_count)
    .disable_signals();

    let bind_address = config.bind_address();
    warn!("Starting server at http://{}", bind_address);
    let server = server
        .bind(&bind_address)
        .with_context(|| format!("Failed to bind {}", bind_address))?
        .run();
    let handle = server.handle();
    let mut server_task = actix_web::rt::spawn(server);

    tokio::select! {
        res = &mut server_task => {
            warn!("HTTP server exited without a shutdown signal");
            lifetime::shutdown::perform_shutdown_tasks(&shortener).await;
            res.context("HTTP server task panicked")?
                .context("HTTP server failed")?;
            return Ok(());
        }
        _ = lifetime::shutdown::wait_for_signal() => {}
    }

    lifetime::shutdown::graceful_shutdown(handle, shortener).await;
    match server_task.await {
        Ok(Ok(())) => warn!("Graceful shutdown: all tasks completed"),
        Ok(Err(e)) => error!("HTTP server returned an error during shutdown: {}", e),
        Err(e) => error!("HTTP server task failed: {}", e),
    }

    Ok(())
}
