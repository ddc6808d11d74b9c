//! HTTP layer
//!
//! Thin actix-web handlers over [`crate::services::ShortenerService`]. The
//! route table lives here so the server and the integration tests mount the
//! exact same paths.

pub mod middleware;
pub mod services;

use actix_web::web;

use middleware::TrustedSubnetGuard;
use services::{HealthService, InternalService, RedirectService, ShortenService, UserUrlsService};

/// `/api/...` endpoints
pub fn api_routes(trusted_subnet: Option<String>) -> actix_web::Scope {
    web::scope("/api")
        .route("/shorten", web::post().to(ShortenService::shorten_json))
        .route("/shorten/batch", web::post().to(ShortenService::shorten_batch))
        .route("/user/urls", web::get().to(UserUrlsService::list))
        .route("/user/urls", web::delete().to(UserUrlsService::delete))
        .service(
            web::scope("/internal")
                .wrap(TrustedSubnetGuard::new(trusted_subnet))
                .route("/stats", web::get().to(InternalService::stats)),
        )
}

/// Mount every route; `/{id}` goes last so it never shadows a fixed path
pub fn configure_routes(cfg: &mut web::ServiceConfig, trusted_subnet: Option<String>) {
    cfg.service(api_routes(trusted_subnet))
        .route("/", web::post().to(ShortenService::shorten_text))
        .route("/ping", web::get().to(HealthService::ping))
        .route("/{id}", web::get().to(RedirectService::handle_redirect))
        .route("/{id}", web::head().to(RedirectService::handle_redirect));
}
