use actix_web::http::StatusCode;
use actix_web::{HttpResponse, Responder, web};
use std::sync::Arc;
use tracing::trace;

use crate::services::ShortenerService;
use crate::shortcode::is_valid_code;

use super::helpers::{error_response, text_response};

pub struct RedirectService;

impl RedirectService {
    /// `GET /{id}`: 307 to the origin, 404 unknown, 410 deleted
    pub async fn handle_redirect(
        path: web::Path<String>,
        service: web::Data<Arc<ShortenerService>>,
    ) -> impl Responder {
        let code = path.into_inner();

        // 非法短码直接 400，不查存储
        if !is_valid_code(&code) {
            trace!("Invalid short code rejected: {}", code);
            return text_response(StatusCode::BAD_REQUEST, "invalid short code");
        }

        match service.resolve_active(&code).await {
            Ok(record) => HttpResponse::TemporaryRedirect()
                .insert_header(("Location", record.origin))
                .finish(),
            Err(e) => error_response(&e),
        }
    }
}
