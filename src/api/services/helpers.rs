//! Response helpers shared by the handlers

use actix_web::cookie::Cookie;
use actix_web::http::StatusCode;
use actix_web::http::header::CONTENT_TYPE;
use actix_web::{HttpResponse, HttpResponseBuilder};
use serde::Serialize;
use tracing::error;

use crate::errors::ShortenerError;

/// 纯文本响应
pub fn text_response(status: StatusCode, body: impl Into<String>) -> HttpResponse {
    HttpResponse::build(status)
        .insert_header((CONTENT_TYPE, "text/plain; charset=utf-8"))
        .body(body.into())
}

/// Map a service error to its HTTP status with a plain-text body
pub fn error_response(err: &ShortenerError) -> HttpResponse {
    let status = err.http_status();
    if status.is_server_error() {
        error!("Request failed: {}", err);
    }
    text_response(status, err.error_type())
}

/// Start a response, attaching a freshly issued identity cookie if any
pub fn respond(status: StatusCode, cookie: Option<Cookie<'static>>) -> HttpResponseBuilder {
    let mut builder = HttpResponse::build(status);
    if let Some(cookie) = cookie {
        builder.cookie(cookie);
    }
    builder
}

pub fn json_with_cookie<T: Serialize>(
    status: StatusCode,
    cookie: Option<Cookie<'static>>,
    body: &T,
) -> HttpResponse {
    respond(status, cookie)
        .insert_header((CONTENT_TYPE, "application/json"))
        .json(body)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_response_status() {
        let resp = error_response(&ShortenerError::gone("x"));
        assert_eq!(resp.status(), StatusCode::GONE);

        let resp = error_response(&ShortenerError::backend_unavailable("down"));
        assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn test_respond_attaches_cookie() {
        let resp = respond(StatusCode::OK, Some(Cookie::new("auth_token", "v"))).finish();
        assert!(resp.cookies().any(|c| c.name() == "auth_token"));

        let resp = respond(StatusCode::OK, None).finish();
        assert_eq!(resp.cookies().count(), 0);
    }
}
