//! Shorten endpoints: plain-text, JSON and batch

use actix_web::http::StatusCode;
use actix_web::http::header::CONTENT_TYPE;
use actix_web::{HttpRequest, HttpResponse, Responder, web};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

use crate::identity::IdentityService;
use crate::services::{BatchItem, ShortenOutcome, ShortenerService};

use super::helpers::{error_response, json_with_cookie, respond, text_response};

#[derive(Debug, Deserialize)]
pub struct ShortenRequest {
    #[serde(default)]
    pub url: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ShortenResponse {
    pub result: String,
}

#[derive(Debug, Deserialize)]
pub struct BatchRequestItem {
    #[serde(default)]
    pub correlation_id: String,
    #[serde(default)]
    pub original_url: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BatchResponseItem {
    pub correlation_id: String,
    pub short_url: String,
}

fn outcome_status(outcome: &ShortenOutcome) -> StatusCode {
    if outcome.created {
        StatusCode::CREATED
    } else {
        StatusCode::CONFLICT
    }
}

pub struct ShortenService;

impl ShortenService {
    /// `POST /` with the origin URL as the raw body
    pub async fn shorten_text(
        req: HttpRequest,
        body: web::Bytes,
        service: web::Data<Arc<ShortenerService>>,
        identity: web::Data<Arc<IdentityService>>,
    ) -> impl Responder {
        let Ok(url) = std::str::from_utf8(&body) else {
            return text_response(StatusCode::BAD_REQUEST, "body must be UTF-8");
        };

        let (owner, cookie) = identity.get_or_issue_request(&req);
        match service.shorten(&owner, url).await {
            Ok(outcome) => respond(outcome_status(&outcome), cookie)
                .insert_header((CONTENT_TYPE, "text/plain; charset=utf-8"))
                .body(service.shorten_url(&outcome.code)),
            Err(e) => error_response(&e),
        }
    }

    /// `POST /api/shorten` with `{"url": "..."}`
    pub async fn shorten_json(
        req: HttpRequest,
        body: web::Bytes,
        service: web::Data<Arc<ShortenerService>>,
        identity: web::Data<Arc<IdentityService>>,
    ) -> impl Responder {
        let request: ShortenRequest = match serde_json::from_slice(&body) {
            Ok(r) => r,
            Err(e) => {
                debug!("Bad shorten request body: {}", e);
                return text_response(StatusCode::BAD_REQUEST, "invalid request body");
            }
        };

        let (owner, cookie) = identity.get_or_issue_request(&req);
        match service.shorten(&owner, &request.url).await {
            Ok(outcome) => json_with_cookie(
                outcome_status(&outcome),
                cookie,
                &ShortenResponse {
                    result: service.shorten_url(&outcome.code),
                },
            ),
            Err(e) => error_response(&e),
        }
    }

    /// `POST /api/shorten/batch`
    pub async fn shorten_batch(
        req: HttpRequest,
        body: web::Bytes,
        service: web::Data<Arc<ShortenerService>>,
        identity: web::Data<Arc<IdentityService>>,
    ) -> HttpResponse {
        let items: Vec<BatchRequestItem> = match serde_json::from_slice(&body) {
            Ok(items) => items,
            Err(e) => {
                debug!("Bad batch request body: {}", e);
                return text_response(StatusCode::BAD_REQUEST, "invalid request body");
            }
        };
        if items.is_empty() {
            return text_response(StatusCode::BAD_REQUEST, "empty batch");
        }

        let items = items
            .into_iter()
            .map(|item| BatchItem {
                correlation_id: item.correlation_id,
                original_url: item.original_url,
            })
            .collect();

        let (owner, cookie) = identity.get_or_issue_request(&req);
        match service.batch_shorten(&owner, items).await {
            Ok(results) => {
                let body: Vec<BatchResponseItem> = results
                    .into_iter()
                    .map(|r| BatchResponseItem {
                        short_url: service.shorten_url(&r.code),
                        correlation_id: r.correlation_id,
                    })
                    .collect();
                json_with_cookie(StatusCode::CREATED, cookie, &body)
            }
            Err(e) => error_response(&e),
        }
    }
}
