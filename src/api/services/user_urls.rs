//! Per-owner listing and deletion

use actix_web::http::StatusCode;
use actix_web::{HttpRequest, HttpResponse, web};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

use crate::identity::IdentityService;
use crate::services::ShortenerService;

use super::helpers::{error_response, json_with_cookie, respond, text_response};

#[derive(Debug, Serialize, Deserialize)]
pub struct UserUrl {
    pub short_url: String,
    pub original_url: String,
}

pub struct UserUrlsService;

impl UserUrlsService {
    /// `GET /api/user/urls`; 204 when the caller owns nothing
    pub async fn list(
        req: HttpRequest,
        service: web::Data<Arc<ShortenerService>>,
        identity: web::Data<Arc<IdentityService>>,
    ) -> HttpResponse {
        let (owner, cookie) = identity.get_or_issue_request(&req);

        let records = match service.list_for_owner(&owner).await {
            Ok(records) => records,
            Err(e) => return error_response(&e),
        };

        if records.is_empty() {
            return respond(StatusCode::NO_CONTENT, cookie).finish();
        }

        let body: Vec<UserUrl> = records
            .into_iter()
            .map(|r| UserUrl {
                short_url: service.shorten_url(&r.code),
                original_url: r.origin,
            })
            .collect();
        json_with_cookie(StatusCode::OK, cookie, &body)
    }

    /// `DELETE /api/user/urls` with a JSON array of codes; always 202 once queued
    pub async fn delete(
        req: HttpRequest,
        body: web::Bytes,
        service: web::Data<Arc<ShortenerService>>,
        identity: web::Data<Arc<IdentityService>>,
    ) -> HttpResponse {
        let codes: Vec<String> = match serde_json::from_slice(&body) {
            Ok(codes) => codes,
            Err(e) => {
                debug!("Bad delete request body: {}", e);
                return text_response(StatusCode::BAD_REQUEST, "invalid request body");
            }
        };

        let (owner, cookie) = identity.get_or_issue_request(&req);
        match service.delete(&owner, codes) {
            Ok(_) => respond(StatusCode::ACCEPTED, cookie).finish(),
            Err(e) => error_response(&e),
        }
    }
}
