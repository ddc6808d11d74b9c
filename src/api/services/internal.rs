use actix_web::{HttpResponse, web};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::services::ShortenerService;

use super::helpers::error_response;

#[derive(Debug, Serialize, Deserialize)]
pub struct StatsResponse {
    pub urls: u64,
    pub users: u64,
}

pub struct InternalService;

impl InternalService {
    /// `GET /api/internal/stats`, only reachable through the trusted-subnet guard
    pub async fn stats(service: web::Data<Arc<ShortenerService>>) -> HttpResponse {
        match service.stats().await {
            Ok(stats) => HttpResponse::Ok().json(StatsResponse {
                urls: stats.urls,
                users: stats.users,
            }),
            Err(e) => error_response(&e),
        }
    }
}
