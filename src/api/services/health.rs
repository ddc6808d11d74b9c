use actix_web::http::StatusCode;
use actix_web::{HttpResponse, web};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, trace};

use crate::services::ShortenerService;

use super::helpers::text_response;

const PING_TIMEOUT_SECS: u64 = 5;

pub struct HealthService;

impl HealthService {
    /// `GET /ping`: 200 when the backend answers, 500 otherwise
    pub async fn ping(service: web::Data<Arc<ShortenerService>>) -> HttpResponse {
        match tokio::time::timeout(Duration::from_secs(PING_TIMEOUT_SECS), service.ping()).await {
            Ok(Ok(())) => {
                trace!("Ping ok ({})", service.backend_name());
                text_response(StatusCode::OK, "OK")
            }
            Ok(Err(e)) => {
                error!("Storage ping failed: {}", e);
                text_response(StatusCode::INTERNAL_SERVER_ERROR, "storage unavailable")
            }
            Err(_) => {
                error!("Storage ping timed out");
                text_response(StatusCode::INTERNAL_SERVER_ERROR, "storage unavailable")
            }
        }
    }
}
