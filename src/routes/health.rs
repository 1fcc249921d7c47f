use actix_web::HttpResponse;
use chrono::Utc;

use crate::models::HealthPayload;
use crate::response::ApiResponse;

#[utoipa::path(
    get,
    path = "/health",
    tag = "System",
    responses((status = 200, description = "Service is healthy", body = HealthPayload))
)]
pub async fn health() -> HttpResponse {
    ApiResponse::ok(HealthPayload {
        status: "ok",
        service: "MineNearMe API",
        version: env!("CARGO_PKG_VERSION"),
        timestamp: Utc::now(),
    })
}
