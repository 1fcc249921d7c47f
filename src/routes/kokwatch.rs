use actix_web::http::StatusCode;
use actix_web::{web, HttpResponse};
use serde::Serialize;

use crate::models::KokWatchQuery;
use crate::services::{KokWatchClient, KokWatchReply};

/// Error shape the KokWatch map layer expects.
#[derive(Serialize)]
struct KokWatchError {
    status: &'static str,
    message: String,
}

fn error(status: StatusCode, message: impl Into<String>) -> HttpResponse {
    HttpResponse::build(status).json(KokWatchError {
        status: "error",
        message: message.into(),
    })
}

#[utoipa::path(
    get,
    path = "/kokwatch",
    tag = "KokWatch",
    params(KokWatchQuery),
    responses(
        (status = 200, description = "Upstream KokWatch JSON, unchanged"),
        (status = 400, description = "Token is required")
    )
)]
pub(crate) async fn kokwatch(
    client: web::Data<KokWatchClient>,
    query: web::Query<KokWatchQuery>,
) -> HttpResponse {
    let Some(token) = query.token.as_deref().filter(|t| !t.is_empty()) else {
        return error(StatusCode::BAD_REQUEST, "Token is required");
    };

    match client.fetch(token).await {
        Ok(KokWatchReply::Data(body)) => HttpResponse::Ok().json(body),
        Ok(KokWatchReply::Failed(status)) => {
            let status =
                StatusCode::from_u16(status.as_u16()).unwrap_or(StatusCode::BAD_GATEWAY);
            error(
                status,
                format!(
                    "External API error: {}",
                    status.canonical_reason().unwrap_or("unknown")
                ),
            )
        }
        Err(e) => {
            log::error!("KokWatch proxy failed: {e}");
            error(StatusCode::BAD_GATEWAY, "Internal server error")
        }
    }
}
