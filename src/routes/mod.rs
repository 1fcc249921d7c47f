pub mod citizen_reports;
pub mod comments;
pub mod health;
pub mod kokwatch;
pub mod mines;
pub mod reports;

use actix_web::{web, HttpResponse};
use serde_json::json;

use crate::config::API_PREFIX;
use crate::errors::AppError;

pub const JSON_LIMIT_BYTES: usize = 10 * 1024 * 1024;

/// Registers every route plus extractor error handlers that answer with the
/// JSON error envelope.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(
        web::JsonConfig::default()
            .limit(JSON_LIMIT_BYTES)
            .error_handler(|err, _| AppError::Validation(err.to_string()).into()),
    )
    .app_data(
        web::QueryConfig::default()
            .error_handler(|err, _| AppError::Validation(err.to_string()).into()),
    )
    .app_data(
        web::PathConfig::default()
            .error_handler(|err, _| AppError::Validation(err.to_string()).into()),
    )
    .route("/health", web::get().to(health::health))
    .service(
        web::scope(API_PREFIX)
            .route("/health", web::get().to(health::health))
            .service(
                web::scope("/reports")
                    .route("", web::get().to(reports::list_reports))
                    .route("", web::post().to(reports::create_report))
                    .route("/nearby/{lat}/{lng}", web::get().to(reports::nearby_reports))
                    .route("/case/{case_id}", web::get().to(reports::list_case_reports))
                    .route("/case/{case_id}", web::post().to(reports::create_case_report))
                    .route("/{id}", web::get().to(reports::get_report))
                    .route("/{id}/actions", web::get().to(reports::get_actions))
                    .route("/{id}/actions", web::post().to(reports::add_action))
                    .route("/{id}/actions/{action_id}", web::patch().to(reports::update_action))
                    .route("/{id}/response", web::patch().to(reports::assign_response))
                    .route("/{id}/status", web::patch().to(reports::update_status)),
            )
            .service(
                web::scope("/comments")
                    .route("/{case_id}/stats", web::get().to(comments::comment_stats))
                    .route("/{comment_id}/like", web::put().to(comments::toggle_like))
                    .route("/{case_id}", web::get().to(comments::list_comments))
                    .route("/{case_id}", web::post().to(comments::create_comment))
                    .route("/{comment_id}", web::delete().to(comments::delete_comment)),
            )
            .service(
                web::scope("/citizen-reports")
                    .route("", web::get().to(citizen_reports::list_citizen_reports))
                    .route("/all", web::get().to(citizen_reports::all_citizen_reports))
                    .route("/test", web::get().to(citizen_reports::probe_csite))
                    .route("/nearby", web::post().to(citizen_reports::nearby_citizen_reports)),
            )
            .route("/mines/nearby", web::get().to(mines::nearby_mines))
            .route("/kokwatch", web::get().to(kokwatch::kokwatch)),
    );
}

pub async fn not_found() -> HttpResponse {
    HttpResponse::NotFound().json(json!({
        "success": false,
        "message": "Route not found",
    }))
}
