use actix_web::{HttpResponse, ResponseError};
use serde::Serialize;
use std::fmt;

#[derive(Debug)]
pub(crate) enum AppError {
    Validation(String),
    Database(String),
    NotFound(String),
    Upstream(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Validation(msg) => write!(f, "validation error: {msg}"),
            Self::Database(msg) => write!(f, "database error: {msg}"),
            Self::NotFound(msg) => write!(f, "not found: {msg}"),
            Self::Upstream(msg) => write!(f, "upstream error: {msg}"),
        }
    }
}

impl ResponseError for AppError {
    fn error_response(&self) -> HttpResponse {
        match self {
            Self::Validation(msg) => HttpResponse::BadRequest().json(ErrorBody::new(400, msg)),
            Self::Database(msg) => {
                log::error!("Database error: {msg}");
                HttpResponse::InternalServerError()
                    .json(ErrorBody::new(500, "database connection error"))
            }
            Self::NotFound(msg) => HttpResponse::NotFound().json(ErrorBody::new(404, msg)),
            Self::Upstream(msg) => {
                log::error!("Upstream error: {msg}");
                HttpResponse::BadGateway().json(ErrorBody::new(502, msg))
            }
        }
    }
}

impl From<tokio_postgres::Error> for AppError {
    fn from(err: tokio_postgres::Error) -> Self {
        let msg = if let Some(db_err) = err.as_db_error() {
            format!(
                "{}: {} (code: {})",
                db_err.severity(),
                db_err.message(),
                db_err.code().code()
            )
        } else {
            err.to_string()
        };
        Self::Database(msg)
    }
}

impl From<deadpool_postgres::PoolError> for AppError {
    fn from(err: deadpool_postgres::PoolError) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<reqwest::Error> for AppError {
    /// The request URL is stripped: upstream query strings carry API tokens.
    fn from(err: reqwest::Error) -> Self {
        let err = err.without_url();
        if err.is_timeout() {
            Self::Upstream("upstream request timed out".to_string())
        } else if err.is_decode() {
            Self::Upstream(format!("invalid upstream response: {err}"))
        } else {
            Self::Upstream(format!("upstream request failed: {err}"))
        }
    }
}

#[derive(Serialize)]
pub(crate) struct ErrorBody<'a> {
    success: bool,
    code: u16,
    message: &'a str,
}

impl<'a> ErrorBody<'a> {
    pub fn new(code: u16, message: &'a str) -> Self {
        Self {
            success: false,
            code,
            message,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::body::to_bytes;
    use actix_web::http::StatusCode;

    #[actix_web::test]
    async fn validation_maps_to_bad_request_envelope() {
        let resp = AppError::Validation("radius out of range".into()).error_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let body = to_bytes(resp.into_body()).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["success"], false);
        assert_eq!(json["code"], 400);
        assert_eq!(json["message"], "radius out of range");
    }

    #[actix_web::test]
    async fn database_details_are_not_leaked() {
        let resp = AppError::Database("password authentication failed".into()).error_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = to_bytes(resp.into_body()).await.unwrap();
        let text = String::from_utf8(body.to_vec()).unwrap();
        assert!(!text.contains("password"));
    }

    #[test]
    fn upstream_maps_to_bad_gateway() {
        let resp = AppError::Upstream("C-Site API responded with status: 503".into()).error_response();
        assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);
    }

    #[tokio::test]
    async fn upstream_errors_do_not_carry_the_token() {
        let err = reqwest::Client::new()
            .get("http://127.0.0.1:9/publicdata/get_kokwatch?token=s3cret-token")
            .send()
            .await
            .unwrap_err();
        assert!(err.to_string().contains("s3cret-token"));

        let app = AppError::from(err);
        assert!(!app.to_string().contains("s3cret-token"), "{app}");
    }
}
